use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use mealboard_core::models::*;
use mealboard_core::{MealPlanner, PlanError};

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Map a planner error onto an HTTP status.
///
/// Validation and not-found messages are safe to show to the client. Store
/// failures are logged in full server-side and returned as a generic message.
fn api_error(e: PlanError) -> (StatusCode, String) {
    match e {
        PlanError::Validation(msg) => {
            tracing::warn!("Validation error: {}", msg);
            (StatusCode::BAD_REQUEST, msg)
        }
        PlanError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
        PlanError::Store(err) => {
            tracing::error!("Store error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn status_ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn today() -> CalendarDate {
    CalendarDate::from(Local::now().date_naive())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    status_ok()
}

// ============================================================
// Recipes
// ============================================================

/// Body of the delete endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeIdInput {
    #[serde(alias = "uuid")]
    pub id: String,
}

pub async fn list_recipes(State(planner): State<MealPlanner>) -> ApiResult<Json<Vec<Recipe>>> {
    planner.recipes().list().map(Json).map_err(api_error)
}

pub async fn get_recipe(
    State(planner): State<MealPlanner>,
    Path(id): Path<String>,
) -> ApiResult<Json<Recipe>> {
    planner.recipes().get(&id).map(Json).map_err(api_error)
}

pub async fn create_recipe(
    State(planner): State<MealPlanner>,
    Json(input): Json<CreateRecipeInput>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    planner
        .recipes()
        .create(input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(api_error)
}

/// The target id travels in the body next to the patched fields.
pub async fn update_recipe(
    State(planner): State<MealPlanner>,
    Json(input): Json<UpdateRecipeInput>,
) -> ApiResult<Json<Recipe>> {
    let id = input
        .id
        .clone()
        .ok_or_else(|| api_error(PlanError::validation("id required")))?;

    planner.recipes().update(&id, input).map(Json).map_err(api_error)
}

/// Deleting an unknown id still succeeds so clients can retry freely.
pub async fn delete_recipe(
    State(planner): State<MealPlanner>,
    Json(input): Json<RecipeIdInput>,
) -> ApiResult<Json<serde_json::Value>> {
    planner.recipes().delete(&input.id).map_err(api_error)?;
    Ok(status_ok())
}

// ============================================================
// Meal plan
// ============================================================

/// Query parameters for the meal-plan dump.
#[derive(Debug, Deserialize)]
pub struct MealPlanQuery {
    /// `YYYY-MM`; without it the whole calendar is returned.
    pub month: Option<String>,
}

/// The calendar as `month -> date -> mealType -> slot`.
pub async fn get_meal_plan(
    State(planner): State<MealPlanner>,
    Query(query): Query<MealPlanQuery>,
) -> ApiResult<Json<BTreeMap<String, MonthPlan>>> {
    let meal_plan = planner.meal_plan();

    let Some(month) = query.month else {
        let plan = meal_plan.snapshot().map_err(api_error)?;
        return Ok(Json(plan.months().clone()));
    };

    let days = meal_plan.month(&month).map_err(api_error)?;
    let mut months = BTreeMap::new();
    if !days.is_empty() {
        months.insert(month, days);
    }
    Ok(Json(months))
}

pub async fn assign_slot(
    State(planner): State<MealPlanner>,
    Json(input): Json<AssignSlotInput>,
) -> ApiResult<Json<SlotPayload>> {
    planner.assign_slot(input).map(Json).map_err(api_error)
}

pub async fn add_recipe_to_slot(
    State(planner): State<MealPlanner>,
    Json(input): Json<AddRecipeToSlotInput>,
) -> ApiResult<(StatusCode, Json<AddedRecipe>)> {
    let added = planner.add_recipe_to_slot(input).map_err(api_error)?;
    let status = if added.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(added)))
}

pub async fn todays_meals(State(planner): State<MealPlanner>) -> ApiResult<Json<TodaysMeals>> {
    planner.todays_meals(today()).map(Json).map_err(api_error)
}

/// Slot keys filled by the shuffle.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShuffleResponse {
    pub filled: Vec<SlotKey>,
}

pub async fn shuffle_meal_plan(
    State(planner): State<MealPlanner>,
    Json(input): Json<ShuffleInput>,
) -> ApiResult<Json<ShuffleResponse>> {
    planner
        .shuffle_fill(input)
        .map(|filled| Json(ShuffleResponse { filled }))
        .map_err(api_error)
}

// ============================================================
// Favorites
// ============================================================

pub async fn list_favorites(
    State(planner): State<MealPlanner>,
) -> ApiResult<Json<Vec<FavoriteSummary>>> {
    planner.favorites().list().map(Json).map_err(api_error)
}

pub async fn list_full_favorites(
    State(planner): State<MealPlanner>,
) -> ApiResult<Json<Vec<Recipe>>> {
    planner.favorites().list_full().map(Json).map_err(api_error)
}

// ============================================================
// Shopping lists
// ============================================================

/// Query parameters for the shopping list.
#[derive(Debug, Deserialize)]
pub struct ShoppingListQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Unparseable bounds do not fail the request; the response's `window`
/// reports that the list is unfiltered.
pub async fn shopping_list(
    State(planner): State<MealPlanner>,
    Query(query): Query<ShoppingListQuery>,
) -> ApiResult<Json<ShoppingList>> {
    planner
        .shopping()
        .for_range(query.start.as_deref(), query.end.as_deref())
        .map(Json)
        .map_err(api_error)
}

pub async fn todays_shopping_list(
    State(planner): State<MealPlanner>,
) -> ApiResult<Json<ShoppingList>> {
    planner
        .shopping()
        .for_day(today())
        .map(Json)
        .map_err(api_error)
}

// ============================================================
// Slots
// ============================================================

/// Body of the restore endpoint; `recipe` is the payload captured on delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct RestoreSlotInput {
    pub slot_id: String,
    pub recipe: SlotPayload,
}

/// Response of slot deletion, carrying what was removed for undo.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedSlot {
    pub status: String,
    pub removed: Option<SlotPayload>,
}

pub async fn delete_slot(
    State(planner): State<MealPlanner>,
    Path(slot_id): Path<String>,
) -> ApiResult<Json<DeletedSlot>> {
    let key: SlotKey = slot_id.parse().map_err(api_error)?;
    let removed = planner
        .meal_plan()
        .delete_slot(&key.date, &key.meal_type)
        .map_err(api_error)?;

    Ok(Json(DeletedSlot {
        status: "ok".to_string(),
        removed,
    }))
}

pub async fn restore_slot(
    State(planner): State<MealPlanner>,
    Json(input): Json<RestoreSlotInput>,
) -> ApiResult<Json<serde_json::Value>> {
    let key: SlotKey = input.slot_id.parse().map_err(api_error)?;
    planner
        .meal_plan()
        .restore_slot(&key.date, &key.meal_type, input.recipe)
        .map_err(api_error)?;
    Ok(status_ok())
}
