mod handlers;

use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use mealboard_core::MealPlanner;

pub use handlers::{
    DeletedSlot, MealPlanQuery, RecipeIdInput, RestoreSlotInput, ShoppingListQuery,
    ShuffleResponse,
};

/// Router allowing any CORS origin.
pub fn create_router(planner: MealPlanner) -> Router {
    build_router(planner, CorsLayer::permissive())
}

/// Router restricted to the given CORS origins.
pub fn create_router_with_origins(planner: MealPlanner, origins: &[String]) -> Result<Router> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(build_router(planner, cors))
}

fn build_router(planner: MealPlanner, cors: CorsLayer) -> Router {
    let api = Router::new()
        // Recipes
        .route("/recipes", get(handlers::list_recipes))
        .route("/recipes", post(handlers::create_recipe))
        .route("/recipes/add", post(handlers::create_recipe))
        .route("/recipes/update", post(handlers::update_recipe))
        .route("/recipes/delete", post(handlers::delete_recipe))
        .route("/recipes/{id}", get(handlers::get_recipe))
        // Meal plan
        .route("/meals/data", get(handlers::get_meal_plan))
        .route("/meals/update", post(handlers::assign_slot))
        .route("/meals/add-recipe", post(handlers::add_recipe_to_slot))
        .route("/meals/today", get(handlers::todays_meals))
        .route("/meals/shuffle", post(handlers::shuffle_meal_plan))
        // Favorites
        .route("/meals/favorites", get(handlers::list_favorites))
        .route("/meals/favorites/full", get(handlers::list_full_favorites))
        // Shopping lists
        .route("/meals/shopping-list", get(handlers::shopping_list))
        .route("/meals/shopping-list/today", get(handlers::todays_shopping_list))
        // Slots (by `date|mealType` key)
        .route("/mealslot/restore", post(handlers::restore_slot))
        .route("/mealslot/{slot_id}", delete(handlers::delete_slot))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(planner)
}
