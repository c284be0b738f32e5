//! Operations spanning both stores.
//!
//! [`MealPlanner`] is the handle callers hold: it wires a recipe store and a
//! meal-plan store to the same backends and implements the boundary
//! operations that touch both. Stores are locked one at a time, never nested.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};

use crate::db::{
    Database, DocumentBackend, JsonFileBackend, MemoryBackend, MEAL_PLAN_DOCUMENT,
    MEAL_PLAN_FILE, RECIPES_DOCUMENT, RECIPES_FILE,
};
use crate::error::{PlanError, PlanResult};
use crate::favorites::FavoritesIndex;
use crate::meal_plan::MealPlanStore;
use crate::models::*;
use crate::recipes::RecipeStore;
use crate::shopping::ShoppingListAggregator;

/// Longest range a single shuffle may fill.
pub const MAX_SHUFFLE_DAYS: i64 = 366;

#[derive(Clone)]
pub struct MealPlanner {
    recipes: RecipeStore,
    meal_plan: MealPlanStore,
}

impl MealPlanner {
    pub fn new(recipes: Arc<dyn DocumentBackend>, meal_plan: Arc<dyn DocumentBackend>) -> Self {
        Self {
            recipes: RecipeStore::new(recipes),
            meal_plan: MealPlanStore::new(meal_plan),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), Arc::new(MemoryBackend::new()))
    }

    /// `recipes.json` and `meals_data.json` under `dir`.
    pub fn open_json_dir(dir: &Path) -> Self {
        Self::new(
            Arc::new(JsonFileBackend::new(dir.join(RECIPES_FILE))),
            Arc::new(JsonFileBackend::new(dir.join(MEAL_PLAN_FILE))),
        )
    }

    /// Both documents as rows of an already migrated database.
    pub fn open_sqlite(db: &Database) -> Self {
        Self::new(
            Arc::new(db.document(RECIPES_DOCUMENT)),
            Arc::new(db.document(MEAL_PLAN_DOCUMENT)),
        )
    }

    pub fn recipes(&self) -> &RecipeStore {
        &self.recipes
    }

    pub fn meal_plan(&self) -> &MealPlanStore {
        &self.meal_plan
    }

    pub fn favorites(&self) -> FavoritesIndex {
        FavoritesIndex::new(self.recipes.clone())
    }

    pub fn shopping(&self) -> ShoppingListAggregator {
        ShoppingListAggregator::new(self.recipes.clone(), self.meal_plan.clone())
    }

    /// Points a slot at a recipe by id.
    ///
    /// The recipe does not have to exist; it is only consulted for the
    /// default serving count when `servings` is omitted.
    pub fn assign_slot(&self, input: AssignSlotInput) -> PlanResult<SlotPayload> {
        let date = CalendarDate::parse(&input.date)?;
        validate_meal_type(&input.meal_type)?;
        if let Some(month) = &input.month {
            if parse_month(month)? != date.month_key() {
                return Err(PlanError::validation(format!(
                    "date {date} does not belong to month {month}"
                )));
            }
        }
        if input.recipe_id.trim().is_empty() {
            return Err(PlanError::validation("recipe_uuid is required"));
        }

        let servings = match input.servings {
            Some(servings) => positive_servings(servings)?,
            None => self
                .recipes
                .find(&input.recipe_id)?
                .map(|recipe| recipe.default_servings)
                .unwrap_or(1),
        };

        let payload = SlotPayload::by_reference(input.recipe_id, servings);
        self.meal_plan
            .set_slot(&input.date, &input.meal_type, payload.clone())?;
        Ok(payload)
    }

    /// Creates the recipe unless an existing one is named, then assigns it.
    ///
    /// A recipe created here is removed again if the slot cannot be written.
    pub fn add_recipe_to_slot(&self, input: AddRecipeToSlotInput) -> PlanResult<AddedRecipe> {
        CalendarDate::parse(&input.date)?;
        validate_meal_type(&input.meal_type)?;
        if let Some(servings) = input.servings {
            positive_servings(servings)?;
        }

        let existing = match &input.recipe_id {
            Some(id) => self.recipes.find(id)?,
            None => None,
        };

        let (recipe, created) = match (existing, input.recipe) {
            (Some(recipe), _) => (recipe, false),
            (None, Some(mut draft)) => {
                if draft.default_servings.is_none() {
                    draft.default_servings = input.servings.map(i64::from);
                }
                (self.recipes.create(draft)?, true)
            }
            (None, None) => {
                return Err(match input.recipe_id {
                    Some(id) => PlanError::recipe_not_found(&id),
                    None => PlanError::validation("recipe or recipe_uuid is required"),
                })
            }
        };

        let servings = input.servings.unwrap_or(recipe.default_servings);
        let slot = SlotPayload::by_reference(recipe.id.clone(), servings);

        if let Err(err) = self
            .meal_plan
            .set_slot(&input.date, &input.meal_type, slot.clone())
        {
            if created {
                if let Err(rollback) = self.recipes.delete(&recipe.id) {
                    tracing::error!(
                        recipe_id = %recipe.id,
                        error = %rollback,
                        "Failed to remove recipe after slot write failed"
                    );
                }
            }
            return Err(err);
        }

        tracing::info!(
            recipe_id = %recipe.id,
            date = %input.date,
            meal_type = %input.meal_type,
            created,
            "Added recipe to meal slot"
        );

        Ok(AddedRecipe {
            recipe_id: recipe.id,
            created,
            slot,
        })
    }

    pub fn todays_meals(&self, today: CalendarDate) -> PlanResult<TodaysMeals> {
        let mut day = self.meal_plan.get_day(&today.key())?;
        Ok(TodaysMeals {
            date: today.key(),
            breakfast: day.remove("breakfast"),
            lunch: day.remove("lunch"),
            dinner: day.remove("dinner"),
        })
    }

    /// Fills empty, unlocked slots in `[start, end]` with favorites.
    ///
    /// A recipe is used at most once per Sunday-to-Saturday week, counting
    /// slots that were already assigned. Returns the keys that were filled.
    pub fn shuffle_fill(&self, input: ShuffleInput) -> PlanResult<Vec<SlotKey>> {
        let start = CalendarDate::parse(&input.start)?;
        let end = CalendarDate::parse(&input.end)?;
        if end < start {
            return Err(PlanError::validation("shuffle range ends before it starts"));
        }
        let days = (end.naive() - start.naive()).num_days() + 1;
        if days > MAX_SHUFFLE_DAYS {
            return Err(PlanError::validation(format!(
                "shuffle range spans {days} days, at most {MAX_SHUFFLE_DAYS} allowed"
            )));
        }

        let meal_types: Vec<String> = if input.meal_types.is_empty() {
            DEFAULT_MEAL_TYPES.iter().map(|s| s.to_string()).collect()
        } else {
            input.meal_types
        };
        for meal_type in &meal_types {
            validate_meal_type(meal_type)?;
        }

        let mut favorites = self.favorites().list_full()?;
        if favorites.is_empty() {
            return Ok(Vec::new());
        }
        let offset = (input.seed % favorites.len() as u64) as usize;
        favorites.rotate_left(offset);

        let filled = self.meal_plan.modify(|plan| {
            let mut used_by_week: HashMap<NaiveDate, HashSet<RecipeId>> = HashMap::new();
            for (date, day) in plan.days() {
                let Ok(date) = CalendarDate::parse(date) else {
                    continue;
                };
                let used = used_by_week.entry(week_start(date.naive())).or_default();
                used.extend(day.values().filter_map(|slot| slot.recipe_id()).map(String::from));
            }

            let mut filled = Vec::new();
            for day in start.naive().iter_days().take(days as usize) {
                let date = CalendarDate::from(day);
                for meal_type in &meal_types {
                    let key = SlotKey::new(date.key(), meal_type.as_str());
                    if input.locked.contains(&key) || plan.slot(&date, meal_type).is_some() {
                        continue;
                    }

                    let used = used_by_week.entry(week_start(day)).or_default();
                    let Some(pick) = favorites.iter().find(|recipe| !used.contains(&recipe.id))
                    else {
                        continue;
                    };
                    used.insert(pick.id.clone());
                    plan.set(
                        &date,
                        meal_type,
                        SlotPayload::by_reference(pick.id.clone(), pick.default_servings),
                    );
                    filled.push(key);
                }
            }
            Ok(filled)
        })?;

        tracing::info!(
            start = %start,
            end = %end,
            filled = filled.len(),
            "Shuffled favorites into meal plan"
        );
        Ok(filled)
    }
}

fn positive_servings(servings: u32) -> PlanResult<u32> {
    if servings == 0 {
        return Err(PlanError::validation("servings must be at least 1"));
    }
    Ok(servings)
}

/// The Sunday starting the week that contains `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}
