use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{CreateRecipeInput, RecipeId, SlotKey, SlotPayload};

/// Input for pointing a slot at an existing recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignSlotInput {
    /// Optional `YYYY-MM`; must match `date` when given.
    pub month: Option<String>,
    pub date: String,
    #[serde(rename = "mealType")]
    pub meal_type: String,
    #[serde(rename = "recipe_uuid", alias = "recipeId")]
    pub recipe_id: RecipeId,
    /// Defaults to the recipe's `default_servings`.
    pub servings: Option<u32>,
}

/// Input for putting a recipe into a slot, creating it first if needed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddRecipeToSlotInput {
    pub date: String,
    #[serde(rename = "mealType")]
    pub meal_type: String,
    /// Draft used when `recipe_id` is absent or unknown.
    pub recipe: Option<CreateRecipeInput>,
    /// Existing recipe to reuse.
    #[serde(rename = "recipe_uuid", alias = "recipeId")]
    pub recipe_id: Option<RecipeId>,
    pub servings: Option<u32>,
}

/// Result of [`crate::MealPlanner::add_recipe_to_slot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedRecipe {
    #[serde(rename = "recipe_uuid")]
    pub recipe_id: RecipeId,
    /// Whether the recipe was created by this call.
    pub created: bool,
    pub slot: SlotPayload,
}

/// The three standard slots of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodaysMeals {
    pub date: String,
    pub breakfast: Option<SlotPayload>,
    pub lunch: Option<SlotPayload>,
    pub dinner: Option<SlotPayload>,
}

/// Input for filling empty slots from the favorites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShuffleInput {
    pub start: String,
    pub end: String,
    /// Defaults to breakfast, lunch and dinner.
    #[serde(default, rename = "mealTypes")]
    pub meal_types: Vec<String>,
    /// Slots that must stay empty.
    #[serde(default)]
    pub locked: BTreeSet<SlotKey>,
    /// Rotates the order favorites are tried in.
    #[serde(default)]
    pub seed: u64,
}
