//! Meal-planning core: a recipe catalog, a meal calendar and shopping lists
//! scaled by serving count.
//!
//! Everything is synchronous. Each store guards its own document, so the
//! types here can be shared freely between request handlers.

pub mod db;
pub mod error;
pub mod favorites;
pub mod meal_plan;
pub mod models;
pub mod planner;
pub mod recipes;
pub mod shopping;

pub use error::{PlanError, PlanResult, StoreError};
pub use favorites::FavoritesIndex;
pub use meal_plan::MealPlanStore;
pub use planner::MealPlanner;
pub use recipes::{RecipeBook, RecipeStore};
pub use shopping::ShoppingListAggregator;
