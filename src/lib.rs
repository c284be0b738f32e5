pub mod api;
pub mod config;

pub use mealboard_core::{db, models, MealPlanner, PlanError, StoreError};
