//! Domain models for mealboard.
//!
//! # Core Concepts
//!
//! - [`Recipe`]: a catalog entry with ingredients measured for its
//!   `default_servings`. Owned exclusively by the recipe store.
//! - [`MealPlan`]: the calendar document, `month -> date -> meal type -> slot`.
//!   Empty date and month buckets never survive a removal.
//! - [`SlotPayload`]: what sits in a slot. Either a reference to a recipe id
//!   plus a serving count, or an inline snapshot restored verbatim.
//! - [`ShoppingList`]: aggregated ingredient lines, computed on demand and never
//!   persisted.

mod meal_plan;
mod planner;
mod recipe;
mod shopping;

pub use meal_plan::*;
pub use planner::*;
pub use recipe::*;
pub use shopping::*;
