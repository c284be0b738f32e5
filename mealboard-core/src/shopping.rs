//! Shopping-list aggregation.
//!
//! Joins the meal calendar against the recipe catalog, scales each recipe by
//! `servings / default_servings` and sums quantities per `(item, unit)`.
//! Units are never converted. A slot whose recipe cannot be resolved adds
//! nothing instead of failing the whole list.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::PlanResult;
use crate::meal_plan::MealPlanStore;
use crate::models::{
    AggregatedLine, CalendarDate, Ingredient, MealPlan, ShoppingList, ShoppingWindow,
    SlotPayload, UnfilteredReason,
};
use crate::recipes::{RecipeBook, RecipeStore};

#[derive(Clone)]
pub struct ShoppingListAggregator {
    recipes: RecipeStore,
    meal_plan: MealPlanStore,
}

impl ShoppingListAggregator {
    pub fn new(recipes: RecipeStore, meal_plan: MealPlanStore) -> Self {
        Self { recipes, meal_plan }
    }

    /// Aggregates `[start, end]` inclusive.
    ///
    /// With only one bound the list covers that single day. Without bounds, or
    /// when a bound is not `YYYY-MM-DD`, every stored slot is aggregated and the
    /// returned window says so.
    pub fn for_range(&self, start: Option<&str>, end: Option<&str>) -> PlanResult<ShoppingList> {
        let window = resolve_window(start, end);
        let plan = self.meal_plan.snapshot()?;
        let book = self.recipes.snapshot()?;
        Ok(aggregate(&plan, &book, window))
    }

    pub fn for_day(&self, date: CalendarDate) -> PlanResult<ShoppingList> {
        let day = date.key();
        self.for_range(Some(&day), Some(&day))
    }
}

fn resolve_window(start: Option<&str>, end: Option<&str>) -> ShoppingWindow {
    let (start, end) = match (start, end) {
        (None, None) => {
            return ShoppingWindow::Unfiltered {
                reason: UnfilteredReason::NotRequested,
            }
        }
        (Some(start), None) => (start, start),
        (None, Some(end)) => (end, end),
        (Some(start), Some(end)) => (start, end),
    };

    match (CalendarDate::parse(start), CalendarDate::parse(end)) {
        (Ok(start), Ok(end)) => ShoppingWindow::Range {
            start: start.key(),
            end: end.key(),
        },
        _ => {
            tracing::warn!(start, end, "Unparseable shopping list range, aggregating all slots");
            ShoppingWindow::Unfiltered {
                reason: UnfilteredReason::InvalidDates,
            }
        }
    }
}

fn aggregate(plan: &MealPlan, book: &RecipeBook, window: ShoppingWindow) -> ShoppingList {
    let bounds = match &window {
        ShoppingWindow::Range { start, end } => Some((start.as_str(), end.as_str())),
        ShoppingWindow::Unfiltered { .. } => None,
    };

    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();

    for (date, day) in plan.days() {
        if let Some((start, end)) = bounds {
            // Zero-padded day keys order correctly as plain strings
            if CalendarDate::parse(date).is_err() || date < start || date > end {
                continue;
            }
        }

        for (meal_type, payload) in day {
            let Some(portion) = Portion::resolve(payload, book) else {
                tracing::warn!(date, meal_type = %meal_type, "Skipping unresolvable meal slot");
                continue;
            };

            for ingredient in portion.ingredients.iter() {
                *totals
                    .entry((ingredient.item.clone(), ingredient.unit.clone()))
                    .or_insert(0.0) += ingredient.quantity * portion.factor;
            }
        }
    }

    let lines = totals
        .into_iter()
        .map(|((item, unit), quantity)| AggregatedLine {
            item,
            unit,
            quantity,
        })
        .collect();

    ShoppingList { window, lines }
}

/// Ingredients of one slot together with the factor they are scaled by.
struct Portion<'a> {
    ingredients: Cow<'a, [Ingredient]>,
    factor: f64,
}

impl<'a> Portion<'a> {
    fn resolve(payload: &'a SlotPayload, book: &'a RecipeBook) -> Option<Self> {
        match payload {
            SlotPayload::ByReference(reference) => {
                let recipe = book.get(&reference.recipe_id)?;
                Some(Self {
                    ingredients: Cow::Borrowed(recipe.ingredients.as_slice()),
                    factor: scale_factor(
                        f64::from(reference.servings),
                        f64::from(recipe.default_servings),
                    ),
                })
            }
            SlotPayload::Inline(snapshot) => Self::from_snapshot(snapshot, book),
        }
    }

    /// An inline snapshot with an ingredient list is folded as is, scaled only
    /// when it carries both serving counts. Without a list, a string
    /// `recipe_uuid` is resolved against the catalog with `servings`
    /// defaulting to 1.
    fn from_snapshot(snapshot: &'a Map<String, Value>, book: &'a RecipeBook) -> Option<Self> {
        let Some(entries) = snapshot.get("ingredients").and_then(Value::as_array) else {
            let recipe = book.get(snapshot.get("recipe_uuid")?.as_str()?)?;
            let servings = snapshot
                .get("servings")
                .and_then(Value::as_f64)
                .unwrap_or(1.0);
            return Some(Self {
                ingredients: Cow::Borrowed(recipe.ingredients.as_slice()),
                factor: scale_factor(servings, f64::from(recipe.default_servings)),
            });
        };
        let ingredients: Vec<Ingredient> = entries
            .iter()
            .filter_map(|entry| serde_json::from_value::<Ingredient>(entry.clone()).ok())
            .filter(|ingredient| ingredient.quantity.is_finite() && ingredient.quantity >= 0.0)
            .collect();

        let servings = snapshot.get("servings").and_then(Value::as_f64);
        let default_servings = snapshot
            .get("default_servings")
            .or_else(|| snapshot.get("defaultServings"))
            .and_then(Value::as_f64);
        let factor = match (servings, default_servings) {
            (Some(servings), Some(default_servings)) => scale_factor(servings, default_servings),
            _ => 1.0,
        };

        Some(Self {
            ingredients: Cow::Owned(ingredients),
            factor,
        })
    }
}

/// `servings / default_servings`, or `servings` alone when the default is 0.
/// Recipes created through the store always have a default of at least 1.
fn scale_factor(servings: f64, default_servings: f64) -> f64 {
    if default_servings == 0.0 {
        servings
    } else {
        servings / default_servings
    }
}
