use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PlanError, PlanResult};
use crate::models::RecipeId;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const MONTH_FORMAT: &str = "%Y-%m";

/// Meal types filled by the shuffle planner when the caller names none.
pub const DEFAULT_MEAL_TYPES: [&str; 3] = ["breakfast", "lunch", "dinner"];

/// A zero-padded `YYYY-MM-DD` calendar day.
///
/// Day keys compare correctly as strings only because they are zero-padded,
/// so anything that does not round-trip through the format is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn parse(value: &str) -> PlanResult<Self> {
        let invalid =
            || PlanError::validation(format!("invalid date `{value}`, expected YYYY-MM-DD"));
        let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())?;
        if date.format(DATE_FORMAT).to_string() != value {
            return Err(invalid());
        }
        Ok(Self(date))
    }

    pub fn key(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }

    pub fn month_key(&self) -> String {
        self.0.format(MONTH_FORMAT).to_string()
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

/// Validates a `YYYY-MM` month key.
pub fn parse_month(value: &str) -> PlanResult<String> {
    CalendarDate::parse(&format!("{value}-01"))
        .map(|date| date.month_key())
        .map_err(|_| PlanError::validation(format!("invalid month `{value}`, expected YYYY-MM")))
}

pub fn validate_meal_type(meal_type: &str) -> PlanResult<()> {
    if meal_type.trim().is_empty() {
        return Err(PlanError::validation("meal type is required"));
    }
    Ok(())
}

/// External identifier of a slot: `date|mealType`.
///
/// Only the first `|` separates the two parts, so meal types may contain `|`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotKey {
    pub date: String,
    pub meal_type: String,
}

impl SlotKey {
    pub fn new(date: impl Into<String>, meal_type: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            meal_type: meal_type.into(),
        }
    }
}

impl FromStr for SlotKey {
    type Err = PlanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .split_once('|')
            .map(|(date, meal_type)| Self::new(date, meal_type))
            .ok_or_else(|| {
                PlanError::validation(format!("malformed slot key `{value}`, expected date|mealType"))
            })
    }
}

impl TryFrom<String> for SlotKey {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotKey> for String {
    fn from(key: SlotKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.date, self.meal_type)
    }
}

/// A live reference from a slot to a catalog recipe.
///
/// Persisted as `{"recipe_uuid": ..., "servings": ...}`. Unknown keys make a
/// payload fall through to [`SlotPayload::Inline`] instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeRef {
    #[serde(rename = "recipe_uuid")]
    pub recipe_id: RecipeId,
    pub servings: u32,
}

/// Contents of one meal slot.
///
/// `ByReference` is what slot assignment writes. `Inline` only enters the
/// calendar through restore, which stores whatever object the caller captured
/// when the slot was deleted; it is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotPayload {
    ByReference(RecipeRef),
    Inline(Map<String, Value>),
}

impl SlotPayload {
    pub fn by_reference(recipe_id: impl Into<RecipeId>, servings: u32) -> Self {
        Self::ByReference(RecipeRef {
            recipe_id: recipe_id.into(),
            servings,
        })
    }

    /// The referenced recipe id, including a string `recipe_uuid` kept in an
    /// inline payload.
    pub fn recipe_id(&self) -> Option<&str> {
        match self {
            Self::ByReference(reference) => Some(&reference.recipe_id),
            Self::Inline(snapshot) => snapshot.get("recipe_uuid").and_then(Value::as_str),
        }
    }
}

/// Slots of one day, keyed by meal type.
pub type DayPlan = BTreeMap<String, SlotPayload>;

/// Days of one month, keyed by `YYYY-MM-DD`.
pub type MonthPlan = BTreeMap<String, DayPlan>;

/// The meal calendar: `month -> date -> meal type -> payload`.
///
/// Invariants:
/// - every date key starts with its month key;
/// - no date bucket and no month bucket is ever empty, so a listed date
///   always has at least one slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealPlan {
    months: BTreeMap<String, MonthPlan>,
}

impl MealPlan {
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn months(&self) -> &BTreeMap<String, MonthPlan> {
        &self.months
    }

    pub fn month(&self, month: &str) -> Option<&MonthPlan> {
        self.months.get(month)
    }

    pub fn day(&self, date: &CalendarDate) -> Option<&DayPlan> {
        self.months.get(&date.month_key())?.get(&date.key())
    }

    pub fn slot(&self, date: &CalendarDate, meal_type: &str) -> Option<&SlotPayload> {
        self.day(date)?.get(meal_type)
    }

    /// All stored days in date order, whatever month they are filed under.
    pub fn days(&self) -> impl Iterator<Item = (&str, &DayPlan)> {
        self.months
            .values()
            .flat_map(|days| days.iter().map(|(date, day)| (date.as_str(), day)))
    }

    /// Upserts a slot, creating its month and date buckets as needed.
    pub fn set(
        &mut self,
        date: &CalendarDate,
        meal_type: &str,
        payload: SlotPayload,
    ) -> Option<SlotPayload> {
        self.months
            .entry(date.month_key())
            .or_default()
            .entry(date.key())
            .or_default()
            .insert(meal_type.to_string(), payload)
    }

    /// Removes a slot and prunes the date and month buckets it leaves empty.
    pub fn remove(&mut self, date: &CalendarDate, meal_type: &str) -> Option<SlotPayload> {
        let month_key = date.month_key();
        let date_key = date.key();

        let days = self.months.get_mut(&month_key)?;
        let day = days.get_mut(&date_key)?;
        let removed = day.remove(meal_type)?;

        if day.is_empty() {
            days.remove(&date_key);
        }
        if days.is_empty() {
            self.months.remove(&month_key);
        }
        Some(removed)
    }

    /// Drops empty buckets left behind by documents written elsewhere.
    pub fn prune_empty(&mut self) {
        for days in self.months.values_mut() {
            days.retain(|_, day| !day.is_empty());
        }
        self.months.retain(|_, days| !days.is_empty());
    }
}
