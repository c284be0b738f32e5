//! Meal calendar store.
//!
//! Slots only reference recipes; nothing here checks that a referenced
//! recipe exists, and restore writes its payload back verbatim.

use std::sync::Arc;

use crate::db::{Document, DocumentBackend, MEAL_PLAN_DOCUMENT};
use crate::error::PlanResult;
use crate::models::{
    parse_month, validate_meal_type, CalendarDate, DayPlan, MealPlan, MonthPlan, SlotPayload,
};

#[derive(Clone)]
pub struct MealPlanStore {
    document: Document<MealPlan>,
}

impl MealPlanStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            document: Document::new(MEAL_PLAN_DOCUMENT, backend),
        }
    }

    /// Upserts a slot.
    pub fn set_slot(&self, date: &str, meal_type: &str, payload: SlotPayload) -> PlanResult<()> {
        let date = CalendarDate::parse(date)?;
        validate_meal_type(meal_type)?;

        self.modify(|plan| {
            plan.set(&date, meal_type, payload);
            Ok(())
        })?;

        tracing::debug!(date = %date, meal_type, "Set meal slot");
        Ok(())
    }

    /// Slots of one day. A day without slots is an empty map.
    pub fn get_day(&self, date: &str) -> PlanResult<DayPlan> {
        let date = CalendarDate::parse(date)?;
        Ok(self.snapshot()?.day(&date).cloned().unwrap_or_default())
    }

    pub fn get_slot(&self, date: &str, meal_type: &str) -> PlanResult<Option<SlotPayload>> {
        let date = CalendarDate::parse(date)?;
        Ok(self.snapshot()?.slot(&date, meal_type).cloned())
    }

    /// Removes a slot, pruning emptied date and month buckets.
    ///
    /// Returns the removed payload so callers can offer an undo; removing an
    /// empty slot is not an error.
    pub fn delete_slot(&self, date: &str, meal_type: &str) -> PlanResult<Option<SlotPayload>> {
        let date = CalendarDate::parse(date)?;

        let removed = self.modify(|plan| Ok(plan.remove(&date, meal_type)))?;

        if removed.is_some() {
            tracing::debug!(date = %date, meal_type, "Deleted meal slot");
        }
        Ok(removed)
    }

    /// Puts a previously captured payload back into a slot, as is.
    pub fn restore_slot(
        &self,
        date: &str,
        meal_type: &str,
        payload: SlotPayload,
    ) -> PlanResult<()> {
        let date = CalendarDate::parse(date)?;
        validate_meal_type(meal_type)?;

        self.modify(|plan| {
            plan.set(&date, meal_type, payload);
            Ok(())
        })?;

        tracing::debug!(date = %date, meal_type, "Restored meal slot");
        Ok(())
    }

    /// Dates of one `YYYY-MM` month. Empty when the month has no slots.
    pub fn month(&self, month: &str) -> PlanResult<MonthPlan> {
        let month = parse_month(month)?;
        Ok(self.snapshot()?.month(&month).cloned().unwrap_or_default())
    }

    pub fn snapshot(&self) -> PlanResult<MealPlan> {
        let mut plan = self.document.read()?;
        plan.prune_empty();
        Ok(plan)
    }

    /// One read-modify-write cycle over the whole calendar.
    pub(crate) fn modify<R>(
        &self,
        mutate: impl FnOnce(&mut MealPlan) -> PlanResult<R>,
    ) -> PlanResult<R> {
        self.document.update(|plan| {
            plan.prune_empty();
            mutate(plan)
        })
    }
}
