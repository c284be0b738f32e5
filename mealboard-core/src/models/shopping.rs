use serde::{Deserialize, Serialize};

/// Total amount of one `(item, unit)` pair across the aggregated slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedLine {
    pub item: String,
    pub unit: String,
    pub quantity: f64,
}

/// Why a shopping list covers every stored slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfilteredReason {
    /// The caller asked for no date bounds.
    NotRequested,
    /// The supplied bounds were not `YYYY-MM-DD`; the filter was dropped
    /// rather than failing the request.
    InvalidDates,
}

/// The date window a shopping list was actually computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShoppingWindow {
    /// Inclusive range of `YYYY-MM-DD` days.
    Range { start: String, end: String },
    Unfiltered { reason: UnfilteredReason },
}

/// Aggregated ingredients, sorted by item then unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub window: ShoppingWindow,
    pub lines: Vec<AggregatedLine>,
}

impl ShoppingList {
    /// True when the list was restricted to a date range.
    pub fn is_filtered(&self) -> bool {
        matches!(self.window, ShoppingWindow::Range { .. })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
