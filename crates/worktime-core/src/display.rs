use serde::Serialize;

use crate::engine::WorkedResult;

/// Hours+minutes text shown when there is nothing positive to show.
pub const EMPTY_HOURS_MINUTES: &str = "0h 00m";
/// Decimal text shown when there is nothing positive to show.
pub const EMPTY_DECIMAL: &str = "0.0";

/// The two display strings derived from a [`WorkedResult`].
///
/// Rebuilt wholesale on every computation. A non-positive or missing total
/// renders as the fixed empty sentinel, never as a negative duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readout {
    pub hours_minutes: String,
    pub decimal: String,
    /// Raw engine total, kept for callers that want it (`None` when empty).
    pub total_minutes: Option<i64>,
    pub is_empty: bool,
}

impl Readout {
    pub fn empty(total_minutes: Option<i64>) -> Self {
        Self {
            hours_minutes: EMPTY_HOURS_MINUTES.to_string(),
            decimal: EMPTY_DECIMAL.to_string(),
            total_minutes,
            is_empty: true,
        }
    }

    pub fn from_result(result: &WorkedResult) -> Self {
        match result.total_minutes() {
            Some(minutes) if minutes > 0 => Self {
                hours_minutes: format_hours_minutes(minutes),
                decimal: format_decimal_hours(minutes),
                total_minutes: Some(minutes),
                is_empty: false,
            },
            other => Self::empty(other),
        }
    }
}

/// `"{h}h {mm}m"` for a positive minute count.
pub fn format_hours_minutes(minutes: i64) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// Decimal hours rounded half-up to two places (`450` → `"7.50"`).
pub fn format_decimal_hours(minutes: i64) -> String {
    // hundredths of an hour, rounded on exact integers; widened so any i64 fits
    let hundredths = (i128::from(minutes) * 100 + 30) / 60;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}
