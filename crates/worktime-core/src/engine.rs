use serde::{Deserialize, Serialize};

use crate::clock::{parse_clock_time, parse_leading_int, ClockTime};
use crate::display::Readout;

// ── Selectors ──

/// Break-input style.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Break given as its own start/end clock times.
    #[default]
    Detailed,
    /// Break given as a flat minute count.
    Simple,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Detailed => "detailed",
            Mode::Simple => "simple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "detailed" => Some(Mode::Detailed),
            "simple" => Some(Mode::Simple),
            _ => None,
        }
    }
}

/// Formula applied in detailed mode when both break bounds are present.
///
/// Over exact integer minutes the two are algebraically equal for every input;
/// both are kept so callers can name the formula they rely on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetailedStrategy {
    /// `(break_start - start) + (end - break_end)`: the break splits the shift
    /// into two sessions which are summed.
    #[default]
    SessionSum,
    /// `(end - start) - (break_end - break_start)`.
    SubtractBreak,
}

impl DetailedStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailedStrategy::SessionSum => "session_sum",
            DetailedStrategy::SubtractBreak => "subtract_break",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "session_sum" => Some(DetailedStrategy::SessionSum),
            "subtract_break" => Some(DetailedStrategy::SubtractBreak),
            _ => None,
        }
    }
}

/// One editable input field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Start,
    End,
    BreakStart,
    BreakEnd,
    BreakMinutes,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Start,
        Field::End,
        Field::BreakStart,
        Field::BreakEnd,
        Field::BreakMinutes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Start => "start",
            Field::End => "end",
            Field::BreakStart => "break_start",
            Field::BreakEnd => "break_end",
            Field::BreakMinutes => "break_minutes",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Field::ALL.into_iter().find(|f| f.as_str() == s.trim())
    }
}

// ── Input ──

/// Default text of the simple-break field.
pub const DEFAULT_BREAK_MINUTES: &str = "0";

/// Everything the engine reads, as the raw text the user typed.
///
/// Both break variants are always kept; `mode` only selects which one counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftInput {
    pub start: String,
    pub end: String,
    pub mode: Mode,
    pub break_start: String,
    pub break_end: String,
    pub break_minutes: String,
}

impl Default for ShiftInput {
    fn default() -> Self {
        Self {
            start: String::new(),
            end: String::new(),
            mode: Mode::default(),
            break_start: String::new(),
            break_end: String::new(),
            break_minutes: DEFAULT_BREAK_MINUTES.to_string(),
        }
    }
}

/// The active break, parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakSpec {
    DetailedRange {
        start: Option<ClockTime>,
        end: Option<ClockTime>,
    },
    SimpleDuration {
        minutes: i64,
    },
}

impl ShiftInput {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Start => &self.start,
            Field::End => &self.end,
            Field::BreakStart => &self.break_start,
            Field::BreakEnd => &self.break_end,
            Field::BreakMinutes => &self.break_minutes,
        }
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Start => &mut self.start,
            Field::End => &mut self.end,
            Field::BreakStart => &mut self.break_start,
            Field::BreakEnd => &mut self.break_end,
            Field::BreakMinutes => &mut self.break_minutes,
        };
        *slot = value.into();
    }

    pub fn start_time(&self) -> Option<ClockTime> {
        parse_clock_time(&self.start)
    }

    pub fn end_time(&self) -> Option<ClockTime> {
        parse_clock_time(&self.end)
    }

    /// Simple-break minutes; unparsable text counts as 0.
    pub fn simple_break_minutes(&self) -> i64 {
        parse_leading_int(&self.break_minutes).unwrap_or(0)
    }

    /// Move the simple break by `delta` minutes.
    pub fn adjust_break_minutes(&mut self, delta: i64) {
        let next = self.simple_break_minutes().saturating_add(delta);
        self.break_minutes = next.to_string();
    }

    pub fn reset_break_minutes(&mut self) {
        self.break_minutes = DEFAULT_BREAK_MINUTES.to_string();
    }

    /// The break variant selected by `mode`.
    pub fn break_spec(&self) -> BreakSpec {
        match self.mode {
            Mode::Detailed => BreakSpec::DetailedRange {
                start: parse_clock_time(&self.break_start),
                end: parse_clock_time(&self.break_end),
            },
            Mode::Simple => BreakSpec::SimpleDuration {
                minutes: self.simple_break_minutes(),
            },
        }
    }
}

// ── Result ──

/// Outcome of one computation. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkedResult {
    /// Start or end is missing; nothing to show.
    Empty,
    /// Raw signed total; may be zero or negative.
    Worked { total_minutes: i64 },
}

impl WorkedResult {
    pub fn total_minutes(&self) -> Option<i64> {
        match self {
            WorkedResult::Empty => None,
            WorkedResult::Worked { total_minutes } => Some(*total_minutes),
        }
    }

    pub fn readout(&self) -> Readout {
        Readout::from_result(self)
    }
}

// ── Compute ──

/// Worked time with the default detailed strategy.
pub fn compute(input: &ShiftInput) -> WorkedResult {
    compute_with(input, DetailedStrategy::default())
}

/// Worked time for `input`. Pure, never fails; a typed-in break that would
/// overflow saturates at the `i64` bounds.
pub fn compute_with(input: &ShiftInput, strategy: DetailedStrategy) -> WorkedResult {
    let (Some(start), Some(end)) = (input.start_time(), input.end_time()) else {
        return WorkedResult::Empty;
    };
    let start = start.minutes_since_midnight();
    let end = end.minutes_since_midnight();
    let shift = end.saturating_sub(start);

    let total_minutes = match input.break_spec() {
        BreakSpec::DetailedRange {
            start: Some(break_start),
            end: Some(break_end),
        } => {
            let break_start = break_start.minutes_since_midnight();
            let break_end = break_end.minutes_since_midnight();
            match strategy {
                DetailedStrategy::SessionSum => break_start
                    .saturating_sub(start)
                    .saturating_add(end.saturating_sub(break_end)),
                DetailedStrategy::SubtractBreak => {
                    shift.saturating_sub(break_end.saturating_sub(break_start))
                }
            }
        }
        // A half-filled range is ignored, not treated as a zero break.
        BreakSpec::DetailedRange { .. } => shift,
        BreakSpec::SimpleDuration { minutes } => shift.saturating_sub(minutes),
    };
    WorkedResult::Worked { total_minutes }
}
