use serde::Serialize;

use crate::clock::ClockTime;
use crate::engine::{Field, ShiftInput};

/// A row of preset buttons; each row writes exactly one field.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PickGroup {
    Start,
    BreakStart,
    BreakEnd,
    SimpleBreak,
    End,
}

impl PickGroup {
    pub const ALL: [PickGroup; 5] = [
        PickGroup::Start,
        PickGroup::BreakStart,
        PickGroup::BreakEnd,
        PickGroup::SimpleBreak,
        PickGroup::End,
    ];

    /// The single field this group writes.
    pub fn field(self) -> Field {
        match self {
            PickGroup::Start => Field::Start,
            PickGroup::BreakStart => Field::BreakStart,
            PickGroup::BreakEnd => Field::BreakEnd,
            PickGroup::SimpleBreak => Field::BreakMinutes,
            PickGroup::End => Field::End,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PickGroup::Start => "start",
            PickGroup::BreakStart => "break_start",
            PickGroup::BreakEnd => "break_end",
            PickGroup::SimpleBreak => "simple_break",
            PickGroup::End => "end",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        PickGroup::ALL.into_iter().find(|g| g.as_str() == s.trim())
    }
}

/// One preset: the label a button shows and the text it writes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuickPick {
    pub group: PickGroup,
    pub label: String,
    pub value: String,
}

impl QuickPick {
    pub fn new(group: PickGroup, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            group,
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> Field {
        self.group.field()
    }

    /// Write this preset into `input`. Touches only [`Self::field`].
    pub fn apply(&self, input: &mut ShiftInput) {
        input.set_field(self.field(), self.value.as_str());
    }
}

/// Declarative table of every preset, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct QuickPickTable {
    picks: Vec<QuickPick>,
}

impl Default for QuickPickTable {
    fn default() -> Self {
        let mut picks = Vec::new();
        let mut push_times = |group, from: ClockTime, to: ClockTime| {
            for t in half_hours(from, to) {
                let label = t.to_string();
                picks.push(QuickPick::new(group, label.clone(), label));
            }
        };
        push_times(PickGroup::Start, ClockTime::new(6, 30), ClockTime::new(10, 0));
        push_times(PickGroup::BreakStart, ClockTime::new(12, 0), ClockTime::new(14, 30));
        push_times(PickGroup::BreakEnd, ClockTime::new(13, 0), ClockTime::new(15, 30));
        push_times(PickGroup::End, ClockTime::new(14, 0), ClockTime::new(20, 30));

        for (label, minutes) in [
            ("-0", 0),
            ("-30m", 30),
            ("-1h", 60),
            ("-1h 30", 90),
            ("-2h", 120),
            ("Reset", 0),
        ] {
            picks.push(QuickPick::new(
                PickGroup::SimpleBreak,
                label,
                minutes.to_string(),
            ));
        }
        Self { picks }
    }
}

impl QuickPickTable {
    pub fn new(picks: Vec<QuickPick>) -> Self {
        Self { picks }
    }

    pub fn all(&self) -> &[QuickPick] {
        &self.picks
    }

    pub fn group(&self, group: PickGroup) -> impl Iterator<Item = &QuickPick> {
        self.picks.iter().filter(move |p| p.group == group)
    }

    /// Look a preset up by group and label (labels are matched exactly).
    pub fn find(&self, group: PickGroup, label: &str) -> Option<&QuickPick> {
        self.group(group).find(|p| p.label == label)
    }
}

/// Every half hour from `from` to `to`, both inclusive.
fn half_hours(from: ClockTime, to: ClockTime) -> Vec<ClockTime> {
    let (from, to) = (from.minutes_since_midnight(), to.minutes_since_midnight());
    (from..=to)
        .step_by(30)
        .map(|m| ClockTime::from_minutes(m as u32))
        .collect()
}
