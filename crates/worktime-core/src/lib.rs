pub mod clock;
pub mod display;
pub mod engine;
pub mod quickpick;

pub use clock::{parse_clock_time, parse_leading_int, ClockTime};
pub use display::{Readout, EMPTY_DECIMAL, EMPTY_HOURS_MINUTES};
pub use engine::{
    compute, compute_with, BreakSpec, DetailedStrategy, Field, Mode, ShiftInput, WorkedResult,
    DEFAULT_BREAK_MINUTES,
};
pub use quickpick::{PickGroup, QuickPick, QuickPickTable};
