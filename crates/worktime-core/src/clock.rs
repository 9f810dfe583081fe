use serde::{Deserialize, Serialize};
use std::fmt;

/// A wall-clock time of day.
///
/// Components are not range-checked: `"25:90"` parses to `{ hour: 25, minute: 90 }`
/// and flows into arithmetic as 25*60 + 90 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub const fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// Build a time from minutes since midnight.
    pub const fn from_minutes(minutes: u32) -> Self {
        Self {
            hour: minutes / 60,
            minute: minutes % 60,
        }
    }

    pub fn minutes_since_midnight(self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parse `"H:MM"` / `"HH:MM"` into a [`ClockTime`].
///
/// Returns `None` for empty, incomplete or malformed input (`""`, `"8"`, `"8:"`,
/// `"8:00:00"`, `"ab:cd"`). Never errors: half-typed form values are normal.
pub fn parse_clock_time(s: &str) -> Option<ClockTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (hour, minute) = s.split_once(':')?;
    if minute.contains(':') {
        return None;
    }
    Some(ClockTime {
        hour: parse_component(hour)?,
        minute: parse_component(minute)?,
    })
}

fn parse_component(part: &str) -> Option<u32> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Leading-integer parse: optional whitespace, optional sign, then digits.
/// Anything after the digits is ignored (`"45min"` → 45, `"1.5"` → 1).
/// Returns `None` when no digit is found.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let value: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_and_unpadded_hours() {
        assert_eq!(parse_clock_time("08:00"), Some(ClockTime::new(8, 0)));
        assert_eq!(parse_clock_time("8:05"), Some(ClockTime::new(8, 5)));
        assert_eq!(parse_clock_time("17:45"), Some(ClockTime::new(17, 45)));
    }

    #[test]
    fn empty_and_malformed_are_absent() {
        for s in ["", "   ", "8", "8:", ":30", "ab:cd", "8:00:00", "-1:00", "8:3x"] {
            assert_eq!(parse_clock_time(s), None, "{s:?} should be absent");
        }
    }

    #[test]
    fn out_of_range_components_still_parse() {
        let t = parse_clock_time("25:90").unwrap();
        assert_eq!(t, ClockTime::new(25, 90));
        assert_eq!(t.minutes_since_midnight(), 25 * 60 + 90);
    }

    #[test]
    fn format_then_parse_keeps_minutes() {
        for minutes in (0..24 * 60).step_by(7) {
            let t = ClockTime::from_minutes(minutes);
            let parsed = parse_clock_time(&t.to_string()).unwrap();
            assert_eq!(parsed.minutes_since_midnight(), i64::from(minutes));
        }
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(parse_clock_time(" 9:30 "), Some(ClockTime::new(9, 30)));
    }

    #[test]
    fn leading_int_ignores_trailing_text() {
        assert_eq!(parse_leading_int("60"), Some(60));
        assert_eq!(parse_leading_int(" 45min"), Some(45));
        assert_eq!(parse_leading_int("1.5"), Some(1));
        assert_eq!(parse_leading_int("-15"), Some(-15));
        assert_eq!(parse_leading_int("+30"), Some(30));
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("-"), None);
    }
}
