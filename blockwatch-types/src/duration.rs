//! Wire-format durations for the filter server's control API.
//!
//! The disable endpoint takes Go-style duration strings (`"5m"`, `"1h30m"`),
//! so durations are formatted with `h`/`m`/`s`/`ms` components rather than a
//! bare number of seconds.

use alloc::format;
use alloc::string::String;
use core::time::Duration;

/// Unit suffix to milliseconds multiplier. `ms` must be matched before `m`.
const UNITS: &[(&str, u64)] = &[
    ("ms", 1),
    ("s", 1_000),
    ("m", 60_000),
    ("h", 3_600_000),
];

/// Failure to parse a duration string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationParseError {
    input: String,
}

impl core::fmt::Display for DurationParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid duration: {:?}", self.input)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DurationParseError {}

/// Parse duration strings like `"30s"`, `"5m"`, `"1h"`, or compound forms
/// like `"1h30m"`. Whole numbers only; the empty string is an error.
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let input = s;
    let s = s.trim();
    let err = || DurationParseError {
        input: String::from(input),
    };

    if s.is_empty() {
        return Err(err());
    }

    let mut total_ms: u64 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(err)?;
        if digits == 0 {
            return Err(err());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| err())?;
        rest = &rest[digits..];

        let (suffix, multiplier) = UNITS
            .iter()
            .find(|(suffix, _)| rest.starts_with(suffix))
            .ok_or_else(err)?;
        rest = &rest[suffix.len()..];

        total_ms = total_ms.saturating_add(value.saturating_mul(*multiplier));
    }

    Ok(Duration::from_millis(total_ms))
}

/// Format a duration in the control API's wire form.
///
/// Components are emitted largest-first with zero components omitted:
/// 300 s is `"5m"`, 5400 s is `"1h30m"`, zero is `"0s"`.
pub fn format_duration(d: Duration) -> String {
    let mut ms = d.as_millis() as u64;
    if ms == 0 {
        return String::from("0s");
    }

    let mut out = String::new();
    for (suffix, multiplier) in UNITS.iter().rev() {
        let count = ms / multiplier;
        if count > 0 {
            out.push_str(&format!("{}{}", count, suffix));
            ms -= count * multiplier;
        }
    }
    out
}
