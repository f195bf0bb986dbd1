//! Timeframe grammar accepted by the chart protocol.
//!
//! The remote encodes intervals as terse strings: bare digits for
//! minutes (`"5"`, `"240"`), a digit/unit pair for seconds, hours,
//! days, weeks and months (`"30S"`, `"4H"`, `"2W"`), and bare `"D"`,
//! `"W"`, `"M"` for one of each. Anything else is rejected before any
//! I/O happens.

use crate::Result;
use crate::error::MarketwireError;

/// Validates a timeframe string against the accepted grammar.
///
/// Accepted categories:
/// - minutes: bare digits `1..=1440`
/// - seconds: `<n>S` for `1..=60`
/// - hours: `<n>H` for `1..=168`
/// - days: `D` or `<n>D` for `1..=365`
/// - weeks: `W` or `<n>W` for `1..=52`
/// - months: `M` or `<n>M` for `1..=12`
///
/// Surrounding whitespace is tolerated. Lowercase unit letters are not.
///
/// # Errors
///
/// Returns [`MarketwireError::Configuration`] naming the accepted
/// categories when the string does not match.
pub fn validate(timeframe: &str) -> Result<()> {
    let tf = timeframe.trim();
    if tf.is_empty() {
        return Err(MarketwireError::Configuration(
            "timeframe must be a non-empty string".into(),
        ));
    }

    if !tf.is_ascii() {
        return Err(MarketwireError::Configuration(format!(
            "invalid timeframe format '{tf}': only ASCII digits and unit letters are accepted"
        )));
    }

    if tf.chars().all(|c| c.is_ascii_digit()) {
        return check_range(tf, 1, 1440, "minute");
    }

    let (digits, unit) = tf.split_at(tf.len() - 1);
    match unit {
        "S" => check_unit(digits, 1, 60, "second", false),
        "H" => check_unit(digits, 1, 168, "hour", false),
        "D" => check_unit(digits, 1, 365, "day", true),
        "W" => check_unit(digits, 1, 52, "week", true),
        "M" => check_unit(digits, 1, 12, "month", true),
        _ => Err(MarketwireError::Configuration(format!(
            "invalid timeframe format '{tf}': expected minutes (1-1440), \
             seconds (1S-60S), hours (1H-168H), days (D, 1D-365D), \
             weeks (W, 1W-52W), or months (M, 1M-12M)"
        ))),
    }
}

fn check_unit(digits: &str, min: u32, max: u32, unit: &str, bare_allowed: bool) -> Result<()> {
    if digits.is_empty() {
        if bare_allowed {
            return Ok(());
        }
        return Err(MarketwireError::Configuration(format!(
            "invalid {unit} timeframe: a count between {min} and {max} is required"
        )));
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(MarketwireError::Configuration(format!(
            "invalid {unit} timeframe '{digits}': count must be numeric"
        )));
    }
    check_range(digits, min, max, unit)
}

fn check_range(digits: &str, min: u32, max: u32, unit: &str) -> Result<()> {
    match digits.parse::<u32>() {
        Ok(n) if (min..=max).contains(&n) => Ok(()),
        _ => Err(MarketwireError::Configuration(format!(
            "invalid {unit} timeframe '{digits}': must be between {min} and {max}"
        ))),
    }
}
