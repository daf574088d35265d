//! Formatting of typed values into the exact text placed inside a span.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::error::RenderError;

pub const MAX_PRECISION: u8 = 6;

/// A raw value paired with how it should be displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain measurement (temperature, wind speed, visibility).
    Number(f64),
    /// Fraction in `0.0..=1.0` shown as a percentage.
    Percentage(f64),
    /// Unix timestamp in seconds shown as a weekday name.
    Weekday(i64),
    /// Dictionary definition with punctuation stripped.
    Definition(String),
    /// Text embedded verbatim.
    Text(String),
}

/// Pure renderer; all locale-like state is carried explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderer {
    precision: u8,
    timezone: Tz,
    strip_chars: Vec<char>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            precision: 0,
            timezone: Tz::UTC,
            strip_chars: vec![':'],
        }
    }
}

impl Renderer {
    pub fn new(precision: u8, timezone: Tz, strip_chars: Vec<char>) -> Result<Self, RenderError> {
        check_precision(precision)?;
        Ok(Self {
            precision,
            timezone,
            strip_chars,
        })
    }

    pub fn render(&self, value: &Value) -> Result<String, RenderError> {
        match value {
            Value::Number(number) => format_fixed(*number, self.precision),
            Value::Percentage(fraction) => format_percentage(*fraction, self.precision),
            Value::Weekday(timestamp) => weekday_name(*timestamp, self.timezone),
            Value::Definition(text) => Ok(self.definition(text)),
            Value::Text(text) => Ok(text.clone()),
        }
    }

    /// Definitions only lose punctuation, so this never fails.
    pub fn definition(&self, text: &str) -> String {
        strip_chars(text, &self.strip_chars)
    }
}

fn check_precision(precision: u8) -> Result<(), RenderError> {
    if precision > MAX_PRECISION {
        return Err(RenderError::Precision {
            precision,
            max: MAX_PRECISION,
        });
    }
    Ok(())
}

/// Fixed-point formatting with round-half-away-from-zero.
///
/// `format!` alone rounds exact ties to even, so the value is rounded first.
pub fn format_fixed(value: f64, precision: u8) -> Result<String, RenderError> {
    if !value.is_finite() {
        return Err(RenderError::NonFinite { value });
    }
    check_precision(precision)?;

    let factor = 10f64.powi(i32::from(precision));
    let mut rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        // Drop the sign of negative zero.
        rounded = 0.0;
    }
    Ok(format!("{rounded:.width$}", width = usize::from(precision)))
}

/// Format a fraction as a percentage (`0.96` → `96` at precision 0).
pub fn format_percentage(fraction: f64, precision: u8) -> Result<String, RenderError> {
    format_fixed(fraction * 100.0, precision)
}

/// Full English weekday name of `timestamp` as observed in `timezone`.
pub fn weekday_name(timestamp: i64, timezone: Tz) -> Result<String, RenderError> {
    let instant = DateTime::<Utc>::from_timestamp(timestamp, 0)
        .ok_or(RenderError::TimestampOutOfRange { timestamp })?;
    Ok(instant.with_timezone(&timezone).format("%A").to_string())
}

/// Remove every character in `strip` and collapse the remaining whitespace.
pub fn strip_chars(text: &str, strip: &[char]) -> String {
    let kept: String = text.chars().filter(|ch| !strip.contains(ch)).collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
