//! Culture-aware rendering of scalar values.
//!
//! A [`FormatProvider`] decides how numbers and timestamps turn into text, both when a message
//! template is rendered and when a property has no native column type and falls back to its
//! string form.

use std::fmt::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};

/// Renders numbers and timestamps for display.
///
/// Every method has a default that matches [`InvariantFormat`], so implementations only need to
/// override what differs for their locale.
pub trait FormatProvider: fmt::Debug + Send + Sync {
    /// The character placed between the integral and the fractional digits of a number.
    fn decimal_separator(&self) -> char {
        '.'
    }

    /// Formats a floating point number.
    ///
    /// `F<n>` (or `f<n>`) renders exactly `n` fractional digits, for `n` up to 99; any other
    /// format, or none, uses the shortest representation that round-trips.
    fn format_float(&self, value: f64, format: Option<&str>) -> String {
        let formatted = match format.and_then(fixed_precision) {
            Some(precision) => format!("{value:.precision$}"),
            None => value.to_string(),
        };
        localize(formatted, self.decimal_separator())
    }

    /// Formats a timestamp.
    ///
    /// A non-empty format is treated as a `chrono` strftime pattern. Without one, or when the
    /// pattern is invalid, RFC 3339 with millisecond precision is used.
    fn format_timestamp(&self, timestamp: &DateTime<Utc>, format: Option<&str>) -> String {
        if let Some(pattern) = format.filter(|pattern| !pattern.is_empty()) {
            let mut out = String::new();
            if write!(out, "{}", timestamp.format(pattern)).is_ok() {
                return out;
            }
        }
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Culture-independent formatting. Used whenever no provider is supplied.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InvariantFormat;

impl FormatProvider for InvariantFormat {}

/// Formatting for a culture that only differs from the invariant one by its decimal separator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CultureFormat {
    decimal_separator: char,
}

impl CultureFormat {
    pub const fn new(decimal_separator: char) -> Self {
        Self { decimal_separator }
    }
}

impl FormatProvider for CultureFormat {
    fn decimal_separator(&self) -> char {
        self.decimal_separator
    }
}

/// Resolves an optional provider to a usable one.
pub fn provider_or_default(provider: Option<&dyn FormatProvider>) -> &dyn FormatProvider {
    provider.unwrap_or(&InvariantFormat)
}

/// Largest fixed-point precision honored; larger ones fall back to the shortest form.
const MAX_FIXED_PRECISION: usize = 99;

fn fixed_precision(format: &str) -> Option<usize> {
    let digits = format
        .strip_prefix('F')
        .or_else(|| format.strip_prefix('f'))?;
    if digits.is_empty() {
        // Same default as the .NET fixed-point specifier.
        Some(2)
    } else {
        digits
            .parse()
            .ok()
            .filter(|precision| *precision <= MAX_FIXED_PRECISION)
    }
}

fn localize(formatted: String, separator: char) -> String {
    if separator == '.' {
        formatted
    } else {
        formatted.replacen('.', &separator.to_string(), 1)
    }
}
