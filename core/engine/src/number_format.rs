//! FILENAME: core/engine/src/number_format.rs
//! PURPOSE: Display text for numeric chart values: axis ticks, tooltips,
//! heatmap cell text and hierarchy shares.
//! CONTEXT: A chart's display options carry one NumberFormat. Values that
//! are not numbers keep their own display text.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// How numbers are rendered in a chart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumberFormat {
    /// Shortest plain rendering; scientific only for extreme magnitudes.
    #[default]
    General,
    /// Fixed decimals with optional digit grouping and affixes,
    /// e.g. "$1,250.00" or "412 cases".
    Number {
        #[serde(default)]
        decimals: u8,
        #[serde(default)]
        grouped: bool,
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
    },
    /// Fraction shown as a percentage: 0.32 gives "32%".
    Percentage {
        #[serde(default)]
        decimals: u8,
    },
    /// Magnitude suffix for axis ticks: 10321 gives "10.3K".
    Compact {
        #[serde(default = "default_compact_decimals")]
        decimals: u8,
    },
}

fn default_compact_decimals() -> u8 {
    1
}

impl NumberFormat {
    /// Fixed decimals with thousands grouping.
    pub fn grouped(decimals: u8) -> Self {
        NumberFormat::Number {
            decimals,
            grouped: true,
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    /// Grouped amount behind a currency symbol.
    pub fn currency(symbol: impl Into<String>, decimals: u8) -> Self {
        NumberFormat::Number {
            decimals,
            grouped: true,
            prefix: symbol.into(),
            suffix: String::new(),
        }
    }

    pub fn percent(decimals: u8) -> Self {
        NumberFormat::Percentage { decimals }
    }

    pub fn compact(decimals: u8) -> Self {
        NumberFormat::Compact { decimals }
    }
}

/// Renders `value` with `format`. NaN and infinities use their plain text.
pub fn format_number(value: f64, format: &NumberFormat) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    match format {
        NumberFormat::General => general(value),
        NumberFormat::Number {
            decimals,
            grouped,
            prefix,
            suffix,
        } => {
            let digits = fixed(value.abs(), *decimals, *grouped);
            let sign = if value < 0.0 && has_nonzero_digit(&digits) { "-" } else { "" };
            format!("{sign}{prefix}{digits}{suffix}")
        }
        NumberFormat::Percentage { decimals } => {
            format!("{}%", signed_fixed(value * 100.0, *decimals))
        }
        NumberFormat::Compact { decimals } => compact(value, *decimals),
    }
}

/// Display text of any table value. Numbers go through `format`, missing
/// values render empty, everything else keeps `Value::display`.
pub fn format_value(value: &Value, format: &NumberFormat) -> String {
    match value {
        Value::Number(n) => format_number(*n, format),
        Value::Missing => String::new(),
        other => other.display(),
    }
}

// ============================================================================
// RENDERING HELPERS
// ============================================================================

fn general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-4..1e15).contains(&magnitude) {
        let text = format!("{:.5e}", value);
        if let Some((mantissa, exponent)) = text.split_once('e') {
            return format!("{}E{}", trim_fraction(mantissa), exponent);
        }
        return text;
    }
    trim_fraction(&format!("{:.10}", value))
}

/// Non-negative `magnitude` rounded to `decimals`, optionally grouped.
fn fixed(magnitude: f64, decimals: u8, grouped: bool) -> String {
    let text = format!("{:.*}", decimals as usize, magnitude);
    if !grouped {
        return text;
    }
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let lead = whole.len() % 3;
    let mut out = String::with_capacity(text.len() + whole.len() / 3);
    for (i, digit) in whole.char_indices() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn signed_fixed(value: f64, decimals: u8) -> String {
    let digits = fixed(value.abs(), decimals, false);
    if value < 0.0 && has_nonzero_digit(&digits) {
        format!("-{digits}")
    } else {
        digits
    }
}

const MAGNITUDES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

fn compact(value: f64, decimals: u8) -> String {
    let magnitude = value.abs();
    match MAGNITUDES.iter().find(|(scale, _)| magnitude >= *scale) {
        Some((scale, suffix)) => {
            let scaled = trim_fraction(&signed_fixed(value / scale, decimals));
            format!("{scaled}{suffix}")
        }
        None => trim_fraction(&signed_fixed(value, decimals)),
    }
}

/// Rounding can turn a small negative into zero; no sign for "-0".
fn has_nonzero_digit(text: &str) -> bool {
    text.bytes().any(|b| (b'1'..=b'9').contains(&b))
}

fn trim_fraction(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general() {
        let general = NumberFormat::General;
        assert_eq!(format_number(0.0, &general), "0");
        assert_eq!(format_number(42.0, &general), "42");
        assert_eq!(format_number(3.14159, &general), "3.14159");
        assert_eq!(format_number(1e12, &general), "1000000000000");
        assert_eq!(format_number(-2.5, &general), "-2.5");
        assert_eq!(format_number(2.5e16, &general), "2.5E16");
        assert_eq!(format_number(f64::NAN, &general), "NaN");
    }

    #[test]
    fn test_grouped_and_currency() {
        assert_eq!(format_number(10321.0, &NumberFormat::grouped(0)), "10,321");
        assert_eq!(format_number(1234567.891, &NumberFormat::grouped(2)), "1,234,567.89");
        assert_eq!(format_number(999.0, &NumberFormat::grouped(0)), "999");
        assert_eq!(format_number(-1250.0, &NumberFormat::currency("$", 2)), "-$1,250.00");
        assert_eq!(format_number(-0.001, &NumberFormat::grouped(1)), "0.0");

        let cases = NumberFormat::Number {
            decimals: 0,
            grouped: true,
            prefix: String::new(),
            suffix: " cases".to_string(),
        };
        assert_eq!(format_number(412.0, &cases), "412 cases");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(format_number(0.32, &NumberFormat::percent(0)), "32%");
        assert_eq!(format_number(32.0 / 52.0, &NumberFormat::percent(1)), "61.5%");
        assert_eq!(format_number(-0.125, &NumberFormat::percent(1)), "-12.5%");
    }

    #[test]
    fn test_compact() {
        let compact = NumberFormat::compact(1);
        assert_eq!(format_number(10321.0, &compact), "10.3K");
        assert_eq!(format_number(2_000_000.0, &compact), "2M");
        assert_eq!(format_number(-4_500_000_000.0, &compact), "-4.5B");
        assert_eq!(format_number(950.0, &compact), "950");
    }

    #[test]
    fn test_format_value() {
        let fmt = NumberFormat::grouped(0);
        assert_eq!(format_value(&Value::Number(10321.0), &fmt), "10,321");
        assert_eq!(format_value(&Value::Missing, &fmt), "");
        assert_eq!(format_value(&Value::text("Java"), &fmt), "Java");
    }

    #[test]
    fn test_number_format_json() {
        let json = r#"{"kind":"number","decimals":2,"grouped":true,"prefix":"$"}"#;
        let fmt: NumberFormat = serde_json::from_str(json).unwrap();
        assert_eq!(fmt, NumberFormat::currency("$", 2));
        let compact: NumberFormat = serde_json::from_str(r#"{"kind":"compact"}"#).unwrap();
        assert_eq!(compact, NumberFormat::compact(1));
        let general: NumberFormat = serde_json::from_str(r#"{"kind":"general"}"#).unwrap();
        assert_eq!(general, NumberFormat::General);
    }
}
