//! FILENAME: core/engine/src/value.rs
//! PURPOSE: Defines the typed cell value and the semantic column types.
//! CONTEXT: Every cell of a `Table` holds a `Value`. Columns declare a
//! `ColumnType` and every value stored in the column must conform to it.
//! Absent values are `Value::Missing`; they are never coerced to 0 or "".

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};

// ============================================================================
// COLUMN TYPES
// ============================================================================

/// The semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    String,
    Timestamp,
    Categorical,
}

impl ColumnType {
    /// Returns true if `value` may be stored in a column of this type.
    /// `Missing` conforms to every type.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Missing)
                | (ColumnType::Numeric, Value::Number(_))
                | (ColumnType::String, Value::Text(_))
                | (ColumnType::Categorical, Value::Text(_))
                | (ColumnType::Timestamp, Value::Timestamp(_))
        )
    }

    /// String and Categorical columns both hold text.
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Categorical)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::String => "string",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// VALUE
// ============================================================================

/// A single cell of a table.
///
/// Equality is exact: strings compare case-sensitively and numbers compare
/// with `==`, except that NaN is equal to NaN so that it can form a group.
/// `0.0` and `-0.0` are equal and hash identically.
///
/// JSON has no timestamp type. A timestamp serialises as its display text
/// and deserialises as `Text`; `coerce_to(ColumnType::Timestamp)` turns it
/// back into a `Timestamp` once the target column is known. Configuration
/// literals go through that path when they meet a timestamp column.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Missing,
    Number(f64),
    Text(String),
    #[serde(skip)]
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Returns the display value as a String.
    /// Used for axis labels, hierarchy labels and tooltips.
    pub fn display(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
            Value::Timestamp(ts) => {
                if ts.time() == NaiveTime::MIN {
                    ts.format("%Y-%m-%d").to_string()
                } else {
                    ts.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }

    /// Converts a configuration literal to the representation used by a
    /// column of type `column_type`. Text literals compared against a
    /// timestamp column are parsed; everything else is returned unchanged.
    pub fn coerce_to(&self, column_type: ColumnType) -> Value {
        match (self, column_type) {
            (Value::Text(s), ColumnType::Timestamp) => parse_timestamp(s, &[])
                .map(Value::Timestamp)
                .unwrap_or_else(|| self.clone()),
            _ => self.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Number(_) => 1,
            Value::Timestamp(_) => 2,
            Value::Text(_) => 3,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Missing => {}
            Value::Number(n) => {
                if n.is_nan() {
                    // All NaN values hash to the same thing
                    u64::MAX.hash(state);
                } else if *n == 0.0 {
                    0u64.hash(state);
                } else {
                    n.to_bits().hash(state);
                }
            }
            Value::Text(s) => s.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
        }
    }
}

impl Ord for Value {
    /// Missing < Number < Timestamp < Text. NaN sorts after every other number.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            },
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Timestamp(_) => serializer.serialize_str(&self.display()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Missing)
    }
}

// ============================================================================
// TIMESTAMP PARSING
// ============================================================================

/// Formats tried, in order, when no explicit format matches.
pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d",
    "%H:%M:%S",
];

/// Date used for time-of-day values that carry no date.
pub fn time_only_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Parses `raw` with a single format. Formats that only describe a date or
/// only a time of day are accepted too: dates become midnight, times are
/// anchored on 1900-01-01.
pub fn parse_timestamp_with(raw: &str, format: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(ts);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
        return Some(date.and_time(NaiveTime::MIN));
    }
    NaiveTime::parse_from_str(raw, format)
        .ok()
        .map(|time| time_only_anchor().and_time(time))
}

/// Parses `raw` trying `extra_formats` first, then the defaults.
pub fn parse_timestamp(raw: &str, extra_formats: &[String]) -> Option<NaiveDateTime> {
    extra_formats
        .iter()
        .map(String::as_str)
        .chain(DEFAULT_TIMESTAMP_FORMATS.iter().copied())
        .find_map(|format| parse_timestamp_with(raw, format))
}
