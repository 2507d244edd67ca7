//! FILENAME: core/engine/src/derive.rs
//! PURPOSE: Derived Column Deriver - computes calculated fields row by row.
//! CONTEXT: A `DerivedFieldSpec` names a new column and the pure function
//! that produces it from one or more source columns (revenue = qty * price,
//! hour of day, weekday name, month bucket, ...). Deriving never touches the
//! source columns: the result is a new Table with exactly one extra column.
//!
//! Failure policy: if the function fails for any row, the whole derivation
//! fails. Rows are never skipped.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::DerivationError;
use crate::table::{Column, Table};
use crate::value::{parse_timestamp_with, ColumnType, Value};
use crate::{log_debug, log_enter, log_exit};

// ============================================================================
// DERIVATION DEFINITIONS
// ============================================================================

/// Binary arithmetic between two numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Signature of a caller-supplied derivation. Receives the source values of
/// one row in declaration order.
pub type DeriveFn = dyn Fn(&[&Value]) -> Result<Value, String> + Send + Sync;

/// A derivation written in code rather than configuration.
#[derive(Clone)]
pub struct CustomDerivation {
    pub sources: Vec<String>,
    pub output_type: ColumnType,
    function: Arc<DeriveFn>,
}

impl fmt::Debug for CustomDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomDerivation")
            .field("sources", &self.sources)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

/// The function computing a derived column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derivation {
    /// `left op right` over two numeric columns.
    Arithmetic {
        op: ArithmeticOp,
        left: String,
        right: String,
    },
    /// Hour of day (0-23) of a timestamp.
    Hour { source: String },
    /// English weekday name ("Monday").
    DayName { source: String },
    /// Weekday number, Sunday = 0 through Saturday = 6.
    DayOfWeek { source: String },
    /// First day of the timestamp's month at midnight.
    TruncateMonth { source: String },
    /// strftime-style rendering of a timestamp ("%b %Y" gives "May 2021").
    FormatTimestamp { source: String, pattern: String },
    /// Parses a text column into timestamps using a strftime-style format.
    ParseTimestamp { source: String, format: String },
    #[serde(skip)]
    Custom(CustomDerivation),
}

impl Derivation {
    /// Source columns, in the order the function receives them.
    pub fn sources(&self) -> Vec<&str> {
        match self {
            Derivation::Arithmetic { left, right, .. } => vec![left.as_str(), right.as_str()],
            Derivation::Hour { source }
            | Derivation::DayName { source }
            | Derivation::DayOfWeek { source }
            | Derivation::TruncateMonth { source }
            | Derivation::FormatTimestamp { source, .. }
            | Derivation::ParseTimestamp { source, .. } => vec![source.as_str()],
            Derivation::Custom(custom) => custom.sources.iter().map(String::as_str).collect(),
        }
    }

    pub fn output_type(&self) -> ColumnType {
        match self {
            Derivation::Arithmetic { .. }
            | Derivation::Hour { .. }
            | Derivation::DayOfWeek { .. } => ColumnType::Numeric,
            Derivation::DayName { .. } => ColumnType::Categorical,
            Derivation::TruncateMonth { .. } | Derivation::ParseTimestamp { .. } => {
                ColumnType::Timestamp
            }
            Derivation::FormatTimestamp { .. } => ColumnType::String,
            Derivation::Custom(custom) => custom.output_type,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Derivation::Arithmetic { .. } => "arithmetic",
            Derivation::Hour { .. } => "hour",
            Derivation::DayName { .. } => "day_name",
            Derivation::DayOfWeek { .. } => "day_of_week",
            Derivation::TruncateMonth { .. } => "truncate_month",
            Derivation::FormatTimestamp { .. } => "format_timestamp",
            Derivation::ParseTimestamp { .. } => "parse_timestamp",
            Derivation::Custom(_) => "custom",
        }
    }

    /// Checks that a source column has the type this derivation reads.
    fn check_source(&self, column: &Column) -> Result<(), DerivationError> {
        let ty = column.column_type();
        let expected = match self {
            Derivation::Arithmetic { .. } if ty != ColumnType::Numeric => Some("numeric"),
            Derivation::Hour { .. }
            | Derivation::DayName { .. }
            | Derivation::DayOfWeek { .. }
            | Derivation::TruncateMonth { .. }
            | Derivation::FormatTimestamp { .. }
                if ty != ColumnType::Timestamp =>
            {
                Some("timestamp")
            }
            Derivation::ParseTimestamp { .. } if !ty.is_textual() => Some("text"),
            _ => None,
        };
        match expected {
            Some(expected) => Err(DerivationError::SourceType {
                column: column.name().to_string(),
                derivation: self.label(),
                expected,
                found: ty,
            }),
            None => Ok(()),
        }
    }
}

/// Specification of one derived column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedFieldSpec {
    /// Name of the new column. Must not exist in the input table.
    pub name: String,
    #[serde(flatten)]
    pub derivation: Derivation,
}

impl DerivedFieldSpec {
    pub fn new(name: impl Into<String>, derivation: Derivation) -> Self {
        DerivedFieldSpec {
            name: name.into(),
            derivation,
        }
    }

    pub fn arithmetic(
        name: impl Into<String>,
        op: ArithmeticOp,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Derivation::Arithmetic {
                op,
                left: left.into(),
                right: right.into(),
            },
        )
    }

    pub fn multiply(
        name: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::arithmetic(name, ArithmeticOp::Multiply, left, right)
    }

    pub fn hour(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, Derivation::Hour { source: source.into() })
    }

    pub fn day_name(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, Derivation::DayName { source: source.into() })
    }

    pub fn day_of_week(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, Derivation::DayOfWeek { source: source.into() })
    }

    pub fn truncate_month(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, Derivation::TruncateMonth { source: source.into() })
    }

    pub fn format_timestamp(
        name: impl Into<String>,
        source: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Derivation::FormatTimestamp {
                source: source.into(),
                pattern: pattern.into(),
            },
        )
    }

    pub fn parse_timestamp(
        name: impl Into<String>,
        source: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Derivation::ParseTimestamp {
                source: source.into(),
                format: format.into(),
            },
        )
    }

    /// A derivation computed by `function`. The values it returns must
    /// conform to `output_type`.
    pub fn custom<F>(
        name: impl Into<String>,
        sources: &[&str],
        output_type: ColumnType,
        function: F,
    ) -> Self
    where
        F: Fn(&[&Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::new(
            name,
            Derivation::Custom(CustomDerivation {
                sources: sources.iter().map(|s| s.to_string()).collect(),
                output_type,
                function: Arc::new(function),
            }),
        )
    }
}

// ============================================================================
// ROW FUNCTIONS
// ============================================================================

/// A derivation with its per-call setup (pattern parsing) done once.
enum Prepared<'s> {
    Arithmetic(ArithmeticOp),
    Hour,
    DayName,
    DayOfWeek,
    TruncateMonth,
    Format(Vec<Item<'s>>),
    Parse(&'s str),
    Custom(&'s DeriveFn),
}

impl<'s> Prepared<'s> {
    fn new(derivation: &'s Derivation) -> Result<Self, DerivationError> {
        Ok(match derivation {
            Derivation::Arithmetic { op, .. } => Prepared::Arithmetic(*op),
            Derivation::Hour { .. } => Prepared::Hour,
            Derivation::DayName { .. } => Prepared::DayName,
            Derivation::DayOfWeek { .. } => Prepared::DayOfWeek,
            Derivation::TruncateMonth { .. } => Prepared::TruncateMonth,
            Derivation::FormatTimestamp { pattern, .. } => {
                let items: Vec<Item<'s>> = StrftimeItems::new(pattern).collect();
                if items.iter().any(|item| matches!(item, Item::Error)) {
                    return Err(DerivationError::InvalidPattern(pattern.clone()));
                }
                Prepared::Format(items)
            }
            Derivation::ParseTimestamp { format, .. } => Prepared::Parse(format),
            Derivation::Custom(custom) => Prepared::Custom(custom.function.as_ref()),
        })
    }

    fn apply(&self, inputs: &[&Value]) -> Result<Value, String> {
        match self {
            Prepared::Custom(function) => function(inputs),
            // Missing in, missing out
            _ if inputs.iter().any(|v| v.is_missing()) => Ok(Value::Missing),
            Prepared::Arithmetic(op) => {
                let (a, b) = (number(inputs[0])?, number(inputs[1])?);
                let result = match op {
                    ArithmeticOp::Add => a + b,
                    ArithmeticOp::Subtract => a - b,
                    ArithmeticOp::Multiply => a * b,
                    ArithmeticOp::Divide => {
                        if b == 0.0 {
                            return Err("division by zero".to_string());
                        }
                        a / b
                    }
                };
                Ok(Value::Number(result))
            }
            Prepared::Hour => Ok(Value::Number(timestamp(inputs[0])?.hour() as f64)),
            Prepared::DayName => Ok(Value::Text(timestamp(inputs[0])?.format("%A").to_string())),
            Prepared::DayOfWeek => Ok(Value::Number(
                timestamp(inputs[0])?.weekday().num_days_from_sunday() as f64,
            )),
            Prepared::TruncateMonth => {
                let ts = timestamp(inputs[0])?;
                NaiveDate::from_ymd_opt(ts.year(), ts.month(), 1)
                    .map(|date| Value::Timestamp(date.and_time(NaiveTime::MIN)))
                    .ok_or_else(|| format!("cannot truncate {}", ts))
            }
            Prepared::Format(items) => {
                let ts = timestamp(inputs[0])?;
                let mut out = String::new();
                write!(out, "{}", ts.format_with_items(items.iter()))
                    .map_err(|_| format!("cannot format {}", ts))?;
                Ok(Value::Text(out))
            }
            Prepared::Parse(format) => {
                let raw = inputs[0].as_text().ok_or("expected text")?;
                parse_timestamp_with(raw, format)
                    .map(Value::Timestamp)
                    .ok_or_else(|| format!("cannot parse '{}' with format '{}'", raw, format))
            }
        }
    }
}

fn number(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("expected number, found {}", value.kind()))
}

fn timestamp(value: &Value) -> Result<NaiveDateTime, String> {
    value
        .as_timestamp()
        .ok_or_else(|| format!("expected timestamp, found {}", value.kind()))
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Computes one derived column and returns a new table containing it.
pub fn derive(table: &Table, spec: &DerivedFieldSpec) -> Result<Table, DerivationError> {
    log_enter!(
        "DERIVE",
        "derive",
        "column={} kind={} rows={}",
        spec.name,
        spec.derivation.label(),
        table.row_count()
    );

    if table.column(&spec.name).is_some() {
        return Err(DerivationError::DuplicateColumn(spec.name.clone()));
    }

    let sources = spec
        .derivation
        .sources()
        .into_iter()
        .map(|name| {
            let column = table
                .column(name)
                .ok_or_else(|| DerivationError::UnknownColumn(name.to_string()))?;
            spec.derivation.check_source(column)?;
            Ok(column)
        })
        .collect::<Result<Vec<&Column>, DerivationError>>()?;

    let prepared = Prepared::new(&spec.derivation)?;
    let mut values = Vec::with_capacity(table.row_count());
    let mut inputs: Vec<&Value> = Vec::with_capacity(sources.len());

    for row in 0..table.row_count() {
        inputs.clear();
        inputs.extend(sources.iter().map(|column| &column.values()[row]));

        let value = prepared.apply(&inputs).map_err(|reason| {
            log_debug!("DERIVE", "row {} of '{}' failed: {}", row, spec.name, reason);
            DerivationError::Row {
                column: spec.name.clone(),
                row,
                reason,
            }
        })?;
        values.push(value);
    }

    let column = Column::new(spec.name.clone(), spec.derivation.output_type(), values)?;
    let derived = table.with_column(column)?;

    log_exit!("DERIVE", "derive", "column={}", spec.name);
    Ok(derived)
}

/// Applies `specs` in declaration order; later specs may read columns
/// produced by earlier ones.
pub fn derive_all(table: &Table, specs: &[DerivedFieldSpec]) -> Result<Table, DerivationError> {
    specs
        .iter()
        .try_fold(table.clone(), |current, spec| derive(&current, spec))
}
