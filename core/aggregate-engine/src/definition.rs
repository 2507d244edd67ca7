//! FILENAME: core/aggregate-engine/src/definition.rs
//! Aggregation Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a grouped
//! aggregation: which columns form the group key, which measures are
//! computed per group, how the result is ordered and how many rows are kept.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AggregationError;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    Sum,
    Count,
    #[serde(alias = "avg", alias = "mean")]
    Average,
    Min,
    Max,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Sum
    }
}

impl AggregationType {
    /// Resolves a function name from configuration. Case-insensitive;
    /// `avg` and `mean` are accepted for `average`.
    pub fn parse(name: &str) -> Result<Self, AggregationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregationType::Sum),
            "count" => Ok(AggregationType::Count),
            "average" | "avg" | "mean" => Ok(AggregationType::Average),
            "min" => Ok(AggregationType::Min),
            "max" => Ok(AggregationType::Max),
            _ => Err(AggregationError::UnsupportedAggregation(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Count => "count",
            AggregationType::Average => "average",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
        }
    }
}

impl FromStr for AggregationType {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AggregationType::parse(s)
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// MEASURES
// ============================================================================

/// One aggregated output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    /// The aggregation function to apply.
    pub function: AggregationType,

    /// Column the function reads. Only `count` may omit it, in which case
    /// it counts rows.
    #[serde(default)]
    pub column: Option<String>,

    /// Name of the output column (e.g., "total_sales").
    pub alias: String,
}

impl Measure {
    pub fn new(
        function: AggregationType,
        column: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Measure {
            function,
            column: Some(column.into()),
            alias: alias.into(),
        }
    }

    pub fn sum(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Sum, column, alias)
    }

    pub fn average(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Average, column, alias)
    }

    pub fn min(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Min, column, alias)
    }

    pub fn max(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Max, column, alias)
    }

    pub fn count(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(AggregationType::Count, column, alias)
    }

    /// Number of rows per group.
    pub fn count_rows(alias: impl Into<String>) -> Self {
        Measure {
            function: AggregationType::Count,
            column: None,
            alias: alias.into(),
        }
    }
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

/// Orders the result by an output column (group key or measure alias).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

// ============================================================================
// AGGREGATION SPEC
// ============================================================================

/// The complete description of one grouped aggregation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationSpec {
    /// Group-key columns. Empty means a single group over all rows.
    #[serde(default)]
    pub group_by: Vec<String>,

    #[serde(default)]
    pub measures: Vec<Measure>,

    /// Applied in order; later keys break ties of earlier ones.
    #[serde(default)]
    pub sort: Vec<SortKey>,

    /// Row cap applied after sorting.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl AggregationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Output column names: group keys first, then measure aliases.
    pub fn output_columns(&self) -> Vec<&str> {
        self.group_by
            .iter()
            .map(String::as_str)
            .chain(self.measures.iter().map(|m| m.alias.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(AggregationType::parse("AVG").unwrap(), AggregationType::Average);
        assert_eq!(AggregationType::parse("mean").unwrap(), AggregationType::Average);
        assert_eq!("max".parse::<AggregationType>().unwrap(), AggregationType::Max);
        assert_eq!(
            AggregationType::parse("median").unwrap_err(),
            AggregationError::UnsupportedAggregation("median".to_string())
        );
    }

    #[test]
    fn test_spec_from_json() {
        let spec: AggregationSpec = serde_json::from_str(
            r#"{
                "group_by": ["product_category"],
                "measures": [
                    {"function": "sum", "column": "revenue", "alias": "total_sales"},
                    {"function": "avg", "column": "revenue", "alias": "avg_sales"},
                    {"function": "count", "alias": "orders"}
                ],
                "sort": [{"column": "total_sales", "direction": "desc"}],
                "limit": 10
            }"#,
        )
        .unwrap();

        assert_eq!(spec.measures[1].function, AggregationType::Average);
        assert_eq!(spec.measures[2], Measure::count_rows("orders"));
        assert_eq!(spec.sort[0], SortKey::descending("total_sales"));
        assert_eq!(
            spec.output_columns(),
            vec!["product_category", "total_sales", "avg_sales", "orders"]
        );
    }
}
