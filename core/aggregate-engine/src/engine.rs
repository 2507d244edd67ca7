//! FILENAME: core/aggregate-engine/src/engine.rs
//! Aggregation Engine - Groups rows and computes measures.
//!
//! The engine runs in four passes:
//! 1. Validate the spec against the input schema
//! 2. Partition rows by group key (first-seen order)
//! 3. Fold every measure per group
//! 4. Sort (stable), apply the limit and build the output Table

use std::cmp::Ordering;

use engine::{log_debug, log_enter, log_exit, Column, ColumnType, Table, Value};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::{AggregationSpec, AggregationType, Measure, SortDirection};
use crate::error::AggregationError;

/// Group keys borrow their values from the input table. Most reports group
/// by one or two columns, so keys stay inline.
type GroupKey<'t> = SmallVec<[&'t Value; 4]>;

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running state for one measure in one group.
#[derive(Debug, Clone, Default)]
struct Accumulator<'t> {
    sum: f64,
    count: u64,
    min: Option<&'t Value>,
    max: Option<&'t Value>,
}

impl<'t> Accumulator<'t> {
    /// Folds one value in. Missing values are skipped.
    fn add(&mut self, value: &'t Value) {
        if value.is_missing() {
            return;
        }
        self.count += 1;
        if let Some(n) = value.as_f64() {
            self.sum += n;
        }
        if self.min.map_or(true, |m| value < m) {
            self.min = Some(value);
        }
        if self.max.map_or(true, |m| value > m) {
            self.max = Some(value);
        }
    }

    /// Counts a row without reading any column.
    fn add_row(&mut self) {
        self.count += 1;
    }

    /// Computes the final aggregate value. Groups without a single
    /// non-missing value produce Missing, except for count.
    fn compute(&self, aggregation: AggregationType) -> Value {
        match aggregation {
            AggregationType::Count => Value::Number(self.count as f64),
            _ if self.count == 0 => Value::Missing,
            AggregationType::Sum => Value::Number(self.sum),
            AggregationType::Average => Value::Number(self.sum / self.count as f64),
            AggregationType::Min => self.min.cloned().unwrap_or(Value::Missing),
            AggregationType::Max => self.max.cloned().unwrap_or(Value::Missing),
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// A measure with its input column resolved.
struct ResolvedMeasure<'a> {
    measure: &'a Measure,
    column: Option<&'a Column>,
    output_type: ColumnType,
}

fn resolve_measure<'a>(
    table: &'a Table,
    measure: &'a Measure,
) -> Result<ResolvedMeasure<'a>, AggregationError> {
    let column = match &measure.column {
        Some(name) => Some(
            table
                .column(name)
                .ok_or_else(|| AggregationError::UnknownColumn(name.clone()))?,
        ),
        None if measure.function == AggregationType::Count => None,
        None => return Err(AggregationError::MissingMeasureColumn(measure.alias.clone())),
    };

    let output_type = match (measure.function, column.map(Column::column_type)) {
        (AggregationType::Count, _) => ColumnType::Numeric,
        (AggregationType::Sum | AggregationType::Average, Some(ColumnType::Numeric)) => {
            ColumnType::Numeric
        }
        (
            AggregationType::Min | AggregationType::Max,
            Some(ty @ (ColumnType::Numeric | ColumnType::Timestamp)),
        ) => ty,
        (function, Some(found)) => {
            return Err(AggregationError::NonNumericColumn {
                column: measure.column.clone().unwrap_or_default(),
                function,
                found,
            })
        }
        (_, None) => return Err(AggregationError::MissingMeasureColumn(measure.alias.clone())),
    };

    Ok(ResolvedMeasure {
        measure,
        column,
        output_type,
    })
}

fn check_outputs(spec: &AggregationSpec) -> Result<(), AggregationError> {
    let outputs = spec.output_columns();
    for (i, name) in outputs.iter().enumerate() {
        if outputs[..i].contains(name) {
            return Err(AggregationError::DuplicateOutput(name.to_string()));
        }
    }
    if let Some(key) = spec.sort.iter().find(|key| !outputs.contains(&key.column.as_str())) {
        return Err(AggregationError::UnknownSortKey(key.column.clone()));
    }
    Ok(())
}

// ============================================================================
// SORTING
// ============================================================================

/// Missing sorts last in both directions.
fn compare_for_sort(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        },
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Groups `table` by the spec's key columns and computes every measure per
/// group. Returns a new Table with one row per group.
pub fn aggregate(table: &Table, spec: &AggregationSpec) -> Result<Table, AggregationError> {
    log_enter!(
        "AGGREGATE",
        "aggregate",
        "rows={} keys={:?} measures={}",
        table.row_count(),
        spec.group_by,
        spec.measures.len()
    );

    if spec.group_by.is_empty() && spec.measures.is_empty() {
        return Err(AggregationError::NoMeasures);
    }

    let key_columns = spec
        .group_by
        .iter()
        .map(|name| {
            table
                .column(name)
                .ok_or_else(|| AggregationError::UnknownColumn(name.clone()))
        })
        .collect::<Result<Vec<&Column>, AggregationError>>()?;

    let measures = spec
        .measures
        .iter()
        .map(|measure| resolve_measure(table, measure))
        .collect::<Result<Vec<_>, AggregationError>>()?;

    check_outputs(spec)?;

    // Partition rows; `groups` keeps first-seen order
    let mut index: FxHashMap<GroupKey<'_>, usize> = FxHashMap::default();
    let mut groups: Vec<(GroupKey<'_>, Vec<Accumulator<'_>>)> = Vec::new();

    for row in 0..table.row_count() {
        let key: GroupKey<'_> = key_columns.iter().map(|column| &column.values()[row]).collect();
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                groups.push((key.clone(), vec![Accumulator::default(); measures.len()]));
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };

        let accumulators = &mut groups[slot].1;
        for (acc, resolved) in accumulators.iter_mut().zip(&measures) {
            match resolved.column {
                Some(column) => acc.add(&column.values()[row]),
                None => acc.add_row(),
            }
        }
    }

    log_debug!("AGGREGATE", "{} groups from {} rows", groups.len(), table.row_count());

    let mut rows: Vec<Vec<Value>> = groups
        .into_iter()
        .map(|(key, accumulators)| {
            key.into_iter()
                .cloned()
                .chain(
                    accumulators
                        .iter()
                        .zip(&measures)
                        .map(|(acc, resolved)| acc.compute(resolved.measure.function)),
                )
                .collect()
        })
        .collect();

    if !spec.sort.is_empty() {
        let outputs = spec.output_columns();
        let sort_keys: Vec<(usize, SortDirection)> = spec
            .sort
            .iter()
            .filter_map(|key| {
                outputs
                    .iter()
                    .position(|name| *name == key.column)
                    .map(|pos| (pos, key.direction))
            })
            .collect();

        // sort_by is stable: ties keep group-creation order
        rows.sort_by(|a, b| {
            sort_keys
                .iter()
                .map(|&(pos, direction)| compare_for_sort(&a[pos], &b[pos], direction))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    if let Some(limit) = spec.limit {
        rows.truncate(limit);
    }

    // Transpose rows back into typed columns
    let output_types = key_columns
        .iter()
        .map(|column| column.column_type())
        .chain(measures.iter().map(|resolved| resolved.output_type));

    let mut columns = Vec::with_capacity(spec.group_by.len() + measures.len());
    let outputs = spec.output_columns().into_iter().zip(output_types);
    for (pos, (name, column_type)) in outputs.enumerate() {
        let values: Vec<Value> = rows.iter().map(|row| row[pos].clone()).collect();
        columns.push(Column::new(name, column_type, values)?);
    }

    let result = Table::new(columns)?;
    log_exit!("AGGREGATE", "aggregate", "rows={}", result.row_count());
    Ok(result)
}
