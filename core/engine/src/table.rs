//! FILENAME: core/engine/src/table.rs
//! PURPOSE: The immutable, column-typed, row-aligned in-memory dataset.
//! CONTEXT: A `Table` is created once at load time and never mutated in
//! place. Every transformation (select, filter, derive, aggregate) builds a
//! new Table. Columns that a transformation leaves untouched are shared
//! between the old and the new table through `Arc`, so deriving one column
//! from a wide table does not copy the others.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::value::{ColumnType, Value};

// ============================================================================
// COLUMN
// ============================================================================

/// A named, typed vector of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// Creates a column, checking that every value conforms to `column_type`.
    pub fn new(
        name: impl Into<String>,
        column_type: ColumnType,
        values: Vec<Value>,
    ) -> Result<Self, TableError> {
        let name = name.into();
        if let Some((row, bad)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !column_type.accepts(v))
        {
            return Err(TableError::TypeMismatch {
                column: name,
                row,
                expected: column_type,
                found: bad.kind(),
            });
        }
        Ok(Column {
            name,
            column_type,
            values,
        })
    }

    /// A numeric column without missing values.
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Column {
            name: name.into(),
            column_type: ColumnType::Numeric,
            values: values.into_iter().map(Value::Number).collect(),
        }
    }

    /// A string column without missing values.
    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Column {
            name: name.into(),
            column_type: ColumnType::String,
            values: values.into_iter().map(|s| Value::Text(s.into())).collect(),
        }
    }

    /// A categorical column without missing values.
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Column {
            name: name.into(),
            column_type: ColumnType::Categorical,
            values: values.into_iter().map(|s| Value::Text(s.into())).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        self.values.iter().any(Value::is_missing)
    }

    /// Returns a copy of this column with rows picked by `indices`.
    fn take(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            column_type: self.column_type,
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// Declarative row filter, used where a closure cannot be written down
/// (report definitions loaded from JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Keep rows whose value equals `value` exactly.
    Equals { column: String, value: Value },
    /// Keep rows whose value differs from `value`. Missing differs from any literal.
    NotEquals { column: String, value: Value },
    /// Keep rows whose value is one of `values`.
    OneOf { column: String, values: Vec<Value> },
    /// Drop rows where the column is missing.
    NotMissing { column: String },
    /// Keep rows matching every nested predicate.
    All { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn not_missing(column: impl Into<String>) -> Self {
        Predicate::NotMissing {
            column: column.into(),
        }
    }

    /// Resolves column names and literals against `table` once, so the
    /// per-row check is a plain comparison.
    fn compile<'t>(&self, table: &'t Table) -> Result<CompiledPredicate<'t>, TableError> {
        let lookup = |name: &str| table.require_column(name);
        Ok(match self {
            Predicate::Equals { column, value } => {
                let col = lookup(column)?;
                CompiledPredicate::Equals(col, value.coerce_to(col.column_type()))
            }
            Predicate::NotEquals { column, value } => {
                let col = lookup(column)?;
                CompiledPredicate::NotEquals(col, value.coerce_to(col.column_type()))
            }
            Predicate::OneOf { column, values } => {
                let col = lookup(column)?;
                let set = values.iter().map(|v| v.coerce_to(col.column_type())).collect();
                CompiledPredicate::OneOf(col, set)
            }
            Predicate::NotMissing { column } => CompiledPredicate::NotMissing(lookup(column)?),
            Predicate::All { predicates } => CompiledPredicate::All(
                predicates
                    .iter()
                    .map(|p| p.compile(table))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

enum CompiledPredicate<'t> {
    Equals(&'t Column, Value),
    NotEquals(&'t Column, Value),
    OneOf(&'t Column, HashSet<Value>),
    NotMissing(&'t Column),
    All(Vec<CompiledPredicate<'t>>),
}

impl CompiledPredicate<'_> {
    fn matches(&self, row: usize) -> bool {
        match self {
            CompiledPredicate::Equals(col, value) => col.values[row] == *value,
            CompiledPredicate::NotEquals(col, value) => col.values[row] != *value,
            CompiledPredicate::OneOf(col, set) => set.contains(&col.values[row]),
            CompiledPredicate::NotMissing(col) => !col.values[row].is_missing(),
            CompiledPredicate::All(parts) => parts.iter().all(|p| p.matches(row)),
        }
    }
}

// ============================================================================
// ROW VIEW
// ============================================================================

/// A borrowed view of one row, handed to filter closures.
#[derive(Debug, Clone, Copy)]
pub struct Row<'t> {
    table: &'t Table,
    index: usize,
}

impl<'t> Row<'t> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of the named column in this row.
    pub fn get(&self, column: &str) -> Option<&'t Value> {
        self.table.column(column).map(|c| &c.values[self.index])
    }

    /// Value at a column position.
    pub fn at(&self, column_index: usize) -> Option<&'t Value> {
        self.table
            .columns
            .get(column_index)
            .map(|c| &c.values[self.index])
    }

    pub fn values(&self) -> Vec<&'t Value> {
        self.table
            .columns
            .iter()
            .map(|c| &c.values[self.index])
            .collect()
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Arc<Column>>,
    row_count: usize,
}

impl Table {
    /// Builds a table, validating that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        Self::from_shared(columns.into_iter().map(Arc::new).collect())
    }

    /// Builds a table from columns that may be shared with other tables.
    pub fn from_shared(columns: Vec<Arc<Column>>) -> Result<Self, TableError> {
        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut seen = HashSet::new();

        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != row_count {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected: row_count,
                    found: column.len(),
                });
            }
        }

        Ok(Table { columns, row_count })
    }

    /// A table with the given schema and zero rows.
    pub fn empty(schema: &[(&str, ColumnType)]) -> Result<Self, TableError> {
        let columns = schema
            .iter()
            .map(|(name, ty)| Column::new(*name, *ty, Vec::new()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Column names paired with their types, in column order.
    pub fn schema(&self) -> Vec<(&str, ColumnType)> {
        self.columns
            .iter()
            .map(|c| (c.name(), c.column_type()))
            .collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(|c| c.as_ref())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.as_ref())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Like `column`, but reports an unknown name as an error.
    pub fn require_column(&self, name: &str) -> Result<&Column, TableError> {
        self.column(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.row_count).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.row_count).map(move |index| Row { table: self, index })
    }

    /// Projects the named columns, in the order given.
    pub fn select(&self, names: &[&str]) -> Result<Table, TableError> {
        let columns = names
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .find(|c| c.name == *name)
                    .cloned()
                    .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Table::from_shared(columns)
    }

    /// Keeps the rows for which `predicate` returns true.
    pub fn filter<F>(&self, predicate: F) -> Table
    where
        F: Fn(&Row<'_>) -> bool,
    {
        let indices: Vec<usize> = self
            .rows()
            .filter(|row| predicate(row))
            .map(|row| row.index)
            .collect();
        self.take_rows(&indices)
    }

    /// Keeps the rows matching a declarative predicate.
    pub fn filter_by(&self, predicate: &Predicate) -> Result<Table, TableError> {
        let compiled = predicate.compile(self)?;
        let indices: Vec<usize> = (0..self.row_count).filter(|&i| compiled.matches(i)).collect();
        Ok(self.take_rows(&indices))
    }

    /// Removes the named columns. Unknown names are an error.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Table, TableError> {
        for name in names {
            self.require_column(name)?;
        }
        let columns: Vec<Arc<Column>> = self
            .columns
            .iter()
            .filter(|c| !names.contains(&c.name()))
            .cloned()
            .collect();
        let row_count = if columns.is_empty() { 0 } else { self.row_count };
        Ok(Table { columns, row_count })
    }

    /// Removes every column that contains at least one missing value.
    pub fn drop_incomplete_columns(&self) -> Table {
        let columns: Vec<Arc<Column>> = self
            .columns
            .iter()
            .filter(|c| !c.has_missing())
            .cloned()
            .collect();
        let row_count = if columns.is_empty() { 0 } else { self.row_count };
        Table { columns, row_count }
    }

    /// Stacks the rows of `other` below this table's rows. Columns are
    /// matched by name and keep this table's order and types; both tables
    /// must have the same column names. Text columns accept rows from either
    /// text type.
    pub fn append(&self, other: &Table) -> Result<Table, TableError> {
        if let Some(extra) = other.columns.iter().find(|c| self.column(c.name()).is_none()) {
            return Err(TableError::UnknownColumn(extra.name.clone()));
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let below = other.require_column(column.name())?;
            let compatible = below.column_type == column.column_type
                || (below.column_type.is_textual() && column.column_type.is_textual());
            if !compatible {
                return Err(TableError::AppendType {
                    column: column.name.clone(),
                    expected: column.column_type,
                    found: below.column_type,
                });
            }

            let mut values = Vec::with_capacity(column.len() + below.len());
            values.extend_from_slice(&column.values);
            values.extend_from_slice(&below.values);
            columns.push(Column {
                name: column.name.clone(),
                column_type: column.column_type,
                values,
            });
        }
        Table::new(columns)
    }

    /// Returns a new table with `column` appended. Existing columns are shared.
    pub fn with_column(&self, column: Column) -> Result<Table, TableError> {
        let mut columns = self.columns.clone();
        columns.push(Arc::new(column));
        Table::from_shared(columns)
    }

    fn take_rows(&self, indices: &[usize]) -> Table {
        if indices.len() == self.row_count {
            return self.clone();
        }
        Table {
            columns: self.columns.iter().map(|c| Arc::new(c.take(indices))).collect(),
            row_count: indices.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::categorical("location_level", ["Province", "Country", "Province"]),
            Column::text("location", ["DKI Jakarta", "Indonesia", "Jawa Barat"]),
            Column::new(
                "new_cases",
                ColumnType::Numeric,
                vec![Value::from(10), Value::Missing, Value::from(7)],
            )
            .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = Table::new(vec![Column::numeric("a", [1.0]), Column::numeric("a", [2.0])]);
        assert_eq!(result, Err(TableError::DuplicateColumn("a".to_string())));
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::numeric("a", [1.0, 2.0]),
            Column::numeric("b", [1.0]),
        ]);
        assert!(matches!(result, Err(TableError::LengthMismatch { .. })));
    }

    #[test]
    fn test_column_rejects_nonconforming_value() {
        let values = vec![Value::from(1), Value::text("x")];
        let result = Column::new("qty", ColumnType::Numeric, values);
        assert!(matches!(
            result,
            Err(TableError::TypeMismatch { row: 1, found: "text", .. })
        ));
    }

    #[test]
    fn test_select_is_ordered_and_shares_columns() {
        let table = sample();
        let selected = table.select(&["new_cases", "location"]).unwrap();
        assert_eq!(selected.column_names(), vec!["new_cases", "location"]);
        assert!(Arc::ptr_eq(&selected.columns[1], &table.columns[1]));
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_select_unknown_column() {
        let err = sample().select(&["province"]).unwrap_err();
        assert_eq!(err, TableError::UnknownColumn("province".to_string()));
    }

    #[test]
    fn test_filter_closure() {
        let table = sample();
        let provinces =
            table.filter(|row| row.get("location_level") == Some(&Value::text("Province")));
        assert_eq!(provinces.row_count(), 2);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_filter_by_predicate() {
        let table = sample();
        let filtered = table
            .filter_by(&Predicate::All {
                predicates: vec![
                    Predicate::equals("location_level", "Province"),
                    Predicate::not_missing("new_cases"),
                ],
            })
            .unwrap();
        assert_eq!(filtered.row_count(), 2);
        let missing = table.filter_by(&Predicate::not_missing("nope"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_drop_incomplete_columns() {
        let table = sample().drop_incomplete_columns();
        assert_eq!(table.column_names(), vec!["location_level", "location"]);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_drop_columns() {
        let table = sample().drop_columns(&["location_level"]).unwrap();
        assert_eq!(table.column_names(), vec!["location", "new_cases"]);
        assert!(sample().drop_columns(&["continent"]).is_err());
    }

    #[test]
    fn test_with_column_checks_length() {
        let table = sample();
        assert!(table.with_column(Column::numeric("x", [1.0])).is_err());
        let wider = table.with_column(Column::numeric("x", [1.0, 2.0, 3.0])).unwrap();
        assert_eq!(wider.column_count(), 4);
    }

    #[test]
    fn test_empty_schema() {
        let schema = [("product", ColumnType::String), ("qty", ColumnType::Numeric)];
        let table = Table::empty(&schema).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.schema(), schema.to_vec());
    }

    #[test]
    fn test_append_matches_columns_by_name() {
        let below = Table::new(vec![
            Column::numeric("new_cases", [3.0]),
            Column::categorical("location", ["Bali"]),
            Column::categorical("location_level", ["Province"]),
        ])
        .unwrap();
        let stacked = sample().append(&below).unwrap();

        assert_eq!(stacked.row_count(), 4);
        assert_eq!(stacked.column_names(), vec!["location_level", "location", "new_cases"]);
        assert_eq!(stacked.column("location").unwrap().column_type(), ColumnType::String);
        assert_eq!(stacked.row(3).unwrap().get("location"), Some(&Value::text("Bali")));
        assert_eq!(stacked.row(3).unwrap().get("new_cases"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_append_rejects_other_schemas() {
        let narrower = sample().drop_columns(&["new_cases"]).unwrap();
        assert_eq!(
            sample().append(&narrower),
            Err(TableError::UnknownColumn("new_cases".to_string()))
        );
        assert_eq!(
            narrower.append(&sample()),
            Err(TableError::UnknownColumn("new_cases".to_string()))
        );

        let text_cases = Table::new(vec![
            Column::categorical("location_level", ["Province"]),
            Column::text("location", ["Bali"]),
            Column::text("new_cases", ["many"]),
        ])
        .unwrap();
        assert!(matches!(
            sample().append(&text_cases),
            Err(TableError::AppendType { ref column, .. }) if column == "new_cases"
        ));
    }
}
