//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the tabular data engine.
//! CONTEXT: Owns the in-memory Table model, derived columns, number
//! formatting and the unified logging macros shared by the pipeline crates.

pub mod derive;
pub mod error;
pub mod logging;
pub mod number_format;
pub mod table;
pub mod value;

// Re-export commonly used types at the crate root
pub use derive::{derive, derive_all, ArithmeticOp, CustomDerivation, Derivation, DerivedFieldSpec};
pub use error::{DerivationError, TableError};
pub use number_format::{format_number, format_value, NumberFormat};
pub use table::{Column, Predicate, Row, Table};
pub use value::{
    parse_timestamp, parse_timestamp_with, time_only_anchor, ColumnType, Value,
    DEFAULT_TIMESTAMP_FORMATS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integration_test_derive_then_select() {
        let table = Table::new(vec![
            Column::text("product", ["Latte", "Mocha"]),
            Column::numeric("qty", [2.0, 1.0]),
            Column::numeric("unit_price", [3.5, 4.0]),
        ])
        .unwrap();

        let spec = DerivedFieldSpec::multiply("revenue", "qty", "unit_price");
        let derived = derive(&table, &spec).unwrap();
        let projected = derived.select(&["product", "revenue"]).unwrap();

        assert_eq!(projected.column_names(), vec!["product", "revenue"]);
        assert_eq!(
            projected.column("revenue").unwrap().values(),
            &[Value::Number(7.0), Value::Number(4.0)]
        );
        // Source table untouched
        assert_eq!(table.column_count(), 3);
    }
}
