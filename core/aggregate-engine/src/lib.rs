//! FILENAME: core/aggregate-engine/src/lib.rs
//! Grouped aggregation over engine Tables.
//!
//! Replaces the GROUP BY queries of the reporting pages: partition rows by
//! key columns, compute one or more measures per group, then sort and limit.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the aggregation IS)
//! - `engine`: Calculation engine (HOW we calculate)

pub mod definition;
pub mod engine;
pub mod error;

pub use definition::*;
pub use self::engine::aggregate;
pub use error::AggregationError;
