//! FILENAME: core/chart-engine/src/lib.rs
//! Chart Binding Layer.
//!
//! Maps the columns of an already shaped Table onto the visual channels of
//! a chart and produces a renderable description. Rendering itself belongs
//! to the presentation layer.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the chart IS)
//! - `view`: Renderable output for the presentation layer (WHAT we display)
//! - `engine`: Binding engine (HOW fields are resolved)

pub mod definition;
pub mod view;
pub mod engine;
pub mod error;

pub use definition::*;
pub use view::*;
pub use self::engine::{bind, BLANK_LABEL};
pub use error::FieldBindingError;
