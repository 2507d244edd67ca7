//! FILENAME: core/report-engine/src/lib.rs
//! Report assembly for the reporting pipeline.
//!
//! A report definition names sources, derived datasets and sections of
//! narrative and charts. The runner loads and shapes the data, the chart
//! engine binds it, and the assembler produces the ordered page.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the report IS)
//! - `runner`: Pipeline driver (HOW datasets and charts are produced)
//! - `assembler` / `view`: The ordered page (WHAT we display)

pub mod assembler;
pub mod definition;
pub mod error;
pub mod runner;
pub mod view;

pub use assembler::{assemble, assemble_with_placeholders, ChartResult, SectionInput};
pub use definition::*;
pub use error::{AssemblyError, ChartFailure, ConfigError, PipelineError};
pub use runner::{apply_step, load_sources, run_steps, ReportRunner, SourceSet, StepInputs};
pub use view::{ChartSlot, Report, Section};
