//! File I/O, validation, and report serialization for the kesra pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{Dataset, FEATURE_COLUMNS, LABEL_COLUMN, RunName};
pub use error::IoError;
pub use reader::DatasetReader;
pub use writer::ReportWriter;
