//! Dataset preparation for welfare classification.
//!
//! Provides the label-code bijection, deterministic stratified train/test
//! splitting, and feature standardization that sit between raw indicator
//! records and ensemble training. Everything here is fit once per pipeline
//! run and treated as immutable by downstream consumers, so the exact same
//! preprocessing is applied at training time and at inference time.

mod encoder;
mod error;
mod scaler;
mod split;

pub use encoder::LabelMapping;
pub use error::PrepError;
pub use scaler::StandardScaler;
pub use split::{StratifiedSplit, TrainTestSplit};
