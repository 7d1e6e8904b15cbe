//! Error types for Random Forest training, evaluation, and artifacts.

use std::path::PathBuf;

/// Errors from ensemble training, prediction, evaluation, and the artifact
/// bundle.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when the configured ensemble size is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid tree count.
        n_trees: usize,
    },

    /// Returned when a depth limit of zero is configured or requested.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid depth limit.
        max_depth: usize,
    },

    /// Returned when `min_samples_split` is below 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid threshold.
        min_samples_split: usize,
    },

    /// Returned when `min_samples_leaf` is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid threshold.
        min_samples_leaf: usize,
    },

    /// Returned when the feature subsampling strategy resolves outside
    /// `[1, n_features]`.
    #[error("max_features resolved to {max_features}, must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved per-split feature count.
        max_features: usize,
        /// The number of available features.
        n_features: usize,
    },

    /// Returned when a per-class weight is negative or non-finite.
    #[error("class {class} has invalid weight {weight}")]
    InvalidClassWeight {
        /// The class with the invalid weight.
        class: usize,
        /// The invalid weight value.
        weight: f64,
    },

    /// Returned when training or evaluation receives zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when training rows have zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a training row has an unexpected number of features.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features.
        got: usize,
        /// The offending sample index.
        sample_index: usize,
    },

    /// Returned when the label count disagrees with the sample count.
    #[error("{n_labels} labels provided for {n_samples} samples")]
    LabelCountMismatch {
        /// The number of samples.
        n_samples: usize,
        /// The number of labels.
        n_labels: usize,
    },

    /// Returned when a class code falls outside the fitted range.
    #[error("label {label} is outside the fitted range 0..{n_classes}")]
    LabelOutOfRange {
        /// The offending class code.
        label: usize,
        /// The number of fitted classes.
        n_classes: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The offending sample index.
        sample_index: usize,
        /// The offending feature column.
        feature_index: usize,
    },

    /// Returned when the feature name count disagrees with the data width.
    #[error("{got} feature names provided for {expected} feature columns")]
    FeatureNameCountMismatch {
        /// The number of feature columns.
        expected: usize,
        /// The number of names provided.
        got: usize,
    },

    /// Returned when a prediction input has the wrong width.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The width the model was trained on.
        expected: usize,
        /// The width provided.
        got: usize,
    },

    /// Returned when actual and predicted label counts disagree.
    #[error("{n_predicted} predictions provided for {n_actual} actual labels")]
    PredictionCountMismatch {
        /// The number of actual labels.
        n_actual: usize,
        /// The number of predictions.
        n_predicted: usize,
    },

    /// Returned when a class-name list disagrees with the fitted classes.
    #[error("{got} class names provided for {expected} fitted classes")]
    ClassCountMismatch {
        /// The number of fitted classes.
        expected: usize,
        /// The number of names provided.
        got: usize,
    },

    /// Returned when an operation needs at least one tree.
    #[error("ensemble contains zero trees")]
    EmptyEnsemble,

    /// Returned when freshly trained parts disagree at bundle assembly.
    #[error("cannot assemble artifact bundle: {reason}")]
    InconsistentBundle {
        /// Human-readable description of the disagreement.
        reason: String,
    },

    /// Returned when the artifact bundle cannot be encoded.
    #[error("failed to serialize artifact bundle")]
    SerializeBundle {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when the artifact bundle cannot be written to disk.
    #[error("failed to write artifact bundle to {path}")]
    WriteBundle {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the artifact bundle cannot be read from disk.
    #[error("failed to read artifact bundle from {path}")]
    ReadBundle {
        /// The source path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loaded bytes are not a valid, internally consistent
    /// bundle.
    #[error("corrupt artifact bundle at {path}: {reason}")]
    CorruptArtifact {
        /// The source path.
        path: PathBuf,
        /// What made the contents unusable.
        reason: String,
    },

    /// Wraps a preparation error surfaced through bundle inference.
    #[error("preprocessing failed during inference: {0}")]
    Prep(#[from] kesra_prep::PrepError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = RfError::InvalidMaxFeatures {
            max_features: 9,
            n_features: 4,
        };
        assert_eq!(
            err.to_string(),
            "max_features resolved to 9, must be in [1, 4]"
        );

        let err = RfError::CorruptArtifact {
            path: PathBuf::from("/tmp/run_bundle.bin"),
            reason: "format version 9 (this build reads 1)".to_string(),
        };
        assert!(err.to_string().contains("/tmp/run_bundle.bin"));
        assert!(err.to_string().contains("format version 9"));
    }

    #[test]
    fn prep_errors_convert() {
        let prep = kesra_prep::PrepError::EmptyLabels;
        let err: RfError = prep.into();
        assert!(matches!(err, RfError::Prep(_)));
    }
}
