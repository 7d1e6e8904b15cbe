//! Error types for dataset preparation.

/// Errors from label encoding, stratified splitting, and feature scaling.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Returned when fitting an encoder or splitting over zero labels.
    #[error("no labels provided")]
    EmptyLabels,

    /// Returned when encoding a label that was not observed at fit time.
    #[error("unknown label \"{label}\": not present when the mapping was fit")]
    UnknownLabel {
        /// The label that could not be encoded.
        label: String,
    },

    /// Returned when decoding a code outside the fitted range.
    #[error("unknown code {code}: the mapping covers codes 0..{n_classes}")]
    UnknownCode {
        /// The code that could not be decoded.
        code: usize,
        /// Number of classes in the fitted mapping.
        n_classes: usize,
    },

    /// Returned when the held-out fraction is outside the open interval (0, 1).
    #[error("test_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when a class is too small to appear in both split subsets.
    #[error("class {class} has only {count} sample(s); stratification needs at least 2 per class")]
    InsufficientSamples {
        /// The class code with too few members.
        class: usize,
        /// The number of members observed.
        count: usize,
    },

    /// Returned when fitting a scaler on zero rows.
    #[error("cannot fit scaler on an empty training set")]
    EmptyTrainingSet,

    /// Returned when training rows have zero feature columns.
    #[error("training rows have zero feature columns")]
    ZeroFeatures,

    /// Returned when a row has a different number of features than expected.
    #[error("row has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at row {row_index}, feature {feature_index}")]
    NonFiniteValue {
        /// Zero-based row index of the offending value.
        row_index: usize,
        /// Zero-based feature column of the offending value.
        feature_index: usize,
    },
}
