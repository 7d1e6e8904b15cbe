//! Bidirectional mapping between welfare-class labels and integer codes.

use std::collections::BTreeSet;

use tracing::debug;

use crate::PrepError;

/// A frozen bijection between welfare-class labels and codes `0..K-1`.
///
/// Codes are assigned by lexical order of the distinct labels observed at
/// fit time, so the same label set always yields the same mapping regardless
/// of row order. Once fit, the mapping never changes; training and inference
/// share it through the persisted artifact bundle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LabelMapping {
    labels: Vec<String>,
}

impl LabelMapping {
    /// Fit a mapping over the labels observed in a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::EmptyLabels`] when `labels` is empty.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self, PrepError> {
        if labels.is_empty() {
            return Err(PrepError::EmptyLabels);
        }
        let distinct: BTreeSet<&str> = labels.iter().map(AsRef::as_ref).collect();
        let labels: Vec<String> = distinct.into_iter().map(String::from).collect();
        debug!(n_classes = labels.len(), "label mapping fit");
        Ok(Self { labels })
    }

    /// Encode a single label to its code.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::UnknownLabel`] when the label was not seen at
    /// fit time.
    pub fn encode(&self, label: &str) -> Result<usize, PrepError> {
        self.labels
            .binary_search_by(|known| known.as_str().cmp(label))
            .map_err(|_| PrepError::UnknownLabel {
                label: label.to_string(),
            })
    }

    /// Encode a batch of labels, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first [`PrepError::UnknownLabel`] encountered.
    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, PrepError> {
        labels.iter().map(|label| self.encode(label.as_ref())).collect()
    }

    /// Decode a code back to its label.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::UnknownCode`] when `code` is outside the fitted
    /// range.
    pub fn decode(&self, code: usize) -> Result<&str, PrepError> {
        self.labels
            .get(code)
            .map(String::as_str)
            .ok_or(PrepError::UnknownCode {
                code,
                n_classes: self.labels.len(),
            })
    }

    /// Return the number of classes in the mapping.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Return the labels in code order, so `labels()[code]` decodes.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_lexical_order() {
        let mapping = LabelMapping::fit(&["Tinggi", "Rendah", "Sedang"]).unwrap();

        assert_eq!(mapping.labels(), &["Rendah", "Sedang", "Tinggi"]);
        assert_eq!(mapping.encode("Rendah").unwrap(), 0);
        assert_eq!(mapping.encode("Sedang").unwrap(), 1);
        assert_eq!(mapping.encode("Tinggi").unwrap(), 2);
    }

    #[test]
    fn fit_is_independent_of_row_order() {
        let a = LabelMapping::fit(&["Sedang", "Tinggi", "Rendah", "Sedang"]).unwrap();
        let b = LabelMapping::fit(&["Rendah", "Rendah", "Sedang", "Tinggi"]).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn duplicates_collapse_to_one_code() {
        let mapping = LabelMapping::fit(&["Rendah", "Rendah", "Rendah", "Tinggi"]).unwrap();

        assert_eq!(mapping.n_classes(), 2);
    }

    #[test]
    fn encode_decode_round_trip() {
        let mapping = LabelMapping::fit(&["Rendah", "Sedang", "Tinggi"]).unwrap();

        for label in ["Rendah", "Sedang", "Tinggi"] {
            let code = mapping.encode(label).unwrap();
            assert_eq!(mapping.decode(code).unwrap(), label);
        }
    }

    #[test]
    fn unseen_label_is_rejected() {
        let mapping = LabelMapping::fit(&["Rendah", "Tinggi"]).unwrap();

        let err = mapping.encode("Menengah").unwrap_err();
        assert!(matches!(err, PrepError::UnknownLabel { label } if label == "Menengah"));
    }

    #[test]
    fn out_of_range_code_is_rejected() {
        let mapping = LabelMapping::fit(&["Rendah", "Sedang", "Tinggi"]).unwrap();

        let err = mapping.decode(99).unwrap_err();
        assert!(matches!(
            err,
            PrepError::UnknownCode { code: 99, n_classes: 3 }
        ));
    }

    #[test]
    fn empty_labels_are_rejected() {
        let labels: Vec<&str> = vec![];
        assert!(matches!(
            LabelMapping::fit(&labels),
            Err(PrepError::EmptyLabels)
        ));
    }

    #[test]
    fn encode_all_preserves_order() {
        let mapping = LabelMapping::fit(&["Rendah", "Sedang", "Tinggi"]).unwrap();

        let codes = mapping
            .encode_all(&["Tinggi", "Rendah", "Tinggi", "Sedang"])
            .unwrap();
        assert_eq!(codes, vec![2, 0, 2, 1]);
    }

    #[test]
    fn survives_serde_round_trip() {
        let mapping = LabelMapping::fit(&["Rendah", "Sedang", "Tinggi"]).unwrap();

        let json = serde_json::to_string(&mapping).unwrap();
        let restored: LabelMapping = serde_json::from_str(&json).unwrap();

        assert_eq!(mapping, restored);
    }
}
