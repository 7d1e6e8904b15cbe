//! Domain types for kesra-io.

use std::collections::BTreeMap;

use crate::IoError;

/// Header names of the four indicator columns, in canonical feature order.
pub const FEATURE_COLUMNS: [&str; 4] = [
    "jumlah_penduduk_miskin",
    "jumlah_pengangguran_terbuka",
    "pdrb_total_adhk",
    "harapan_lama_sekolah",
];

/// Header name of the welfare-class label column.
pub const LABEL_COLUMN: &str = "kesejahteraan";

/// Count-style columns must be non-negative; `harapan_lama_sekolah` is a
/// score and only has to be finite.
pub(crate) const FEATURE_NON_NEGATIVE: [bool; 4] = [true, true, true, false];

/// A validated run name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunName(String);

impl RunName {
    /// Parse and validate a run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidRunName`] if the name is empty or contains
    /// characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidRunName { name });
        }
        Ok(Self(name))
    }

    /// Return the run name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated welfare dataset: indicator rows plus raw class labels.
///
/// Produced by [`DatasetReader`](crate::DatasetReader). Feature rows and
/// labels are stored in parallel vectors — `feature_rows[i]` corresponds to
/// `labels[i]`. Row values follow [`FEATURE_COLUMNS`] order regardless of
/// the column order in the source file.
#[derive(Debug)]
pub struct Dataset {
    feature_rows: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl Dataset {
    /// Create a new dataset from validated rows.
    pub(crate) fn new(feature_rows: Vec<Vec<f64>>, labels: Vec<String>) -> Self {
        Self { feature_rows, labels }
    }

    /// Return the indicator rows (row-major, [`FEATURE_COLUMNS`] order).
    #[must_use]
    pub fn feature_rows(&self) -> &[Vec<f64>] {
        &self.feature_rows
    }

    /// Return the raw welfare-class labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Return the number of data rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Return the canonical feature names as owned strings.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|&c| c.to_string()).collect()
    }

    /// Count rows per distinct label, ordered by label.
    #[must_use]
    pub fn class_distribution(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_name_valid() {
        let name = RunName::new("welfare-2024_q1".to_string());
        assert!(name.is_ok());
        assert_eq!(name.unwrap().as_str(), "welfare-2024_q1");
    }

    #[test]
    fn run_name_rejects_empty() {
        let name = RunName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidRunName { .. })));
    }

    #[test]
    fn run_name_rejects_special_chars() {
        let name = RunName::new("my run!".to_string());
        assert!(matches!(name, Err(IoError::InvalidRunName { .. })));
    }

    #[test]
    fn class_distribution_counts_per_label() {
        let ds = Dataset::new(
            vec![vec![1.0; 4], vec![2.0; 4], vec![3.0; 4]],
            vec!["Tinggi".into(), "Rendah".into(), "Tinggi".into()],
        );
        let dist = ds.class_distribution();
        assert_eq!(dist["Rendah"], 1);
        assert_eq!(dist["Tinggi"], 2);
        assert_eq!(dist.len(), 2);
    }

    #[test]
    fn feature_names_match_canonical_columns() {
        let ds = Dataset::new(vec![vec![0.0; 4]], vec!["Sedang".into()]);
        assert_eq!(ds.feature_names(), FEATURE_COLUMNS.map(String::from).to_vec());
        assert_eq!(ds.n_rows(), 1);
    }
}
