//! Confusion matrix and per-class classification metrics.

use std::fmt;

use crate::error::RfError;

/// A K x K confusion matrix where `matrix[actual][predicted]` counts rows.
///
/// Row sums therefore equal per-class support, and the diagonal holds the
/// correctly classified counts.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

/// Precision, recall, and F1 for one class.
///
/// Zero denominators follow the usual conventions: precision is 0 when the
/// class was never predicted, recall is 0 when it has no actual members,
/// and F1 is 0 when precision and recall are both 0.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    /// The class code.
    pub class: usize,
    /// TP / (TP + FP).
    pub precision: f64,
    /// TP / (TP + FN).
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of actual members of this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from actual and predicted class codes.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`RfError::EmptyDataset`] | zero rows provided |
    /// | [`RfError::PredictionCountMismatch`] | `actual.len() != predicted.len()` |
    /// | [`RfError::LabelOutOfRange`] | a code is outside `0..n_classes` |
    pub fn from_labels(
        actual: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, RfError> {
        if actual.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if actual.len() != predicted.len() {
            return Err(RfError::PredictionCountMismatch {
                n_actual: actual.len(),
                n_predicted: predicted.len(),
            });
        }
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (&a, &p) in actual.iter().zip(predicted) {
            if a >= n_classes || p >= n_classes {
                return Err(RfError::LabelOutOfRange {
                    label: a.max(p),
                    n_classes,
                });
            }
            matrix[a][p] += 1;
        }
        Ok(Self { matrix, n_classes })
    }

    /// Return the fraction of rows on the diagonal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes).map(|c| self.matrix[c][c]).sum();
        let total: usize = self.matrix.iter().flatten().sum();
        correct as f64 / total as f64
    }

    /// Compute precision, recall, F1, and support for every class.
    ///
    /// Classes with zero actual or zero predicted members are reported,
    /// never dropped.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes)
            .map(|class| {
                let tp = self.matrix[class][class];
                let predicted: usize = (0..self.n_classes).map(|a| self.matrix[a][class]).sum();
                let support: usize = self.matrix[class].iter().sum();

                let precision = if predicted == 0 {
                    0.0
                } else {
                    tp as f64 / predicted as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };

                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the raw counts, rows = actual class, columns = predicted.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "actual\\pred")?;
        for c in 0..self.n_classes {
            write!(f, "{c:>8}")?;
        }
        writeln!(f)?;
        for (a, row) in self.matrix.iter().enumerate() {
            write!(f, "{a:>10}")?;
            for &count in row {
                write!(f, "{count:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_give_unit_metrics() {
        let labels = vec![0, 1, 2, 0, 1, 2];
        let cm = ConfusionMatrix::from_labels(&labels, &labels, 3).unwrap();

        assert_eq!(cm.accuracy(), 1.0);
        for m in cm.class_metrics() {
            assert_eq!(m.precision, 1.0);
            assert_eq!(m.recall, 1.0);
            assert_eq!(m.f1, 1.0);
            assert_eq!(m.support, 2);
        }
    }

    #[test]
    fn known_counts_give_known_metrics() {
        let actual = vec![0, 0, 1, 1, 1, 2];
        let predicted = vec![0, 1, 1, 1, 2, 2];
        let cm = ConfusionMatrix::from_labels(&actual, &predicted, 3).unwrap();

        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-12);

        let metrics = cm.class_metrics();
        assert_eq!(metrics[0].support, 2);
        assert_eq!(metrics[0].precision, 1.0);
        assert_eq!(metrics[0].recall, 0.5);

        assert_eq!(metrics[1].support, 3);
        assert!((metrics[1].precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((metrics[1].recall - 2.0 / 3.0).abs() < 1e-12);

        assert_eq!(metrics[2].support, 1);
        assert_eq!(metrics[2].precision, 0.5);
        assert_eq!(metrics[2].recall, 1.0);
    }

    #[test]
    fn row_sums_equal_support() {
        let actual = vec![0, 0, 0, 1, 1, 2, 2, 2, 2];
        let predicted = vec![0, 1, 2, 1, 1, 0, 2, 2, 1];
        let cm = ConfusionMatrix::from_labels(&actual, &predicted, 3).unwrap();

        for (row, m) in cm.as_rows().iter().zip(cm.class_metrics()) {
            let row_sum: usize = row.iter().sum();
            assert_eq!(row_sum, m.support);
        }

        let total: usize = cm.as_rows().iter().flatten().sum();
        assert_eq!(total, actual.len());
    }

    #[test]
    fn absent_class_is_still_reported() {
        // Class 2 never appears in actual or predicted labels.
        let actual = vec![0, 0, 1, 1];
        let predicted = vec![0, 0, 1, 0];
        let cm = ConfusionMatrix::from_labels(&actual, &predicted, 3).unwrap();

        let metrics = cm.class_metrics();
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[2].support, 0);
        assert_eq!(metrics[2].precision, 0.0);
        assert_eq!(metrics[2].recall, 0.0);
        assert_eq!(metrics[2].f1, 0.0);
    }

    #[test]
    fn never_predicted_class_has_zero_precision() {
        let actual = vec![0, 1, 1];
        let predicted = vec![0, 0, 0];
        let cm = ConfusionMatrix::from_labels(&actual, &predicted, 2).unwrap();

        let metrics = cm.class_metrics();
        assert_eq!(metrics[1].precision, 0.0);
        assert_eq!(metrics[1].recall, 0.0);
        assert_eq!(metrics[1].support, 2);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = ConfusionMatrix::from_labels(&[0, 1], &[0], 2).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionCountMismatch { n_actual: 2, n_predicted: 1 }
        ));
    }

    #[test]
    fn out_of_range_codes_are_rejected() {
        let err = ConfusionMatrix::from_labels(&[0, 5], &[0, 1], 2).unwrap_err();
        assert!(matches!(
            err,
            RfError::LabelOutOfRange { label: 5, n_classes: 2 }
        ));
    }

    #[test]
    fn empty_labels_are_rejected() {
        assert!(matches!(
            ConfusionMatrix::from_labels(&[], &[], 2),
            Err(RfError::EmptyDataset)
        ));
    }
}
