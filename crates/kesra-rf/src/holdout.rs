//! Held-out evaluation of a trained ensemble.

use tracing::{info, instrument};

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::forest::RandomForest;

/// Classification-report row for one welfare class.
#[derive(Debug, Clone)]
pub struct ClassReport {
    /// Decoded class label.
    pub label: String,
    /// TP / (TP + FP); 0 when the class was never predicted.
    pub precision: f64,
    /// TP / (TP + FN); 0 when the class has no actual members.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Actual members of this class in the held-out subset.
    pub support: usize,
}

/// Aggregate row of the classification report.
#[derive(Debug, Clone, Copy)]
pub struct ReportAverages {
    /// Averaged precision.
    pub precision: f64,
    /// Averaged recall.
    pub recall: f64,
    /// Averaged F1.
    pub f1: f64,
    /// Total rows the average covers.
    pub support: usize,
}

/// Evaluation of a trained forest against the held-out subset.
///
/// Every fitted class appears in `per_class`, even with zero actual or zero
/// predicted members. Macro averages weigh classes equally; weighted
/// averages weigh them by support.
#[derive(Debug)]
pub struct HoldoutEvaluation {
    /// Fraction of held-out rows predicted correctly.
    pub accuracy: f64,
    /// K x K counts, rows = actual class, columns = predicted class.
    pub confusion: ConfusionMatrix,
    /// Per-class precision/recall/F1/support, in code order.
    pub per_class: Vec<ClassReport>,
    /// Unweighted mean of the per-class metrics.
    pub macro_avg: ReportAverages,
    /// Support-weighted mean of the per-class metrics.
    pub weighted_avg: ReportAverages,
    /// Number of held-out rows.
    pub n_test: usize,
}

/// Evaluate a trained forest on the held-out subset.
///
/// `class_names` must list the decoded label for every fitted class, in
/// code order; the per-class report is keyed by those labels.
///
/// # Errors
///
/// | Variant | Condition |
/// |---------|-----------|
/// | [`RfError::EmptyDataset`] | zero test rows |
/// | [`RfError::LabelCountMismatch`] | `test_codes.len() != test_features.len()` |
/// | [`RfError::ClassCountMismatch`] | `class_names.len() != forest.n_classes()` |
/// | [`RfError::LabelOutOfRange`] | a test code is outside the fitted classes |
/// | [`RfError::PredictionFeatureMismatch`] | a test row has the wrong width |
#[instrument(skip_all, fields(n_test = test_features.len()))]
pub fn evaluate_holdout(
    forest: &RandomForest,
    test_features: &[Vec<f64>],
    test_codes: &[usize],
    class_names: &[String],
) -> Result<HoldoutEvaluation, RfError> {
    if test_features.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    if test_codes.len() != test_features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: test_features.len(),
            n_labels: test_codes.len(),
        });
    }
    if class_names.len() != forest.n_classes() {
        return Err(RfError::ClassCountMismatch {
            expected: forest.n_classes(),
            got: class_names.len(),
        });
    }

    let predictions = forest.predict_batch(test_features)?;
    let confusion = ConfusionMatrix::from_labels(test_codes, &predictions, class_names.len())?;
    let accuracy = confusion.accuracy();

    let per_class: Vec<ClassReport> = confusion
        .class_metrics()
        .iter()
        .zip(class_names)
        .map(|(m, name)| ClassReport {
            label: name.clone(),
            precision: m.precision,
            recall: m.recall,
            f1: m.f1,
            support: m.support,
        })
        .collect();

    let n_test = test_codes.len();
    let k = per_class.len() as f64;
    let macro_avg = ReportAverages {
        precision: per_class.iter().map(|c| c.precision).sum::<f64>() / k,
        recall: per_class.iter().map(|c| c.recall).sum::<f64>() / k,
        f1: per_class.iter().map(|c| c.f1).sum::<f64>() / k,
        support: n_test,
    };
    let weighted_avg = ReportAverages {
        precision: per_class
            .iter()
            .map(|c| c.precision * c.support as f64)
            .sum::<f64>()
            / n_test as f64,
        recall: per_class
            .iter()
            .map(|c| c.recall * c.support as f64)
            .sum::<f64>()
            / n_test as f64,
        f1: per_class.iter().map(|c| c.f1 * c.support as f64).sum::<f64>() / n_test as f64,
        support: n_test,
    };

    info!(accuracy, n_test, "holdout evaluation complete");

    Ok(HoldoutEvaluation {
        accuracy,
        confusion,
        per_class,
        macro_avg,
        weighted_avg,
        n_test,
    })
}
