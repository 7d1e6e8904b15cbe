//! Feature standardization fitted on the training subset only.

use tracing::debug;

use crate::PrepError;

/// Per-feature standardization state: `(value - mean) / stddev`.
///
/// Fit on training rows only, then applied unchanged to held-out and
/// inference inputs so no evaluation statistics leak into the model. Uses
/// the population standard deviation (divides by n). A feature whose
/// training stddev is zero carries no discriminative information; such
/// features transform to exactly 0 instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stddevs: Vec<f64>,
}

impl StandardScaler {
    /// Fit per-feature mean and population standard deviation.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`PrepError::EmptyTrainingSet`] | `rows` is empty |
    /// | [`PrepError::ZeroFeatures`] | rows have zero feature columns |
    /// | [`PrepError::FeatureCountMismatch`] | rows have inconsistent lengths |
    /// | [`PrepError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PrepError> {
        if rows.is_empty() {
            return Err(PrepError::EmptyTrainingSet);
        }
        let n_features = rows[0].len();
        if n_features == 0 {
            return Err(PrepError::ZeroFeatures);
        }
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(PrepError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                });
            }
            for (feature_index, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(PrepError::NonFiniteValue {
                        row_index,
                        feature_index,
                    });
                }
            }
        }

        let n = rows.len() as f64;
        let means: Vec<f64> = (0..n_features)
            .map(|f| rows.iter().map(|row| row[f]).sum::<f64>() / n)
            .collect();
        let stddevs: Vec<f64> = (0..n_features)
            .map(|f| {
                let variance =
                    rows.iter().map(|row| (row[f] - means[f]).powi(2)).sum::<f64>() / n;
                variance.sqrt()
            })
            .collect();

        debug!(n_rows = rows.len(), n_features, "scaler fit");
        Ok(Self { means, stddevs })
    }

    /// Standardize a single row.
    ///
    /// Works identically for one inference row or the rows of a training
    /// batch; the transform has no dependency on call-time batch size.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::FeatureCountMismatch`] when `row` has the wrong
    /// width.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, PrepError> {
        if row.len() != self.means.len() {
            return Err(PrepError::FeatureCountMismatch {
                expected: self.means.len(),
                got: row.len(),
            });
        }
        let scaled = row
            .iter()
            .zip(self.means.iter().zip(&self.stddevs))
            .map(|(&value, (&mean, &stddev))| {
                if stddev == 0.0 {
                    0.0
                } else {
                    (value - mean) / stddev
                }
            })
            .collect();
        Ok(scaled)
    }

    /// Standardize a batch of rows.
    ///
    /// # Errors
    ///
    /// Returns the first [`PrepError::FeatureCountMismatch`] encountered.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PrepError> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    /// Return the number of features this scaler was fit on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Return the per-feature training means.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Return the per-feature training standard deviations.
    #[must_use]
    pub fn stddevs(&self) -> &[f64] {
        &self.stddevs
    }
}
