//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Averaged class probability distribution for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    pub(crate) fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// Return the most probable class; ties resolve to the lowest code.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        let mut best = 0;
        for (class, &p) in self.probs.iter().enumerate().skip(1) {
            if p > self.probs[best] {
                best = class;
            }
        }
        best
    }

    /// Return the per-class probabilities, indexed by class code.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Predict the class for a single sample by majority vote.
    ///
    /// Each tree casts one vote for its own leaf prediction; ties between
    /// classes with equal vote counts resolve to the lowest code.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when
    /// `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(sample)?] += 1;
        }
        let mut winner = 0;
        for (class, &count) in votes.iter().enumerate().skip(1) {
            if count > votes[winner] {
                winner = class;
            }
        }
        Ok(winner)
    }

    /// Return the averaged class probability distribution for one sample.
    ///
    /// Averages the leaf-frequency estimates of all trees; the result sums
    /// to 1 within floating-point tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when
    /// `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut sums = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.predict_proba(sample)?;
            for (sum, p) in sums.iter_mut().zip(leaf) {
                *sum += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        for sum in &mut sums {
            *sum /= n_trees;
        }
        Ok(ClassDistribution::new(sums))
    }

    /// Predict classes for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first [`RfError::PredictionFeatureMismatch`] encountered.
    pub fn predict_batch(&self, samples: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        samples
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return probability distributions for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first [`RfError::PredictionFeatureMismatch`] encountered.
    pub fn predict_proba_batch(
        &self,
        samples: &[Vec<f64>],
    ) -> Result<Vec<ClassDistribution>, RfError> {
        samples
            .into_par_iter()
            .map(|sample| self.predict_proba(sample))
            .collect()
    }

    /// Return the number of feature columns the forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes the forest was trained on.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the feature column names, in training order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}
