use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::PrepError;

/// Deterministic, class-proportional train/test splitter.
///
/// Construct via [`StratifiedSplit::new`], then chain `with_seed`.
///
/// Each class contributes `round(count * test_fraction)` members to the
/// test subset, clamped so both subsets keep at least one member of every
/// class. The same `(codes, test_fraction, seed)` always produces the same
/// partition.
#[derive(Debug, Clone)]
pub struct StratifiedSplit {
    test_fraction: f64,
    seed: u64,
}

/// Index partition produced by [`StratifiedSplit::split`].
///
/// The two index lists are disjoint, sorted ascending, and together cover
/// every input row exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Row indices assigned to the training subset.
    pub train_indices: Vec<usize>,
    /// Row indices assigned to the held-out evaluation subset.
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    /// Return the number of training rows.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    /// Return the number of held-out rows.
    #[must_use]
    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}

impl StratifiedSplit {
    /// Create a splitter holding out the given fraction of each class.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidTestFraction`] unless `test_fraction` is
    /// in the open interval (0.0, 1.0).
    pub fn new(test_fraction: f64) -> Result<Self, PrepError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PrepError::InvalidTestFraction {
                fraction: test_fraction,
            });
        }
        Ok(Self {
            test_fraction,
            seed: 42,
        })
    }

    /// Set the random seed for the per-class shuffles.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Partition row indices into train and test subsets, stratified by
    /// class code.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`PrepError::EmptyLabels`] | `codes` is empty |
    /// | [`PrepError::InsufficientSamples`] | an observed class has fewer than 2 members |
    #[instrument(skip(self, codes), fields(n_samples = codes.len(), test_fraction = self.test_fraction))]
    pub fn split(&self, codes: &[usize]) -> Result<TrainTestSplit, PrepError> {
        if codes.is_empty() {
            return Err(PrepError::EmptyLabels);
        }

        // Group row indices by class code.
        let n_classes = codes.iter().max().copied().unwrap_or(0) + 1;
        let mut class_indices: Vec<Vec<usize>> = vec![vec![]; n_classes];
        for (i, &code) in codes.iter().enumerate() {
            class_indices[code].push(i);
        }

        // Every observed class must be able to reach both subsets.
        for (class, members) in class_indices.iter().enumerate() {
            if !members.is_empty() && members.len() < 2 {
                return Err(PrepError::InsufficientSamples {
                    class,
                    count: members.len(),
                });
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train_indices = Vec::new();
        let mut test_indices = Vec::new();

        for members in &mut class_indices {
            if members.is_empty() {
                continue;
            }
            members.shuffle(&mut rng);
            let n = members.len();
            let rounded = (n as f64 * self.test_fraction).round() as usize;
            let n_test = rounded.clamp(1, n - 1);
            test_indices.extend_from_slice(&members[..n_test]);
            train_indices.extend_from_slice(&members[n_test..]);
        }

        train_indices.sort_unstable();
        test_indices.sort_unstable();

        debug!(
            n_train = train_indices.len(),
            n_test = test_indices.len(),
            "stratified split complete"
        );

        Ok(TrainTestSplit {
            train_indices,
            test_indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabelMapping;

    fn three_class_codes(per_class: usize) -> Vec<usize> {
        let mut codes = Vec::new();
        for class in 0..3 {
            codes.extend(std::iter::repeat_n(class, per_class));
        }
        codes
    }

    #[test]
    fn fraction_bounds_are_enforced() {
        assert!(matches!(
            StratifiedSplit::new(0.0),
            Err(PrepError::InvalidTestFraction { .. })
        ));
        assert!(matches!(
            StratifiedSplit::new(1.0),
            Err(PrepError::InvalidTestFraction { .. })
        ));
        assert!(matches!(
            StratifiedSplit::new(f64::NAN),
            Err(PrepError::InvalidTestFraction { .. })
        ));
        assert!(StratifiedSplit::new(0.2).is_ok());
    }

    #[test]
    fn partition_is_exact() {
        let codes = three_class_codes(20);
        let split = StratifiedSplit::new(0.2).unwrap().split(&codes).unwrap();

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(&split.test_indices)
            .copied()
            .collect();
        all.sort_unstable();

        let expected: Vec<usize> = (0..codes.len()).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn per_class_proportions_are_within_one_row() {
        let codes = three_class_codes(25);
        let split = StratifiedSplit::new(0.2).unwrap().split(&codes).unwrap();

        for class in 0..3 {
            let class_total = codes.iter().filter(|&&c| c == class).count();
            let in_test = split
                .test_indices
                .iter()
                .filter(|&&i| codes[i] == class)
                .count();
            let ideal = class_total as f64 * 0.2;
            assert!(
                (in_test as f64 - ideal).abs() <= 1.0,
                "class {class}: {in_test} held out, ideal {ideal}"
            );
        }
    }

    #[test]
    fn same_seed_reproduces_the_partition() {
        let codes = three_class_codes(40);
        let splitter = StratifiedSplit::new(0.2).unwrap().with_seed(7);

        let first = splitter.split(&codes).unwrap();
        let second = splitter.split(&codes).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_shuffle_differently() {
        let codes = three_class_codes(40);

        let a = StratifiedSplit::new(0.2)
            .unwrap()
            .with_seed(1)
            .split(&codes)
            .unwrap();
        let b = StratifiedSplit::new(0.2)
            .unwrap()
            .with_seed(2)
            .split(&codes)
            .unwrap();

        assert_ne!(a.test_indices, b.test_indices);
    }

    #[test]
    fn every_class_reaches_both_subsets() {
        let codes = three_class_codes(5);
        let split = StratifiedSplit::new(0.2).unwrap().split(&codes).unwrap();

        for class in 0..3 {
            assert!(split.train_indices.iter().any(|&i| codes[i] == class));
            assert!(split.test_indices.iter().any(|&i| codes[i] == class));
        }
    }

    #[test]
    fn two_classes_of_two_cover_both_subsets() {
        let mapping = LabelMapping::fit(&["Rendah", "Tinggi"]).unwrap();
        let codes = mapping
            .encode_all(&["Rendah", "Tinggi", "Rendah", "Tinggi"])
            .unwrap();

        let split = StratifiedSplit::new(0.2).unwrap().split(&codes).unwrap();

        assert_eq!(split.n_train(), 2);
        assert_eq!(split.n_test(), 2);
        for class in 0..2 {
            assert!(split.train_indices.iter().any(|&i| codes[i] == class));
            assert!(split.test_indices.iter().any(|&i| codes[i] == class));
        }
    }

    #[test]
    fn large_fraction_still_keeps_one_training_row_per_class() {
        let codes = vec![0, 0];
        let split = StratifiedSplit::new(0.9).unwrap().split(&codes).unwrap();

        assert_eq!(split.n_train(), 1);
        assert_eq!(split.n_test(), 1);
    }

    #[test]
    fn singleton_class_is_rejected() {
        let codes = vec![0, 0, 0, 1];
        let err = StratifiedSplit::new(0.2).unwrap().split(&codes).unwrap_err();

        assert!(matches!(
            err,
            PrepError::InsufficientSamples { class: 1, count: 1 }
        ));
    }

    #[test]
    fn empty_codes_are_rejected() {
        let err = StratifiedSplit::new(0.2).unwrap().split(&[]).unwrap_err();
        assert!(matches!(err, PrepError::EmptyLabels));
    }
}
