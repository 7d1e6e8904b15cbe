use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Total weight and weighted Gini impurity over per-class sample counts.
///
/// Weighted Gini is `1 - sum(((count_c * weight_c) / W)^2)` with
/// `W = sum(count_c * weight_c)`. With uniform weights this reduces to the
/// plain Gini impurity over counts. An empty set has zero impurity.
pub(crate) fn weighted_impurity(
    class_counts: &[usize],
    class_weights: &[f64],
) -> (f64, Impurity) {
    let total: f64 = class_counts
        .iter()
        .zip(class_weights)
        .map(|(&count, &weight)| count as f64 * weight)
        .sum();
    if total <= 0.0 {
        return (0.0, Impurity::new(0.0));
    }
    let sum_sq: f64 = class_counts
        .iter()
        .zip(class_weights)
        .map(|(&count, &weight)| {
            let p = count as f64 * weight / total;
            p * p
        })
        .sum();
    (total, Impurity::new(1.0 - sum_sq))
}

/// The best split found for a node, with the resulting sample partition.
#[derive(Debug, Clone)]
pub(crate) struct BestSplit {
    /// Feature to test.
    pub(crate) feature: FeatureIndex,
    /// Midpoint threshold between the two straddling values.
    pub(crate) threshold: f64,
    /// Weighted impurity decrease achieved by this split.
    pub(crate) impurity_decrease: f64,
    /// Sample indices descending to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices descending to the right child.
    pub(crate) right_indices: Vec<usize>,
}

/// Find the best weighted-Gini split over a random subset of features.
///
/// Considers up to `max_features` randomly chosen feature columns. For each
/// candidate the `(value, sample)` pairs are sorted and scanned left to
/// right with incremental class counts, keeping the boundary with the
/// greatest weighted impurity decrease:
///
/// `W_parent * G_parent - W_left * G_left - W_right * G_right`
///
/// Candidate thresholds are midpoints between adjacent distinct values.
/// Leaf-size limits apply to raw sample counts, not weighted ones. Returns
/// `None` when no valid boundary exists (all candidate values identical, or
/// every boundary violates `min_samples_leaf`).
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    class_weights: &[f64],
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<BestSplit> {
    let n_features = features.len();
    let n_samples = sample_indices.len();
    let n_classes = class_weights.len();

    if n_samples < 2 || n_features == 0 {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }
    let (parent_weight, parent_impurity) = weighted_impurity(&parent_counts, class_weights);

    // Partial Fisher-Yates: only the first `take` positions are drawn.
    let take = max_features.min(n_features);
    let mut feature_order: Vec<usize> = (0..n_features).collect();
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        feature_order.swap(i, j);
    }

    let mut best_decrease = f64::NEG_INFINITY;
    let mut best: Option<(FeatureIndex, f64)> = None;

    for &feat_idx in &feature_order[..take] {
        let column = &features[feat_idx];

        let mut sorted: Vec<(f64, usize)> =
            sample_indices.iter().map(|&si| (column[si], si)).collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for i in 0..(n_samples - 1) {
            let (value, si) = sorted[i];
            let class = labels[si];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            // A boundary only exists between two distinct values.
            let next_value = sorted[i + 1].0;
            if value == next_value {
                continue;
            }

            let n_left = i + 1;
            let n_right = n_samples - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let (left_weight, left_impurity) = weighted_impurity(&left_counts, class_weights);
            let (right_weight, right_impurity) =
                weighted_impurity(&right_counts, class_weights);

            let decrease = parent_weight * parent_impurity.value()
                - left_weight * left_impurity.value()
                - right_weight * right_impurity.value();

            if decrease > best_decrease {
                best_decrease = decrease;
                best = Some((FeatureIndex::new(feat_idx), (value + next_value) / 2.0));
            }
        }
    }

    let (feature, threshold) = best?;

    let column = &features[feature.index()];
    let mut left_indices = Vec::with_capacity(n_samples / 2);
    let mut right_indices = Vec::with_capacity(n_samples / 2);
    for &si in sample_indices {
        if column[si] <= threshold {
            left_indices.push(si);
        } else {
            right_indices.push(si);
        }
    }

    Some(BestSplit {
        feature,
        threshold,
        impurity_decrease: best_decrease,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    const UNIFORM: [f64; 2] = [1.0, 1.0];

    #[test]
    fn pure_counts_have_zero_impurity() {
        let (_, impurity) = weighted_impurity(&[8, 0], &UNIFORM);
        assert_eq!(impurity.value(), 0.0);
    }

    #[test]
    fn balanced_binary_counts_have_half_impurity() {
        let (weight, impurity) = weighted_impurity(&[5, 5], &UNIFORM);
        assert_eq!(weight, 10.0);
        assert!((impurity.value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn class_weights_shift_impurity() {
        // counts [5, 5], weights [2, 1]: p = (2/3, 1/3), gini = 4/9.
        let (weight, impurity) = weighted_impurity(&[5, 5], &[2.0, 1.0]);
        assert_eq!(weight, 15.0);
        assert!((impurity.value() - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn separable_data_splits_at_the_gap() {
        // Feature 0 separates the classes at 10.0; feature 1 is constant.
        let features = vec![
            vec![1.0, 2.0, 3.0, 18.0, 19.0, 20.0],
            vec![7.0; 6],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split =
            find_best_split(&features, &labels, &indices, &UNIFORM, 2, 1, &mut rng).unwrap();

        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 10.5).abs() < 1e-12);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5]);
        assert!(split.impurity_decrease > 0.0);
    }

    #[test]
    fn constant_features_yield_no_split() {
        let features = vec![vec![4.0; 5]];
        let labels = vec![0, 1, 0, 1, 0];
        let indices: Vec<usize> = (0..5).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        assert!(
            find_best_split(&features, &labels, &indices, &UNIFORM, 1, 1, &mut rng).is_none()
        );
    }

    #[test]
    fn min_samples_leaf_blocks_tiny_partitions() {
        let features = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let labels = vec![0, 1, 1, 1];
        let indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split =
            find_best_split(&features, &labels, &indices, &UNIFORM, 1, 2, &mut rng).unwrap();

        // The ideal boundary (between samples 0 and 1) leaves one sample on
        // the left, so only the middle boundary qualifies.
        assert_eq!(split.left_indices.len(), 2);
        assert_eq!(split.right_indices.len(), 2);
    }
}
