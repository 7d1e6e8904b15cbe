use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::RfError;
use crate::node::{Node, NodeIndex};
use crate::split::{find_best_split, weighted_impurity};

/// Configuration for a single weighted-Gini CART tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeConfig {
    /// Create a configuration with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the maximum tree depth (`None` = unlimited).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum samples required to split an internal node.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum samples required at each leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how many features each split may consider (`None` = all).
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the RNG seed for feature subsampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train a decision tree.
    ///
    /// `features` is row-major (`features[sample][feature]`), `labels` holds
    /// class codes in `0..class_weights.len()`, and `class_weights` gives
    /// the per-class sample weight applied to impurity and leaf frequencies
    /// (all 1.0 for unweighted training). Stopping criteria use raw sample
    /// counts; only impurity and leaf distributions are weighted.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`RfError::EmptyDataset`] | `features` is empty |
    /// | [`RfError::ZeroFeatures`] | rows have zero feature columns |
    /// | [`RfError::FeatureCountMismatch`] | rows have inconsistent lengths |
    /// | [`RfError::NonFiniteValue`] | any value is NaN or infinite |
    /// | [`RfError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`RfError::LabelOutOfRange`] | a label is outside `0..class_weights.len()` |
    /// | [`RfError::InvalidClassWeight`] | a weight is negative or non-finite |
    /// | [`RfError::InvalidMaxDepth`] | `max_depth` is `Some(0)` |
    /// | [`RfError::InvalidMinSamplesSplit`] | `min_samples_split` < 2 |
    /// | [`RfError::InvalidMinSamplesLeaf`] | `min_samples_leaf` < 1 |
    /// | [`RfError::InvalidMaxFeatures`] | `max_features` outside `[1, n_features]` |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        class_weights: &[f64],
    ) -> Result<DecisionTree, RfError> {
        if features.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        let n_samples = features.len();
        let n_features = features[0].len();
        if n_features == 0 {
            return Err(RfError::ZeroFeatures);
        }
        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(RfError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            for (feature_index, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(RfError::NonFiniteValue {
                        sample_index,
                        feature_index,
                    });
                }
            }
        }
        if labels.len() != n_samples {
            return Err(RfError::LabelCountMismatch {
                n_samples,
                n_labels: labels.len(),
            });
        }
        let n_classes = class_weights.len();
        for &label in labels {
            if label >= n_classes {
                return Err(RfError::LabelOutOfRange { label, n_classes });
            }
        }
        for (class, &weight) in class_weights.iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RfError::InvalidClassWeight { class, weight });
            }
        }

        if let Some(depth) = self.max_depth
            && depth == 0
        {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }

        // Column-major layout so split scans read each feature contiguously.
        let mut col_features: Vec<Vec<f64>> = vec![Vec::with_capacity(n_samples); n_features];
        for row in features {
            for (f, &value) in row.iter().enumerate() {
                col_features[f].push(value);
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut arena = Vec::new();
        let sample_indices: Vec<usize> = (0..n_samples).collect();
        build_node(
            &col_features,
            labels,
            class_weights,
            &sample_indices,
            self,
            max_features,
            0,
            &mut rng,
            &mut arena,
        );

        debug!(n_nodes = arena.len(), "decision tree fit");

        Ok(DecisionTree {
            nodes: arena,
            n_features,
            n_classes,
        })
    }
}

/// Recursively grow the subtree rooted at `sample_indices`.
///
/// The node's slot is pushed before its children so the root always lands
/// at arena index 0; split nodes are written over their placeholder once
/// both child indices are known.
#[allow(clippy::too_many_arguments)]
fn build_node(
    col_features: &[Vec<f64>],
    labels: &[usize],
    class_weights: &[f64],
    sample_indices: &[usize],
    config: &DecisionTreeConfig,
    max_features: usize,
    depth: usize,
    rng: &mut ChaCha8Rng,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = sample_indices.len();
    let n_classes = class_weights.len();

    let mut class_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        class_counts[labels[si]] += 1;
    }
    let (total_weight, impurity) = weighted_impurity(&class_counts, class_weights);

    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let distribution: Vec<f64> = if total_weight > 0.0 {
            class_counts
                .iter()
                .zip(class_weights)
                .map(|(&count, &weight)| count as f64 * weight / total_weight)
                .collect()
        } else {
            class_counts
                .iter()
                .map(|&count| count as f64 / n_samples as f64)
                .collect()
        };
        // Strict comparison: ties resolve to the lowest class code.
        let mut prediction = 0;
        for (class, &p) in distribution.iter().enumerate().skip(1) {
            if p > distribution[prediction] {
                prediction = class;
            }
        }
        let idx = arena.len();
        arena.push(Node::Leaf {
            prediction,
            distribution,
            impurity,
            n_samples,
        });
        NodeIndex::new(idx)
    };

    let depth_reached = config.max_depth.is_some_and(|limit| depth >= limit);
    let too_few = n_samples < config.min_samples_split;
    let pure = impurity.value() == 0.0;
    if depth_reached || too_few || pure {
        return make_leaf(arena);
    }

    let Some(split) = find_best_split(
        col_features,
        labels,
        sample_indices,
        class_weights,
        max_features,
        config.min_samples_leaf,
        rng,
    ) else {
        return make_leaf(arena);
    };

    // Reserve the slot, recurse into both children, then write the split.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        prediction: 0,
        distribution: vec![0.0; n_classes],
        impurity,
        n_samples,
    });

    let left = build_node(
        col_features,
        labels,
        class_weights,
        &split.left_indices,
        config,
        max_features,
        depth + 1,
        rng,
        arena,
    );
    let right = build_node(
        col_features,
        labels,
        class_weights,
        &split.right_indices,
        config,
        max_features,
        depth + 1,
        rng,
        arena,
    );

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
        impurity,
        n_samples,
        impurity_decrease: split.impurity_decrease,
    };

    NodeIndex::new(node_idx)
}

/// A fitted decision tree backed by a node arena.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class code for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample` has the
    /// wrong width.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        match self.leaf_for(sample)? {
            Node::Leaf { prediction, .. } => Ok(*prediction),
            Node::Split { .. } => unreachable!("leaf_for always lands on a leaf"),
        }
    }

    /// Return the leaf class-frequency distribution for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample` has the
    /// wrong width.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, RfError> {
        match self.leaf_for(sample)? {
            Node::Leaf { distribution, .. } => Ok(distribution.clone()),
            Node::Split { .. } => unreachable!("leaf_for always lands on a leaf"),
        }
    }

    fn leaf_for(&self, sample: &[f64]) -> Result<&Node, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut current = 0;
        loop {
            match &self.nodes[current] {
                leaf @ Node::Leaf { .. } => return Ok(leaf),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    current = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Per-feature impurity-decrease totals, normalized to sum to 1.
    ///
    /// A tree with no splits reports all zeros.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                importances[feature.index()] += impurity_decrease;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for importance in &mut importances {
                *importance /= total;
            }
        }
        importances
    }

    /// Return the total number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Return the depth of the tree (0 for a single leaf).
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((left.index(), depth + 1));
                stack.push((right.index(), depth + 1));
            }
        }
        max_depth
    }

    /// Return the number of feature columns this tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes this tree was trained on.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}
