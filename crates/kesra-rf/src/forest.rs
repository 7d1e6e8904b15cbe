//! Random Forest training with parallel tree construction.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{ClassWeight, MaxFeatures, RandomForestConfig};
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted Random Forest ensemble.
///
/// Prediction methods live in the `predict` module; the forest itself is a
/// plain serializable value so it can travel inside the artifact bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

impl RandomForest {
    /// Check the structural invariants a trained forest always satisfies.
    ///
    /// Used when deserializing from disk, where the bytes may not come from
    /// a genuine training run.
    pub(crate) fn structural_defect(&self) -> Option<String> {
        if self.trees.is_empty() {
            return Some("ensemble contains zero trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features != self.n_features {
                return Some(format!(
                    "tree {i} was trained on {} features, ensemble declares {}",
                    tree.n_features, self.n_features
                ));
            }
            if tree.n_classes != self.n_classes {
                return Some(format!(
                    "tree {i} was trained on {} classes, ensemble declares {}",
                    tree.n_classes, self.n_classes
                ));
            }
        }
        if self.feature_names.len() != self.n_features {
            return Some(format!(
                "{} feature names for {} features",
                self.feature_names.len(),
                self.n_features
            ));
        }
        None
    }
}

/// Resolve a [`MaxFeatures`] strategy to a concrete per-split count.
pub(crate) fn resolve_max_features(
    strategy: MaxFeatures,
    n_features: usize,
) -> Result<usize, RfError> {
    let resolved = match strategy {
        MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
        MaxFeatures::Log2 => ((n_features as f64).log2().ceil() as usize).max(1),
        MaxFeatures::Fraction(fraction) => (n_features as f64 * fraction).ceil() as usize,
        MaxFeatures::Fixed(count) => count,
        MaxFeatures::All => n_features,
    };
    if resolved == 0 || resolved > n_features {
        return Err(RfError::InvalidMaxFeatures {
            max_features: resolved,
            n_features,
        });
    }
    Ok(resolved)
}

/// Draw a bootstrap resample: `n_samples` indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Compute per-class sample weights from the training labels.
///
/// Balanced weighting assigns `n / (K * count_c)`; a class absent from the
/// training labels gets weight 0, which is harmless because it can never
/// contribute counts.
fn class_weights_for(labels: &[usize], n_classes: usize, strategy: ClassWeight) -> Vec<f64> {
    match strategy {
        ClassWeight::Uniform => vec![1.0; n_classes],
        ClassWeight::Balanced => {
            let mut counts = vec![0usize; n_classes];
            for &label in labels {
                counts[label] += 1;
            }
            let n = labels.len() as f64;
            let k = n_classes as f64;
            counts
                .iter()
                .map(|&count| if count == 0 { 0.0 } else { n / (k * count as f64) })
                .collect()
        }
    }
}

#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    // --- Validate data ---
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
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameCountMismatch {
            expected: n_features,
            got: feature_names.len(),
        });
    }

    // --- Validate config up front so per-tree fits cannot fail below ---
    let max_features = resolve_max_features(config.max_features, n_features)?;
    if let Some(depth) = config.max_depth
        && depth == 0
    {
        return Err(RfError::InvalidMaxDepth { max_depth: 0 });
    }
    if config.min_samples_split < 2 {
        return Err(RfError::InvalidMinSamplesSplit {
            min_samples_split: config.min_samples_split,
        });
    }
    if config.min_samples_leaf < 1 {
        return Err(RfError::InvalidMinSamplesLeaf {
            min_samples_leaf: config.min_samples_leaf,
        });
    }

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let class_weights = class_weights_for(labels, n_classes, config.class_weight);

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        class_weight = ?config.class_weight,
        "training random forest"
    );

    // Per-tree seeds come from a master stream so one seed pins the whole
    // ensemble regardless of thread scheduling.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let max_depth = config.max_depth;
    let min_samples_split = config.min_samples_split;
    let min_samples_leaf = config.min_samples_leaf;

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bootstrap = bootstrap_sample(n_samples, &mut rng);

            let boot_features: Vec<Vec<f64>> =
                bootstrap.iter().map(|&i| features[i].clone()).collect();
            let boot_labels: Vec<usize> = bootstrap.iter().map(|&i| labels[i]).collect();

            let tree_config = DecisionTreeConfig::new()
                .with_max_depth(max_depth)
                .with_min_samples_split(min_samples_split)
                .with_min_samples_leaf(min_samples_leaf)
                .with_max_features(Some(max_features))
                .with_seed(rng.r#gen());

            // Data and config were validated above, so per-tree fits only
            // see inputs that cannot fail.
            tree_config
                .fit(&boot_features, &boot_labels, &class_weights)
                .expect("tree fit on pre-validated data")
        })
        .collect();

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, feature_names);

    debug!(n_trees_trained = trees.len(), "tree training complete");

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    };
    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved: max_features,
    };

    info!("random forest training complete");

    Ok(RandomForestResult::new(forest, importances, metadata))
}
