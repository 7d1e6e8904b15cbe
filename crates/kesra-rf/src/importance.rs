//! Feature importance aggregation across the ensemble.

/// A feature ranked by its aggregate importance.
#[derive(Debug, Clone)]
pub struct RankedFeature {
    /// Feature column name.
    pub name: String,
    /// Normalized importance; all features together sum to 1.
    pub importance: f64,
    /// 1-based rank, 1 = most important.
    pub rank: usize,
}

/// Aggregate per-tree impurity-decrease shares into ranked features.
///
/// Sums each feature's share across all trees, renormalizes so the scores
/// sum to 1 (left at zero when no tree ever split), then sorts descending
/// and assigns 1-based ranks.
pub(crate) fn aggregate_importances(
    per_tree: &[Vec<f64>],
    feature_names: &[String],
) -> Vec<RankedFeature> {
    let n_features = feature_names.len();
    let mut totals = vec![0.0; n_features];
    for tree_importances in per_tree {
        for (total, &importance) in totals.iter_mut().zip(tree_importances) {
            *total += importance;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        for total in &mut totals {
            *total /= sum;
        }
    }

    let mut ranked: Vec<RankedFeature> = feature_names
        .iter()
        .zip(&totals)
        .map(|(name, &importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}
