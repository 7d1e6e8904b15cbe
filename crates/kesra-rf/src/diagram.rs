//! Depth-limited structural view of a single tree.

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::node::Node;
use crate::tree::DecisionTree;

/// Serializable rendering of one tree's top levels, for chart payloads.
///
/// The content is fully determined by the trained ensemble, so repeated
/// exports of the same forest produce identical diagrams.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TreeDiagram {
    /// Index of the rendered tree within the ensemble.
    pub tree_index: usize,
    /// Depth cutoff applied to the rendering.
    pub max_depth: usize,
    /// The tree structure, truncated below `max_depth`.
    pub root: DiagramNode,
}

/// One rendered node of the diagram.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagramNode {
    /// An interior decision with both children rendered.
    Split {
        /// Name of the feature tested at this node.
        feature: String,
        /// Decision threshold; `<=` descends left.
        threshold: f64,
        /// Training samples that reached this node.
        n_samples: usize,
        /// Weighted impurity before the split.
        impurity: f64,
        /// Left child (`value <= threshold`).
        left: Box<DiagramNode>,
        /// Right child.
        right: Box<DiagramNode>,
    },
    /// A terminal leaf.
    Leaf {
        /// Decoded majority class at this leaf.
        label: String,
        /// Training samples that reached this leaf.
        n_samples: usize,
        /// Normalized class distribution at this leaf.
        distribution: Vec<f64>,
    },
    /// A subtree cut off by the depth limit.
    Truncated {
        /// Training samples that reached the hidden subtree.
        n_samples: usize,
        /// Weighted impurity at the cut.
        impurity: f64,
    },
}

impl TreeDiagram {
    /// Render the first tree of a forest down to `max_depth` levels.
    ///
    /// `class_names` must list the decoded label for every fitted class, in
    /// code order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`RfError::InvalidMaxDepth`] | `max_depth` is zero |
    /// | [`RfError::EmptyEnsemble`] | the forest holds no trees |
    /// | [`RfError::ClassCountMismatch`] | `class_names.len() != forest.n_classes()` |
    pub fn from_forest(
        forest: &RandomForest,
        max_depth: usize,
        class_names: &[String],
    ) -> Result<Self, RfError> {
        if max_depth == 0 {
            return Err(RfError::InvalidMaxDepth { max_depth });
        }
        if class_names.len() != forest.n_classes() {
            return Err(RfError::ClassCountMismatch {
                expected: forest.n_classes(),
                got: class_names.len(),
            });
        }
        let Some(tree) = forest.trees.first() else {
            return Err(RfError::EmptyEnsemble);
        };
        let root = render(tree, forest.feature_names(), class_names, 0, 0, max_depth);
        Ok(Self {
            tree_index: 0,
            max_depth,
            root,
        })
    }
}

fn render(
    tree: &DecisionTree,
    feature_names: &[String],
    class_names: &[String],
    node_idx: usize,
    depth: usize,
    max_depth: usize,
) -> DiagramNode {
    match &tree.nodes[node_idx] {
        Node::Leaf {
            prediction,
            distribution,
            n_samples,
            ..
        } => DiagramNode::Leaf {
            label: class_names[*prediction].clone(),
            n_samples: *n_samples,
            distribution: distribution.clone(),
        },
        Node::Split {
            impurity,
            n_samples,
            ..
        } if depth >= max_depth => DiagramNode::Truncated {
            n_samples: *n_samples,
            impurity: impurity.value(),
        },
        Node::Split {
            feature,
            threshold,
            left,
            right,
            impurity,
            n_samples,
            ..
        } => DiagramNode::Split {
            feature: feature_names[feature.index()].clone(),
            threshold: *threshold,
            n_samples: *n_samples,
            impurity: impurity.value(),
            left: Box::new(render(
                tree,
                feature_names,
                class_names,
                left.index(),
                depth + 1,
                max_depth,
            )),
            right: Box::new(render(
                tree,
                feature_names,
                class_names,
                right.index(),
                depth + 1,
                max_depth,
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MaxFeatures, RandomForestConfig};

    fn class_names() -> Vec<String> {
        vec!["Rendah".to_string(), "Tinggi".to_string()]
    }

    fn trained_forest() -> RandomForest {
        // Nested structure: feature 0 splits first, then feature 1.
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.1, 0.1],
            vec![0.1, 0.9],
            vec![0.9, 0.1],
            vec![0.9, 0.9],
        ];
        let labels = vec![0, 1, 1, 0, 0, 1, 1, 0];
        let names = vec!["x".to_string(), "y".to_string()];
        RandomForestConfig::new(3)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap()
            .into_forest()
    }

    fn count_kinds(node: &DiagramNode, splits: &mut usize, leaves: &mut usize, cuts: &mut usize) {
        match node {
            DiagramNode::Split { left, right, .. } => {
                *splits += 1;
                count_kinds(left, splits, leaves, cuts);
                count_kinds(right, splits, leaves, cuts);
            }
            DiagramNode::Leaf { .. } => *leaves += 1,
            DiagramNode::Truncated { .. } => *cuts += 1,
        }
    }

    #[test]
    fn shallow_limit_truncates_subtrees() {
        let forest = trained_forest();
        let diagram = TreeDiagram::from_forest(&forest, 1, &class_names()).unwrap();

        let (mut splits, mut leaves, mut cuts) = (0, 0, 0);
        count_kinds(&diagram.root, &mut splits, &mut leaves, &mut cuts);
        assert!(splits <= 1);
        assert!(cuts + leaves >= 2 || splits == 0);
    }

    #[test]
    fn deep_limit_renders_every_leaf() {
        let forest = trained_forest();
        let diagram = TreeDiagram::from_forest(&forest, 64, &class_names()).unwrap();

        let (mut splits, mut leaves, mut cuts) = (0, 0, 0);
        count_kinds(&diagram.root, &mut splits, &mut leaves, &mut cuts);
        assert_eq!(cuts, 0);
        assert!(leaves >= 2);
    }

    #[test]
    fn rendering_is_deterministic() {
        let forest = trained_forest();

        let a = TreeDiagram::from_forest(&forest, 3, &class_names()).unwrap();
        let b = TreeDiagram::from_forest(&forest, 3, &class_names()).unwrap();

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn serializes_with_kind_tags() {
        let forest = trained_forest();
        let diagram = TreeDiagram::from_forest(&forest, 2, &class_names()).unwrap();

        let json = serde_json::to_value(&diagram).unwrap();
        assert_eq!(json["max_depth"], 2);
        let kind = json["root"]["kind"].as_str().unwrap();
        assert!(kind == "split" || kind == "leaf");
    }

    #[test]
    fn zero_depth_is_rejected() {
        let forest = trained_forest();

        let err = TreeDiagram::from_forest(&forest, 0, &class_names()).unwrap_err();
        assert!(matches!(err, RfError::InvalidMaxDepth { max_depth: 0 }));
    }

    #[test]
    fn class_name_count_is_checked() {
        let forest = trained_forest();
        let short = vec!["Rendah".to_string()];

        let err = TreeDiagram::from_forest(&forest, 3, &short).unwrap_err();
        assert!(matches!(err, RfError::ClassCountMismatch { .. }));
    }
}
