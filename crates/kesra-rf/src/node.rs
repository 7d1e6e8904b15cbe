/// Zero-based feature column index.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based column position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index into the `Vec<Node>` arena backing a decision tree.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Weighted Gini impurity of a node.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` with children referenced by [`NodeIndex`]
/// instead of pointers, which keeps traversal allocation-free and makes the
/// whole tree directly serializable into the artifact bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior decision node.
    Split {
        /// Feature tested at this node.
        feature: FeatureIndex,
        /// Samples with `value <= threshold` descend left.
        threshold: f64,
        /// Arena index of the left child.
        left: NodeIndex,
        /// Arena index of the right child.
        right: NodeIndex,
        /// Weighted impurity before the split.
        impurity: Impurity,
        /// Training samples that reached this node.
        n_samples: usize,
        /// Weighted impurity decrease contributed by this split.
        impurity_decrease: f64,
    },
    /// A terminal node.
    Leaf {
        /// Majority class at this leaf; ties resolve to the lowest code.
        prediction: usize,
        /// Weighted class frequencies, normalized to sum to 1.
        distribution: Vec<f64>,
        /// Weighted impurity of the leaf.
        impurity: Impurity,
        /// Training samples that reached this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the weighted impurity at this node.
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_accessors() {
        let leaf = Node::Leaf {
            prediction: 1,
            distribution: vec![0.25, 0.75],
            impurity: Impurity::new(0.375),
            n_samples: 8,
        };

        assert!(leaf.is_leaf());
        assert_eq!(leaf.n_samples(), 8);
        assert!((leaf.impurity().value() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn split_accessors() {
        let split = Node::Split {
            feature: FeatureIndex::new(2),
            threshold: 0.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            impurity: Impurity::new(0.5),
            n_samples: 20,
            impurity_decrease: 3.2,
        };

        assert!(!split.is_leaf());
        assert_eq!(split.n_samples(), 20);
    }

    #[test]
    fn index_newtypes_round_trip() {
        assert_eq!(FeatureIndex::new(3).index(), 3);
        assert_eq!(NodeIndex::new(17).index(), 17);
    }
}
