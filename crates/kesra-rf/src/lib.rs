//! Random Forest welfare classification: train, evaluate, persist.
//!
//! Implements a weighted-Gini CART ensemble with bootstrap resampling and
//! per-split feature subsampling, trained in parallel via rayon. On top of
//! the ensemble sit held-out evaluation (accuracy, per-class precision,
//! recall, F1, confusion matrix), impurity-based feature importance, and a
//! versioned artifact bundle that binds the model to the scaler and label
//! mapping it was trained with, so inference can never mix preprocessing
//! states.
//!
//! Training is deterministic: one master seed derives every per-tree seed,
//! and tree order never influences votes or averaged probabilities.

mod bundle;
mod config;
mod confusion;
mod diagram;
mod error;
mod forest;
mod holdout;
mod importance;
mod node;
mod predict;
mod result;
mod split;
mod tree;

pub use bundle::{ArtifactBundle, Prediction};
pub use config::{ClassWeight, MaxFeatures, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use diagram::{DiagramNode, TreeDiagram};
pub use error::RfError;
pub use forest::RandomForest;
pub use holdout::{ClassReport, HoldoutEvaluation, ReportAverages, evaluate_holdout};
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::ClassDistribution;
pub use result::{RandomForestResult, TrainingMetadata};
pub use tree::{DecisionTree, DecisionTreeConfig};
