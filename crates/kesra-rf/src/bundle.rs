//! The persisted training artifact: model, scaler, mapping, feature names.

use std::fs;
use std::path::Path;

use kesra_prep::{LabelMapping, StandardScaler};
use tracing::{info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

const FORMAT_VERSION: u32 = 1;

/// The single unit binding a trained forest to its preprocessing state.
///
/// The four parts are only ever produced and persisted together, so a
/// loaded bundle is guaranteed internally consistent: the scaler, label
/// mapping, and feature names all describe the exact run that trained the
/// forest. Downstream consumers load it once and treat it as read-only.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArtifactBundle {
    forest: RandomForest,
    scaler: StandardScaler,
    mapping: LabelMapping,
    feature_names: Vec<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct BundleEnvelope {
    format_version: u32,
    bundle: ArtifactBundle,
}

/// Decoded classification of one raw indicator row.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Decoded welfare-class label.
    pub label: String,
    /// The label's integer code.
    pub code: usize,
    /// Averaged class probabilities, indexed by code.
    pub probabilities: Vec<f64>,
}

impl ArtifactBundle {
    /// Assemble a bundle from freshly trained parts.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InconsistentBundle`] when the parts disagree on
    /// feature or class counts.
    pub fn new(
        forest: RandomForest,
        scaler: StandardScaler,
        mapping: LabelMapping,
        feature_names: Vec<String>,
    ) -> Result<Self, RfError> {
        let bundle = Self {
            forest,
            scaler,
            mapping,
            feature_names,
        };
        if let Some(reason) = bundle.consistency_defect() {
            return Err(RfError::InconsistentBundle { reason });
        }
        Ok(bundle)
    }

    /// Check the cross-field invariants; `None` means consistent.
    fn consistency_defect(&self) -> Option<String> {
        if let Some(reason) = self.forest.structural_defect() {
            return Some(reason);
        }
        if self.feature_names.len() != self.forest.n_features() {
            return Some(format!(
                "{} feature names for a {}-feature ensemble",
                self.feature_names.len(),
                self.forest.n_features()
            ));
        }
        if self.scaler.n_features() != self.forest.n_features() {
            return Some(format!(
                "scaler covers {} features, ensemble expects {}",
                self.scaler.n_features(),
                self.forest.n_features()
            ));
        }
        if self.mapping.n_classes() != self.forest.n_classes() {
            return Some(format!(
                "label mapping covers {} classes, ensemble expects {}",
                self.mapping.n_classes(),
                self.forest.n_classes()
            ));
        }
        if !self
            .mapping
            .labels()
            .windows(2)
            .all(|pair| pair[0] < pair[1])
        {
            return Some("label mapping is not a strictly ordered bijection".to_string());
        }
        None
    }

    /// Serialize the bundle to a versioned binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`RfError::SerializeBundle`] | encoding failed |
    /// | [`RfError::WriteBundle`] | the file could not be written |
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), RfError> {
        let envelope = BundleEnvelope {
            format_version: FORMAT_VERSION,
            bundle: self.clone(),
        };
        let bytes = bincode::serialize(&envelope)
            .map_err(|source| RfError::SerializeBundle { source })?;
        fs::write(path, &bytes).map_err(|source| RfError::WriteBundle {
            path: path.to_path_buf(),
            source,
        })?;
        info!(n_bytes = bytes.len(), "artifact bundle saved");
        Ok(())
    }

    /// Load and fully validate a bundle from disk.
    ///
    /// A bundle never loads partially initialized: undecodable bytes, an
    /// unknown format version, and cross-field disagreements all fail as
    /// [`RfError::CorruptArtifact`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`RfError::ReadBundle`] | the file could not be read |
    /// | [`RfError::CorruptArtifact`] | the contents are not a valid bundle |
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, RfError> {
        let bytes = fs::read(path).map_err(|source| RfError::ReadBundle {
            path: path.to_path_buf(),
            source,
        })?;
        let envelope: BundleEnvelope =
            bincode::deserialize(&bytes).map_err(|source| RfError::CorruptArtifact {
                path: path.to_path_buf(),
                reason: format!("undecodable bundle envelope: {source}"),
            })?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(RfError::CorruptArtifact {
                path: path.to_path_buf(),
                reason: format!(
                    "format version {} (this build reads {FORMAT_VERSION})",
                    envelope.format_version
                ),
            });
        }
        let bundle = envelope.bundle;
        if let Some(reason) = bundle.consistency_defect() {
            return Err(RfError::CorruptArtifact {
                path: path.to_path_buf(),
                reason,
            });
        }
        info!(
            n_trees = bundle.forest.n_trees(),
            n_classes = bundle.forest.n_classes(),
            "artifact bundle loaded"
        );
        Ok(bundle)
    }

    /// Classify one raw (unscaled) indicator row.
    ///
    /// Applies the bundled scaler, takes the ensemble's majority vote, and
    /// decodes the winning code back to its label.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`RfError::Prep`] | `raw_row` has the wrong width |
    /// | [`RfError::PredictionFeatureMismatch`] | scaled width disagrees with the forest |
    pub fn classify(&self, raw_row: &[f64]) -> Result<Prediction, RfError> {
        let scaled = self.scaler.transform_row(raw_row)?;
        let code = self.forest.predict(&scaled)?;
        let distribution = self.forest.predict_proba(&scaled)?;
        let label = self.mapping.decode(code)?.to_string();
        Ok(Prediction {
            label,
            code,
            probabilities: distribution.as_slice().to_vec(),
        })
    }

    /// Borrow the bundled forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Borrow the bundled scaler.
    #[must_use]
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Borrow the bundled label mapping.
    #[must_use]
    pub fn mapping(&self) -> &LabelMapping {
        &self.mapping
    }

    /// Return the feature column names, in training order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}
