//! JSON report and chart-payload writer for training artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::RunName;

/// Writes the metrics report and chart payloads to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{run}_metrics.json`,
/// `{run}_confusion_matrix.json`, `{run}_feature_importance.json`,
/// `{run}_class_metrics.json`, and `{run}_tree_diagram.json`; the model
/// bundle belongs at [`bundle_path`](Self::bundle_path).
///
/// The writer deals in primitives and serializable payloads only — it has
/// no dependency on the model crates.
pub struct ReportWriter {
    output_dir: PathBuf,
    run: RunName,
}

impl ReportWriter {
    /// Create a new writer targeting the given directory and run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), run = %run))]
    pub fn new(output_dir: &Path, run: RunName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            run,
        })
    }

    /// Write the metrics report to `{run}_metrics.json`.
    ///
    /// The `classification_report` field carries per-class entries keyed by
    /// label, each with precision/recall/f1-score/support, plus `accuracy`,
    /// `macro avg`, and `weighted avg` rows — the layout downstream
    /// dashboards already parse.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_metrics(
        &self,
        accuracy: f64,
        class_rows: &[(&str, f64, f64, f64, usize)], // (label, precision, recall, f1, support)
        macro_avg: (f64, f64, f64, usize),           // (precision, recall, f1, support)
        weighted_avg: (f64, f64, f64, usize),
    ) -> Result<(), IoError> {
        let path = self.metrics_path();

        let mut report: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        for &(label, precision, recall, f1, support) in class_rows {
            report.insert(label.to_string(), metric_row(precision, recall, f1, support));
        }
        report.insert("accuracy".to_string(), json!(accuracy));
        report.insert(
            "macro avg".to_string(),
            metric_row(macro_avg.0, macro_avg.1, macro_avg.2, macro_avg.3),
        );
        report.insert(
            "weighted avg".to_string(),
            metric_row(weighted_avg.0, weighted_avg.1, weighted_avg.2, weighted_avg.3),
        );

        let artifact = MetricsArtifact {
            run: self.run.as_str(),
            accuracy,
            classification_report: report,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "metrics report written");
        Ok(())
    }

    /// Write the labeled confusion matrix to `{run}_confusion_matrix.json`.
    ///
    /// `matrix[actual][predicted]`, with `labels` naming both axes in order.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_confusion_matrix(
        &self,
        labels: &[String],
        matrix: &[Vec<usize>],
    ) -> Result<(), IoError> {
        let path = self.confusion_matrix_path();

        let n_test = matrix.iter().flatten().sum();
        let artifact = ConfusionArtifact {
            run: self.run.as_str(),
            labels,
            matrix,
            n_test,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "confusion matrix written");
        Ok(())
    }

    /// Write ranked feature importances to `{run}_feature_importance.json`.
    ///
    /// Entries are written in the order given (callers pass them rank-sorted).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_feature_importance(
        &self,
        features: &[(&str, f64, usize)], // (name, importance, rank)
    ) -> Result<(), IoError> {
        let path = self.feature_importance_path();

        let entries: Vec<FeatureEntry> = features
            .iter()
            .map(|&(name, importance, rank)| FeatureEntry {
                name,
                importance,
                rank,
            })
            .collect();

        let artifact = ImportanceArtifact {
            run: self.run.as_str(),
            features: entries,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "feature importances written");
        Ok(())
    }

    /// Write the per-class metric comparison table to `{run}_class_metrics.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_class_metrics(
        &self,
        class_rows: &[(&str, f64, f64, f64, usize)], // (label, precision, recall, f1, support)
    ) -> Result<(), IoError> {
        let path = self.class_metrics_path();

        let classes: Vec<ClassEntry> = class_rows
            .iter()
            .map(|&(label, precision, recall, f1, support)| ClassEntry {
                label,
                precision,
                recall,
                f1,
                support,
            })
            .collect();

        let artifact = ClassMetricsArtifact {
            run: self.run.as_str(),
            classes,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "class metrics written");
        Ok(())
    }

    /// Write a serializable tree-structure payload to `{run}_tree_diagram.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::SerializeJson`] if the payload cannot be serialized
    /// and [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_tree_diagram<S: Serialize>(&self, diagram: &S) -> Result<(), IoError> {
        let path = self.tree_diagram_path();

        let artifact = DiagramArtifact {
            run: self.run.as_str(),
            diagram,
        };

        let json =
            serde_json::to_string_pretty(&artifact).map_err(|e| IoError::SerializeJson {
                what: "tree_diagram",
                source: e,
            })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "tree diagram written");
        Ok(())
    }

    /// Return the path of the metrics report.
    #[must_use]
    pub fn metrics_path(&self) -> PathBuf {
        self.artifact_path("metrics.json")
    }

    /// Return the path of the confusion matrix payload.
    #[must_use]
    pub fn confusion_matrix_path(&self) -> PathBuf {
        self.artifact_path("confusion_matrix.json")
    }

    /// Return the path of the feature importance payload.
    #[must_use]
    pub fn feature_importance_path(&self) -> PathBuf {
        self.artifact_path("feature_importance.json")
    }

    /// Return the path of the class metrics payload.
    #[must_use]
    pub fn class_metrics_path(&self) -> PathBuf {
        self.artifact_path("class_metrics.json")
    }

    /// Return the path of the tree diagram payload.
    #[must_use]
    pub fn tree_diagram_path(&self) -> PathBuf {
        self.artifact_path("tree_diagram.json")
    }

    /// Return the path where the artifact bundle should be saved.
    ///
    /// Does not write anything — just computes `{output_dir}/{run}_bundle.bin`.
    #[must_use]
    pub fn bundle_path(&self) -> PathBuf {
        self.artifact_path("bundle.bin")
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.run.as_str()))
    }
}

fn metric_row(precision: f64, recall: f64, f1: f64, support: usize) -> serde_json::Value {
    json!({
        "precision": precision,
        "recall": recall,
        "f1-score": f1,
        "support": support,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct MetricsArtifact<'a> {
    run: &'a str,
    accuracy: f64,
    classification_report: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize)]
struct ConfusionArtifact<'a> {
    run: &'a str,
    labels: &'a [String],
    matrix: &'a [Vec<usize>],
    n_test: usize,
}

#[derive(Serialize)]
struct ImportanceArtifact<'a> {
    run: &'a str,
    features: Vec<FeatureEntry<'a>>,
}

#[derive(Serialize)]
struct FeatureEntry<'a> {
    name: &'a str,
    importance: f64,
    rank: usize,
}

#[derive(Serialize)]
struct ClassMetricsArtifact<'a> {
    run: &'a str,
    classes: Vec<ClassEntry<'a>>,
}

#[derive(Serialize)]
struct ClassEntry<'a> {
    label: &'a str,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

#[derive(Serialize)]
struct DiagramArtifact<'a, S> {
    run: &'a str,
    diagram: &'a S,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_writer(dir: &Path, run: &str) -> ReportWriter {
        ReportWriter::new(dir, RunName::new(run.into()).unwrap()).unwrap()
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn write_metrics_json_structure() {
        let dir = TempDir::new().unwrap();
        let writer = test_writer(dir.path(), "metrics_test");

        let class_rows = [
            ("Rendah", 1.0, 0.5, 2.0 / 3.0, 2),
            ("Sedang", 0.5, 1.0, 2.0 / 3.0, 1),
            ("Tinggi", 1.0, 1.0, 1.0, 3),
        ];
        writer
            .write_metrics(
                5.0 / 6.0,
                &class_rows,
                (5.0 / 6.0, 5.0 / 6.0, 7.0 / 9.0, 6),
                (11.0 / 12.0, 5.0 / 6.0, 8.0 / 9.0, 6),
            )
            .unwrap();

        let path = dir.path().join("metrics_test_metrics.json");
        assert!(path.exists());
        let content = read_json(&path);

        assert_eq!(content["run"], "metrics_test");
        assert!((content["accuracy"].as_f64().unwrap() - 5.0 / 6.0).abs() < 1e-12);

        let report = content["classification_report"].as_object().unwrap();
        assert_eq!(report.len(), 6); // 3 classes + accuracy + macro avg + weighted avg
        assert!((report["Rendah"]["f1-score"].as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report["Rendah"]["support"], 2);
        assert_eq!(report["accuracy"], content["accuracy"]);
        assert!(report["macro avg"]["precision"].is_number());
        assert_eq!(report["weighted avg"]["support"], 6);
    }

    #[test]
    fn write_confusion_matrix_structure() {
        let dir = TempDir::new().unwrap();
        let writer = test_writer(dir.path(), "cm_test");

        let labels = vec!["Rendah".to_string(), "Tinggi".to_string()];
        let matrix = vec![vec![3, 1], vec![0, 2]];
        writer.write_confusion_matrix(&labels, &matrix).unwrap();

        let content = read_json(&dir.path().join("cm_test_confusion_matrix.json"));
        assert_eq!(content["labels"].as_array().unwrap().len(), 2);
        assert_eq!(content["labels"][1], "Tinggi");
        assert_eq!(content["matrix"][0][1], 1);
        assert_eq!(content["n_test"], 6);
    }

    #[test]
    fn write_feature_importance_preserves_order() {
        let dir = TempDir::new().unwrap();
        let writer = test_writer(dir.path(), "fi_test");

        let features = [
            ("pdrb_total_adhk", 0.5, 1),
            ("jumlah_penduduk_miskin", 0.3, 2),
            ("harapan_lama_sekolah", 0.2, 3),
        ];
        writer.write_feature_importance(&features).unwrap();

        let content = read_json(&dir.path().join("fi_test_feature_importance.json"));
        let entries = content["features"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["name"], "pdrb_total_adhk");
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[2]["rank"], 3);
    }

    #[test]
    fn write_class_metrics_structure() {
        let dir = TempDir::new().unwrap();
        let writer = test_writer(dir.path(), "classes_test");

        let rows = [("Rendah", 0.9, 0.8, 0.85, 10), ("Tinggi", 0.7, 0.6, 0.65, 5)];
        writer.write_class_metrics(&rows).unwrap();

        let content = read_json(&dir.path().join("classes_test_class_metrics.json"));
        let classes = content["classes"].as_array().unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0]["label"], "Rendah");
        assert!((classes[1]["f1"].as_f64().unwrap() - 0.65).abs() < 1e-12);
        assert_eq!(classes[1]["support"], 5);
    }

    #[test]
    fn write_tree_diagram_passes_payload_through() {
        let dir = TempDir::new().unwrap();
        let writer = test_writer(dir.path(), "diagram_test");

        let payload = json!({
            "tree_index": 0,
            "max_depth": 3,
            "root": { "kind": "leaf", "label": "Tinggi", "n_samples": 12 },
        });
        writer.write_tree_diagram(&payload).unwrap();

        let content = read_json(&dir.path().join("diagram_test_tree_diagram.json"));
        assert_eq!(content["run"], "diagram_test");
        assert_eq!(content["diagram"]["root"]["kind"], "leaf");
        assert_eq!(content["diagram"]["max_depth"], 3);
    }

    #[test]
    fn writer_creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("reports").join("2024");
        let writer = test_writer(&nested, "nested_test");

        writer.write_class_metrics(&[("Rendah", 1.0, 1.0, 1.0, 1)]).unwrap();
        assert!(nested.join("nested_test_class_metrics.json").exists());
    }

    #[test]
    fn bundle_path_uses_run_prefix() {
        let dir = TempDir::new().unwrap();
        let writer = test_writer(dir.path(), "bp_test");
        assert_eq!(
            writer.bundle_path(),
            dir.path().join("bp_test_bundle.bin")
        );
    }
}
