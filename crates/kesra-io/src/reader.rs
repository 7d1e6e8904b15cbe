//! CSV dataset reader with full schema validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{Dataset, FEATURE_COLUMNS, FEATURE_NON_NEGATIVE, LABEL_COLUMN};

/// Reads region welfare records from a CSV file.
///
/// Expected CSV format:
/// - Header row required; columns are located by name, so column order and
///   extra columns (region name, observation period, and the like) are
///   irrelevant
/// - The four indicator columns of [`FEATURE_COLUMNS`] and the
///   [`LABEL_COLUMN`] column must all be present
/// - One row per region-period observation
///
/// A row failing validation fails the whole load; rows are never skipped.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::DataNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | Required column absent from the header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::MalformedValue`] | Indicator cell unparseable, NaN, or Inf |
/// | [`IoError::NegativeValue`] | Count-style indicator below zero |
/// | [`IoError::MissingLabel`] | Label cell empty or whitespace |
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        // 1. Open file (DataNotFound on failure)
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::DataNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // 2. Build CSV reader with headers.
        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        // 3. Read header and locate the required columns by name
        let header = rdr.headers().map_err(|e| IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let expected_cols = header.len();

        let mut feature_positions = [0usize; FEATURE_COLUMNS.len()];
        for (slot, &column) in feature_positions.iter_mut().zip(FEATURE_COLUMNS.iter()) {
            *slot = header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column,
                })?;
        }
        let label_position = header
            .iter()
            .position(|h| h == LABEL_COLUMN)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: LABEL_COLUMN,
            })?;
        debug!(expected_cols, label_position, "located schema columns");

        // 4. Iterate rows with validation
        let mut feature_rows = Vec::new();
        let mut labels = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            // Check column count consistency
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            // Parse indicator values in canonical column order
            let mut row = Vec::with_capacity(FEATURE_COLUMNS.len());
            for (feature_index, &position) in feature_positions.iter().enumerate() {
                let column = FEATURE_COLUMNS[feature_index];
                let raw = record.get(position).unwrap_or("");
                let value: f64 = raw.parse().map_err(|_| IoError::MalformedValue {
                    path: self.path.clone(),
                    row_index,
                    column,
                    raw: raw.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(IoError::MalformedValue {
                        path: self.path.clone(),
                        row_index,
                        column,
                        raw: raw.to_string(),
                    });
                }
                if FEATURE_NON_NEGATIVE[feature_index] && value < 0.0 {
                    return Err(IoError::NegativeValue {
                        path: self.path.clone(),
                        row_index,
                        column,
                        value,
                    });
                }
                row.push(value);
            }

            // Extract the welfare-class label
            let label = record.get(label_position).unwrap_or("").trim();
            if label.is_empty() {
                return Err(IoError::MissingLabel {
                    path: self.path.clone(),
                    row_index,
                });
            }

            feature_rows.push(row);
            labels.push(label.to_string());
        }

        // 5. Check for empty dataset
        if feature_rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let dataset = Dataset::new(feature_rows, labels);
        info!(
            n_rows = dataset.n_rows(),
            n_classes = dataset.class_distribution().len(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}
