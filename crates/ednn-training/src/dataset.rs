use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Stable identifier for a dataset (content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One (features, target) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features: Vec<f64>,
    pub target: f64,
}

/// Immutable tabular regression dataset loaded from CSV.
///
/// Every column must be numeric. The target is `target_column` when given,
/// otherwise the last column.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    source: PathBuf,
    id: DatasetId,
    feature_names: Vec<String>,
    target_name: String,
    samples: Vec<Sample>,
}

#[must_use]
pub fn compute_dataset_id(bytes: &[u8]) -> DatasetId {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    DatasetId(hex::encode(hasher.finalize()))
}

impl TabularDataset {
    pub fn from_csv(path: &Path, target_column: Option<&str>) -> TrainingResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            TrainingError::Dataset(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut dataset = Self::from_bytes(&bytes, target_column)?;
        dataset.source = path.to_path_buf();
        Ok(dataset)
    }

    /// Reads the whole input so the id covers every byte, header included.
    pub fn from_reader<R: std::io::Read>(mut reader: R, target_column: Option<&str>) -> TrainingResult<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes, target_column)
    }

    fn from_bytes(bytes: &[u8], target_column: Option<&str>) -> TrainingResult<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).flexible(true).trim(csv::Trim::All).from_reader(bytes);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.len() < 2 {
            return Err(TrainingError::Dataset(format!(
                "expected at least one feature column and one target column, found {} column(s)",
                headers.len()
            )));
        }

        let target_idx = match target_column {
            Some(name) => headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TrainingError::Dataset(format!("target column {name:?} not found in header")))?,
            None => headers.len() - 1,
        };

        let mut samples = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);
            if record.len() != headers.len() {
                return Err(TrainingError::Dataset(format!(
                    "line {line}: expected {} fields, found {}",
                    headers.len(),
                    record.len()
                )));
            }

            let mut features = Vec::with_capacity(headers.len() - 1);
            let mut target = 0.0;
            for (col, field) in record.iter().enumerate() {
                let value: f64 = field.parse().map_err(|_| {
                    TrainingError::Dataset(format!("line {line}: column {:?} is not numeric: {field:?}", headers[col]))
                })?;
                if col == target_idx {
                    target = value;
                } else {
                    features.push(value);
                }
            }
            samples.push(Sample { features, target });
        }

        if samples.is_empty() {
            return Err(TrainingError::Dataset("dataset must not be empty".to_string()));
        }

        let mut feature_names = headers.clone();
        let target_name = feature_names.remove(target_idx);

        Ok(Self {
            source: PathBuf::new(),
            id: compute_dataset_id(bytes),
            feature_names,
            target_name,
            samples,
        })
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub fn id(&self) -> &DatasetId {
        &self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.feature_names.len()
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }
}
