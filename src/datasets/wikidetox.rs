use std::{fs::File, io::Read, path::Path};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{config::DatasetConfig, pipelines::text_classification};

use super::{Dataset as _, DatasetError, InMemDataset};

/// A single sentence and whether it is toxic
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct SentimentIssue {
    /// Ground truth, only meaningful while training
    pub label: bool,

    /// The sentence to classify
    pub text: String,
}

impl SentimentIssue {
    /// Wrap free text for prediction, with a placeholder label
    pub fn unlabeled<S: Into<String>>(text: S) -> Self {
        Self::new(false, text.into())
    }
}

impl text_classification::Item for SentimentIssue {
    fn text(&self) -> &str {
        &self.text
    }

    fn label(&self) -> bool {
        self.label
    }
}

/// Struct for the WikiDetox dataset
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<SentimentIssue>,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("len", &self.dataset.len())
            .finish_non_exhaustive()
    }
}

impl super::Dataset<SentimentIssue> for Dataset {
    fn get(&self, index: usize) -> Option<SentimentIssue> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl Dataset {
    /// Load every row of a tab-separated file
    pub fn load<P: AsRef<Path>>(path: P, config: &DatasetConfig) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let dataset = Self::from_reader(file, config)?;
        if dataset.dataset.is_empty() {
            return Err(DatasetError::Empty(path.display().to_string()));
        }

        log::info!("Loaded {} rows from {}", dataset.dataset.len(), path.display());

        Ok(dataset)
    }

    /// Parse tab-separated rows from any reader. An empty result is not an error here.
    pub fn from_reader<R: Read>(reader: R, config: &DatasetConfig) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(config.has_header)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let mut items = Vec::new();

        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let column = |column: usize| {
                record
                    .get(column)
                    .ok_or(DatasetError::MissingColumn { line, column })
            };

            let raw_label = column(config.label_column)?;
            let label = parse_label(raw_label).ok_or_else(|| DatasetError::InvalidLabel {
                line,
                value: raw_label.to_string(),
            })?;
            let text = column(config.text_column)?;

            items.push(SentimentIssue::new(label, text.to_string()));
        }

        Ok(Self {
            dataset: InMemDataset::new(items),
        })
    }

    /// Borrow the underlying rows
    pub fn items(&self) -> &InMemDataset<SentimentIssue> {
        &self.dataset
    }
}

impl From<Vec<SentimentIssue>> for Dataset {
    fn from(items: Vec<SentimentIssue>) -> Self {
        Self {
            dataset: InMemDataset::new(items),
        }
    }
}

/// Read a boolean label the way common TSV exports spell it
pub fn parse_label(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "+1" | "yes" => Some(true),
        "false" | "0" | "-1" | "no" => Some(false),
        _ => None,
    }
}
