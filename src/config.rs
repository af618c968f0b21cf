use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    models::{featurizer, gbdt},
    utils::files::write_atomic,
};

/// The default location of the labeled dataset, relative to the working directory
pub static DEFAULT_DATASET_PATH: &str = "data/wikiDetoxAnnotated40kRows.tsv";

/// The default location of the persisted model artifact, relative to the working directory
pub static DEFAULT_MODEL_PATH: &str = "data/models/SentimentModel.json";

/// Top-level configuration, passed explicitly to the trainer and the predictor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the tab-separated training data
    pub dataset_path: PathBuf,

    /// Path to the model artifact
    pub model_path: PathBuf,

    /// How rows are read from the dataset
    pub dataset: DatasetConfig,

    /// Train / test split and reproducibility settings
    pub training: TrainingConfig,

    /// Text featurization settings
    pub featurizer: featurizer::Config,

    /// Gradient boosting settings
    pub booster: gbdt::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            dataset: DatasetConfig::default(),
            training: TrainingConfig::default(),
            featurizer: featurizer::Config::default(),
            booster: gbdt::Config::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Unable to read config file {}: {}", path.display(), e))?;

        serde_json::from_str(&contents)
            .map_err(|e| anyhow!("Unable to parse config file {}: {}", path.display(), e))
    }

    /// Save the configuration as pretty-printed JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;

        write_atomic(path, contents.as_bytes())
            .map_err(|e| anyhow!("Unable to write config file {}: {}", path.display(), e))
    }

    /// Set the dataset path
    pub fn with_dataset_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.dataset_path = path.into();
        self
    }

    /// Set the model artifact path
    pub fn with_model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.model_path = path.into();
        self
    }
}

/// Column layout of the dataset file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Zero-based column holding the boolean label
    pub label_column: usize,

    /// Zero-based column holding the text
    pub text_column: usize,

    /// Whether the first row is a header
    pub has_header: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            label_column: 0,
            text_column: 2,
            has_header: true,
        }
    }
}

/// Train / test split settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,

    /// Seed for the shuffle that precedes the split
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 1,
        }
    }
}

impl TrainingConfig {
    /// Set the held-out fraction
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Set the split seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_config_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "model_path": "out/model.json", "training": { "seed": 7 } }"#)
            .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.model_path, PathBuf::from("out/model.json"));
        assert_eq!(config.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.test_fraction, 0.2);
        assert_eq!(config.dataset, DatasetConfig::default());
    }

    #[test]
    fn saved_config_loads_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::default()
            .with_dataset_path("somewhere/else.tsv")
            .with_model_path("somewhere/model.json");
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings/config.json");

        Config::default().save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn default_paths_resolve_against_the_working_directory() {
        let config = Config::default();

        assert!(config.dataset_path.is_relative());
        assert!(config.model_path.is_relative());
        assert_eq!(config.model_path, PathBuf::from("data/models/SentimentModel.json"));
    }

    #[test]
    fn unparseable_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        let err = Config::load(&path).unwrap_err();

        assert!(err.to_string().starts_with("Unable to parse config file"));
    }
}
