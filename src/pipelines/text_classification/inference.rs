use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::de::DeserializeOwned;

use crate::{
    datasets::wikidetox::SentimentIssue,
    models::artifact::{self, Artifact, ArtifactError},
};

use super::{Model, SentimentPrediction};

/// Holds a fitted model for repeated single-sentence predictions.
///
/// The model is loaded once and shared read-only. It only changes on an explicit [`reload`].
///
/// [`reload`]: Predictor::reload
pub struct Predictor<M> {
    model: Arc<M>,
    model_path: Option<PathBuf>,
}

impl<M: Model> Predictor<M> {
    /// Wrap an in-memory model. Such a predictor has no artifact to reload from.
    pub fn from_model(model: M) -> Self {
        Self {
            model: Arc::new(model),
            model_path: None,
        }
    }

    /// Score one sentence
    pub fn predict(&self, text: &str) -> SentimentPrediction {
        let issue = SentimentIssue::unlabeled(text);

        self.model.predict(&issue)
    }

    /// A shared handle to the current model
    pub fn model(&self) -> Arc<M> {
        Arc::clone(&self.model)
    }

    /// The artifact this predictor was loaded from, if any
    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }
}

impl<M: Model + Artifact + DeserializeOwned> Predictor<M> {
    /// Load the model artifact at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let model = artifact::load(path)?;

        Ok(Self {
            model: Arc::new(model),
            model_path: Some(path.to_path_buf()),
        })
    }

    /// Re-read the artifact from disk. On failure the current model is kept.
    pub fn reload(&mut self) -> Result<(), ArtifactError> {
        let Some(path) = self.model_path.as_deref() else {
            return Err(ArtifactError::NoSource);
        };

        let model = artifact::load(path)?;
        self.model = Arc::new(model);

        log::info!("Reloaded model from {}", path.display());

        Ok(())
    }
}
