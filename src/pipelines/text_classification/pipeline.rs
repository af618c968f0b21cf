use crate::datasets::Dataset;

use super::{SentimentPrediction, TrainingError};

/// A labeled piece of text that can flow through the pipeline
pub trait Item {
    /// The text to classify
    fn text(&self) -> &str;

    /// The ground-truth label. Ignored at prediction time.
    fn label(&self) -> bool;
}

/// A fitted pipeline that can score single items
pub trait Model {
    /// Run single-example inference
    fn predict<I: Item>(&self, item: &I) -> SentimentPrediction;
}

/// An unfitted pipeline: featurization followed by a binary classifier
pub trait Estimator<I: Item> {
    /// The fitted pipeline produced by this estimator
    type Model: Model;

    /// Fit every stage of the pipeline to the given rows
    fn fit<D: Dataset<I>>(&self, dataset: &D) -> Result<Self::Model, TrainingError>;
}

impl<M: Model> Model for std::sync::Arc<M> {
    fn predict<I: Item>(&self, item: &I) -> SentimentPrediction {
        self.as_ref().predict(item)
    }
}
