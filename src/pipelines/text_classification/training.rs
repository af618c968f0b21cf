use crate::{
    config::TrainingConfig,
    datasets::{train_test_split, Dataset},
};

use super::{BinaryClassificationMetrics, Estimator, Item, Model};

/// Split the dataset, fit the estimator on the training half, and evaluate on the rest.
///
/// Nothing is persisted; the caller decides whether to save the returned model.
pub fn train<I, D, E>(
    dataset: &D,             // The full labeled dataset
    config: &TrainingConfig, // Split settings
    estimator: &E,           // The unfitted pipeline
) -> Result<(E::Model, BinaryClassificationMetrics), TrainingError>
where
    I: Item + Clone + Send + Sync,
    D: Dataset<I>,
    E: Estimator<I>,
{
    if !(config.test_fraction > 0.0 && config.test_fraction < 1.0) {
        return Err(TrainingError::InvalidConfig(format!(
            "test_fraction must be between 0 and 1, got {}",
            config.test_fraction
        )));
    }

    let split = train_test_split(dataset, config.test_fraction, config.seed)
        .ok_or(TrainingError::TooFewExamples(dataset.len()))?;

    log::info!(
        "Split {} rows into {} for training and {} for testing (seed {})",
        dataset.len(),
        split.train.len(),
        split.test.len(),
        config.seed
    );

    log::info!("Training the model");
    let model = estimator.fit(&split.train)?;

    log::info!("Evaluating the model's accuracy with test data");
    let metrics = evaluate(&model, &split.test);

    log::info!(
        "accuracy: {:.4}, auc: {}, f1: {:.4}, log-loss: {:.4}",
        metrics.accuracy,
        metrics
            .auc
            .map(|auc| format!("{auc:.4}"))
            .unwrap_or_else(|| "n/a".to_string()),
        metrics.f1_score,
        metrics.log_loss
    );

    Ok((model, metrics))
}

/// Score every row of a labeled dataset
pub fn evaluate<I, D, M>(model: &M, dataset: &D) -> BinaryClassificationMetrics
where
    I: Item,
    D: Dataset<I>,
    M: Model,
{
    let outcomes: Vec<_> = dataset
        .iter()
        .map(|item| (item.label(), model.predict(&item)))
        .collect();

    BinaryClassificationMetrics::evaluate(&outcomes)
}

/// Training Error
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TrainingError {
    /// Not enough rows to hold out a test set
    #[error("at least 2 examples are required to train, got {0}")]
    TooFewExamples(usize),

    /// Every training row carries the same label
    #[error("training data contains a single class (label = {0})")]
    SingleClass(bool),

    /// Featurization produced no usable features
    #[error("no features survived featurization; the training texts are empty or too sparse")]
    EmptyVocabulary,

    /// A hyper-parameter is out of range
    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),
}
