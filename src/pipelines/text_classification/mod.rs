/// Item and model traits for the pipeline
pub mod pipeline;

/// Prediction output
pub mod output;

/// Evaluation metrics
pub mod metrics;

/// Training
pub mod training;

/// Inference
pub mod inference;

pub use inference::Predictor;
pub use metrics::BinaryClassificationMetrics;
pub use output::SentimentPrediction;
pub use pipeline::{Estimator, Item, Model};
pub use training::{train, TrainingError};
