/// Persisting fitted models
pub mod artifact;

/// Text featurization
pub mod featurizer;

/// Gradient-boosted decision trees
pub mod gbdt;

/// The featurizer + boosted trees pipeline
pub mod sentiment;

pub use sentiment::{SentimentEstimator, SentimentModel};
