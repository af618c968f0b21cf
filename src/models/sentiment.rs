use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    datasets::Dataset,
    pipelines::text_classification::{Estimator, Item, Model, SentimentPrediction, TrainingError},
};

use super::{
    artifact::Artifact,
    featurizer::{self, TextFeaturizer},
    gbdt::{self, GradientBoostedTrees},
};

/// The fitted pipeline: text featurization followed by boosted trees
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentModel {
    featurizer: TextFeaturizer,
    classifier: GradientBoostedTrees,
}

impl SentimentModel {
    /// The n-grams the classifier leans on most, with their total split gain
    pub fn top_features(&self, n: usize) -> Vec<(String, f64)> {
        self.classifier
            .feature_importance()
            .into_iter()
            .take(n)
            .map(|(feature, gain)| {
                let name = self
                    .featurizer
                    .feature_name(feature)
                    .unwrap_or("<unknown>")
                    .to_string();

                (name, gain)
            })
            .collect()
    }

    /// Number of boosted trees
    pub fn num_trees(&self) -> usize {
        self.classifier.num_trees()
    }

}

impl Model for SentimentModel {
    fn predict<I: Item>(&self, item: &I) -> SentimentPrediction {
        let features = self.featurizer.transform(item.text());

        SentimentPrediction::from_score(self.classifier.predict_score(&features))
    }
}

impl Artifact for SentimentModel {
    const KIND: &'static str = "sentiment-analysis/text-classifier";
    const VERSION: u32 = 1;

    fn validate(&self) -> Result<(), String> {
        self.classifier.validate(self.featurizer.dimension())
    }
}

/// The unfitted pipeline and its hyper-parameters
#[derive(Clone, Debug, Default, PartialEq, new)]
pub struct SentimentEstimator {
    /// Featurizer settings
    pub featurizer: featurizer::Config,

    /// Boosting settings
    pub booster: gbdt::Config,
}

impl SentimentEstimator {
    /// Take the pipeline settings from the top-level configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.featurizer.clone(), config.booster.clone())
    }
}

impl<I: Item> Estimator<I> for SentimentEstimator {
    type Model = SentimentModel;

    fn fit<D: Dataset<I>>(&self, dataset: &D) -> Result<SentimentModel, TrainingError> {
        let items: Vec<I> = dataset.iter().collect();
        let featurizer = TextFeaturizer::fit(&self.featurizer, items.iter().map(Item::text))?;

        log::info!("Featurized text into {} features", featurizer.dimension());

        let rows: Vec<_> = items
            .iter()
            .map(|item| featurizer.transform(item.text()))
            .collect();
        let labels: Vec<bool> = items.iter().map(Item::label).collect();

        let classifier =
            GradientBoostedTrees::fit(&self.booster, &rows, &labels, featurizer.dimension())?;

        log::info!("Fitted {} trees", classifier.num_trees());

        Ok(SentimentModel {
            featurizer,
            classifier,
        })
    }
}
