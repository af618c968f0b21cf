//! Gradient-boosted decision trees for binary classification.
//!
//! Trees are grown leaf-wise over histogram-binned features and fitted to the gradient of the
//! logistic loss. Training is fully deterministic: there is no row or feature sampling, and
//! ties between equally good splits go to the lowest feature index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipelines::text_classification::{output::sigmoid, TrainingError};

use super::featurizer::SparseVector;

/// Histogram binning of feature values
pub mod binning;

/// Regression trees and the leaf-wise tree builder
pub mod tree;

pub use tree::Tree;

use binning::BinMapper;
use tree::TreeBuilder;

/// Boosting settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of boosting rounds
    pub num_trees: usize,

    /// Maximum leaves per tree
    pub num_leaves: usize,

    /// Minimum training rows in a leaf
    pub min_data_in_leaf: usize,

    /// Shrinkage applied to every leaf value
    pub learning_rate: f64,

    /// Maximum histogram bins per feature, including the zero bin
    pub max_bins: usize,

    /// L2 penalty on leaf values
    pub l2_regularization: f64,

    /// Minimum gain for a split to be taken
    pub min_split_gain: f64,

    /// Minimum hessian sum in a leaf
    pub min_child_weight: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_trees: 100,
            num_leaves: 20,
            min_data_in_leaf: 10,
            learning_rate: 0.2,
            max_bins: 64,
            l2_regularization: 1.0,
            min_split_gain: 0.0,
            min_child_weight: 1e-3,
        }
    }
}

impl Config {
    /// Set the number of trees
    pub fn with_num_trees(mut self, num_trees: usize) -> Self {
        self.num_trees = num_trees;
        self
    }

    /// Set the maximum leaves per tree
    pub fn with_num_leaves(mut self, num_leaves: usize) -> Self {
        self.num_leaves = num_leaves;
        self
    }

    /// Set the minimum rows per leaf
    pub fn with_min_data_in_leaf(mut self, min_data_in_leaf: usize) -> Self {
        self.min_data_in_leaf = min_data_in_leaf;
        self
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    fn validate(&self) -> Result<(), TrainingError> {
        let invalid = |message: &str| Err(TrainingError::InvalidConfig(message.to_string()));

        if self.num_trees == 0 {
            return invalid("num_trees must be positive");
        }
        if self.num_leaves < 2 {
            return invalid("num_leaves must be at least 2");
        }
        if self.min_data_in_leaf == 0 {
            return invalid("min_data_in_leaf must be positive");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid("learning_rate must be a positive number");
        }
        if !(2..=usize::from(u16::MAX)).contains(&self.max_bins) {
            return invalid("max_bins must be between 2 and 65535");
        }
        if !(self.l2_regularization.is_finite() && self.l2_regularization >= 0.0) {
            return invalid("l2_regularization must be non-negative");
        }

        Ok(())
    }
}

/// A fitted boosted-tree binary classifier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    /// Initial log-odds, from the training label prior
    bias: f64,

    /// Additive trees, applied in order
    trees: Vec<Tree>,

    /// Total split gain per feature
    importance: BTreeMap<u32, f64>,
}

impl GradientBoostedTrees {
    /// Fit trees to sparse rows and their labels
    pub fn fit(
        config: &Config,
        rows: &[SparseVector],
        labels: &[bool],
        dimension: usize,
    ) -> Result<Self, TrainingError> {
        config.validate()?;

        if rows.len() != labels.len() {
            return Err(TrainingError::InvalidConfig(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let positives = labels.iter().filter(|label| **label).count();
        match labels.first() {
            None => return Err(TrainingError::TooFewExamples(0)),
            Some(&label) if positives == 0 || positives == labels.len() => {
                return Err(TrainingError::SingleClass(label))
            }
            _ => {}
        }

        let n = rows.len();
        let prior = positives as f64 / n as f64;
        let bias = (prior / (1.0 - prior)).ln();
        let targets: Vec<f64> = labels.iter().map(|&y| if y { 1.0 } else { 0.0 }).collect();

        let bins = BinMapper::fit(rows, dimension, config.max_bins);
        let binned: Vec<_> = rows.iter().map(|row| bins.bin_row(row)).collect();
        let mut builder = TreeBuilder::new(config, &bins, &binned, dimension);

        let mut scores = vec![bias; n];
        let mut gradients = vec![0.0; n];
        let mut hessians = vec![0.0; n];
        let mut trees = Vec::with_capacity(config.num_trees);
        let mut importance = BTreeMap::new();

        for round in 0..config.num_trees {
            for i in 0..n {
                let p = sigmoid(scores[i]);
                gradients[i] = p - targets[i];
                hessians[i] = (p * (1.0 - p)).max(1e-16);
            }

            let grown = builder.grow(&gradients, &hessians);

            if grown.gains.is_empty() {
                log::info!("Stopping after {} trees: no leaf can be split further", round);
                break;
            }

            for (value, leaf_rows) in &grown.leaves {
                for &row in leaf_rows {
                    scores[row] += value;
                }
            }

            for (feature, gain) in grown.gains {
                *importance.entry(feature).or_insert(0.0) += gain;
            }

            trees.push(grown.tree);

            if log::log_enabled!(log::Level::Debug) {
                log::debug!("tree {:>4}: training log-loss {:.5}", round + 1, log_loss(&scores, &targets));
            }
        }

        Ok(Self {
            bias,
            trees,
            importance,
        })
    }

    /// Raw log-odds for one row
    pub fn predict_score(&self, row: &SparseVector) -> f64 {
        self.trees
            .iter()
            .fold(self.bias, |score, tree| score + tree.predict(row))
    }

    /// Number of fitted trees
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Features ordered by total split gain, highest first
    pub fn feature_importance(&self) -> Vec<(u32, f64)> {
        let mut ranked: Vec<(u32, f64)> = self.importance.iter().map(|(f, g)| (*f, *g)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        ranked
    }

    /// Check structural consistency after deserializing
    pub fn validate(&self, dimension: usize) -> Result<(), String> {
        if !self.bias.is_finite() {
            return Err("bias is not finite".to_string());
        }

        for (i, tree) in self.trees.iter().enumerate() {
            if !tree.is_well_formed() {
                return Err(format!("tree {i} has invalid child links"));
            }
        }

        if let Some(feature) = self.importance.keys().find(|f| **f as usize >= dimension) {
            return Err(format!("feature {feature} is outside the vocabulary"));
        }

        Ok(())
    }
}

fn log_loss(scores: &[f64], targets: &[f64]) -> f64 {
    let total: f64 = scores
        .iter()
        .zip(targets)
        .map(|(&score, &y)| {
            let p = sigmoid(score).clamp(1e-15, 1.0 - 1e-15);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();

    total / scores.len() as f64
}
