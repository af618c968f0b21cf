use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::SentimentPrediction;

/// Probabilities are clamped this far from 0 and 1 before taking logs
const LOG_LOSS_EPSILON: f64 = 1e-15;

/// Evaluation results for a binary classifier over a labeled test set
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryClassificationMetrics {
    /// Number of evaluated rows
    pub count: usize,

    /// Toxic rows predicted toxic
    pub true_positives: usize,

    /// Non-toxic rows predicted toxic
    pub false_positives: usize,

    /// Non-toxic rows predicted non-toxic
    pub true_negatives: usize,

    /// Toxic rows predicted non-toxic
    pub false_negatives: usize,

    /// Fraction of rows predicted correctly
    pub accuracy: f64,

    /// Area under the ROC curve. `None` when the test set holds only one class.
    pub auc: Option<f64>,

    /// Harmonic mean of positive precision and recall
    pub f1_score: f64,

    /// Precision of toxic predictions
    pub positive_precision: f64,

    /// Recall of toxic rows
    pub positive_recall: f64,

    /// Precision of non-toxic predictions
    pub negative_precision: f64,

    /// Recall of non-toxic rows
    pub negative_recall: f64,

    /// Mean cross-entropy of the predicted probabilities
    pub log_loss: f64,

    /// Relative improvement of the log-loss over always predicting the label prior
    pub log_loss_reduction: f64,

    /// Entropy of the label prior
    pub entropy: f64,
}

impl BinaryClassificationMetrics {
    /// Compute metrics from `(ground truth, prediction)` pairs
    pub fn evaluate(outcomes: &[(bool, SentimentPrediction)]) -> Self {
        if outcomes.is_empty() {
            return Self::default();
        }

        let mut metrics = Self {
            count: outcomes.len(),
            ..Self::default()
        };

        let mut log_loss = 0.0;

        for (label, prediction) in outcomes {
            match (*label, prediction.predicted_label) {
                (true, true) => metrics.true_positives += 1,
                (false, true) => metrics.false_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_negatives += 1,
            }

            let p = f64::from(prediction.probability).clamp(LOG_LOSS_EPSILON, 1.0 - LOG_LOSS_EPSILON);
            log_loss -= if *label { p.ln() } else { (1.0 - p).ln() };
        }

        let n = metrics.count as f64;
        let tp = metrics.true_positives;
        let fp = metrics.false_positives;
        let tn = metrics.true_negatives;
        let fn_ = metrics.false_negatives;

        metrics.accuracy = (tp + tn) as f64 / n;
        metrics.positive_precision = ratio(tp, tp + fp);
        metrics.positive_recall = ratio(tp, tp + fn_);
        metrics.negative_precision = ratio(tn, tn + fn_);
        metrics.negative_recall = ratio(tn, tn + fp);

        let precision_recall = metrics.positive_precision + metrics.positive_recall;
        metrics.f1_score = if precision_recall > 0.0 {
            2.0 * metrics.positive_precision * metrics.positive_recall / precision_recall
        } else {
            0.0
        };

        metrics.log_loss = log_loss / n;

        let prior = (tp + fn_) as f64 / n;
        metrics.entropy = binary_entropy(prior);
        metrics.log_loss_reduction = if metrics.entropy > 0.0 {
            (metrics.entropy - metrics.log_loss) / metrics.entropy
        } else {
            0.0
        };

        metrics.auc = area_under_roc(outcomes);

        metrics
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }

    -(p * p.ln() + (1.0 - p) * (1.0 - p).ln())
}

/// Mann-Whitney estimate of the AUC, with tied scores sharing their average rank
fn area_under_roc(outcomes: &[(bool, SentimentPrediction)]) -> Option<f64> {
    let positives = outcomes.iter().filter(|(label, _)| *label).count();
    let negatives = outcomes.len() - positives;

    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut ranked: Vec<(f64, bool)> = outcomes
        .iter()
        .map(|(label, prediction)| (prediction.score, *label))
        .collect();
    ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;

    while start < ranked.len() {
        let mut end = start + 1;
        while end < ranked.len() && ranked[end].0 == ranked[start].0 {
            end += 1;
        }

        // Ranks are 1-based; the tied block [start, end) shares the mean rank.
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = ranked[start..end].iter().filter(|(_, label)| *label).count();
        positive_rank_sum += average_rank * tied_positives as f64;

        start = end;
    }

    let p = positives as f64;
    let auc = (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64);

    Some(auc)
}
