use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Probability above which a text counts as toxic
pub const THRESHOLD: f32 = 0.5;

/// The result of scoring one text
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentPrediction {
    /// Whether the text is predicted toxic
    pub predicted_label: bool,

    /// Confidence that the text is toxic, in `[0, 1]`
    pub probability: f32,

    /// Raw model output (log-odds)
    pub score: f64,
}

impl SentimentPrediction {
    /// Build a prediction from a raw log-odds score
    pub fn from_score(score: f64) -> Self {
        let probability = sigmoid(score) as f32;

        Self {
            predicted_label: probability > THRESHOLD,
            probability,
            score,
        }
    }

    /// Build a prediction from a probability, deriving the label and a matching score
    pub fn from_probability(probability: f32) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        let p = f64::from(probability);

        Self {
            predicted_label: probability > THRESHOLD,
            probability,
            score: (p / (1.0 - p)).ln(),
        }
    }

    /// Human-readable label
    pub fn label_text(&self) -> &'static str {
        if self.predicted_label {
            "Toxic"
        } else {
            "Non Toxic"
        }
    }
}

/// A prediction alongside the text it was made for, formatted for the console
pub struct Report<'a> {
    /// The scored text
    pub text: &'a str,

    /// The prediction for it
    pub prediction: &'a SentimentPrediction,
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Text: {} | Prediction: {} sentiment | Probability: {} ",
            self.text,
            self.prediction.label_text(),
            self.prediction.probability
        )
    }
}

/// The logistic function, saturating cleanly for large magnitudes
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
