use std::io::{self, Write};

use derive_new::new;

use crate::pipelines::text_classification::{output::Report, BinaryClassificationMetrics, SentimentPrediction};

const RULE: &str = "==================================================";

/// Writes banners, metrics and prediction lines for console use
pub trait Renderer {
    /// A highlighted section title
    fn header(&mut self, title: &str) -> io::Result<()>;

    /// Evaluation metrics after training
    fn metrics(&mut self, metrics: &BinaryClassificationMetrics) -> io::Result<()>;

    /// The result of one prediction
    fn prediction(&mut self, text: &str, prediction: &SentimentPrediction) -> io::Result<()>;
}

/// A plain-text renderer over any writer
#[derive(new)]
pub struct Simple<W: Write> {
    out: W,
}

impl Simple<io::Stdout> {
    /// Render to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Simple<W> {
    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for Simple<W> {
    fn header(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "=============== {title} ===============")
    }

    fn metrics(&mut self, metrics: &BinaryClassificationMetrics) -> io::Result<()> {
        let auc = metrics
            .auc
            .map(percent)
            .unwrap_or_else(|| "n/a".to_string());

        writeln!(self.out, "*{}", "*".repeat(RULE.len() - 1))?;
        writeln!(self.out, "*       Metrics for binary classification model")?;
        writeln!(self.out, "*{}", "-".repeat(RULE.len() - 1))?;
        writeln!(self.out, "*       Test rows: {}", metrics.count)?;
        writeln!(self.out, "*       Accuracy: {}", percent(metrics.accuracy))?;
        writeln!(self.out, "*       Area Under Curve: {auc}")?;
        writeln!(self.out, "*       F1Score: {}", percent(metrics.f1_score))?;
        writeln!(self.out, "*       LogLoss: {:.2}", metrics.log_loss)?;
        writeln!(self.out, "*       LogLossReduction: {:.2}", metrics.log_loss_reduction)?;
        writeln!(self.out, "*       PositivePrecision: {:.2}", metrics.positive_precision)?;
        writeln!(self.out, "*       PositiveRecall: {:.2}", metrics.positive_recall)?;
        writeln!(self.out, "*       NegativePrecision: {:.2}", metrics.negative_precision)?;
        writeln!(self.out, "*       NegativeRecall: {:.2}", metrics.negative_recall)?;
        writeln!(self.out, "*{}", "*".repeat(RULE.len() - 1))
    }

    fn prediction(&mut self, text: &str, prediction: &SentimentPrediction) -> io::Result<()> {
        writeln!(self.out, "=============== Single Prediction  ===============")?;
        writeln!(self.out, "{}", Report { text, prediction })?;
        writeln!(self.out, "{RULE}")
    }
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render<F: FnOnce(&mut Simple<Vec<u8>>) -> io::Result<()>>(f: F) -> String {
        let mut renderer = Simple::new(Vec::new());
        f(&mut renderer).unwrap();

        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn prediction_block() {
        let prediction = SentimentPrediction::from_probability(0.25);

        let output = render(|r| r.prediction("nice work", &prediction));

        assert_eq!(
            output,
            "=============== Single Prediction  ===============\n\
             Text: nice work | Prediction: Non Toxic sentiment | Probability: 0.25 \n\
             ==================================================\n"
        );
    }

    #[test]
    fn header_line() {
        assert_eq!(
            render(|r| r.header("Training the model")),
            "=============== Training the model ===============\n"
        );
    }

    #[test]
    fn metrics_without_auc() {
        let metrics = BinaryClassificationMetrics {
            count: 3,
            accuracy: 2.0 / 3.0,
            ..BinaryClassificationMetrics::default()
        };

        let output = render(|r| r.metrics(&metrics));

        assert!(output.contains("*       Accuracy: 66.67%\n"));
        assert!(output.contains("*       Area Under Curve: n/a\n"));
    }
}
