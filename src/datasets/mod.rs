use std::sync::Arc;

use burn_dataset::transform::{PartialDataset, ShuffledDataset};

use crate::pipelines::text_classification::Item;

pub use burn_dataset::{Dataset, InMemDataset};

/// The WikiDetox toxicity dataset
pub mod wikidetox;

/// The two halves of a dataset split
pub struct TrainTestSplit<I> {
    /// Rows used to fit the model
    pub train: InMemDataset<I>,

    /// Rows held out for evaluation
    pub test: InMemDataset<I>,
}

/// Hold out `test_fraction` of each label, shuffling every label's rows with `seed`.
///
/// Each label keeps at least one row for training. When rounding would leave the test set
/// empty, one row of the largest label that can spare it is held out instead. Returns `None`
/// when there is nothing to hold out.
pub fn train_test_split<I, D>(dataset: &D, test_fraction: f64, seed: u64) -> Option<TrainTestSplit<I>>
where
    I: Item + Clone + Send + Sync,
    D: Dataset<I>,
{
    if dataset.len() < 2 {
        return None;
    }

    let (positives, negatives): (Vec<I>, Vec<I>) = dataset.iter().partition(|item| item.label());

    let mut strata: Vec<(ShuffledDataset<InMemDataset<I>, I>, usize)> = [negatives, positives]
        .into_iter()
        .filter(|items| !items.is_empty())
        .map(|items| {
            let len = items.len();
            let held_out = ((len as f64 * test_fraction).round() as usize).min(len - 1);

            (ShuffledDataset::with_seed(InMemDataset::new(items), seed), held_out)
        })
        .collect();

    if strata.iter().all(|(_, held_out)| *held_out == 0) {
        let (_, held_out) = strata
            .iter_mut()
            .filter(|(rows, _)| rows.len() >= 2)
            .max_by_key(|(rows, _)| rows.len())?;
        *held_out = 1;
    }

    let mut train = Vec::with_capacity(dataset.len());
    let mut test = Vec::new();

    for (rows, held_out) in strata {
        let len = rows.len();
        let rows = Arc::new(rows);

        test.extend(PartialDataset::new(Arc::clone(&rows), 0, held_out).iter());
        train.extend(PartialDataset::new(rows, held_out, len).iter());
    }

    Some(TrainTestSplit {
        train: InMemDataset::new(train),
        test: InMemDataset::new(test),
    })
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// The dataset file could not be opened or read
    #[error("unable to read dataset {path}: {source}")]
    Io {
        /// The dataset path
        path: String,
        /// The underlying error
        source: std::io::Error,
    },

    /// The file is not valid delimited text
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    /// The file held no data rows
    #[error("dataset {0} contains no rows")]
    Empty(String),

    /// A row is too short to hold a configured column
    #[error("line {line}: missing column {column}")]
    MissingColumn {
        /// One-based line number in the file
        line: u64,
        /// Zero-based column index
        column: usize,
    },

    /// The label column could not be read as a boolean
    #[error("line {line}: invalid label {value:?}")]
    InvalidLabel {
        /// One-based line number in the file
        line: u64,
        /// The raw label value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{wikidetox::SentimentIssue, *};

    /// Every third row is toxic
    fn issues(n: usize) -> InMemDataset<SentimentIssue> {
        InMemDataset::new(
            (0..n)
                .map(|i| SentimentIssue::new(i % 3 == 0, format!("comment {i}")))
                .collect(),
        )
    }

    fn texts(dataset: &InMemDataset<SentimentIssue>) -> Vec<String> {
        dataset.iter().map(|issue| issue.text).collect()
    }

    fn count(dataset: &InMemDataset<SentimentIssue>, label: bool) -> usize {
        dataset.iter().filter(|issue| issue.label == label).count()
    }

    #[test]
    fn split_holds_out_the_requested_fraction_of_each_label() {
        let split = train_test_split(&issues(90), 0.2, 1).unwrap();

        assert_eq!((count(&split.test, true), count(&split.test, false)), (6, 12));
        assert_eq!((count(&split.train, true), count(&split.train, false)), (24, 48));

        let mut all: Vec<String> = texts(&split.train);
        all.extend(texts(&split.test));
        all.sort_unstable();

        let mut expected = texts(&issues(90));
        expected.sort_unstable();
        assert_eq!(all, expected);
    }

    #[test]
    fn split_is_reproducible_for_a_seed() {
        let first = train_test_split(&issues(50), 0.2, 42).unwrap();
        let second = train_test_split(&issues(50), 0.2, 42).unwrap();
        let other = train_test_split(&issues(50), 0.2, 43).unwrap();

        assert_eq!(texts(&first.train), texts(&second.train));
        assert_eq!(texts(&first.test), texts(&second.test));
        assert_ne!(texts(&first.test), texts(&other.test));
    }

    #[test]
    fn a_lone_minority_row_always_stays_in_training() {
        for position in 0..20 {
            let dataset = InMemDataset::new(
                (0..20)
                    .map(|i| SentimentIssue::new(i == position, format!("comment {i}")))
                    .collect(),
            );

            let split = train_test_split(&dataset, 0.2, 1).unwrap();

            assert_eq!(count(&split.train, true), 1, "toxic row at {position}");
            assert_eq!(count(&split.test, false), 4, "toxic row at {position}");
            assert_eq!(split.test.len() + split.train.len(), 20);
        }
    }

    #[test]
    fn tiny_datasets_still_hold_out_a_row() {
        let split = train_test_split(&issues(3), 0.2, 1).unwrap();
        assert_eq!((split.train.len(), split.test.len()), (2, 1));
        assert_eq!(count(&split.train, true), 1);

        let single_class = InMemDataset::new(vec![
            SentimentIssue::new(false, "a".to_string()),
            SentimentIssue::new(false, "b".to_string()),
        ]);
        let split = train_test_split(&single_class, 0.2, 1).unwrap();
        assert_eq!((split.train.len(), split.test.len()), (1, 1));

        assert!(train_test_split(&issues(1), 0.2, 1).is_none());
        assert!(train_test_split(&issues(2), 0.2, 1).is_none());
    }
}
