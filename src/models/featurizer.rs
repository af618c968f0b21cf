//! Text featurization: word and character n-gram counts over a fitted vocabulary,
//! L2-normalized into a sparse vector.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::pipelines::text_classification::TrainingError;

/// Featurizer settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Longest word n-gram to extract (1 = unigrams only, 0 disables words)
    pub word_ngram_length: usize,

    /// Character n-gram length (0 disables character n-grams)
    pub char_ngram_length: usize,

    /// An n-gram must appear in at least this many training texts
    pub min_document_frequency: usize,

    /// Upper bound on the vocabulary size
    pub max_features: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            word_ngram_length: 2,
            char_ngram_length: 3,
            min_document_frequency: 2,
            max_features: 4096,
        }
    }
}

impl Config {
    /// Set the minimum document frequency
    pub fn with_min_document_frequency(mut self, min_document_frequency: usize) -> Self {
        self.min_document_frequency = min_document_frequency;
        self
    }

    /// Set the maximum vocabulary size
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    fn validate(&self) -> Result<(), TrainingError> {
        if self.word_ngram_length == 0 && self.char_ngram_length == 0 {
            return Err(TrainingError::InvalidConfig(
                "at least one of word_ngram_length and char_ngram_length must be positive".into(),
            ));
        }

        if self.max_features == 0 {
            return Err(TrainingError::InvalidConfig(
                "max_features must be positive".into(),
            ));
        }

        Ok(())
    }
}

/// A sparse feature vector, sorted by feature index
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector(Vec<(u32, f32)>);

impl SparseVector {
    /// Build from `(index, value)` pairs in any order. Zero values are dropped.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.retain(|(_, value)| *value != 0.0);
        pairs.sort_unstable_by_key(|(index, _)| *index);

        Self(pairs)
    }

    /// The value of one feature; absent features are zero
    pub fn get(&self, index: u32) -> f32 {
        self.0
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.0[pos].1)
            .unwrap_or(0.0)
    }

    /// The non-zero entries
    pub fn entries(&self) -> &[(u32, f32)] {
        &self.0
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.0.len()
    }
}

/// A featurizer fitted to a training corpus
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextFeaturizer {
    config: Config,

    /// N-gram to feature index
    vocabulary: BTreeMap<String, u32>,
}

impl TextFeaturizer {
    /// Build the vocabulary from training texts
    pub fn fit<'a, T>(config: &Config, texts: T) -> Result<Self, TrainingError>
    where
        T: IntoIterator<Item = &'a str>,
    {
        config.validate()?;

        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let unique: BTreeSet<String> = ngrams(config, text).into_iter().collect();
            for ngram in unique {
                *document_frequency.entry(ngram).or_default() += 1;
            }
        }

        let mut candidates: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= config.min_document_frequency)
            .collect();

        // Most frequent first, ties broken lexically so the result does not depend on hashing
        candidates.sort_unstable_by(|(a, a_df), (b, b_df)| b_df.cmp(a_df).then_with(|| a.cmp(b)));
        candidates.truncate(config.max_features);

        if candidates.is_empty() {
            return Err(TrainingError::EmptyVocabulary);
        }

        let vocabulary = candidates
            .into_iter()
            .enumerate()
            .map(|(index, (ngram, _))| (ngram, index as u32))
            .collect();

        Ok(Self {
            config: config.clone(),
            vocabulary,
        })
    }

    /// Turn text into a normalized sparse feature vector
    pub fn transform(&self, text: &str) -> SparseVector {
        // Ordered so the norm is summed the same way on every call
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();

        for ngram in ngrams(&self.config, text) {
            if let Some(&index) = self.vocabulary.get(&ngram) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let norm = counts.values().map(|c| c * c).sum::<f32>().sqrt();
        let pairs = counts
            .into_iter()
            .map(|(index, count)| (index, count / norm))
            .collect();

        SparseVector::from_pairs(pairs)
    }

    /// Number of features produced by [`transform`](Self::transform)
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// The n-gram behind a feature index, for inspection
    pub fn feature_name(&self, index: u32) -> Option<&str> {
        self.vocabulary
            .iter()
            .find(|(_, i)| **i == index)
            .map(|(ngram, _)| ngram.as_str())
    }
}

/// Lowercased alphanumeric tokens
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every word and character n-gram of the text, with repeats
fn ngrams(config: &Config, text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let mut ngrams = Vec::new();

    if tokens.is_empty() {
        return ngrams;
    }

    for n in 1..=config.word_ngram_length {
        ngrams.extend(tokens.windows(n).map(|w| format!("w:{}", w.join(" "))));
    }

    if config.char_ngram_length > 0 {
        let chars: Vec<char> = format!(" {} ", tokens.join(" ")).chars().collect();
        ngrams.extend(
            chars
                .windows(config.char_ngram_length)
                .map(|w| format!("c:{}", w.iter().collect::<String>())),
        );
    }

    ngrams
}
