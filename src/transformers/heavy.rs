/*! Heavy normalization, for topic modeling.

Scrubbed text is split into unicode words, lowercased, lemmatized and cleaned of stopwords,
non-alphabetic tokens and short tokens. Stopwords are checked both on the surface form
and on the lemma.
!*/
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::{config::HeavyConfig, error::Error, record::ScrubbedRecord};

use super::{Lemmatizer, Stopwords, Transform};

/// Heavy output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeavyRecord {
    pub id: String,
    pub tokens: Vec<String>,
}

pub struct HeavyNormalizer {
    stopwords: Stopwords,
    lemmatizer: Lemmatizer,
    min_token_chars: usize,
    alphabetic_only: bool,
}

impl Default for HeavyNormalizer {
    fn default() -> Self {
        Self::new(Stopwords::default(), Lemmatizer::default(), 3, true)
    }
}

impl HeavyNormalizer {
    pub fn new(
        stopwords: Stopwords,
        lemmatizer: Lemmatizer,
        min_token_chars: usize,
        alphabetic_only: bool,
    ) -> Self {
        Self {
            stopwords,
            lemmatizer,
            min_token_chars,
            alphabetic_only,
        }
    }

    pub fn from_config(config: &HeavyConfig) -> Result<Self, Error> {
        Ok(Self::new(
            Stopwords::from_config(config)?,
            Lemmatizer::from_config(config)?,
            config.min_token_chars,
            config.alphabetic_only,
        ))
    }

    /// Token list of a text.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(str::to_lowercase)
            .filter(|word| !self.stopwords.contains(word))
            .map(|word| self.lemmatizer.lemmatize(&word))
            .filter(|lemma| self.keep(lemma))
            .collect()
    }

    fn keep(&self, lemma: &str) -> bool {
        if self.stopwords.contains(lemma) {
            return false;
        }
        if self.alphabetic_only && !lemma.chars().all(char::is_alphabetic) {
            return false;
        }
        lemma.chars().count() >= self.min_token_chars
    }
}

impl Transform for HeavyNormalizer {
    type Output = HeavyRecord;

    fn transform(&self, record: &ScrubbedRecord) -> HeavyRecord {
        HeavyRecord {
            id: record.id().to_string(),
            tokens: self.tokens(record.text()),
        }
    }
}
