/*! Lemmatization.

Lookup order is:

1. the user supplied dictionary (`form<TAB>lemma`, `#` comments),
1. a small built-in table of irregular forms,
1. the configured fallback: identity, or the english Snowball stemmer.
!*/
use std::{collections::HashMap, path::Path};

use lazy_static::lazy_static;
use log::{debug, info};
use rust_stemmers::{Algorithm, Stemmer};

use crate::{
    config::{HeavyConfig, LemmaFallback},
    error::Error,
};

lazy_static! {
    static ref IRREGULAR: HashMap<&'static str, &'static str> = [
        ("am", "be"),
        ("is", "be"),
        ("are", "be"),
        ("was", "be"),
        ("were", "be"),
        ("been", "be"),
        ("has", "have"),
        ("had", "have"),
        ("does", "do"),
        ("did", "do"),
        ("done", "do"),
        ("went", "go"),
        ("gone", "go"),
        ("said", "say"),
        ("made", "make"),
        ("won", "win"),
        ("lost", "lose"),
        ("ran", "run"),
        ("running", "run"),
        ("thought", "think"),
        ("told", "tell"),
        ("paid", "pay"),
        ("men", "man"),
        ("women", "woman"),
        ("children", "child"),
        ("lies", "lie"),
        ("lied", "lie"),
        ("lying", "lie"),
        ("voters", "voter"),
        ("votes", "vote"),
        ("voted", "vote"),
        ("rallies", "rally"),
        ("states", "state"),
        ("taxes", "tax"),
        ("jobs", "job"),
        ("debates", "debate"),
        ("better", "good"),
        ("best", "good"),
        ("worse", "bad"),
        ("worst", "bad"),
    ]
    .into_iter()
    .collect();
}

pub struct Lemmatizer {
    dictionary: HashMap<String, String>,
    stemmer: Option<Stemmer>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new(HashMap::new(), LemmaFallback::Identity)
    }
}

impl Lemmatizer {
    pub fn new(dictionary: HashMap<String, String>, fallback: LemmaFallback) -> Self {
        let stemmer = match fallback {
            LemmaFallback::Identity => None,
            LemmaFallback::Snowball => Some(Stemmer::create(Algorithm::English)),
        };
        Self {
            dictionary,
            stemmer,
        }
    }

    pub fn from_config(config: &HeavyConfig) -> Result<Self, Error> {
        let dictionary = match &config.lemma_dictionary {
            Some(path) => Self::load_dictionary(path)?,
            None => HashMap::new(),
        };
        Ok(Self::new(dictionary, config.lemma_fallback))
    }

    /// Load a tab separated `form<TAB>lemma` file. Forms are lowercased.
    pub fn load_dictionary(path: &Path) -> Result<HashMap<String, String>, Error> {
        debug!("loading lemma dictionary from {path:?}");
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .from_path(path)?;

        let mut dictionary = HashMap::new();
        for (line, row) in reader.records().enumerate() {
            let row = row?;
            match (row.get(0), row.get(1), row.len()) {
                (Some(form), Some(lemma), 2) => {
                    dictionary.insert(form.trim().to_lowercase(), lemma.trim().to_lowercase());
                }
                _ => {
                    return Err(Error::Configuration(format!(
                        "{path:?}: row {} is not a form<TAB>lemma pair",
                        line + 1
                    )))
                }
            }
        }

        info!("loaded {} lemmas from {path:?}", dictionary.len());
        Ok(dictionary)
    }

    /// Lemma of a lowercased token.
    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(lemma) = self.dictionary.get(token) {
            return lemma.clone();
        }
        if let Some(lemma) = IRREGULAR.get(token) {
            return lemma.to_string();
        }
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(token).into_owned(),
            None => token.to_string(),
        }
    }
}
