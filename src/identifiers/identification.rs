/*! Identifier trait

All identifiers should implement [Identifier] to be useable by the language filter.
!*/
use fasttext::Prediction;
use oxilangtag::{LanguageTag, LanguageTagParseError};
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::tag_convert::label_to_tag;

/// Top language prediction for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    label: LanguageTag<String>,
    prob: f32,
}

impl Identification {
    pub fn new(label: LanguageTag<String>, prob: f32) -> Self {
        Self { label, prob }
    }

    pub fn label(&self) -> &LanguageTag<String> {
        &self.label
    }

    pub fn prob(&self) -> f32 {
        self.prob
    }
}

impl TryFrom<Prediction> for Identification {
    type Error = LanguageTagParseError;
    fn try_from(prediction: Prediction) -> Result<Self, LanguageTagParseError> {
        Ok(Self::new(label_to_tag(&prediction.label)?, prediction.prob))
    }
}

/// Language identification of a single line of text.
///
/// Implementors have to be shareable between threads: the language filter
/// runs classifications concurrently.
pub trait Identifier: Send + Sync {
    /// Returns the top prediction, or [None] if the model has no prediction for `text`.
    fn identify(&self, text: &str) -> Result<Option<Identification>, Error>;
}
