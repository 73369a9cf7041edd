//! Duplicate and short text removal.
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use itertools::Itertools;
use log::info;
use twox_hash::XxHash64;

use crate::{
    audit::{AuditRecorder, Evidence, Reason, Rejection},
    config::NoiseConfig,
    record::{Record, RecordId},
};

use super::{sift, FilterMut, Verdict};

/// Rejects records whose normalized text has already been seen,
/// then records that have less than `min_tokens` whitespace-separated tokens.
///
/// Normalization is case folding and whitespace collapsing: `"Vote  Early!"` and `"vote early!"`
/// are duplicates. There is no fuzzy matching.
///
/// A text is registered as seen before its length is checked, so a too short text
/// still makes its later copies duplicates.
pub struct NoiseFilter {
    min_tokens: usize,
    // normalized text -> first record that had it
    seen: HashMap<String, RecordId, BuildHasherDefault<XxHash64>>,
}

impl NoiseFilter {
    pub fn new(min_tokens: usize) -> Self {
        Self {
            min_tokens,
            seen: Default::default(),
        }
    }

    pub fn from_config(config: &NoiseConfig) -> Self {
        Self::new(config.min_tokens)
    }

    /// Case-folded, whitespace-collapsed text.
    pub fn normalize(text: &str) -> String {
        text.split_whitespace().map(str::to_lowercase).join(" ")
    }

    /// Filter a whole stage input.
    pub fn apply(&mut self, records: Vec<Record>, recorder: &AuditRecorder) -> Vec<Record> {
        let nb_input = records.len();
        info!("[noise] checking {nb_input} records");

        let kept = sift(records, recorder, |record| self.detect_mut(record));

        info!(
            "[noise] retained {} records ({} rejected)",
            kept.len(),
            nb_input - kept.len()
        );
        kept
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::from_config(&NoiseConfig::default())
    }
}

impl FilterMut<&Record> for NoiseFilter {
    fn detect_mut(&mut self, record: &Record) -> Verdict {
        let normalized = Self::normalize(record.text());

        if let Some(first) = self.seen.get(&normalized) {
            return Verdict::Reject(Rejection::new(
                Reason::Duplicate,
                Some(Evidence::Message(format!("duplicate of {first}"))),
            ));
        }
        self.seen.insert(normalized, record.id().to_string());

        let nb_tokens = record.text().split_whitespace().count();
        if nb_tokens < self.min_tokens {
            return Verdict::Reject(Rejection::new(
                Reason::TooShort,
                Some(Evidence::Message(format!("{nb_tokens} tokens"))),
            ));
        }

        Verdict::Keep
    }
}
