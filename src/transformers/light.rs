//! Light normalization, for contextual models.
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use unic_ucd::GeneralCategory;

use crate::{config::LightConfig, record::ScrubbedRecord};

use super::Transform;

lazy_static! {
    static ref URL: Regex = Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap();
    static ref MENTION: Regex = Regex::new(r"@\w+").unwrap();
    static ref RETWEET: Regex = Regex::new(r"\bRT\b:?").unwrap();
}

/// Light output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightRecord {
    pub id: String,
    pub text: String,
}

/// Keeps the scrubbed text as close to natural language as possible:
/// control characters are dropped and whitespace is collapsed.
///
/// URLs, mentions and retweet markers are only removed when asked to.
#[derive(Debug, Clone, Default)]
pub struct LightNormalizer {
    config: LightConfig,
}

impl LightNormalizer {
    pub fn new(config: LightConfig) -> Self {
        Self { config }
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut text = text.to_string();
        if self.config.strip_urls {
            text = URL.replace_all(&text, " ").into_owned();
        }
        if self.config.strip_mentions {
            text = MENTION.replace_all(&text, " ").into_owned();
        }
        if self.config.strip_retweet_marker {
            text = RETWEET.replace_all(&text, " ").into_owned();
        }

        // control chars (newlines, tabs) become whitespace
        let text: String = text
            .chars()
            .map(|c| {
                if GeneralCategory::of(c) == GeneralCategory::Control {
                    ' '
                } else {
                    c
                }
            })
            .collect();

        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Transform for LightNormalizer {
    type Output = LightRecord;

    fn transform(&self, record: &ScrubbedRecord) -> LightRecord {
        LightRecord {
            id: record.id().to_string(),
            text: self.normalize(record.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::LightConfig;

    use super::LightNormalizer;

    #[test]
    fn keeps_natural_text() {
        let l = LightNormalizer::default();
        assert_eq!(
            l.normalize("RT  great rally!!\n\nSee https://t.co/abc @someone\u{0007}"),
            "RT great rally!! See https://t.co/abc @someone"
        );
    }

    #[test]
    fn opt_in_stripping() {
        let l = LightNormalizer::new(LightConfig {
            strip_urls: true,
            strip_mentions: true,
            strip_retweet_marker: true,
        });
        assert_eq!(
            l.normalize("RT: @someone great rally!! https://t.co/abc www.example.com"),
            "great rally!!"
        );
        // only the standalone marker goes
        assert_eq!(l.normalize("ART is not RTE"), "ART is not RTE");
    }
}
