/*! Run configuration.

A [PipelineConfig] is threaded explicitly through every stage of a run.
It can be loaded from a JSON file, every section and field falling back to its default when missing.

```json
{
  "language": { "target": "en", "threshold": 0.5, "lid_path": "lid.176.bin" },
  "noise": { "min_tokens": 4 },
  "bots": { "rate_ceiling": 144.0, "percentile": 0.995 },
  "scrub": { "entities": ["trump", "biden"] }
}
```
!*/
use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use oxilangtag::LanguageTag;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    pub language: LanguageConfig,
    pub noise: NoiseConfig,
    pub bots: BotConfig,
    pub scrub: ScrubConfig,
    pub heavy: HeavyConfig,
    pub light: LightConfig,
    pub columns: ColumnConfig,
    /// Prefix of the removed-bots/removed-foreign trail files (eg. the candidate name).
    pub output_prefix: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: LanguageConfig::default(),
            noise: NoiseConfig::default(),
            bots: BotConfig::default(),
            scrub: ScrubConfig::default(),
            heavy: HeavyConfig::default(),
            light: LightConfig::default(),
            columns: ColumnConfig::default(),
            output_prefix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LanguageConfig {
    /// Target language, as a BCP47 tag.
    pub target: String,
    /// Minimum confidence of the top prediction.
    pub threshold: f32,
    /// Path to the fastText language identification model.
    pub lid_path: PathBuf,
    /// Per-record classification timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of classifications in flight.
    pub concurrency: usize,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target: "en".to_string(),
            threshold: 0.5,
            lid_path: PathBuf::from("lid.176.bin"),
            timeout_ms: 5_000,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NoiseConfig {
    /// Records with fewer whitespace-separated tokens are rejected.
    pub min_tokens: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self { min_tokens: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BotConfig {
    /// Absolute posting rate ceiling, in posts per day.
    pub rate_ceiling: f64,
    /// Quantile of the rate distribution an author has to exceed (0.995 = top 0.5%).
    pub percentile: f64,
    /// Only authors with at least this many posts make up the rate distribution.
    pub min_posts_for_percentile: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            rate_ceiling: 144.0,
            percentile: 0.995,
            min_posts_for_percentile: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScrubConfig {
    /// Entity variants to remove, matched case-insensitively.
    pub entities: Vec<String>,
    /// Optional file with one entity variant per line, added to `entities`.
    pub entities_file: Option<PathBuf>,
    /// Hard cap on scan-and-remove passes.
    pub max_passes: usize,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            entities: [
                "trump",
                "biden",
                "harris",
                "pence",
                "donaldtrump",
                "realdonaldtrump",
                "joebiden",
                "kamalaharris",
                "mikepence",
            ]
            .iter()
            .map(|e| e.to_string())
            .collect(),
            entities_file: None,
            max_passes: 16,
        }
    }
}

impl ScrubConfig {
    /// Merge configured entities with the ones from `entities_file`.
    ///
    /// Variants are lowercased and stripped of leading `#`/`@`.
    pub fn resolve_entities(&self) -> Result<Vec<String>, Error> {
        let mut entities: Vec<String> = self.entities.clone();
        if let Some(path) = &self.entities_file {
            entities.extend(read_list(path)?);
        }

        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(entities.len());
        for entity in entities {
            let entity = entity
                .trim()
                .trim_start_matches(['#', '@'])
                .to_lowercase();
            if entity.is_empty() {
                continue;
            }
            if entity.chars().any(char::is_whitespace) {
                return Err(Error::Configuration(format!(
                    "entity variant {entity:?} is not a single token"
                )));
            }
            if seen.insert(entity.clone()) {
                resolved.push(entity);
            }
        }

        if resolved.is_empty() {
            warn!("no target entities configured, scrubbing will be a no-op");
        }
        Ok(resolved)
    }
}

/// What to do with tokens missing from the lemma dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LemmaFallback {
    /// Keep the token as is.
    Identity,
    /// Reduce the token with the english Snowball stemmer.
    Snowball,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HeavyConfig {
    /// One stopword per line. Replaces the built-in list when set.
    pub stopwords_file: Option<PathBuf>,
    /// Added to the stopword list.
    pub extra_stopwords: Vec<String>,
    /// Tab-separated `form<TAB>lemma` dictionary.
    pub lemma_dictionary: Option<PathBuf>,
    pub lemma_fallback: LemmaFallback,
    /// Minimum length (in chars) of a kept lemma.
    pub min_token_chars: usize,
    /// Only keep purely alphabetic lemmas.
    pub alphabetic_only: bool,
}

impl Default for HeavyConfig {
    fn default() -> Self {
        Self {
            stopwords_file: None,
            extra_stopwords: Vec::new(),
            lemma_dictionary: None,
            lemma_fallback: LemmaFallback::Identity,
            min_token_chars: 3,
            alphabetic_only: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LightConfig {
    pub strip_urls: bool,
    pub strip_mentions: bool,
    /// Remove standalone `RT` retweet markers.
    pub strip_retweet_marker: bool,
}

/// Names of the input columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ColumnConfig {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub timestamp: String,
    pub candidate_tag: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            author_id: "author_id".to_string(),
            text: "text".to_string(),
            timestamp: "timestamp".to_string(),
            candidate_tag: "candidate_tag".to_string(),
        }
    }
}

impl ColumnConfig {
    /// (role, column name) pairs, in record field order.
    pub fn required(&self) -> [(&'static str, &str); 5] {
        [
            ("id", &self.id),
            ("author_id", &self.author_id),
            ("text", &self.text),
            ("timestamp", &self.timestamp),
            ("candidate_tag", &self.candidate_tag),
        ]
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        debug!("loading configuration from {path:?}");
        let reader = BufReader::new(File::open(path)?);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Parsed target language.
    pub fn target_language(&self) -> Result<LanguageTag<String>, Error> {
        LanguageTag::parse(self.language.target.clone()).map_err(|e| {
            Error::Configuration(format!(
                "invalid target language {:?}: {e}",
                self.language.target
            ))
        })
    }

    /// Check thresholds and required values.
    pub fn validate(&self) -> Result<(), Error> {
        fn invalid(msg: String) -> Result<(), Error> {
            Err(Error::Configuration(msg))
        }

        self.target_language()?;

        let lang = &self.language;
        if !(0.0..=1.0).contains(&lang.threshold) {
            return invalid(format!(
                "language.threshold must be within [0, 1], got {}",
                lang.threshold
            ));
        }
        if lang.lid_path.as_os_str().is_empty() {
            return invalid("missing required value language.lid_path".to_string());
        }
        if lang.timeout_ms == 0 {
            return invalid("language.timeout_ms must be positive".to_string());
        }
        if lang.concurrency == 0 {
            return invalid("language.concurrency must be positive".to_string());
        }

        if self.noise.min_tokens == 0 {
            return invalid("noise.min_tokens must be at least 1".to_string());
        }

        let bots = &self.bots;
        if !bots.rate_ceiling.is_finite() || bots.rate_ceiling < 0.0 {
            return invalid(format!(
                "bots.rate_ceiling must be a non-negative number, got {}",
                bots.rate_ceiling
            ));
        }
        if !(bots.percentile > 0.0 && bots.percentile < 1.0) {
            return invalid(format!(
                "bots.percentile must be within ]0, 1[, got {}",
                bots.percentile
            ));
        }
        if bots.min_posts_for_percentile == 0 {
            return invalid("bots.min_posts_for_percentile must be at least 1".to_string());
        }

        if self.scrub.max_passes == 0 {
            return invalid("scrub.max_passes must be at least 1".to_string());
        }

        if self.heavy.min_token_chars == 0 {
            return invalid("heavy.min_token_chars must be at least 1".to_string());
        }

        let mut names = HashSet::new();
        for (role, name) in self.columns.required() {
            if name.is_empty() {
                return invalid(format!("missing required value columns.{role}"));
            }
            if !names.insert(name) {
                return invalid(format!("column {name:?} is mapped twice"));
            }
        }

        Ok(())
    }

    /// Hex SHA-256 of the serialized configuration.
    pub fn digest(&self) -> Result<String, Error> {
        let bytes = serde_json::to_vec(self)?;
        let hash = Sha256::digest(&bytes);
        Ok(hash.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Prefix to use for trail file names.
    pub fn file_prefix(&self) -> String {
        match &self.output_prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}_"),
            _ => String::new(),
        }
    }
}

/// Read a one-item-per-line list, skipping blank lines and `#` comments.
pub(crate) fn read_list(path: &Path) -> Result<Vec<String>, Error> {
    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("# ") || line == "#" {
            continue;
        }
        items.push(line.to_string());
    }
    Ok(items)
}
