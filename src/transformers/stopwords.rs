//! Stopword lists.
use std::collections::HashSet;

use lazy_static::lazy_static;
use log::debug;

use crate::{
    config::{read_list, HeavyConfig},
    error::Error,
};

lazy_static! {
    /// Common english function words.
    static ref ENGLISH: Vec<&'static str> = vec![
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "could", "did", "do", "does", "doing", "done", "down",
        "during", "each", "even", "ever", "every", "few", "for", "from", "further", "get", "got",
        "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him", "himself",
        "his", "how", "however", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
        "least", "less", "like", "made", "make", "many", "may", "me", "might", "more", "most",
        "much", "must", "my", "myself", "neither", "never", "no", "nor", "not", "now", "of",
        "off", "often", "on", "once", "one", "only", "or", "other", "our", "ours", "ourselves",
        "out", "over", "own", "per", "please", "put", "quite", "rather", "really", "said", "same",
        "say", "see", "seem", "she", "should", "since", "so", "some", "still", "such", "take",
        "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
        "they", "this", "those", "though", "through", "thus", "to", "too", "under", "until",
        "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever",
        "when", "where", "whether", "which", "while", "who", "whoever", "whom", "whose", "why",
        "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
        "yourselves",
    ];

    /// Terms that are too frequent in campaign tweets to carry any topic.
    static ref CAMPAIGN: Vec<&'static str> = vec![
        "maga", "potus", "vp", "campaign", "candidate", "poll", "vote", "voting", "election",
        "2020", "amp", "https", "http", "rt", "com", "org", "www", "html", "people", "time",
        "day", "country", "america", "american", "nation", "state", "year", "man", "woman",
        "world", "thing", "way", "news",
    ];
}

/// Lowercased stopword set.
#[derive(Debug, Clone)]
pub struct Stopwords(HashSet<String>);

impl Default for Stopwords {
    fn default() -> Self {
        Self(
            ENGLISH
                .iter()
                .chain(CAMPAIGN.iter())
                .map(|w| w.to_string())
                .collect(),
        )
    }
}

impl Stopwords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(words.into_iter().map(|w| w.as_ref().to_lowercase()).collect())
    }

    /// Built-in list (or the one from `stopwords_file`), plus `extra_stopwords`.
    pub fn from_config(config: &HeavyConfig) -> Result<Self, Error> {
        let mut stopwords = match &config.stopwords_file {
            Some(path) => {
                debug!("loading stopwords from {path:?}");
                Self::new(read_list(path)?)
            }
            None => Self::default(),
        };
        stopwords.extend(&config.extra_stopwords);
        Ok(stopwords)
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
    }

    /// Case-insensitive membership.
    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word) || self.0.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::config::HeavyConfig;

    use super::Stopwords;

    #[test]
    fn default_list() {
        let s = Stopwords::default();
        assert!(s.contains("the"));
        assert!(s.contains("The"));
        assert!(s.contains("maga"));
        assert!(s.contains("election"));
        assert!(!s.contains("economy"));
    }

    #[test]
    fn from_file_replaces_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# custom list").unwrap();
        writeln!(file, "Economy").unwrap();

        let config = HeavyConfig {
            stopwords_file: Some(file.path().to_path_buf()),
            extra_stopwords: vec!["rally".to_string()],
            ..Default::default()
        };
        let s = Stopwords::from_config(&config).unwrap();

        assert_eq!(s.len(), 2);
        assert!(s.contains("economy"));
        assert!(s.contains("rally"));
        assert!(!s.contains("the"));
    }
}
