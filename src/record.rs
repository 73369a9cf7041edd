//! Raw posts.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RecordId = String;

/// One raw post, as ingested.
///
/// Records are never mutated once built: stages move them from their input set
/// into either their surviving set or their audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    author_id: String,
    text: String,
    timestamp: DateTime<Utc>,
    candidate_tag: String,
}

impl Record {
    pub fn new(
        id: RecordId,
        author_id: String,
        text: String,
        timestamp: DateTime<Utc>,
        candidate_tag: String,
    ) -> Self {
        Self {
            id,
            author_id,
            text,
            timestamp,
            candidate_tag,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    /// Which candidate's dataset the record was sourced from.
    pub fn candidate_tag(&self) -> &str {
        &self.candidate_tag
    }
}

/// A record that went through the entity scrubber.
///
/// Holds the untouched original along with the scrubbed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubbedRecord {
    record: Record,
    text: String,
    removals: usize,
}

impl ScrubbedRecord {
    pub fn new(record: Record, text: String, removals: usize) -> Self {
        Self {
            record,
            text,
            removals,
        }
    }

    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Entity-free text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of entity occurrences removed from the original text.
    pub fn removals(&self) -> usize {
        self.removals
    }
}
