/*! Rejection audit trails.

Each rejecting stage owns an [AuditRecorder], an append-only sink guarded by its own lock.
A record identifier can appear at most once in a given trail: a second rejection of the same identifier is refused.

[AuditLog] regroups the recorders of a run.
!*/
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    sync::{Mutex, PoisonError},
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// Pipeline stages, in execution order.
///
/// `Setup` and `Output` never reject records, they are only used
/// to tag fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Setup,
    Ingest,
    Language,
    Noise,
    Bots,
    Scrub,
    Fork,
    Output,
}

impl Stage {
    /// Stages that can reject records, in execution order.
    pub const REJECTING: [Stage; 4] = [Stage::Ingest, Stage::Language, Stage::Noise, Stage::Bots];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Ingest => "ingest",
            Stage::Language => "language",
            Stage::Noise => "noise",
            Stage::Bots => "bots",
            Stage::Scrub => "scrub",
            Stage::Fork => "fork",
            Stage::Output => "output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    MalformedRecord,
    DuplicateId,
    EmptyText,
    ForeignLanguage,
    ClassificationError,
    Duplicate,
    TooShort,
    BotActivity,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::MalformedRecord => "malformed_record",
            Reason::DuplicateId => "duplicate_id",
            Reason::EmptyText => "empty_text",
            Reason::ForeignLanguage => "foreign_language",
            Reason::ClassificationError => "classification_error",
            Reason::Duplicate => "duplicate",
            Reason::TooShort => "too_short",
            Reason::BotActivity => "bot_activity",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value backing a rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    Language { code: String, confidence: f32 },
    Rate { author_id: String, rate: f64 },
    Message(String),
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::Language { code, confidence } => write!(f, "{code}:{confidence:.4}"),
            Evidence::Rate { author_id, rate } => write!(f, "{author_id}:{rate:.2}"),
            Evidence::Message(msg) => f.write_str(msg),
        }
    }
}

/// Reason and evidence of a single rejection, before it is attached to a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub reason: Reason,
    pub evidence: Option<Evidence>,
}

impl Rejection {
    pub fn new(reason: Reason, evidence: Option<Evidence>) -> Self {
        Self { reason, evidence }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionEntry {
    pub id: RecordId,
    pub stage: Stage,
    pub reason: Reason,
    pub evidence: Option<Evidence>,
}

#[derive(Debug, Default)]
struct Trail {
    entries: Vec<RejectionEntry>,
    ids: HashSet<RecordId>,
}

/// Append-only rejection sink for a single stage.
#[derive(Debug)]
pub struct AuditRecorder {
    stage: Stage,
    trail: Mutex<Trail>,
}

impl AuditRecorder {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            trail: Mutex::new(Trail::default()),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Append a rejection.
    ///
    /// Returns `false` (and leaves the trail untouched) if `id` is already in the trail.
    pub fn record_rejection(&self, id: &str, reason: Reason, evidence: Option<Evidence>) -> bool {
        let mut trail = self.trail.lock().unwrap_or_else(PoisonError::into_inner);
        if !trail.ids.insert(id.to_string()) {
            warn!("[{}] refusing second rejection of {id} ({reason})", self.stage);
            return false;
        }

        debug!("[{}] rejected {id}: {reason}", self.stage);
        trail.entries.push(RejectionEntry {
            id: id.to_string(),
            stage: self.stage,
            reason,
            evidence,
        });
        true
    }

    /// Full trail, in append order.
    pub fn trail(&self) -> Vec<RejectionEntry> {
        self.trail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.trail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ids
            .contains(id)
    }

    pub fn len(&self) -> usize {
        self.trail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejection counts per reason.
    pub fn counts_by_reason(&self) -> BTreeMap<Reason, usize> {
        let trail = self.trail.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counts = BTreeMap::new();
        for entry in &trail.entries {
            *counts.entry(entry.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// The recorders of a run, one per rejecting stage.
#[derive(Debug)]
pub struct AuditLog {
    recorders: Vec<AuditRecorder>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self {
            recorders: Stage::REJECTING.into_iter().map(AuditRecorder::new).collect(),
        }
    }
}

impl AuditLog {
    /// Get the recorder of a stage.
    /// Returns [None] for stages that never reject.
    pub fn recorder(&self, stage: Stage) -> Option<&AuditRecorder> {
        self.recorders.iter().find(|r| r.stage() == stage)
    }

    /// Route a rejection to the recorder of `stage`.
    ///
    /// Returns `false` if the stage does not reject or if `id` was already rejected by it.
    pub fn record_rejection(
        &self,
        stage: Stage,
        id: &str,
        reason: Reason,
        evidence: Option<Evidence>,
    ) -> bool {
        match self.recorder(stage) {
            Some(recorder) => recorder.record_rejection(id, reason, evidence),
            None => {
                warn!("stage {stage} does not record rejections (tried {id}: {reason})");
                false
            }
        }
    }

    /// Trail of a stage. Empty for stages that never reject.
    pub fn trail(&self, stage: Stage) -> Vec<RejectionEntry> {
        self.recorder(stage).map(|r| r.trail()).unwrap_or_default()
    }

    pub fn recorders(&self) -> impl Iterator<Item = &AuditRecorder> {
        self.recorders.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn refuses_second_rejection() {
        let recorder = AuditRecorder::new(Stage::Noise);
        assert!(recorder.record_rejection("1", Reason::Duplicate, None));
        assert!(!recorder.record_rejection("1", Reason::TooShort, None));

        let trail = recorder.trail();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].reason, Reason::Duplicate);
        assert_eq!(trail[0].stage, Stage::Noise);
    }

    #[test]
    fn trail_keeps_append_order() {
        let recorder = AuditRecorder::new(Stage::Language);
        for id in ["c", "a", "b"] {
            recorder.record_rejection(id, Reason::EmptyText, None);
        }
        let ids: Vec<_> = recorder.trail().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn concurrent_appends() {
        let recorder = Arc::new(AuditRecorder::new(Stage::Language));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        // every id is submitted by two threads
                        let id = format!("{}", (t % 4) * 100 + i);
                        recorder.record_rejection(&id, Reason::ForeignLanguage, None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.len(), 400);
    }

    #[test]
    fn log_routes_by_stage() {
        let log = AuditLog::default();
        assert!(log.record_rejection(
            Stage::Bots,
            "42",
            Reason::BotActivity,
            Some(Evidence::Rate {
                author_id: "bot".to_string(),
                rate: 300.0
            })
        ));
        assert!(!log.record_rejection(Stage::Scrub, "43", Reason::Duplicate, None));

        assert_eq!(log.trail(Stage::Bots).len(), 1);
        assert!(log.trail(Stage::Noise).is_empty());
        assert!(log.recorder(Stage::Scrub).is_none());
    }

    #[test]
    fn evidence_display() {
        let e = Evidence::Language {
            code: "fr".to_string(),
            confidence: 0.91,
        };
        assert_eq!(e.to_string(), "fr:0.9100");
    }
}
