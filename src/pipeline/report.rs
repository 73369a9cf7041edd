//! Run report.
use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    audit::{AuditRecorder, Reason, Stage},
    error::Error,
    record::Record,
};

/// Counts of a rejecting stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub input: usize,
    pub kept: usize,
    pub rejected: usize,
    pub by_reason: BTreeMap<Reason, usize>,
}

impl StageReport {
    /// Build the report of a stage that consumed `input` items and kept `kept`.
    ///
    /// Fails if survivors and trail do not partition the input:
    /// every input item has to be either kept or in the trail, and never both.
    pub fn checked(
        input: usize,
        kept: &[Record],
        recorder: &AuditRecorder,
    ) -> Result<Self, Error> {
        let stage = recorder.stage();
        let rejected = recorder.len();

        if kept.len() + rejected != input {
            return Err(Error::Custom(format!(
                "{input} records in, {} kept and {rejected} rejected",
                kept.len()
            )));
        }
        if let Some(record) = kept.iter().find(|r| recorder.contains(r.id())) {
            return Err(Error::Custom(format!(
                "record {} is both kept and rejected",
                record.id()
            )));
        }

        Ok(Self {
            stage,
            input,
            kept: kept.len(),
            rejected,
            by_reason: recorder.counts_by_reason(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrubReport {
    /// Entity occurrences removed.
    pub removals: usize,
    /// Records with at least one removal.
    pub records_touched: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputReport {
    pub heavy: usize,
    pub light: usize,
    /// Heavy records left without any token.
    pub empty_heavy: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub version: String,
    /// SHA-256 of the effective configuration.
    pub config_digest: String,
    /// Rows read from the dataset.
    pub input: usize,
    pub stages: Vec<StageReport>,
    pub scrub: ScrubReport,
    pub output: OutputReport,
}

impl RunReport {
    pub fn new(version: &str, config_digest: String, input: usize) -> Self {
        Self {
            version: version.to_string(),
            config_digest,
            input,
            stages: Vec::new(),
            scrub: ScrubReport::default(),
            output: OutputReport::default(),
        }
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Total of rejections, all stages included.
    pub fn rejected(&self) -> usize {
        self.stages.iter().map(|s| s.rejected).sum()
    }

    pub fn log(&self) {
        info!(
            "run report (v{}, config {}): {} input rows",
            self.version,
            &self.config_digest[..self.config_digest.len().min(12)],
            self.input
        );
        for stage in &self.stages {
            let reasons = stage
                .by_reason
                .iter()
                .map(|(reason, count)| format!("{reason}={count}"))
                .collect::<Vec<_>>()
                .join(", ");
            info!(
                "  {:<8} in: {:>8} kept: {:>8} rejected: {:>8} [{reasons}]",
                stage.stage.as_str(),
                stage.input,
                stage.kept,
                stage.rejected
            );
        }
        info!(
            "  scrub    {} removals in {} records",
            self.scrub.removals, self.scrub.records_touched
        );
        info!(
            "  output   heavy: {} light: {} ({} heavy records without tokens)",
            self.output.heavy, self.output.light, self.output.empty_heavy
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        audit::{AuditRecorder, Reason, Stage},
        error::Error,
        filtering::tests::record,
    };

    use super::{RunReport, StageReport};

    #[test]
    fn checked_partition() {
        let recorder = AuditRecorder::new(Stage::Noise);
        recorder.record_rejection("2", Reason::Duplicate, None);
        let kept = vec![record("1", "a", "t", 0), record("3", "a", "t", 1)];

        let report = StageReport::checked(3, &kept, &recorder).unwrap();
        assert_eq!(report.stage, Stage::Noise);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.by_reason.get(&Reason::Duplicate), Some(&1));

        // a record went missing
        assert!(matches!(
            StageReport::checked(4, &kept, &recorder),
            Err(Error::Custom(_))
        ));

        // kept and rejected
        recorder.record_rejection("1", Reason::TooShort, None);
        assert!(matches!(
            StageReport::checked(3, &kept, &recorder),
            Err(Error::Custom(_))
        ));
    }

    #[test]
    fn serializes_reasons_as_keys() {
        let recorder = AuditRecorder::new(Stage::Bots);
        recorder.record_rejection("9", Reason::BotActivity, None);

        let mut report = RunReport::new("0.1.0", "abc".to_string(), 1);
        report
            .stages
            .push(StageReport::checked(1, &[], &recorder).unwrap());

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""by_reason":{"bot_activity":1}"#));
        assert!(json.contains(r#""stage":"bots""#));

        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert_eq!(back.rejected(), 1);
    }
}
