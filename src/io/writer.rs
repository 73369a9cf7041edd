/*! Output writing.

Every file of a run lands in a single destination folder:

| file | columns |
|------|---------|
| `heavy.csv` | `id`, `tokens` (space-joined) |
| `light.csv` | `id`, `text` |
| `<prefix>bots_removed.csv` | `id`, `author_id`, `rate` |
| `<prefix>foreign_removed.csv` | `id`, `detected_language`, `confidence` |
| `audit_<stage>.csv` | `id`, `stage`, `reason`, `evidence` |
| `report.json` | the [RunReport] |
!*/
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    audit::{Evidence, Reason, RejectionEntry, Stage},
    error::Error,
    pipeline::{RunOutput, RunReport},
    transformers::{HeavyRecord, LightRecord},
};

#[derive(Debug, Serialize)]
struct HeavyRow<'a> {
    id: &'a str,
    tokens: String,
}

#[derive(Debug, Serialize)]
struct AuditRow<'a> {
    id: &'a str,
    stage: &'static str,
    reason: &'static str,
    evidence: String,
}

/// Row of a removed bots trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotRow {
    pub id: String,
    pub author_id: String,
    pub rate: f64,
}

#[derive(Debug, Serialize)]
struct ForeignRow<'a> {
    id: &'a str,
    detected_language: &'a str,
    confidence: f32,
}

pub struct OutputWriter {
    dst: PathBuf,
    prefix: String,
}

impl OutputWriter {
    /// Create a writer into `dst`, creating the folder if needed.
    pub fn new(dst: &Path, prefix: String) -> Result<Self, Error> {
        if !dst.exists() {
            warn!("destination {dst:?} does not exist, creating it");
            std::fs::create_dir_all(dst)?;
        }
        Ok(Self {
            dst: dst.to_path_buf(),
            prefix,
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dst.join(name)
    }

    fn write_rows<T, I>(&self, name: &str, rows: I) -> Result<PathBuf, Error>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let path = self.path(name);
        let mut writer = csv::Writer::from_path(&path)?;
        let mut count = 0;
        for row in rows {
            writer.serialize(row)?;
            count += 1;
        }
        writer.flush()?;
        debug!("wrote {count} rows to {path:?}");
        Ok(path)
    }

    /// Write a header-only CSV, so that empty outputs are still well-formed.
    fn write_header(&self, name: &str, header: &[&str]) -> Result<PathBuf, Error> {
        let path = self.path(name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(header)?;
        writer.flush()?;
        Ok(path)
    }

    pub fn write_heavy(&self, records: &[HeavyRecord]) -> Result<PathBuf, Error> {
        if records.is_empty() {
            return self.write_header("heavy.csv", &["id", "tokens"]);
        }
        self.write_rows(
            "heavy.csv",
            records.iter().map(|r| HeavyRow {
                id: &r.id,
                tokens: r.tokens.join(" "),
            }),
        )
    }

    pub fn write_light(&self, records: &[LightRecord]) -> Result<PathBuf, Error> {
        if records.is_empty() {
            return self.write_header("light.csv", &["id", "text"]);
        }
        self.write_rows("light.csv", records)
    }

    /// Write the trail of a stage.
    pub fn write_audit(&self, stage: Stage, trail: &[RejectionEntry]) -> Result<PathBuf, Error> {
        let name = format!("audit_{stage}.csv");
        if trail.is_empty() {
            return self.write_header(&name, &["id", "stage", "reason", "evidence"]);
        }
        self.write_rows(
            &name,
            trail.iter().map(|e| AuditRow {
                id: &e.id,
                stage: e.stage.as_str(),
                reason: e.reason.as_str(),
                evidence: e.evidence.as_ref().map(ToString::to_string).unwrap_or_default(),
            }),
        )
    }

    /// Write the records removed as bots, with the rate of their author.
    pub fn write_bots(&self, trail: &[RejectionEntry]) -> Result<PathBuf, Error> {
        let name = format!("{}bots_removed.csv", self.prefix);
        let rows: Vec<BotRow> = trail
            .iter()
            .filter_map(|e| match (&e.reason, &e.evidence) {
                (Reason::BotActivity, Some(Evidence::Rate { author_id, rate })) => Some(BotRow {
                    id: e.id.clone(),
                    author_id: author_id.clone(),
                    rate: *rate,
                }),
                _ => None,
            })
            .collect();

        if rows.is_empty() {
            return self.write_header(&name, &["id", "author_id", "rate"]);
        }
        self.write_rows(&name, rows)
    }

    /// Write the records removed as foreign, with their detected language.
    pub fn write_foreign(&self, trail: &[RejectionEntry]) -> Result<PathBuf, Error> {
        let name = format!("{}foreign_removed.csv", self.prefix);
        let rows: Vec<ForeignRow> = trail
            .iter()
            .filter_map(|e| match (&e.reason, &e.evidence) {
                (Reason::ForeignLanguage, Some(Evidence::Language { code, confidence })) => {
                    Some(ForeignRow {
                        id: &e.id,
                        detected_language: code,
                        confidence: *confidence,
                    })
                }
                _ => None,
            })
            .collect();

        if rows.is_empty() {
            return self.write_header(&name, &["id", "detected_language", "confidence"]);
        }
        self.write_rows(&name, rows)
    }

    pub fn write_report(&self, report: &RunReport) -> Result<PathBuf, Error> {
        let path = self.path("report.json");
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, report)?;
        Ok(path)
    }

    /// Write every output of a run. Returns the written paths.
    pub fn write_all(&self, output: &RunOutput) -> Result<Vec<PathBuf>, Error> {
        let mut written = vec![
            self.write_heavy(&output.corpora.heavy)?,
            self.write_light(&output.corpora.light)?,
        ];

        for recorder in output.audit.recorders() {
            written.push(self.write_audit(recorder.stage(), &recorder.trail())?);
        }
        written.push(self.write_foreign(&output.audit.trail(Stage::Language))?);
        written.push(self.write_bots(&output.audit.trail(Stage::Bots))?);
        written.push(self.write_report(&output.report)?);

        info!("wrote {} files into {:?}", written.len(), self.dst);
        Ok(written)
    }
}
