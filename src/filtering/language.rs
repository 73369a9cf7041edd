/*! Language filtering.

Each record is classified by an [Identifier]. Records whose top prediction is not the target
language, or is not confident enough, are rejected as `foreign_language`.

Classifications run concurrently on a tokio runtime (a dedicated one unless called from a
multi-threaded runtime), each one on the blocking pool and
bounded by a timeout. A classification that fails, panics or times out rejects its record as
`classification_error` instead of stalling or aborting the run.
!*/
use std::{sync::Arc, time::Duration};

use futures::{stream, StreamExt};
use log::{error, info};
use oxilangtag::LanguageTag;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::{
    audit::{AuditRecorder, Evidence, Reason, Rejection},
    config::LanguageConfig,
    error::Error,
    identifiers::{same_language, Identification, Identifier},
    record::Record,
};

use super::Verdict;

pub struct LanguageFilter {
    identifier: Arc<dyn Identifier>,
    target: LanguageTag<String>,
    threshold: f32,
    timeout: Duration,
    concurrency: usize,
}

impl LanguageFilter {
    pub fn new(
        identifier: Arc<dyn Identifier>,
        target: LanguageTag<String>,
        threshold: f32,
        timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            identifier,
            target,
            threshold,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(
        identifier: Arc<dyn Identifier>,
        config: &LanguageConfig,
    ) -> Result<Self, Error> {
        let target = LanguageTag::parse(config.target.clone())?;
        Ok(Self::new(
            identifier,
            target,
            config.threshold,
            Duration::from_millis(config.timeout_ms),
            config.concurrency,
        ))
    }

    /// Verdict for a successful identification.
    fn judge(&self, identification: Option<Identification>) -> Verdict {
        match identification {
            Some(id) if same_language(id.label(), &self.target) && id.prob() >= self.threshold => {
                Verdict::Keep
            }
            Some(id) => Verdict::Reject(Rejection::new(
                Reason::ForeignLanguage,
                Some(Evidence::Language {
                    code: id.label().to_string(),
                    confidence: id.prob(),
                }),
            )),
            None => Verdict::Reject(Rejection::new(
                Reason::ForeignLanguage,
                Some(Evidence::Language {
                    code: "und".to_string(),
                    confidence: 0.0,
                }),
            )),
        }
    }

    fn classification_error(msg: String) -> Verdict {
        Verdict::Reject(Rejection::new(
            Reason::ClassificationError,
            Some(Evidence::Message(msg)),
        ))
    }

    /// Classify a single record.
    async fn classify(&self, record: &Record) -> Verdict {
        if record.text().trim().is_empty() {
            return Verdict::Reject(Rejection::new(Reason::EmptyText, None));
        }

        let identifier = Arc::clone(&self.identifier);
        let text = record.text().to_string();
        let task = tokio::task::spawn_blocking(move || identifier.identify(&text));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(identification))) => self.judge(identification),
            Ok(Ok(Err(e))) => Self::classification_error(e.to_string()),
            Ok(Err(join_error)) => {
                error!("classification of {} panicked: {join_error}", record.id());
                Self::classification_error(format!("classification task failed: {join_error}"))
            }
            Err(_) => Self::classification_error(format!(
                "classification timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }

    /// Classify every record, `concurrency` at a time, in input order.
    async fn verdicts(&self, records: Vec<Record>) -> Vec<(Record, Verdict)> {
        stream::iter(records)
            .map(|record| async move {
                let verdict = self.classify(&record).await;
                (record, verdict)
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Filter a whole stage input.
    ///
    /// Survivors keep their input order.
    /// Outside of a tokio runtime the filter builds its own. Within a multi-threaded one it
    /// blocks the current worker, and a current-thread runtime is refused.
    pub fn apply(&self, records: Vec<Record>, recorder: &AuditRecorder) -> Result<Vec<Record>, Error> {
        let nb_input = records.len();
        info!("[language] checking {nb_input} records");

        let verdicts = match Handle::try_current() {
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(self.concurrency)
                    .enable_time()
                    .build()?;
                let verdicts = runtime.block_on(self.verdicts(records));
                // timed out classifications may still be running on the blocking pool.
                runtime.shutdown_background();
                verdicts
            }
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.verdicts(records)))
            }
            Ok(_) => {
                return Err(Error::Custom(
                    "language filter cannot run on a current-thread tokio runtime".to_string(),
                ))
            }
        };

        let mut kept = Vec::with_capacity(verdicts.len());
        for (record, verdict) in verdicts {
            match verdict {
                Verdict::Keep => kept.push(record),
                Verdict::Reject(rejection) => {
                    recorder.record_rejection(record.id(), rejection.reason, rejection.evidence);
                }
            }
        }

        info!(
            "[language] retained {} {} records ({} rejected)",
            kept.len(),
            self.target,
            nb_input - kept.len()
        );
        Ok(kept)
    }
}
