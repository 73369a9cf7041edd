/*! Filtering utilities

Filters operate on record level, and are applied in a fixed order:

1. [LanguageFilter]: drops records that are not in the target language,
1. [NoiseFilter]: drops duplicates and too short records,
1. [BotDetector]: drops every record of authors with an outlying posting rate.

Per-record verdicts come from [Filter] when they only depend on the record
(the authors flagged by [BotDetector], through [FlaggedAuthors]),
and from [FilterMut] when earlier records matter ([NoiseFilter] remembers normalized texts).

Each rejection is written to the stage's [crate::audit::AuditRecorder] before the record is dropped.
! */
mod activity;
mod filter;
mod language;
mod noise;

pub use activity::{ActivityProfiles, AuthorActivityProfile, BotDetector, FlaggedAuthors};
pub use filter::{Filter, FilterMut, Verdict};
pub use language::LanguageFilter;
pub use noise::NoiseFilter;

use crate::{audit::AuditRecorder, record::Record};

/// Split `records` into survivors and rejected records,
/// writing each rejection to `recorder`.
///
/// Survivors keep their relative order.
pub(crate) fn sift<F>(records: Vec<Record>, recorder: &AuditRecorder, mut verdict: F) -> Vec<Record>
where
    F: FnMut(&Record) -> Verdict,
{
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        match verdict(&record) {
            Verdict::Keep => kept.push(record),
            Verdict::Reject(rejection) => {
                recorder.record_rejection(record.id(), rejection.reason, rejection.evidence);
            }
        }
    }
    kept
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::{
        audit::{AuditRecorder, Reason, Rejection, Stage},
        record::Record,
    };

    use super::{sift, Verdict};

    pub(crate) use super::language::tests::KeywordIdentifier;

    pub(crate) fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 10, 15, 0, 0, 0).unwrap()
    }

    pub(crate) fn record(id: &str, author: &str, text: &str, minutes: i64) -> Record {
        Record::new(
            id.to_string(),
            author.to_string(),
            text.to_string(),
            epoch() + Duration::minutes(minutes),
            "trump".to_string(),
        )
    }

    #[test]
    fn sift_partitions_input() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&i.to_string(), "a", "some text here", i))
            .collect();
        let recorder = AuditRecorder::new(Stage::Noise);

        let kept = sift(records, &recorder, |r| {
            if r.timestamp().timestamp() % 120 == 0 {
                Verdict::Keep
            } else {
                Verdict::Reject(Rejection::new(Reason::TooShort, None))
            }
        });

        assert_eq!(kept.len(), 5);
        assert_eq!(recorder.len(), 5);
        assert!(kept.iter().all(|r| !recorder.contains(r.id())));
        let kept_ids: Vec<_> = kept.iter().map(|r| r.id()).collect();
        assert_eq!(kept_ids, vec!["0", "2", "4", "6", "8"]);
    }
}
