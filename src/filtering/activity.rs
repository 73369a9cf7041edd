/*! Activity outlier (bot) detection.

Detection is done in two phases, over the full set of records that went through the noise filter:

1. [ActivityProfiles::build] groups records by author and computes a posting rate for each of them,
1. [BotDetector::flag] computes the rate distribution, then flags authors that are both above an absolute
   rate ceiling and above a quantile of the distribution.

Records of flagged authors are then rejected through [FlaggedAuthors], which implements [Filter].

Both conditions are required: the ceiling avoids flagging the top of a long human tail,
the quantile avoids flagging everyone in a dataset where activity is uniformly high.
!*/
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{
    audit::{AuditRecorder, Evidence, Reason, Rejection},
    config::BotConfig,
    record::Record,
};

use super::{sift, Filter, Verdict};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Posting activity of a single author.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorActivityProfile {
    author_id: String,
    post_count: usize,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl AuthorActivityProfile {
    fn new(record: &Record) -> Self {
        Self {
            author_id: record.author_id().to_string(),
            post_count: 1,
            first_seen: *record.timestamp(),
            last_seen: *record.timestamp(),
        }
    }

    fn add(&mut self, record: &Record) {
        self.post_count += 1;
        self.first_seen = self.first_seen.min(*record.timestamp());
        self.last_seen = self.last_seen.max(*record.timestamp());
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn post_count(&self) -> usize {
        self.post_count
    }

    /// Span between earliest and latest post, in (fractional) days.
    pub fn observed_days(&self) -> f64 {
        (self.last_seen - self.first_seen).num_seconds() as f64 / SECONDS_PER_DAY
    }

    /// Posts per day. The observed span is at least one day.
    pub fn rate(&self) -> f64 {
        self.post_count as f64 / self.observed_days().max(1.0)
    }
}

/// Author profiles of a dataset. Read-only once built.
#[derive(Debug, Default)]
pub struct ActivityProfiles(HashMap<String, AuthorActivityProfile>);

impl ActivityProfiles {
    pub fn build(records: &[Record]) -> Self {
        let mut profiles: HashMap<String, AuthorActivityProfile> = HashMap::new();
        for record in records {
            profiles
                .entry(record.author_id().to_string())
                .and_modify(|profile| profile.add(record))
                .or_insert_with(|| AuthorActivityProfile::new(record));
        }
        Self(profiles)
    }

    pub fn get(&self, author_id: &str) -> Option<&AuthorActivityProfile> {
        self.0.get(author_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthorActivityProfile> {
        self.0.values()
    }
}

/// Authors flagged as automated, with their rate.
#[derive(Debug, Default)]
pub struct FlaggedAuthors(HashMap<String, f64>);

impl FlaggedAuthors {
    pub fn contains(&self, author_id: &str) -> bool {
        self.0.contains_key(author_id)
    }

    pub fn rate(&self, author_id: &str) -> Option<f64> {
        self.0.get(author_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Filter<&Record> for FlaggedAuthors {
    fn detect(&self, record: &Record) -> Verdict {
        match self.rate(record.author_id()) {
            Some(rate) => Verdict::Reject(Rejection::new(
                Reason::BotActivity,
                Some(Evidence::Rate {
                    author_id: record.author_id().to_string(),
                    rate,
                }),
            )),
            None => Verdict::Keep,
        }
    }
}

/// Joint ceiling/quantile outlier rule.
#[derive(Debug, Clone)]
pub struct BotDetector {
    rate_ceiling: f64,
    percentile: f64,
    min_posts_for_percentile: usize,
}

impl Default for BotDetector {
    fn default() -> Self {
        Self::from_config(&BotConfig::default())
    }
}

impl BotDetector {
    /// `percentile` is a fraction, clamped to `[0, 1]`.
    pub fn new(rate_ceiling: f64, percentile: f64, min_posts_for_percentile: usize) -> Self {
        if !(0.0..=1.0).contains(&percentile) {
            warn!("[bots] percentile {percentile} out of [0, 1], clamping");
        }
        Self {
            rate_ceiling,
            percentile,
            min_posts_for_percentile,
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(
            config.rate_ceiling,
            config.percentile,
            config.min_posts_for_percentile,
        )
    }

    /// Rate quantile over the authors that have at least `min_posts_for_percentile` posts.
    /// Returns [None] if no author qualifies.
    pub fn rate_cutoff(&self, profiles: &ActivityProfiles) -> Option<f64> {
        let mut rates: Vec<f64> = profiles
            .iter()
            .filter(|p| p.post_count() >= self.min_posts_for_percentile)
            .map(AuthorActivityProfile::rate)
            .collect();
        rates.sort_by(f64::total_cmp);
        quantile(&rates, self.percentile)
    }

    /// Flag authors whose rate exceeds both the ceiling and the cutoff.
    pub fn flag(&self, profiles: &ActivityProfiles) -> FlaggedAuthors {
        let cutoff = match self.rate_cutoff(profiles) {
            Some(cutoff) => cutoff,
            None => return FlaggedAuthors::default(),
        };
        debug!(
            "[bots] rate cutoff (q={}): {cutoff:.2}, ceiling: {:.2}",
            self.percentile, self.rate_ceiling
        );

        let flagged = profiles
            .iter()
            .filter(|p| {
                let rate = p.rate();
                rate > self.rate_ceiling && rate > cutoff
            })
            .map(|p| {
                debug!(
                    "[bots] flagged {}: {} posts in {:.2} days ({:.2}/day)",
                    p.author_id(),
                    p.post_count(),
                    p.observed_days(),
                    p.rate()
                );
                (p.author_id().to_string(), p.rate())
            })
            .collect();

        FlaggedAuthors(flagged)
    }

    /// Build profiles, flag authors and reject their records.
    ///
    /// Has to be given the *whole* surviving set: rates depend on every record of an author.
    pub fn apply(&self, records: Vec<Record>, recorder: &AuditRecorder) -> Vec<Record> {
        let nb_input = records.len();
        let profiles = ActivityProfiles::build(&records);
        let flagged = self.flag(&profiles);
        info!(
            "[bots] {} authors, {} flagged as automated",
            profiles.len(),
            flagged.len()
        );

        let kept = sift(records, recorder, |record| flagged.detect(record));
        info!(
            "[bots] retained {} records ({} rejected)",
            kept.len(),
            nb_input - kept.len()
        );
        kept
    }
}

/// Quantile of sorted `values`, linearly interpolated between closest ranks.
fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let pos = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let fraction = pos - lower as f64;

    Some(values[lower] + (values[upper] - values[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::{
        audit::{AuditRecorder, Evidence, Reason, Stage},
        filtering::tests::{epoch, record},
        record::Record,
    };

    use super::{quantile, ActivityProfiles, BotDetector};

    /// `count` posts evenly spread over `days` days.
    fn author_posts(author: &str, count: usize, days: i64) -> Vec<Record> {
        let span = Duration::days(days).num_minutes();
        (0..count)
            .map(|i| {
                let minutes = if count > 1 {
                    span * i as i64 / (count as i64 - 1)
                } else {
                    0
                };
                record(
                    &format!("{author}-{i}"),
                    author,
                    "some tweet text here",
                    minutes,
                )
            })
            .collect()
    }

    #[test]
    fn test_quantile() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[3.0], 0.995), Some(3.0));
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), Some(3.0));

        let q = quantile(&[10.0, 250.0], 0.995).unwrap();
        assert!((q - 248.8).abs() < 1e-9);

        // out of range fractions are clamped
        assert_eq!(quantile(&[1.0, 2.0, 3.0], 2.0), Some(3.0));
        assert_eq!(quantile(&[1.0, 2.0, 3.0], -1.0), Some(1.0));
    }

    #[test]
    fn profile_rate() {
        let records = author_posts("b", 500, 2);
        let profiles = ActivityProfiles::build(&records);
        let b = profiles.get("b").unwrap();

        assert_eq!(b.post_count(), 500);
        assert!((b.observed_days() - 2.0).abs() < 1e-9);
        assert!((b.rate() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn minimum_span_is_one_day() {
        let records = vec![
            record("1", "a", "one", 0),
            record("2", "a", "two", 1),
            record("3", "a", "three", 2),
        ];
        let profiles = ActivityProfiles::build(&records);
        assert!((profiles.get("a").unwrap().rate() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn only_fast_author_is_flagged() {
        let mut records = author_posts("a", 10, 1);
        records.extend(author_posts("b", 500, 2));
        let recorder = AuditRecorder::new(Stage::Bots);

        let kept = BotDetector::default().apply(records, &recorder);

        assert_eq!(kept.len(), 10);
        assert!(kept.iter().all(|r| r.author_id() == "a"));

        let trail = recorder.trail();
        assert_eq!(trail.len(), 500);
        for entry in trail {
            assert_eq!(entry.reason, Reason::BotActivity);
            match entry.evidence {
                Some(Evidence::Rate { author_id, rate }) => {
                    assert_eq!(author_id, "b");
                    assert!((rate - 250.0).abs() < 1e-9);
                }
                other => panic!("unexpected evidence {other:?}"),
            }
        }
    }

    #[test]
    fn out_of_range_percentile() {
        let mut records = author_posts("a", 10, 1);
        records.extend(author_posts("b", 500, 2));
        let profiles = ActivityProfiles::build(&records);

        // q > 1 is the top rate, which is never strictly exceeded
        assert!(BotDetector::new(144.0, 7.0, 1).flag(&profiles).is_empty());

        // q < 0 is the lowest rate, so only the ceiling applies
        let recorder = AuditRecorder::new(Stage::Bots);
        let kept = BotDetector::new(144.0, -1.0, 1).apply(records, &recorder);
        assert_eq!(kept.len(), 10);
        assert_eq!(recorder.len(), 500);
    }

    #[test]
    fn ceiling_protects_prolific_humans() {
        // b is the top author but stays below the ceiling
        let mut records = author_posts("a", 10, 1);
        records.extend(author_posts("b", 100, 1));

        let profiles = ActivityProfiles::build(&records);
        assert!(BotDetector::default().flag(&profiles).is_empty());
    }

    #[test]
    fn uniformly_high_activity_is_not_flagged() {
        let mut records = Vec::new();
        for author in ["a", "b", "c", "d"] {
            records.extend(author_posts(author, 400, 2));
        }

        let profiles = ActivityProfiles::build(&records);
        assert!(BotDetector::default().flag(&profiles).is_empty());
    }

    #[test]
    fn single_author_is_not_flagged() {
        let records = author_posts("b", 500, 2);
        let profiles = ActivityProfiles::build(&records);
        assert!(BotDetector::default().flag(&profiles).is_empty());
    }

    #[test]
    fn percentile_population_policy() {
        // many one-post authors drag the cutoff down when they are counted
        let mut records = Vec::new();
        for i in 0..50 {
            records.extend(author_posts(&format!("h{i}"), 1, 0));
        }
        records.extend(author_posts("x", 300, 1));
        records.extend(author_posts("y", 600, 1));

        let profiles = ActivityProfiles::build(&records);

        let all = BotDetector::new(144.0, 0.95, 1).flag(&profiles);
        assert!(all.contains("x"));
        assert!(all.contains("y"));

        // only x and y qualify: the cutoff is now between them
        let active_only = BotDetector::new(144.0, 0.95, 2).flag(&profiles);
        assert!(!active_only.contains("x"));
        assert!(active_only.contains("y"));
    }

    #[test]
    fn timestamps_out_of_order() {
        let records = vec![
            record("1", "a", "t", 2 * 24 * 60),
            record("2", "a", "t", 0),
            record("3", "a", "t", 24 * 60),
        ];
        let profiles = ActivityProfiles::build(&records);
        let a = profiles.get("a").unwrap();
        assert!((a.observed_days() - 2.0).abs() < 1e-9);
        assert_eq!(*records[1].timestamp(), epoch());
    }
}
