/*! CSV dataset reader.

The header is checked before any row is read: a missing column is a schema error.
Row level problems (missing field, unparseable timestamp, repeated identifier) are rejections, never errors.
!*/
use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use flate2::read::MultiGzDecoder;
use log::{debug, info};

use crate::{
    audit::{AuditRecorder, Evidence, Reason},
    config::ColumnConfig,
    error::Error,
    record::Record,
};

/// Result of the ingestion of a dataset.
#[derive(Debug, Default)]
pub struct Ingested {
    /// Number of data rows read.
    pub rows: usize,
    pub records: Vec<Record>,
}

/// Column positions of the record fields.
#[derive(Debug, Clone, Copy)]
struct Positions {
    id: usize,
    author_id: usize,
    text: usize,
    timestamp: usize,
    candidate_tag: usize,
}

pub struct CsvReader {
    columns: ColumnConfig,
}

impl CsvReader {
    pub fn new(columns: ColumnConfig) -> Self {
        Self { columns }
    }

    /// Read a dataset from a file. Files ending in `.gz` are decompressed on the fly.
    pub fn read_path(&self, path: &Path, recorder: &AuditRecorder) -> Result<Ingested, Error> {
        info!("reading dataset {path:?}");
        let file = File::open(path)?;
        let is_gzip = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"));

        if is_gzip {
            self.read(MultiGzDecoder::new(BufReader::new(file)), recorder)
        } else {
            self.read(BufReader::new(file), recorder)
        }
    }

    pub fn read<R: Read>(&self, reader: R, recorder: &AuditRecorder) -> Result<Ingested, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let positions = self.positions(reader.headers()?)?;

        let mut ingested = Ingested::default();
        // every id handed out so far, kept or rejected
        let mut ids = HashSet::new();
        for (idx, row) in reader.records().enumerate() {
            ingested.rows += 1;
            // header is line 1
            let line = idx + 2;

            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    let msg = e.to_string();
                    Self::reject(recorder, &mut ids, "", line, Reason::MalformedRecord, msg);
                    continue;
                }
            };

            let record = match Self::to_record(&row, positions) {
                Ok(record) => record,
                Err(msg) => {
                    let id = row.get(positions.id).unwrap_or_default().trim();
                    Self::reject(recorder, &mut ids, id, line, Reason::MalformedRecord, msg);
                    continue;
                }
            };

            if ids.contains(record.id()) {
                let msg = format!("id {} already seen, line {line}", record.id());
                Self::reject(recorder, &mut ids, "", line, Reason::DuplicateId, msg);
                continue;
            }
            ids.insert(record.id().to_string());

            ingested.records.push(record);
        }

        info!(
            "[ingest] read {} rows, {} records ({} rejected)",
            ingested.rows,
            ingested.records.len(),
            ingested.rows - ingested.records.len()
        );
        Ok(ingested)
    }

    /// Reject a row under its id, or under a `line:<n>` key when the id is empty or already used.
    /// The key is claimed in `ids`, so a later row with the same id is a duplicate
    /// and every rejected row gets its own trail entry.
    fn reject(
        recorder: &AuditRecorder,
        ids: &mut HashSet<String>,
        id: &str,
        line: usize,
        reason: Reason,
        msg: String,
    ) {
        let key = if id.is_empty() || ids.contains(id) {
            Self::line_key(ids, line)
        } else {
            id.to_string()
        };
        ids.insert(key.clone());
        debug!("[ingest] rejected row {key}: {msg}");
        recorder.record_rejection(&key, reason, Some(Evidence::Message(msg)));
    }

    /// `line:<n>`, suffixed with `#<k>` if a record already uses that id.
    fn line_key(ids: &HashSet<String>, line: usize) -> String {
        let key = format!("line:{line}");
        if !ids.contains(&key) {
            return key;
        }
        (1..)
            .map(|k| format!("{key}#{k}"))
            .find(|candidate| !ids.contains(candidate))
            .unwrap_or(key)
    }

    fn positions(&self, headers: &csv::StringRecord) -> Result<Positions, Error> {
        let find = |role: &str, name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    Error::Schema(format!("missing {role} column {name:?} (found {headers:?})"))
                })
        };

        let c = &self.columns;
        Ok(Positions {
            id: find("id", c.id.as_str())?,
            author_id: find("author_id", c.author_id.as_str())?,
            text: find("text", c.text.as_str())?,
            timestamp: find("timestamp", c.timestamp.as_str())?,
            candidate_tag: find("candidate_tag", c.candidate_tag.as_str())?,
        })
    }

    fn to_record(row: &csv::StringRecord, p: Positions) -> Result<Record, String> {
        let field = |name: &str, pos: usize| {
            row.get(pos)
                .ok_or_else(|| format!("missing field {name} ({} fields)", row.len()))
        };
        let non_empty = |name: &str, pos: usize| {
            field(name, pos).and_then(|value| {
                let value = value.trim();
                if value.is_empty() {
                    Err(format!("empty field {name}"))
                } else {
                    Ok(value)
                }
            })
        };

        let id = non_empty("id", p.id)?;
        let author_id = non_empty("author_id", p.author_id)?;
        let text = field("text", p.text)?;
        let timestamp = non_empty("timestamp", p.timestamp)?;
        let candidate_tag = field("candidate_tag", p.candidate_tag)?;

        let timestamp =
            parse_timestamp(timestamp).ok_or_else(|| format!("invalid timestamp {timestamp:?}"))?;

        Ok(Record::new(
            id.to_string(),
            author_id.to_string(),
            text.to_string(),
            timestamp,
            candidate_tag.trim().to_string(),
        ))
    }
}

/// Parse a timestamp. Accepted forms:
///
/// - RFC 3339 (`2020-10-15T08:30:00Z`, `2020-10-15T10:30:00+02:00`),
/// - `2020-10-15 08:30:00`, optionally with fractional seconds, read as UTC,
/// - Twitter API style (`Thu Oct 15 08:30:00 +0000 2020`),
/// - integer Unix seconds.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%a %b %d %H:%M:%S %z %Y") {
        return Some(dt.with_timezone(&Utc));
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{TimeZone, Utc};
    use flate2::{write::GzEncoder, Compression};

    use crate::{
        audit::{AuditRecorder, Reason, Stage},
        config::ColumnConfig,
        error::Error,
    };

    use super::{parse_timestamp, CsvReader};

    const DATASET: &str = "\
id,author_id,text,timestamp,candidate_tag
1,a,\"great rally, tonight\",2020-10-15 08:30:00,trump
2,b,another one,2020-10-15T08:30:00Z,biden
3,c,bad time,yesterday,biden
1,d,same id,1602750600,trump
4,,no author,1602750600,trump
5,e,short row
";

    #[test]
    fn timestamps() {
        let expected = Utc.with_ymd_and_hms(2020, 10, 15, 8, 30, 0).unwrap();
        for value in [
            "2020-10-15T08:30:00Z",
            "2020-10-15T10:30:00+02:00",
            "2020-10-15 08:30:00",
            "2020-10-15 08:30:00.000",
            "Thu Oct 15 08:30:00 +0000 2020",
            "1602750600",
        ] {
            assert_eq!(parse_timestamp(value), Some(expected), "{value}");
        }
        assert_eq!(parse_timestamp("15/10/2020"), None);
    }

    #[test]
    fn rows_are_sorted_out() {
        let recorder = AuditRecorder::new(Stage::Ingest);
        let ingested = CsvReader::new(ColumnConfig::default())
            .read(DATASET.as_bytes(), &recorder)
            .unwrap();

        assert_eq!(ingested.rows, 6);
        let ids: Vec<_> = ingested.records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(ingested.records[0].text(), "great rally, tonight");

        let trail: Vec<_> = recorder
            .trail()
            .into_iter()
            .map(|e| (e.id, e.reason))
            .collect();
        assert_eq!(
            trail,
            vec![
                ("3".to_string(), Reason::MalformedRecord),
                ("line:5".to_string(), Reason::DuplicateId),
                ("4".to_string(), Reason::MalformedRecord),
                ("5".to_string(), Reason::MalformedRecord),
            ]
        );
    }

    #[test]
    fn every_rejected_row_is_traced() {
        let recorder = AuditRecorder::new(Stage::Ingest);
        let data = "\
id,author_id,text,timestamp,candidate_tag
7,a,first,1602750600,trump
7,b,second,1602750600,trump
7,c,third,1602750600,trump
,d,no id,1602750600,trump
";
        let ingested = CsvReader::new(ColumnConfig::default())
            .read(data.as_bytes(), &recorder)
            .unwrap();

        assert_eq!(ingested.records.len(), 1);
        assert_eq!(ingested.rows, ingested.records.len() + recorder.len());

        let ids: Vec<_> = recorder.trail().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["line:3", "line:4", "line:5"]);
    }

    #[test]
    fn malformed_row_claims_its_id() {
        let recorder = AuditRecorder::new(Stage::Ingest);
        let data = "\
id,author_id,text,timestamp,candidate_tag
7,a,bad date,not-a-date,trump
7,b,good date,2020-10-15 08:00:00,trump
8,c,kept,2020-10-15 08:00:00,trump
";
        let ingested = CsvReader::new(ColumnConfig::default())
            .read(data.as_bytes(), &recorder)
            .unwrap();

        let kept: Vec<_> = ingested.records.iter().map(|r| r.id()).collect();
        assert_eq!(kept, vec!["8"]);
        let trail: Vec<_> = recorder
            .trail()
            .into_iter()
            .map(|e| (e.id, e.reason))
            .collect();
        assert_eq!(
            trail,
            vec![
                ("7".to_string(), Reason::MalformedRecord),
                ("line:3".to_string(), Reason::DuplicateId),
            ]
        );
        assert!(kept.iter().all(|id| !recorder.contains(id)));
    }

    #[test]
    fn line_keys_never_collide_with_ids() {
        let recorder = AuditRecorder::new(Stage::Ingest);
        let data = "\
id,author_id,text,timestamp,candidate_tag
line:3,a,valid tweet,1602750600,trump
,b,row without id,1602750600,trump
line:3#1,c,another valid tweet,1602750600,trump
,d,row without id on line 5,1602750600,trump
";
        let ingested = CsvReader::new(ColumnConfig::default())
            .read(data.as_bytes(), &recorder)
            .unwrap();

        let kept: Vec<_> = ingested.records.iter().map(|r| r.id()).collect();
        assert_eq!(kept, vec!["line:3"]);
        let trail: Vec<_> = recorder
            .trail()
            .into_iter()
            .map(|e| (e.id, e.reason))
            .collect();
        assert_eq!(
            trail,
            vec![
                ("line:3#1".to_string(), Reason::MalformedRecord),
                ("line:4".to_string(), Reason::DuplicateId),
                ("line:5".to_string(), Reason::MalformedRecord),
            ]
        );
        assert_eq!(ingested.rows, ingested.records.len() + recorder.len());
    }

    #[test]
    fn missing_column() {
        let recorder = AuditRecorder::new(Stage::Ingest);
        let data = "id,author_id,tweet,timestamp,candidate_tag\n1,a,hello,1602750600,trump\n";

        let result = CsvReader::new(ColumnConfig::default()).read(data.as_bytes(), &recorder);
        assert!(matches!(result, Err(Error::Schema(_))));
        assert!(recorder.is_empty());
    }

    #[test]
    fn custom_columns() {
        let recorder = AuditRecorder::new(Stage::Ingest);
        let data = "tweet_id,user_id,tweet,created_at,source_file\n1,a,hello there,1602750600,biden\n";
        let columns = ColumnConfig {
            id: "tweet_id".to_string(),
            author_id: "user_id".to_string(),
            text: "tweet".to_string(),
            timestamp: "created_at".to_string(),
            candidate_tag: "source_file".to_string(),
        };

        let ingested = CsvReader::new(columns).read(data.as_bytes(), &recorder).unwrap();
        assert_eq!(ingested.records.len(), 1);
        assert_eq!(ingested.records[0].candidate_tag(), "biden");
    }

    #[test]
    fn gzipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.csv.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::fast());
        encoder.write_all(DATASET.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let recorder = AuditRecorder::new(Stage::Ingest);
        let ingested = CsvReader::new(ColumnConfig::default())
            .read_path(&path, &recorder)
            .unwrap();
        assert_eq!(ingested.records.len(), 2);
    }
}
