/*!
# IO utilities

Dataset loading and corpus/trail saving.

- [reader::CsvReader] reads the input CSV (optionally gzipped) into [crate::record::Record]s,
  rejecting malformed rows through the `ingest` audit trail.
- [writer::OutputWriter] writes both corpora, the audit trails and the run report into a destination folder.
!*/
pub mod reader;
pub mod writer;

pub use reader::{CsvReader, Ingested};
pub use writer::OutputWriter;
