/*! # Tweetsieve

Layered filtering pipeline for candidate-tagged election tweets.

Records go through language, noise and bot filters, get scrubbed of the candidates' names,
then fork into a heavy (lemmatized token lists) and a light (natural text) corpus.
Every rejected record is kept, with its reason, in a per-stage audit trail.

```no_run
use std::path::PathBuf;
use tweetsieve::{config::PipelineConfig, io::OutputWriter, pipeline::{ForkedPipeline, Pipeline}};

let config = PipelineConfig::default();
let writer = OutputWriter::new(&PathBuf::from("out"), config.file_prefix()).unwrap();
let pipeline = ForkedPipeline::with_fasttext(PathBuf::from("tweets.csv.gz"), config).unwrap();
let output = pipeline.run().unwrap();
writer.write_all(&output).unwrap();
```
!*/
pub mod audit;
pub mod config;
pub mod error;
pub mod filtering;
pub mod forensics;
pub mod identifiers;
pub mod io;
pub mod pipeline;
pub mod record;
pub mod transformers;
