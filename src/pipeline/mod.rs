//! Pipelines.
//!
//! The module provides a light [pipeline::Pipeline] trait, and [ForkedPipeline],
//! which filters, scrubs and forks a dataset into the heavy and light corpora.
mod forked;
pub mod pipeline;
pub mod report;

pub use forked::{ForkedPipeline, RunOutput};
pub use pipeline::Pipeline;
pub use report::{RunReport, StageReport};

/// Crate version, recorded in run reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
