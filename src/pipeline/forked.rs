/*! Filter, scrub and fork pipeline.

Stages run in a fixed order, each one consuming the whole output of the previous one:

```text
ingest -> language -> noise -> bots -> scrub -> fork (heavy | light)
```

Rejecting stages write to their own trail of the run's [AuditLog].
After each of them, the pipeline checks that survivors and rejections partition the stage input.

A fatal error is tagged with the stage at which it occurred (see [Error::at]).
!*/
use std::{io::Read, path::PathBuf, sync::Arc};

use log::info;

use crate::{
    audit::{AuditLog, AuditRecorder, Stage},
    config::PipelineConfig,
    error::Error,
    filtering::{BotDetector, LanguageFilter, NoiseFilter},
    identifiers::{FastText, Identifier},
    io::{CsvReader, Ingested},
    record::Record,
    transformers::{EntityScrubber, ForkedCorpora, OutputForker},
};

use super::{
    pipeline::Pipeline,
    report::{OutputReport, RunReport, ScrubReport, StageReport},
    VERSION,
};

/// Everything a completed run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub corpora: ForkedCorpora,
    pub audit: AuditLog,
    pub report: RunReport,
}

/// Tags errors with `stage`.
fn at(stage: Stage) -> impl Fn(Error) -> Error {
    move |e| e.at(stage)
}

fn recorder(audit: &AuditLog, stage: Stage) -> Result<&AuditRecorder, Error> {
    audit
        .recorder(stage)
        .ok_or_else(|| Error::Custom(format!("no audit trail for stage {stage}")).at(stage))
}

pub struct ForkedPipeline {
    src: PathBuf,
    config: PipelineConfig,
    identifier: Arc<dyn Identifier>,
}

impl ForkedPipeline {
    pub fn new(src: PathBuf, config: PipelineConfig, identifier: Arc<dyn Identifier>) -> Self {
        Self {
            src,
            config,
            identifier,
        }
    }

    /// Validate `config` and load the fastText model it points to.
    pub fn with_fasttext(src: PathBuf, config: PipelineConfig) -> Result<Self, Error> {
        config.validate().map_err(at(Stage::Setup))?;
        let model = FastText::from_path(&config.language.lid_path).map_err(at(Stage::Setup))?;
        Ok(Self::new(src, config, Arc::new(model)))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run over an in-memory CSV dataset instead of `src`.
    pub fn run_reader<R: Read>(&self, reader: R) -> Result<RunOutput, Error> {
        self.process(|csv, recorder| csv.read(reader, recorder))
    }

    /// Run a rejecting stage, then check and report its partition.
    fn filter_stage<F>(
        audit: &AuditLog,
        report: &mut RunReport,
        stage: Stage,
        records: Vec<Record>,
        filter: F,
    ) -> Result<Vec<Record>, Error>
    where
        F: FnOnce(Vec<Record>, &AuditRecorder) -> Result<Vec<Record>, Error>,
    {
        let recorder = recorder(audit, stage)?;
        let input = records.len();
        let kept = filter(records, recorder).map_err(at(stage))?;
        report
            .stages
            .push(StageReport::checked(input, &kept, recorder).map_err(at(stage))?);
        Ok(kept)
    }

    fn process<F>(&self, ingest: F) -> Result<RunOutput, Error>
    where
        F: FnOnce(&CsvReader, &AuditRecorder) -> Result<Ingested, Error>,
    {
        let config = &self.config;
        config.validate().map_err(at(Stage::Setup))?;
        let digest = config.digest().map_err(at(Stage::Setup))?;

        let language = LanguageFilter::from_config(Arc::clone(&self.identifier), &config.language)
            .map_err(at(Stage::Setup))?;
        let mut noise = NoiseFilter::from_config(&config.noise);
        let bots = BotDetector::from_config(&config.bots);
        let scrubber = EntityScrubber::from_config(&config.scrub).map_err(at(Stage::Setup))?;
        let forker = OutputForker::from_config(config).map_err(at(Stage::Setup))?;
        let csv = CsvReader::new(config.columns.clone());

        let audit = AuditLog::default();

        let ingest_recorder = recorder(&audit, Stage::Ingest)?;
        let ingested = ingest(&csv, ingest_recorder).map_err(at(Stage::Ingest))?;
        let mut report = RunReport::new(VERSION, digest, ingested.rows);
        report.stages.push(
            StageReport::checked(ingested.rows, &ingested.records, ingest_recorder)
                .map_err(at(Stage::Ingest))?,
        );

        let records = Self::filter_stage(
            &audit,
            &mut report,
            Stage::Language,
            ingested.records,
            |records, recorder| language.apply(records, recorder),
        )?;
        let records = Self::filter_stage(
            &audit,
            &mut report,
            Stage::Noise,
            records,
            |records, recorder| Ok(noise.apply(records, recorder)),
        )?;
        let records = Self::filter_stage(
            &audit,
            &mut report,
            Stage::Bots,
            records,
            |records, recorder| Ok(bots.apply(records, recorder)),
        )?;

        let scrubbed = scrubber.apply(records);
        report.scrub = ScrubReport {
            removals: scrubbed.iter().map(|r| r.removals()).sum(),
            records_touched: scrubbed.iter().filter(|r| r.removals() > 0).count(),
        };

        let corpora = forker.fork(&scrubbed).map_err(at(Stage::Fork))?;
        report.output = OutputReport {
            heavy: corpora.heavy.len(),
            light: corpora.light.len(),
            empty_heavy: corpora.heavy.iter().filter(|h| h.tokens.is_empty()).count(),
        };

        report.log();
        Ok(RunOutput {
            corpora,
            audit,
            report,
        })
    }
}

impl Pipeline<RunOutput> for ForkedPipeline {
    fn run(&self) -> Result<RunOutput, Error> {
        info!("running on {:?}", self.src);
        self.process(|csv, recorder| csv.read_path(&self.src, recorder))
    }
}
