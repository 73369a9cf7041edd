//! # Tweetsieve
//!
//! Turns candidate-tagged election tweets into two corpora:
//! a heavily normalized one for topic modeling and a lightly normalized one for contextual models.
//!
//! ```sh
//! tweetsieve 0.3.0
//! Election tweets corpus preparation.
//!
//! USAGE:
//!     tweetsieve <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     help            Prints this message or the help of the given subcommand(s)
//!     inspect-bots    Summarize a removed bots trail
//!     run             Run the filter/scrub/fork pipeline
//!     schema          Print the JSON schema of the configuration file
//! ```
use structopt::StructOpt;
use tweetsieve::{
    audit::Stage,
    config::PipelineConfig,
    error::Error,
    forensics::BotForensics,
    io::OutputWriter,
    pipeline::{ForkedPipeline, Pipeline},
};

#[macro_use]
extern crate log;

mod cli;

fn run(opt: cli::Tweetsieve) -> Result<(), Error> {
    match opt {
        cli::Tweetsieve::Run(r) => {
            let config = r.config().map_err(|e| e.at(Stage::Setup))?;
            debug!("effective configuration\n{:#?}", config);

            let writer = OutputWriter::new(&r.dst, config.file_prefix())
                .map_err(|e| e.at(Stage::Setup))?;
            let pipeline = ForkedPipeline::with_fasttext(r.src, config)?;
            let output = pipeline.run()?;
            writer.write_all(&output).map_err(|e| e.at(Stage::Output))?;
        }
        cli::Tweetsieve::InspectBots(i) => {
            let forensics = BotForensics::from_path(&i.src, i.rate_ceiling)?;
            print!("{forensics}");
        }
        cli::Tweetsieve::Schema => {
            let schema = schemars::schema_for!(PipelineConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    };
    Ok(())
}

fn main() {
    env_logger::init();

    let opt = cli::Tweetsieve::from_args();
    debug!("cli args\n{:#?}", opt);

    if let Err(e) = run(opt) {
        match e.stage() {
            Some(stage) => error!("run failed during {stage} stage: {e}"),
            None => error!("{e}"),
        }
        std::process::exit(1);
    }
}
