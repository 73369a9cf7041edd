//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;
use tweetsieve::{config::LemmaFallback, config::PipelineConfig, error::Error};

#[derive(Debug, StructOpt)]
#[structopt(name = "tweetsieve", about = "Election tweets corpus preparation.")]
/// Holds every command that is callable by the `tweetsieve` command.
pub enum Tweetsieve {
    #[structopt(about = "Run the filter/scrub/fork pipeline")]
    Run(Run),
    #[structopt(about = "Summarize a removed bots trail")]
    InspectBots(InspectBots),
    #[structopt(about = "Print the JSON schema of the configuration file")]
    Schema,
}

#[derive(Debug, StructOpt)]
/// Run command and parameters.
///
/// Options given on the command line take precedence over the configuration file.
pub struct Run {
    #[structopt(parse(from_os_str), help = "source dataset (csv, optionally gzipped)")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination folder")]
    pub dst: PathBuf,
    #[structopt(long = "config", parse(from_os_str), help = "JSON configuration file")]
    pub config: Option<PathBuf>,
    #[structopt(
        long = "lid-path",
        parse(from_os_str),
        help = "path to the fastText language identification model"
    )]
    pub lid_path: Option<PathBuf>,
    #[structopt(long = "target-lang", help = "target language. Default is en.")]
    pub target_lang: Option<String>,
    #[structopt(
        long = "lang-threshold",
        help = "minimum language confidence. Default is 0.5."
    )]
    pub lang_threshold: Option<f32>,
    #[structopt(long = "min-tokens", help = "minimum number of tokens. Default is 4.")]
    pub min_tokens: Option<usize>,
    #[structopt(
        long = "rate-ceiling",
        help = "bot posting rate ceiling (posts/day). Default is 144."
    )]
    pub rate_ceiling: Option<f64>,
    #[structopt(
        long = "percentile",
        help = "bot posting rate quantile. Default is 0.995."
    )]
    pub percentile: Option<f64>,
    #[structopt(
        long = "entities-file",
        parse(from_os_str),
        help = "file of entity variants to scrub, one per line"
    )]
    pub entities_file: Option<PathBuf>,
    #[structopt(
        long = "stopwords",
        parse(from_os_str),
        help = "stopwords file, replaces the built-in list"
    )]
    pub stopwords: Option<PathBuf>,
    #[structopt(
        long = "lemmas",
        parse(from_os_str),
        help = "form<TAB>lemma dictionary"
    )]
    pub lemmas: Option<PathBuf>,
    #[structopt(long = "snowball", help = "stem tokens missing from the lemma dictionary")]
    pub snowball: bool,
    #[structopt(long = "prefix", help = "prefix of the removed records files")]
    pub prefix: Option<String>,
}

impl Run {
    /// Load the configuration file (or defaults), then apply command line overrides.
    pub fn config(&self) -> Result<PipelineConfig, Error> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_path(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(lid_path) = &self.lid_path {
            config.language.lid_path = lid_path.clone();
        }
        if let Some(target) = &self.target_lang {
            config.language.target = target.clone();
        }
        if let Some(threshold) = self.lang_threshold {
            config.language.threshold = threshold;
        }
        if let Some(min_tokens) = self.min_tokens {
            config.noise.min_tokens = min_tokens;
        }
        if let Some(rate_ceiling) = self.rate_ceiling {
            config.bots.rate_ceiling = rate_ceiling;
        }
        if let Some(percentile) = self.percentile {
            config.bots.percentile = percentile;
        }
        if let Some(entities_file) = &self.entities_file {
            config.scrub.entities_file = Some(entities_file.clone());
        }
        if let Some(stopwords) = &self.stopwords {
            config.heavy.stopwords_file = Some(stopwords.clone());
        }
        if let Some(lemmas) = &self.lemmas {
            config.heavy.lemma_dictionary = Some(lemmas.clone());
        }
        if self.snowball {
            config.heavy.lemma_fallback = LemmaFallback::Snowball;
        }
        if let Some(prefix) = &self.prefix {
            config.output_prefix = Some(prefix.clone());
        }

        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
/// Forensics on a `bots_removed.csv` file.
pub struct InspectBots {
    #[structopt(parse(from_os_str), help = "removed bots trail")]
    pub src: PathBuf,
    #[structopt(
        long = "rate-ceiling",
        default_value = "144",
        help = "rate above which an account is deemed automated"
    )]
    pub rate_ceiling: f64,
}
