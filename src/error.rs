//! Error enum
use std::fmt;

use oxilangtag::LanguageTagParseError;

use crate::audit::Stage;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Csv(csv::Error),
    Serde(serde_json::Error),
    /// Malformed input structure (missing column, unreadable header).
    Schema(String),
    /// Invalid threshold or missing required configuration value.
    Configuration(String),
    /// Per-record classification failure. Never fatal on its own:
    /// the language filter turns it into a rejection.
    Classification(String),
    FastText(String),
    LanguageTag(LanguageTagParseError),
    Custom(String),
    /// Fatal error, tagged with the stage at which it occurred.
    AtStage(Stage, Box<Error>),
}

impl Error {
    /// Tag an error with the stage it happened in.
    /// Already tagged errors keep their original stage.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            Error::AtStage(..) => self,
            e => Error::AtStage(stage, Box::new(e)),
        }
    }

    /// Stage at which the error occurred, if known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::AtStage(stage, _) => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Csv(e) => write!(f, "csv error: {e}"),
            Error::Serde(e) => write!(f, "serialization error: {e}"),
            Error::Schema(msg) => write!(f, "schema error: {msg}"),
            Error::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Error::Classification(msg) => write!(f, "classification error: {msg}"),
            Error::FastText(msg) => write!(f, "fasttext error: {msg}"),
            Error::LanguageTag(e) => write!(f, "invalid language tag: {e}"),
            Error::Custom(msg) => write!(f, "{msg}"),
            Error::AtStage(stage, e) => write!(f, "[{stage}] {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Csv(e) => Some(e),
            Error::Serde(e) => Some(e),
            Error::LanguageTag(e) => Some(e),
            Error::AtStage(_, e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Error {
        Error::Csv(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<LanguageTagParseError> for Error {
    fn from(e: LanguageTagParseError) -> Error {
        Error::LanguageTag(e)
    }
}

// fasttext reports its errors as plain strings.
impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::FastText(s)
    }
}

#[cfg(test)]
mod tests {
    use crate::audit::Stage;

    use super::Error;

    #[test]
    fn keeps_first_stage() {
        let e = Error::Schema("missing column text".to_string())
            .at(Stage::Ingest)
            .at(Stage::Language);

        assert_eq!(e.stage(), Some(Stage::Ingest));
        assert_eq!(e.to_string(), "[ingest] schema error: missing column text");
    }
}
