/*! fastText language identification model.
!*/
use std::path::Path;

use fasttext::FastText as FastTextLib;
use log::{debug, error};

use crate::error::Error;

use super::identification::{Identification, Identifier};

/// Wraps a loaded fastText model, predicting the top-1 label.
///
/// The prediction threshold of the model is kept at 0 so that the confidence of the top label
/// is always reported: thresholding is done by the language filter, which has to record
/// the detected language of rejected records.
pub struct FastText {
    inner: FastTextLib,
}

impl FastText {
    /// Load a model from `path` (eg. `lid.176.bin`).
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Configuration(format!("could not parse model path {path:?}")))?;

        if !path.exists() {
            return Err(Error::Configuration(format!(
                "language identification model not found at {path:?}"
            )));
        }

        debug!("loading fasttext model from {path_str}");
        let mut inner = FastTextLib::new();
        inner.load_model(path_str)?;
        Ok(Self { inner })
    }

    /// fastText predicts on a single line: newlines are replaced by spaces,
    /// unicode null chars are removed.
    fn prepare(text: &str) -> String {
        text.chars()
            .filter(|c| *c != char::from(0))
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect()
    }
}

impl Identifier for FastText {
    fn identify(&self, text: &str) -> Result<Option<Identification>, Error> {
        let line = Self::prepare(text);
        let predictions = self.inner.predict(&line, 1, 0.0)?;

        match predictions.into_iter().next() {
            None => Ok(None),
            Some(prediction) => match Identification::try_from(prediction) {
                Ok(id) => Ok(Some(id)),
                Err(e) => {
                    error!("Couldn't find a proper label: {e:?}");
                    Err(Error::Classification(format!("invalid label: {e}")))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::error::Error;

    use super::{FastText, Identifier};

    #[test]
    fn prepare_single_line() {
        assert_eq!(
            FastText::prepare("first line\nsecond\r\nthird\u{0}"),
            "first line second  third"
        );
    }

    #[test]
    fn missing_model() {
        let res = FastText::from_path(Path::new("does/not/exist/lid.176.bin"));
        assert!(matches!(res, Err(Error::Configuration(_))));
    }

    #[test]
    #[ignore]
    fn test_one_sentence() {
        let model = FastText::from_path(Path::new("lid.176.bin")).unwrap();

        let sentence = "Ceci est une phrase en Français :)";
        let pred = model.identify(sentence).unwrap().unwrap();

        assert_eq!(pred.label().as_str(), "fr");
    }
}
