//! Fasttext identifier
use std::path::Path;

use crate::{error::Error, lang::Lang};
use fasttext::FastText as FastTextLib;
use log::debug;

use super::{Identification, Identifier};

/// Holds a [fasttext::FastText] instance and its parameters:
/// - [FastText::k], number of predicted languages on a sentence
/// - [FastText::threshold], prediction threshold
///
/// Predictions are restricted to [FastText::targets]: the best scoring
/// target language above the threshold is kept, others are ignored.
pub struct FastText {
    predictor: FastTextLib,
    pub k: i32,
    pub threshold: f32,
    targets: Vec<Lang>,
}

impl FastText {
    /// Create a new fasttext classifier allowing to identify
    /// language of strings.
    ///
    /// - [Self::k] is set to 5
    /// - [Self::threshold] is set to .5
    ///
    /// # Errors
    /// Propagates [fasttext::FastText] errors.
    pub fn new_lid(filename: &Path, targets: &[Lang]) -> Result<Self, Error> {
        Self::new(filename, 5, 0.5, targets)
    }

    /// Create a new fasttext classifier.
    ///
    /// filename has to be a path to a `bin` file (`lid.176.bin` for example).
    pub fn new(filename: &Path, k: i32, threshold: f32, targets: &[Lang]) -> Result<Self, Error> {
        let mut predictor = FastTextLib::new();
        let filename_str = filename.to_str();
        match filename_str {
            None => Err(Error::Custom(format!(
                "invalid filepath for lid: {:?}",
                filename
            ))),
            Some(filename) => {
                predictor.load_model(filename)?;
                Ok(Self {
                    predictor,
                    k,
                    threshold,
                    targets: targets.iter().filter(|l| !l.is_unknown()).copied().collect(),
                })
            }
        }
    }
}

impl Identifier for FastText {
    fn identify(&self, sentence: &str) -> Result<Option<Identification>, Error> {
        // null chars crash the underlying C++ code
        let sentence = sentence.replace(char::from(0), "");
        let predictions = self
            .predictor
            .predict(&sentence, self.k, self.threshold)
            .map_err(Error::FastText)?;

        // predictions are sorted by decreasing probability
        let best = predictions
            .iter()
            .filter_map(|p| Identification::try_from(p).ok())
            .find(|id| self.targets.contains(id.label()));

        debug!("{:?} -> {:?}", predictions, best);
        Ok(best)
    }
}
