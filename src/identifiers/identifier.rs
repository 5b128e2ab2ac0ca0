/*! Identifier trait

All language identifiers should implement [Identifier] to be useable in the corpus pipeline.
!*/
use std::str::FromStr;

use fasttext::Prediction;

use crate::{error::Error, lang::Lang};

#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    label: Lang,
    prob: f32,
}

impl Identification {
    pub fn new(label: Lang, prob: f32) -> Self {
        Self { label, prob }
    }

    /// Get a reference to the identification's label.
    pub fn label(&self) -> &Lang {
        &self.label
    }

    /// Get a reference to the identification's prob.
    pub fn prob(&self) -> &f32 {
        &self.prob
    }
}

/// Converts a `__label__xx` prediction.
///
/// Fails for labels outside of the corpus languages.
impl TryFrom<&Prediction> for Identification {
    type Error = Error;

    fn try_from(prediction: &Prediction) -> Result<Self, Self::Error> {
        let label = prediction
            .label
            .strip_prefix("__label__")
            .unwrap_or(&prediction.label);
        Ok(Self {
            label: Lang::from_str(label)?,
            prob: prediction.prob,
        })
    }
}

pub trait Identifier {
    /// Returns a language identification, or [None] when no confident guess can be made.
    fn identify(&self, sentence: &str) -> Result<Option<Identification>, Error>;
}
