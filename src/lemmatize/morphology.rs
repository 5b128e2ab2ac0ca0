//! Morphological analysis capability.
use crate::error::Error;

/// A token as returned by a morphological pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub lemma: Option<String>,
    /// Universal part-of-speech tag (`NOUN`, `PUNCT`…).
    pub upos: String,
}

impl Token {
    pub fn new(text: &str, lemma: Option<&str>, upos: &str) -> Self {
        Self {
            text: text.to_string(),
            lemma: lemma.map(String::from),
            upos: upos.to_string(),
        }
    }
}

/// A loaded, per-language morphological pipeline.
pub trait Morphology: Send + Sync {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, Error>;
}

/// Builds a [Morphology]. Building is expected to be expensive.
pub trait MorphologyBuilder: Send + Sync {
    fn build(&self) -> Result<Box<dyn Morphology>, Error>;
}
