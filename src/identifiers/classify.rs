//! Script and language annotation.
use log::error;

use crate::{lang::Lang, transformers::Annotate, types::Document};

use super::{classify_script, Identifier, ScriptType};

/// Annotates documents with their [ScriptType] and [Lang].
///
/// Both labels are computed on `text_cleaned` when available, on raw content otherwise.
/// Routing downstream only ever uses the language.
pub struct Classifier<I: Identifier> {
    identifier: I,
}

impl<I: Identifier> Classifier<I> {
    pub fn new(identifier: I) -> Self {
        Self { identifier }
    }

    /// Identify the language of `text`.
    ///
    /// Empty text and guesses below threshold are [Lang::Unknown].
    pub fn language(&self, text: &str) -> Lang {
        if text.trim().is_empty() {
            return Lang::Unknown;
        }
        match self.identifier.identify(text) {
            Ok(Some(id)) => *id.label(),
            Ok(None) => Lang::Unknown,
            Err(e) => {
                error!("language identification failed: {e}");
                Lang::Unknown
            }
        }
    }
}

impl<I: Identifier> Annotate<Document> for Classifier<I> {
    fn annotate(&self, doc: &mut Document) {
        let text = doc
            .metadata()
            .text_cleaned()
            .unwrap_or_else(|| doc.content())
            .to_string();

        let script = if text.is_empty() {
            ScriptType::Unknown
        } else {
            classify_script(&text)
        };
        let language = self.language(&text);

        let metadata = doc.metadata_mut();
        metadata.set_script_type(script);
        metadata.set_language(language);
    }
}
