//! Language-dispatched lemmatization.
use log::info;

use crate::{
    error::Error,
    lang::Lang,
    types::{Document, TextColumn},
};

use super::{stopwords::stopwords, MorphologyBuilder, PipelineRegistry, Token};

const NON_LEXICAL: [&str; 3] = ["PUNCT", "SYM", "X"];
const MIN_LENGTH: usize = 2;

fn is_alphabetic(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}

/// Routes texts to the pipeline of their language, and filters the resulting lemmas.
///
/// A token is kept if it has a lemma, is lexical, is alphabetic,
/// and if its lowercase lemma is alphabetic, longer than 2 characters and not a stop word.
#[derive(Default)]
pub struct Lemmatizer {
    registry: PipelineRegistry,
}

impl Lemmatizer {
    pub fn new(registry: PipelineRegistry) -> Self {
        Self { registry }
    }

    /// Register the pipeline builder of `lang`.
    pub fn with_builder(self, lang: Lang, builder: Box<dyn MorphologyBuilder>) -> Self {
        self.registry.insert_builder(lang, builder);
        self
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    /// Lemmatize `text`.
    ///
    /// Blank text yields no lemmas, and no pipeline is built.
    ///
    /// # Errors
    /// [Error::UnsupportedLang] when there's no pipeline for `lang`,
    /// or any error raised by the pipeline.
    pub fn lemmatize(&self, text: &str, lang: Lang) -> Result<Vec<String>, Error> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let pipeline = self.registry.get(lang)?;
        let stopwords = stopwords(lang);
        let lemmas = pipeline
            .analyze(text)?
            .into_iter()
            .filter_map(|token| {
                let Token { text, lemma, upos } = token;
                let lemma = lemma?.to_lowercase();
                let keep = !NON_LEXICAL.contains(&upos.as_str())
                    && is_alphabetic(&text)
                    && is_alphabetic(&lemma)
                    && lemma.chars().count() > MIN_LENGTH
                    && !stopwords.contains(lemma.as_str());
                keep.then_some(lemma)
            })
            .collect();
        Ok(lemmas)
    }

    /// Lemmatize `column` of every document, storing results in `lemmas`.
    ///
    /// # Errors
    /// [Error::MissingColumn] if a document lacks `column`. No document is modified in that case.
    pub fn lemmatize_column(
        &self,
        docs: &mut [Document],
        column: TextColumn,
        lang: Lang,
    ) -> Result<(), Error> {
        if docs.iter().any(|doc| column.get(doc).is_none()) {
            return Err(Error::MissingColumn(column.name().to_string()));
        }

        info!("[{lang}] starting lemmatization on {} rows", docs.len());
        let mut with_lemmas = 0;
        for doc in docs.iter_mut() {
            let text = column.get(doc).unwrap_or_default();
            let lemmas = self.lemmatize(text, lang)?;
            if !lemmas.is_empty() {
                with_lemmas += 1;
            }
            doc.metadata_mut().set_lemmas(lemmas);
        }
        info!(
            "[{lang}] lemmatized {} rows ({with_lemmas} with at least one lemma)",
            docs.len()
        );
        Ok(())
    }
}
