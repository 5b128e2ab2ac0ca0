//! Corpus processing pipeline
//!
//! Runs every stage following collection, on a raw record file.
//!
//! # Processing
//! 1. Each record is normalized (`text_cleaned`), then gets its script and language identified.
//!    All rows are written to `classified.csv`, then split by language into `<lang>_posts.csv`.
//! 1. For each target language, rows go through the relevance filter and get tagged by category
//!    (`<lang>_filtered.csv`).
//! 1. Remaining rows are lemmatized (`<lang>_lemmatized.csv`).
//! 1. Word frequencies, bigrams and trigrams are computed on the lemmas.
//!
//! Every output lands in `<dst>/processed`. The raw file is never modified.
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    error::Error,
    filtering::{RelevanceFilter, StageCounts},
    identifiers::{Classifier, Identifier},
    io::{lang_path, read_documents, write_documents, write_table, LangFiles, Layout},
    lang::Lang,
    lemmatize::Lemmatizer,
    processing::{compute_ngrams, word_frequency},
    transformers::{Annotate, CategoryTagger, Normalizer, Transform},
    types::{Document, TextColumn},
};

use super::Pipeline;

/// What happened to the rows of a language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangSummary {
    pub lang: Lang,
    pub counts: StageCounts,
    /// Rows having at least one lemma.
    pub lemmatized: usize,
}

pub struct Corpus<I: Identifier> {
    src: PathBuf,
    dst: PathBuf,
    classifier: Classifier<I>,
    relevance: RelevanceFilter,
    tagger: CategoryTagger,
    lemmatizer: Lemmatizer,
    languages: Vec<Lang>,
    top_n: usize,
    min_freq: usize,
}

impl<I: Identifier> Corpus<I> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        src: &Path,
        dst: &Path,
        identifier: I,
        relevance: RelevanceFilter,
        tagger: CategoryTagger,
        lemmatizer: Lemmatizer,
        languages: Vec<Lang>,
    ) -> Self {
        Self {
            src: src.to_path_buf(),
            dst: dst.join("processed"),
            classifier: Classifier::new(identifier),
            relevance,
            tagger,
            lemmatizer,
            languages,
            top_n: 100,
            min_freq: 5,
        }
    }

    /// Number of words kept in frequency tables (default 100).
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Minimal n-gram count (default 5).
    pub fn with_min_freq(mut self, min_freq: usize) -> Self {
        self.min_freq = min_freq;
        self
    }

    fn stage_path(&self, lang: Lang, stage: &str) -> PathBuf {
        lang_path(&self.dst, lang, stage)
    }

    /// Normalize and classify every document, then write them all and split them by language.
    fn classify(&self, docs: Vec<Document>) -> Result<Vec<Document>, Error> {
        let normalizer = Normalizer;
        let docs: Vec<Document> = docs
            .into_iter()
            .map(|doc| {
                let mut doc = normalizer.transform_own(doc);
                self.classifier.annotate(&mut doc);
                doc
            })
            .collect();

        let layout = Layout::derived(Vec::new());
        write_documents(&self.dst.join("classified.csv"), &docs, &layout)?;

        let langfiles = LangFiles::new(&self.dst, "posts", layout);
        for doc in &docs {
            langfiles.write(doc)?;
        }
        langfiles.flush()?;

        for lang in Lang::TARGETS.iter().chain([Lang::Unknown].iter()) {
            let count = docs
                .iter()
                .filter(|d| d.metadata().language() == Some(lang))
                .count();
            info!("[{lang}] {count} rows");
        }
        Ok(docs)
    }

    fn frequencies(&self, lang: Lang, docs: &[Document]) -> Result<(), Error> {
        let sequences: Vec<&[String]> = docs
            .iter()
            .filter_map(|d| d.metadata().lemmas())
            .collect();

        let words = word_frequency(&sequences, self.top_n);
        write_table(
            &self.stage_path(lang, "word_frequency"),
            ["word", "frequency"],
            &words,
        )?;
        let bigrams = compute_ngrams(&sequences, 2, self.min_freq)?;
        write_table(&self.stage_path(lang, "bigrams"), ["bigram", "frequency"], &bigrams)?;
        let trigrams = compute_ngrams(&sequences, 3, self.min_freq)?;
        write_table(
            &self.stage_path(lang, "trigrams"),
            ["trigram", "frequency"],
            &trigrams,
        )?;
        info!(
            "[{lang}] {} words, {} bigrams, {} trigrams",
            words.len(),
            bigrams.len(),
            trigrams.len()
        );
        Ok(())
    }

    fn process_lang(&self, lang: Lang, docs: Vec<Document>) -> Result<LangSummary, Error> {
        info!("[{lang}] filtering {} rows", docs.len());
        let (mut docs, counts) = self.relevance.apply(docs)?;
        for doc in docs.iter_mut() {
            self.tagger.annotate(doc);
        }
        let layout = Layout::derived(self.tagger.names().map(String::from).collect());
        write_documents(&self.stage_path(lang, "filtered"), &docs, &layout)?;

        self.lemmatizer
            .lemmatize_column(&mut docs, TextColumn::TextCleaned, lang)?;
        write_documents(&self.stage_path(lang, "lemmatized"), &docs, &layout)?;

        self.frequencies(lang, &docs)?;

        let lemmatized = docs
            .iter()
            .filter(|d| d.metadata().lemmas().map_or(false, |l| !l.is_empty()))
            .count();
        Ok(LangSummary {
            lang,
            counts,
            lemmatized,
        })
    }
}

impl<I: Identifier> Pipeline<Vec<LangSummary>> for Corpus<I> {
    fn run(&self) -> Result<Vec<LangSummary>, Error> {
        let docs = read_documents(&self.src)?;
        info!("read {} rows from {:?}", docs.len(), self.src);

        let docs = self.classify(docs)?;

        let mut summaries = Vec::with_capacity(self.languages.len());
        for lang in &self.languages {
            let lang_docs: Vec<Document> = docs
                .iter()
                .filter(|d| d.metadata().language() == Some(lang))
                .cloned()
                .collect();
            if lang_docs.is_empty() {
                warn!("[{lang}] no rows, skipping");
                continue;
            }
            summaries.push(self.process_lang(*lang, lang_docs)?);
        }

        for summary in &summaries {
            info!(
                "[{}] counts {:?}, {} lemmatized",
                summary.lang,
                summary.counts.as_array(),
                summary.lemmatized
            );
        }
        Ok(summaries)
    }
}
