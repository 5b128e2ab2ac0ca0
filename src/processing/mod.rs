/*! Corpus statistics

Aggregates lemma sequences into word frequency and n-gram tables.
!*/
pub mod frequency;

pub use frequency::{compute_ngrams, word_frequency};
