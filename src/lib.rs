/*! # Kypros

Builds a multilingual (Russian, Greek, English) text corpus from heterogeneous sources:
public messaging channels, a social network search, news sitemaps and a document search archive.

Collection ([sources]) produces canonical [types::Record]s, checkpointed per source.
Processing ([pipelines::Corpus]) then normalizes, classifies, filters, lemmatizes and counts them.
!*/
pub mod config;
pub mod error;
pub mod filtering;
pub mod identifiers;
pub mod io;
pub mod lang;
pub mod lemmatize;
pub mod pipelines;
pub mod processing;
pub mod sources;
pub mod transformers;
pub mod types;
