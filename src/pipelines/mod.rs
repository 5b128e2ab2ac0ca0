//! Pipelines.
//!
//! [corpus::Corpus] runs every post-collection stage, and the module
//! provides a light [pipeline::Pipeline] trait.
pub mod corpus;
#[allow(clippy::module_inception)]
pub mod pipeline;

pub use corpus::{Corpus, LangSummary};
pub use pipeline::Pipeline;
