/*! Lemmatization

[Lemmatizer] routes texts to per-language morphological pipelines ([Morphology]) and filters their output.
Pipelines are expensive to build, and are held in a [PipelineRegistry] that builds each of them at most once.

The provided backend is [udpipe]. !*/
mod morphology;
mod registry;
mod router;
mod stopwords;
pub mod udpipe;

pub use morphology::{Morphology, MorphologyBuilder, Token};
pub use registry::PipelineRegistry;
pub use router::Lemmatizer;
pub use stopwords::stopwords;
