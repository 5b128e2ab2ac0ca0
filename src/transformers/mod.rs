/*! Document transformers.

Transforms documents by filling derived fields ([Transform]) or annotating them ([Annotate]).

!*/
mod annotate;
mod normalize;
mod tags;
mod transform;

pub use annotate::Annotate;
pub use normalize::{clean, Normalizer};
pub use tags::CategoryTagger;
pub use transform::Transform;
