/*! Corpus types.

[Record] is the canonical schema shared by every source, [Document] wraps it with derived [Metadata].
* !*/
mod document;
mod record;

pub use document::{Document, Metadata, TextColumn};
pub use record::{collapse_newlines, Record};
