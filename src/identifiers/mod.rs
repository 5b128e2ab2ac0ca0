/*! Script and language identification

Holds an [Identifier] trait for implementing other ones.

The current identifier used is [fasttext](https://fasttext.cc), restricted to the corpus languages.
Script detection is a letter-count heuristic, see [classify_script]. !*/
mod classify;
mod fasttext;
mod identifier;
mod script;

pub use self::fasttext::FastText;
pub use classify::Classifier;
pub use identifier::{Identification, Identifier};
pub use script::{classify_script, ScriptType};
