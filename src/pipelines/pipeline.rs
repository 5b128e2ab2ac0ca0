//! Pipeline trait.
use crate::error::Error;

/// Implemented by each pipeline, generic over the return type
/// so that pipelines can report what they did.
pub trait Pipeline<T> {
    fn run(&self) -> Result<T, Error>;
}
