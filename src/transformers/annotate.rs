//! Annotate trait
/// Annotations provide contextual information about content.
///
/// Annotators only add information, they never filter nor modify content.
pub trait Annotate<T> {
    fn annotate(&self, doc: &mut T);
}
