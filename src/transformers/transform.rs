//! Transform trait.

pub trait Transform<T> {
    /// Takes ownership of [Document](crate::types::Document) and returns it.
    fn transform_own(&self, doc: T) -> T;
}
