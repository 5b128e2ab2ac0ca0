/*! Filtering utilities

Filters implement [filter::Filter], [filter::FilterMut] or both:
- [filter::Filter] is implemented for filters that do not have state (see [relevance::Length] for example)
- [filter::FilterMut] is implemented for filter that do have state (that is, detection constraints can evolve through time, see [relevance::Dedup]).

[relevance::RelevanceFilter] chains them into the corpus relevance pipeline.
! */
mod filter;
pub mod keywords;
pub mod relevance;

pub use filter::Filter;
pub use filter::FilterMut;
pub use keywords::{Keywords, Pattern, PatternSet};
pub use relevance::{Dedup, Exclusion, Inclusion, Length, RelevanceFilter, StageCounts};
