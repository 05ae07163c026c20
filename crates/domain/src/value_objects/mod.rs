//! Value objects.

mod status_filter;

pub use status_filter::StatusFilter;
