//! Fetch, deduplicate and persist pipeline

mod cache;
mod dedupe;
mod service;

pub use cache::HeadlineCache;
pub use dedupe::{dedupe, dedupe_limited};
pub use service::{IngestPolicy, IngestionService, DEFAULT_SOURCE_QUOTA};
