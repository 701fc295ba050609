mod article_repo;
mod database;
pub mod retry;
mod source_repo;

use std::collections::HashSet;

pub use article_repo::ArticleRepository;
pub use database::Database;
pub use source_repo::SourceRepository;

use crate::news::{ArticleRecord, SourceRecord};
use crate::Result;

/// Article persistence as seen by the ingestion pipeline
#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    /// Identity keys (urls) of every stored article
    async fn existing_urls(&self) -> Result<HashSet<String>>;

    /// Persist a batch atomically; returns the rows actually inserted, with
    /// identity assigned
    async fn save_batch(&self, articles: &[ArticleRecord]) -> Result<Vec<ArticleRecord>>;

    /// Stored articles, newest `published_at` first
    async fn find_page(&self, limit: u32, offset: u32) -> Result<Vec<ArticleRecord>>;
}

/// Source persistence as seen by the ingestion pipeline and scheduler
#[async_trait::async_trait]
pub trait SourceStore: Send + Sync {
    /// Identity keys (source ids) of every stored source
    async fn existing_source_ids(&self) -> Result<HashSet<String>>;

    /// Persist a batch atomically; returns the rows actually inserted
    async fn save_batch(&self, sources: &[SourceRecord]) -> Result<Vec<SourceRecord>>;

    /// All stored sources in insertion order
    async fn list_all(&self) -> Result<Vec<SourceRecord>>;
}
