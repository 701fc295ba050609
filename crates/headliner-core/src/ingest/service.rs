use std::sync::Arc;
use std::time::Duration;

use super::cache::HeadlineCache;
use super::dedupe::{dedupe, dedupe_limited};
use crate::config::{AppConfig, IngestConfig};
use crate::error::UpstreamError;
use crate::news::{ArticleRecord, FetchParams, NewsApiClient, NewsProvider, SourceRecord};
use crate::storage::{ArticleRepository, ArticleStore, Database, SourceRepository, SourceStore};
use crate::Result;

/// Novel sources persisted per source refresh unless configured otherwise.
/// Each stored source triggers one headline request per scheduled run.
pub const DEFAULT_SOURCE_QUOTA: usize = 3;

/// Tunable limits of the ingestion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestPolicy {
    pub source_quota: usize,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            source_quota: DEFAULT_SOURCE_QUOTA,
        }
    }
}

impl From<&IngestConfig> for IngestPolicy {
    fn from(config: &IngestConfig) -> Self {
        Self {
            source_quota: config.source_quota,
        }
    }
}

/// Fetch → dedupe → persist pipeline for articles and sources
///
/// Upstream errors propagate unchanged and leave storage untouched; each batch
/// is written in a single transaction.
pub struct IngestionService {
    provider: Arc<dyn NewsProvider>,
    articles: Arc<dyn ArticleStore>,
    sources: Arc<dyn SourceStore>,
    cache: HeadlineCache,
    policy: IngestPolicy,
}

impl IngestionService {
    pub fn new(
        provider: Arc<dyn NewsProvider>,
        articles: Arc<dyn ArticleStore>,
        sources: Arc<dyn SourceStore>,
    ) -> Self {
        Self {
            provider,
            articles,
            sources,
            cache: HeadlineCache::disabled(),
            policy: IngestPolicy::default(),
        }
    }

    /// Wire the NewsAPI client and SQLite repositories from configuration
    pub fn from_config(config: &AppConfig, db: &Database) -> Result<Self> {
        let provider = Arc::new(NewsApiClient::new(&config.newsapi)?);
        let cache = HeadlineCache::new(
            config.ingest.cache_capacity,
            Duration::from_secs(config.ingest.cache_ttl_secs),
        );

        Ok(Self::new(
            provider,
            Arc::new(ArticleRepository::new(db)),
            Arc::new(SourceRepository::new(db)),
        )
        .with_cache(cache)
        .with_policy(IngestPolicy::from(&config.ingest)))
    }

    pub fn with_cache(mut self, cache: HeadlineCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_policy(mut self, policy: IngestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> IngestPolicy {
        self.policy
    }

    /// Source storage, shared with the scheduler
    pub fn source_store(&self) -> Arc<dyn SourceStore> {
        Arc::clone(&self.sources)
    }

    /// Upstream headlines for `params`, served from the memo when fresh
    async fn fetch_headlines(
        &self,
        params: &FetchParams,
    ) -> std::result::Result<Vec<ArticleRecord>, UpstreamError> {
        if let Some(articles) = self.cache.get(params) {
            tracing::debug!(?params, "Serving headlines from cache");
            return Ok(articles);
        }

        let articles = self.provider.fetch_top_headlines(params).await?;
        self.cache.insert(params.clone(), articles.clone());
        Ok(articles)
    }

    /// Fetch headlines and persist the ones not stored yet
    ///
    /// Returns only the newly persisted articles, in upstream order.
    pub async fn ingest_headlines(&self, params: &FetchParams) -> Result<Vec<ArticleRecord>> {
        let fetched = self.fetch_headlines(params).await?;
        let fetched_count = fetched.len();

        let existing = self.articles.existing_urls().await?;
        let novel = dedupe(fetched, &existing, |a: &ArticleRecord| a.url.clone());

        let saved = self.articles.save_batch(&novel).await?;

        tracing::info!(
            fetched = fetched_count,
            saved = saved.len(),
            sources = params.sources().unwrap_or("-"),
            "Ingested headlines"
        );

        Ok(saved)
    }

    /// Fetch the source list and persist up to `source_quota` new sources
    pub async fn ingest_sources(&self) -> Result<Vec<SourceRecord>> {
        let fetched = self.provider.fetch_sources().await?;
        let fetched_count = fetched.len();

        let existing = self.sources.existing_source_ids().await?;
        let novel = dedupe_limited(
            fetched,
            &existing,
            |s: &SourceRecord| s.source_id.clone(),
            Some(self.policy.source_quota),
        );

        let saved = self.sources.save_batch(&novel).await?;

        tracing::info!(
            fetched = fetched_count,
            saved = saved.len(),
            quota = self.policy.source_quota,
            "Ingested sources"
        );

        Ok(saved)
    }

    /// Stored articles, newest first
    pub async fn news_page(&self, limit: u32, offset: u32) -> Result<Vec<ArticleRecord>> {
        self.articles.find_page(limit, offset).await
    }

    /// All stored sources
    pub async fn list_sources(&self) -> Result<Vec<SourceRecord>> {
        self.sources.list_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamErrorKind;
    use crate::testing::{article, source, MemoryArticleStore, MemorySourceStore, MockProvider};
    use crate::Error;

    struct Fixture {
        provider: Arc<MockProvider>,
        articles: Arc<MemoryArticleStore>,
        sources: Arc<MemorySourceStore>,
    }

    impl Fixture {
        fn new(provider: MockProvider) -> Self {
            Self {
                provider: Arc::new(provider),
                articles: Arc::new(MemoryArticleStore::default()),
                sources: Arc::new(MemorySourceStore::default()),
            }
        }

        fn service(&self) -> IngestionService {
            IngestionService::new(
                self.provider.clone(),
                self.articles.clone(),
                self.sources.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_ingest_headlines_saves_only_unknown_urls() {
        let fx = Fixture::new(MockProvider::new().with_articles(vec![
            article("https://example.com/1", "Penguins Invade Middle-Earth"),
            article("https://example.com/2", "Adventure in Mordor"),
        ]));
        fx.articles.seed(vec![article("https://example.com/1", "Already here")]);

        let params = FetchParams::new(Some("us".into()), Some("technology".into()), None).unwrap();
        let saved = fx.service().ingest_headlines(&params).await.unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].title.as_deref(), Some("Adventure in Mordor"));
        assert!(saved[0].id.is_some());
        assert_eq!(fx.articles.save_calls(), 1);
        assert_eq!(fx.articles.len(), 2);
    }

    #[tokio::test]
    async fn test_ingest_headlines_is_idempotent() {
        let fx = Fixture::new(MockProvider::new().with_articles(vec![
            article("https://example.com/a", "A"),
            article("https://example.com/b", "B"),
        ]));
        let service = fx.service();
        let params = FetchParams::default();

        let first = service.ingest_headlines(&params).await.unwrap();
        let second = service.ingest_headlines(&params).await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(fx.articles.len(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates_and_persists_nothing() {
        let fx = Fixture::new(
            MockProvider::new()
                .with_articles(vec![article("https://example.com/1", "A")])
                .failing_all(UpstreamErrorKind::Unauthorized),
        );

        let err = fx
            .service()
            .ingest_headlines(&FetchParams::default())
            .await
            .unwrap_err();

        assert_eq!(err.upstream_kind(), Some(UpstreamErrorKind::Unauthorized));
        assert_eq!(fx.articles.save_calls(), 0);
        assert_eq!(fx.articles.len(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_propagates() {
        let fx = Fixture::new(
            MockProvider::new().with_articles(vec![article("https://example.com/1", "A")]),
        );
        fx.articles.fail_saves();

        let err = fx
            .service()
            .ingest_headlines(&FetchParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(fx.articles.len(), 0);
    }

    #[tokio::test]
    async fn test_cache_bounds_upstream_calls() {
        let fx = Fixture::new(
            MockProvider::new().with_articles(vec![article("https://example.com/1", "A")]),
        );
        let service = fx
            .service()
            .with_cache(HeadlineCache::new(8, Duration::from_secs(60)));

        let params = FetchParams::new(Some("us".into()), None, None).unwrap();
        let first = service.ingest_headlines(&params).await.unwrap();
        let second = service.ingest_headlines(&params).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(fx.provider.headline_calls(), 1);

        let other = FetchParams::new(Some("gb".into()), None, None).unwrap();
        service.ingest_headlines(&other).await.unwrap();
        assert_eq!(fx.provider.headline_calls(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let fx = Fixture::new(MockProvider::new().failing_all(UpstreamErrorKind::RateLimited));
        let service = fx
            .service()
            .with_cache(HeadlineCache::new(8, Duration::from_secs(60)));

        let params = FetchParams::default();
        assert!(service.ingest_headlines(&params).await.is_err());
        assert!(service.ingest_headlines(&params).await.is_err());
        assert_eq!(fx.provider.headline_calls(), 2);
    }

    #[tokio::test]
    async fn test_ingest_sources_respects_quota() {
        let sources: Vec<SourceRecord> = (0..10)
            .map(|n| source(&format!("source-{}", n), &format!("Source {}", n)))
            .collect();
        let fx = Fixture::new(MockProvider::new().with_sources(sources));

        let saved = fx.service().ingest_sources().await.unwrap();

        assert_eq!(saved.len(), 3);
        assert_eq!(fx.sources.len(), 3);
        let ids: Vec<&str> = saved.iter().map(|s| s.source_id.as_str()).collect();
        assert_eq!(ids, vec!["source-0", "source-1", "source-2"]);
    }

    #[tokio::test]
    async fn test_ingest_sources_skips_known_before_quota() {
        let fx = Fixture::new(MockProvider::new().with_sources(vec![
            source("middle-earth", "Middle-Earth Chronicle"),
            source("shire-times", "Shire Times"),
            source("gondor-gazette", "Gondor Gazette"),
            source("rohan-report", "Rohan Report"),
        ]));
        fx.sources.seed(vec![source("middle-earth", "Middle-Earth Chronicle")]);

        let saved = fx.service().ingest_sources().await.unwrap();

        let names: Vec<&str> = saved.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Shire Times", "Gondor Gazette", "Rohan Report"]);
    }

    #[tokio::test]
    async fn test_source_quota_is_overridable() {
        let sources: Vec<SourceRecord> = (0..10)
            .map(|n| source(&format!("s{}", n), &format!("S{}", n)))
            .collect();
        let fx = Fixture::new(MockProvider::new().with_sources(sources));

        let saved = fx
            .service()
            .with_policy(IngestPolicy { source_quota: 7 })
            .ingest_sources()
            .await
            .unwrap();

        assert_eq!(saved.len(), 7);
    }

    #[tokio::test]
    async fn test_news_page_delegates_to_store() {
        let fx = Fixture::new(MockProvider::new());
        fx.articles.seed(crate::testing::dated_articles(10));

        let page = fx.service().news_page(5, 4).await.unwrap();
        let titles: Vec<&str> = page.iter().filter_map(|a| a.title.as_deref()).collect();
        assert_eq!(
            titles,
            vec!["Article Title 6", "Article Title 5", "Article Title 4", "Article Title 3", "Article Title 2"]
        );
    }
}
