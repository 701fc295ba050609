//! In-memory doubles for the provider and stores

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::error::{UpstreamError, UpstreamErrorKind};
use crate::news::{ArticleRecord, FetchParams, NewsProvider, SourceRecord};
use crate::storage::{ArticleStore, SourceStore};
use crate::{Error, Result};

pub fn article(url: &str, title: &str) -> ArticleRecord {
    ArticleRecord {
        title: Some(title.to_string()),
        source_name: Some("ZOO TV".to_string()),
        ..ArticleRecord::with_url(url)
    }
}

pub fn source(source_id: &str, name: &str) -> SourceRecord {
    SourceRecord::new(source_id, name)
}

/// `Article Title 1..=n`, published one hour apart, oldest first
pub fn dated_articles(n: u32) -> Vec<ArticleRecord> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (1..=n)
        .map(|i| ArticleRecord {
            published_at: Some(base + chrono::Duration::hours(i as i64)),
            ..article(&format!("https://example.com/article/{}", i), &format!("Article Title {}", i))
        })
        .collect()
}

#[derive(Default)]
pub struct MockProvider {
    articles: Vec<ArticleRecord>,
    by_source: HashMap<String, Vec<ArticleRecord>>,
    failing_sources: HashMap<String, UpstreamErrorKind>,
    panicking_sources: HashSet<String>,
    fail_all: Option<UpstreamErrorKind>,
    sources: Vec<SourceRecord>,
    delay: Option<Duration>,
    headline_calls: AtomicUsize,
    source_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    call_log: Mutex<Vec<Option<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(mut self, articles: Vec<ArticleRecord>) -> Self {
        self.articles = articles;
        self
    }

    pub fn with_source_articles(mut self, source: &str, articles: Vec<ArticleRecord>) -> Self {
        self.by_source.insert(source.to_string(), articles);
        self
    }

    pub fn failing_source(mut self, source: &str, kind: UpstreamErrorKind) -> Self {
        self.failing_sources.insert(source.to_string(), kind);
        self
    }

    pub fn panicking_source(mut self, source: &str) -> Self {
        self.panicking_sources.insert(source.to_string());
        self
    }

    pub fn failing_all(mut self, kind: UpstreamErrorKind) -> Self {
        self.fail_all = Some(kind);
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceRecord>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn headline_calls(&self) -> usize {
        self.headline_calls.load(Ordering::SeqCst)
    }

    pub fn source_calls(&self) -> usize {
        self.source_calls.load(Ordering::SeqCst)
    }

    /// `sources` value of every headline request, in call order
    pub fn call_log(&self) -> Vec<Option<String>> {
        self.call_log.lock().unwrap().clone()
    }

    /// Highest number of headline requests observed at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NewsProvider for MockProvider {
    async fn fetch_top_headlines(
        &self,
        params: &FetchParams,
    ) -> std::result::Result<Vec<ArticleRecord>, UpstreamError> {
        self.headline_calls.fetch_add(1, Ordering::SeqCst);
        self.call_log
            .lock()
            .unwrap()
            .push(params.sources().map(str::to_string));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(kind) = self.fail_all {
            return Err(UpstreamError::new(kind, "mock failure"));
        }

        match params.sources() {
            Some(name) => {
                if self.panicking_sources.contains(name) {
                    panic!("mock panic for {}", name);
                }
                if let Some(kind) = self.failing_sources.get(name) {
                    return Err(UpstreamError::new(*kind, format!("mock failure for {}", name)));
                }
                Ok(self
                    .by_source
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| self.articles.clone()))
            }
            None => Ok(self.articles.clone()),
        }
    }

    async fn fetch_sources(&self) -> std::result::Result<Vec<SourceRecord>, UpstreamError> {
        self.source_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.fail_all {
            return Err(UpstreamError::new(kind, "mock failure"));
        }
        Ok(self.sources.clone())
    }
}

#[derive(Default)]
pub struct MemoryArticleStore {
    rows: Mutex<Vec<ArticleRecord>>,
    save_calls: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryArticleStore {
    pub fn seed(&self, articles: Vec<ArticleRecord>) {
        let mut rows = self.rows.lock().unwrap();
        rows.extend(articles.into_iter().map(|a| ArticleRecord {
            id: Some(Uuid::new_v4()),
            created_at: Some(Utc::now()),
            ..a
        }));
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.rows.lock().unwrap().iter().map(|a| a.url.clone()).collect()
    }
}

#[async_trait::async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn existing_urls(&self) -> Result<HashSet<String>> {
        Ok(self.urls().into_iter().collect())
    }

    async fn save_batch(&self, articles: &[ArticleRecord]) -> Result<Vec<ArticleRecord>> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Persistence(sqlx::Error::PoolClosed));
        }

        let mut rows = self.rows.lock().unwrap();
        let mut saved = Vec::new();
        for article in articles {
            if rows.iter().any(|r| r.url == article.url) {
                continue;
            }
            let stored = ArticleRecord {
                id: Some(Uuid::new_v4()),
                created_at: Some(Utc::now()),
                ..article.clone()
            };
            rows.push(stored.clone());
            saved.push(stored);
        }
        Ok(saved)
    }

    async fn find_page(&self, limit: u32, offset: u32) -> Result<Vec<ArticleRecord>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[derive(Default)]
pub struct MemorySourceStore {
    rows: Mutex<Vec<SourceRecord>>,
}

impl MemorySourceStore {
    pub fn seed(&self, sources: Vec<SourceRecord>) {
        self.rows.lock().unwrap().extend(sources);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SourceStore for MemorySourceStore {
    async fn existing_source_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.source_id.clone())
            .collect())
    }

    async fn save_batch(&self, sources: &[SourceRecord]) -> Result<Vec<SourceRecord>> {
        let mut rows = self.rows.lock().unwrap();
        let mut saved = Vec::new();
        for source in sources {
            if rows.iter().any(|r| r.source_id == source.source_id) {
                continue;
            }
            let stored = SourceRecord {
                id: Some(Uuid::new_v4()),
                ..source.clone()
            };
            rows.push(stored.clone());
            saved.push(stored);
        }
        Ok(saved)
    }

    async fn list_all(&self) -> Result<Vec<SourceRecord>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}
