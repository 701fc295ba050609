use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::retry::query_with_retry;
use super::{ArticleStore, Database};
use crate::news::ArticleRecord;
use crate::Result;

/// SQLite-backed article storage
#[derive(Clone)]
pub struct ArticleRepository {
    db: Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: String,
    source_name: Option<String>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: String,
    image_url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    content: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ArticleRow> for ArticleRecord {
    fn from(row: ArticleRow) -> Self {
        ArticleRecord {
            id: Uuid::parse_str(&row.id).ok(),
            source_name: row.source_name,
            author: row.author,
            title: row.title,
            description: row.description,
            url: row.url,
            image_url: row.image_url,
            published_at: row.published_at,
            content: row.content,
            created_at: Some(row.created_at),
        }
    }
}

impl ArticleRepository {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Number of stored articles
    pub async fn count(&self) -> Result<u64> {
        let pool = self.db.pool().clone();
        let (count,): (i64,) = query_with_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_as("SELECT COUNT(*) FROM articles")
                    .fetch_one(&pool)
                    .await
            }
        })
        .await?;

        Ok(count.max(0) as u64)
    }

    /// Remove every stored article (maintenance and tests only)
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM articles")
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl ArticleStore for ArticleRepository {
    async fn existing_urls(&self) -> Result<HashSet<String>> {
        let pool = self.db.pool().clone();
        let urls: Vec<String> = query_with_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_scalar("SELECT url FROM articles")
                    .fetch_all(&pool)
                    .await
            }
        })
        .await?;

        Ok(urls.into_iter().collect())
    }

    async fn save_batch(&self, articles: &[ArticleRecord]) -> Result<Vec<ArticleRecord>> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.db.pool().begin().await?;
        let mut saved = Vec::with_capacity(articles.len());

        for article in articles {
            let id = Uuid::new_v4();
            let now = Utc::now();

            // The UNIQUE(url) constraint absorbs races between concurrent ingestions
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO articles
                (id, source_name, author, title, description, url, image_url, published_at, content, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(&article.source_name)
            .bind(&article.author)
            .bind(&article.title)
            .bind(&article.description)
            .bind(&article.url)
            .bind(&article.image_url)
            .bind(article.published_at)
            .bind(&article.content)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                saved.push(ArticleRecord {
                    id: Some(id),
                    created_at: Some(now),
                    ..article.clone()
                });
            } else {
                tracing::debug!("Article already stored, skipping: {}", article.url);
            }
        }

        tx.commit().await?;

        Ok(saved)
    }

    async fn find_page(&self, limit: u32, offset: u32) -> Result<Vec<ArticleRecord>> {
        let pool = self.db.pool().clone();
        let rows: Vec<ArticleRow> = query_with_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_as(
                    r#"
                    SELECT id, source_name, author, title, description, url,
                           image_url, published_at, content, created_at
                    FROM articles
                    ORDER BY published_at DESC, created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&pool)
                .await
            }
        })
        .await?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }
}
