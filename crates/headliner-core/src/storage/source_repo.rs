use std::collections::HashSet;

use chrono::Utc;
use sqlx::FromRow;
use uuid::Uuid;

use super::retry::query_with_retry;
use super::{Database, SourceStore};
use crate::news::SourceRecord;
use crate::Result;

/// SQLite-backed source storage
#[derive(Clone)]
pub struct SourceRepository {
    db: Database,
}

#[derive(FromRow)]
struct SourceRow {
    id: String,
    source_id: String,
    name: String,
    description: Option<String>,
    url: Option<String>,
    category: Option<String>,
    language: Option<String>,
    country: Option<String>,
}

impl From<SourceRow> for SourceRecord {
    fn from(row: SourceRow) -> Self {
        SourceRecord {
            id: Uuid::parse_str(&row.id).ok(),
            source_id: row.source_id,
            name: row.name,
            description: row.description,
            url: row.url,
            category: row.category,
            language: row.language,
            country: row.country,
        }
    }
}

impl SourceRepository {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Remove every stored source (maintenance and tests only)
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sources")
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl SourceStore for SourceRepository {
    async fn existing_source_ids(&self) -> Result<HashSet<String>> {
        let pool = self.db.pool().clone();
        let ids: Vec<String> = query_with_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_scalar("SELECT source_id FROM sources")
                    .fetch_all(&pool)
                    .await
            }
        })
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn save_batch(&self, sources: &[SourceRecord]) -> Result<Vec<SourceRecord>> {
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.db.pool().begin().await?;
        let mut saved = Vec::with_capacity(sources.len());

        for source in sources {
            let id = Uuid::new_v4();

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO sources
                (id, source_id, name, description, url, category, language, country, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(&source.source_id)
            .bind(&source.name)
            .bind(&source.description)
            .bind(&source.url)
            .bind(&source.category)
            .bind(&source.language)
            .bind(&source.country)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                saved.push(SourceRecord {
                    id: Some(id),
                    ..source.clone()
                });
            }
        }

        tx.commit().await?;

        Ok(saved)
    }

    async fn list_all(&self) -> Result<Vec<SourceRecord>> {
        let pool = self.db.pool().clone();
        let rows: Vec<SourceRow> = query_with_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_as(
                    r#"
                    SELECT id, source_id, name, description, url, category, language, country
                    FROM sources
                    ORDER BY created_at ASC, rowid ASC
                    "#,
                )
                .fetch_all(&pool)
                .await
            }
        })
        .await?;

        Ok(rows.into_iter().map(SourceRecord::from).collect())
    }
}
