use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A headline as fetched from upstream or stored locally
///
/// `url` is the identity key: two records with the same url are the same
/// article. `id` and `created_at` are assigned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub source_name: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ArticleRecord {
    /// Minimal record with only the identity key set
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            id: None,
            source_name: None,
            author: None,
            title: None,
            description: None,
            url: url.into(),
            image_url: None,
            published_at: None,
            content: None,
            created_at: None,
        }
    }
}

/// A news source as listed by upstream; `source_id` is the identity key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub source_id: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
}

impl SourceRecord {
    pub fn new(source_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            source_id: source_id.into(),
            name: name.into(),
            description: None,
            url: None,
            category: None,
            language: None,
            country: None,
        }
    }
}

/// Query for the top-headlines endpoint
///
/// `sources` cannot be combined with `country` or `category`. Empty strings
/// are treated as absent, so equal queries hash equally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FetchParams {
    country: Option<String>,
    category: Option<String>,
    sources: Option<String>,
}

impl FetchParams {
    pub fn new(
        country: Option<String>,
        category: Option<String>,
        sources: Option<String>,
    ) -> Result<Self> {
        let country = non_empty(country);
        let category = non_empty(category);
        let sources = non_empty(sources);

        if sources.is_some() && (country.is_some() || category.is_some()) {
            return Err(Error::InvalidParams(
                "Source param cannot be mixed with other params".to_string(),
            ));
        }

        Ok(Self {
            country,
            category,
            sources,
        })
    }

    /// Query restricted to a single source
    pub fn for_source(source: impl Into<String>) -> Self {
        Self {
            country: None,
            category: None,
            sources: non_empty(Some(source.into())),
        }
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn sources(&self) -> Option<&str> {
        self.sources.as_deref()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
