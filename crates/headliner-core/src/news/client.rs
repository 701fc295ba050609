use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use super::models::{ArticleRecord, FetchParams, SourceRecord};
use super::taxonomy::{self, UNPARSEABLE_ERROR_CODE};
use super::transport::{HttpTransport, RawResponse, ReqwestTransport};
use crate::config::NewsApiConfig;
use crate::error::UpstreamError;
use crate::{Error, Result};

const HEADLINES_PATH: &str = "top-headlines";
const SOURCES_PATH: &str = "sources";

/// Upstream capability the ingestion pipeline depends on
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch top headlines matching `params`
    async fn fetch_top_headlines(
        &self,
        params: &FetchParams,
    ) -> std::result::Result<Vec<ArticleRecord>, UpstreamError>;

    /// Fetch the full list of upstream sources
    async fn fetch_sources(&self) -> std::result::Result<Vec<SourceRecord>, UpstreamError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopHeadlinesResponse {
    #[allow(dead_code)]
    status: Option<String>,
    #[allow(dead_code)]
    total_results: Option<u32>,
    articles: Option<Vec<ApiArticle>>,
}

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    #[allow(dead_code)]
    status: Option<String>,
    sources: Option<Vec<ApiSource>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSourceRef {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    source: Option<ApiSourceRef>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

impl ApiArticle {
    /// Articles without a url have no identity and are dropped
    fn into_record(self) -> Option<ArticleRecord> {
        let url = self.url.filter(|u| !u.is_empty())?;
        let published_at = self.published_at.as_deref().and_then(|ts| {
            DateTime::parse_from_rfc3339(ts)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        Some(ArticleRecord {
            id: None,
            source_name: self.source.and_then(|s| s.name),
            author: self.author,
            title: self.title,
            description: self.description,
            url,
            image_url: self.url_to_image,
            published_at,
            content: self.content,
            created_at: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    category: Option<String>,
    language: Option<String>,
    country: Option<String>,
}

impl ApiSource {
    fn into_record(self) -> Option<SourceRecord> {
        let source_id = self.id.filter(|id| !id.is_empty())?;
        Some(SourceRecord {
            id: None,
            name: self.name.unwrap_or_else(|| source_id.clone()),
            source_id,
            description: self.description,
            url: self.url,
            category: self.category,
            language: self.language,
            country: self.country,
        })
    }
}

/// NewsAPI client: URL construction, response decoding, error translation
///
/// No retries are performed here; a failed call surfaces immediately as a
/// classified [`UpstreamError`].
pub struct NewsApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

impl NewsApiClient {
    /// Create a client using the reqwest transport
    pub fn new(config: &NewsApiConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Self::with_transport(config, transport)
    }

    /// Create a client on top of an arbitrary transport
    pub fn with_transport(config: &NewsApiConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("News API key not configured".to_string()))?;

        // A trailing slash makes `join` append instead of replacing the last segment
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        Ok(Self {
            transport,
            base_url,
            api_key,
            timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        })
    }

    /// Build the top-headlines URL; only non-empty params are appended
    pub fn headlines_url(&self, params: &FetchParams) -> Result<Url> {
        let mut url = self.base_url.join(HEADLINES_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("apiKey", &self.api_key);
            if let Some(country) = params.country() {
                query.append_pair("country", country);
            }
            if let Some(category) = params.category() {
                query.append_pair("category", category);
            }
            if let Some(sources) = params.sources() {
                query.append_pair("sources", sources);
            }
        }
        Ok(url)
    }

    /// Build the sources URL
    pub fn sources_url(&self) -> Result<Url> {
        let mut url = self.base_url.join(SOURCES_PATH)?;
        url.query_pairs_mut().append_pair("apiKey", &self.api_key);
        Ok(url)
    }

    /// Issue the GET under the configured deadline
    async fn get(&self, url: &Url) -> std::result::Result<RawResponse, UpstreamError> {
        tracing::debug!(endpoint = url.path(), "Calling News API");

        match tokio::time::timeout(self.timeout, self.transport.get(url.as_str())).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                tracing::error!("Connection error while calling News API: {}", e);
                Err(taxonomy::transport("Error while calling News API", e))
            }
            Err(elapsed) => {
                tracing::error!(
                    "News API call exceeded {}s deadline",
                    self.timeout.as_secs()
                );
                Err(taxonomy::transport("News API request timed out", elapsed))
            }
        }
    }

    /// Turn a non-2xx response into a classified error
    fn classify_failure(response: &RawResponse) -> UpstreamError {
        let parsed: Option<ApiErrorResponse> = serde_json::from_slice(&response.body).ok();

        if response.status >= 500 {
            return match parsed {
                Some(ApiErrorResponse {
                    code: Some(code),
                    message,
                }) if taxonomy::recognized_kind(&code).is_some() => {
                    taxonomy::classify(response.status, &code, message.as_deref().unwrap_or(""))
                }
                _ => taxonomy::classify_server_status(response.status),
            };
        }

        match parsed {
            Some(err) => taxonomy::classify(
                response.status,
                err.code.as_deref().unwrap_or(UNPARSEABLE_ERROR_CODE),
                err.message.as_deref().unwrap_or(""),
            ),
            None => taxonomy::classify(response.status, UNPARSEABLE_ERROR_CODE, ""),
        }
    }

    /// Decode a success body; an empty or `null` body decodes to `None`
    fn decode<T: serde::de::DeserializeOwned>(
        response: &RawResponse,
    ) -> std::result::Result<Option<T>, UpstreamError> {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice::<Option<T>>(&response.body)
            .map_err(|e| taxonomy::transport("Malformed response from News API", e))
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiClient {
    async fn fetch_top_headlines(
        &self,
        params: &FetchParams,
    ) -> std::result::Result<Vec<ArticleRecord>, UpstreamError> {
        let url = self
            .headlines_url(params)
            .map_err(|e| taxonomy::transport("Invalid News API URL", e))?;
        let response = self.get(&url).await?;

        if !response.is_success() {
            let err = Self::classify_failure(&response);
            tracing::warn!(status = response.status, kind = %err.kind, "News API rejected headlines request");
            return Err(err);
        }

        let articles = match Self::decode::<TopHeadlinesResponse>(&response)? {
            Some(TopHeadlinesResponse {
                articles: Some(articles),
                ..
            }) => articles,
            _ => {
                tracing::warn!("Empty response or no articles found");
                return Ok(Vec::new());
            }
        };

        let records: Vec<ArticleRecord> = articles
            .into_iter()
            .filter_map(ApiArticle::into_record)
            .collect();

        tracing::debug!("News API returned {} articles", records.len());
        Ok(records)
    }

    async fn fetch_sources(&self) -> std::result::Result<Vec<SourceRecord>, UpstreamError> {
        let url = self
            .sources_url()
            .map_err(|e| taxonomy::transport("Invalid News API URL", e))?;
        let response = self.get(&url).await?;

        if !response.is_success() {
            let err = Self::classify_failure(&response);
            tracing::warn!(status = response.status, kind = %err.kind, "News API rejected sources request");
            return Err(err);
        }

        let sources = match Self::decode::<SourcesResponse>(&response)? {
            Some(SourcesResponse {
                sources: Some(sources),
                ..
            }) => sources,
            _ => {
                tracing::warn!("Empty response or no sources found");
                return Ok(Vec::new());
            }
        };

        Ok(sources.into_iter().filter_map(ApiSource::into_record).collect())
    }
}
