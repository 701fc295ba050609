//! Inbound HTTP surface

mod error;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

pub use error::{ErrorBody, HttpError, HttpResult};

use crate::ingest::IngestionService;
use crate::news::{ArticleRecord, FetchParams, SourceRecord};
use crate::Result;

const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IngestionService>,
}

impl AppState {
    pub fn new(service: Arc<IngestionService>) -> Self {
        Self { service }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news/fetch", post(fetch_news))
        .route("/api/news", get(list_news))
        .route("/api/sources/fetch", post(fetch_sources))
        .route("/api/sources", get(list_sources))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` on `bind_addr` until the shutdown signal flips to true
pub async fn serve(router: Router, bind_addr: &str, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("HTTP API listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
        })
        .await?;

    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct FetchQuery {
    country: Option<String>,
    category: Option<String>,
    sources: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

async fn fetch_news(
    State(state): State<AppState>,
    Query(q): Query<FetchQuery>,
) -> HttpResult<Json<Vec<ArticleRecord>>> {
    let params = FetchParams::new(q.country, q.category, q.sources)?;
    let saved = state.service.ingest_headlines(&params).await?;
    Ok(Json(saved))
}

async fn list_news(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> HttpResult<Json<Vec<ArticleRecord>>> {
    let page = state.service.news_page(q.limit, q.offset).await?;
    Ok(Json(page))
}

async fn fetch_sources(State(state): State<AppState>) -> HttpResult<Json<Vec<SourceRecord>>> {
    let saved = state.service.ingest_sources().await?;
    Ok(Json(saved))
}

async fn list_sources(State(state): State<AppState>) -> HttpResult<Json<Vec<SourceRecord>>> {
    let sources = state.service.list_sources().await?;
    Ok(Json(sources))
}
