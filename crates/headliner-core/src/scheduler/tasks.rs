use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;

use crate::config::HeadlineMode;
use crate::ingest::IngestionService;
use crate::news::{FetchParams, SourceRecord};
use crate::storage::SourceStore;
use crate::Result;

/// Result of ingesting headlines for one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source_name: String,
    /// Number of newly persisted articles, or the failure message
    pub result: std::result::Result<usize, String>,
}

/// Report of one headline fetch run across all stored sources
#[derive(Debug, Clone)]
pub struct FetchRun {
    pub mode: HeadlineMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per source, in listing order
    pub outcomes: Vec<SourceOutcome>,
}

impl FetchRun {
    pub fn new_articles(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }

    pub fn failures(&self) -> Vec<&SourceOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err()).collect()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Refresh the stored source list
pub async fn run_source_refresh(service: &IngestionService) -> Result<Vec<SourceRecord>> {
    let saved = service.ingest_sources().await?;
    tracing::info!("Source refresh: {} new sources", saved.len());
    Ok(saved)
}

async fn ingest_source(service: &IngestionService, name: &str) -> std::result::Result<usize, String> {
    match service.ingest_headlines(&FetchParams::for_source(name)).await {
        Ok(saved) => {
            tracing::info!("Source '{}': {} new articles", name, saved.len());
            Ok(saved.len())
        }
        Err(e) => {
            tracing::error!("Failed to fetch headlines for '{}': {}", name, e);
            Err(e.to_string())
        }
    }
}

/// Ingest headlines for every stored source, at most `max_concurrency` at once
///
/// Each source runs as its own task; a failing or panicking task is recorded
/// in its outcome and does not affect the others.
pub async fn run_headline_fetch_concurrent(
    service: Arc<IngestionService>,
    sources: &dyn SourceStore,
    max_concurrency: usize,
) -> Result<FetchRun> {
    let started_at = Utc::now();
    let names: Vec<String> = sources.list_all().await?.into_iter().map(|s| s.name).collect();
    let concurrency = max_concurrency.max(1);

    tracing::info!(
        "Fetching headlines for {} sources (concurrency {})",
        names.len(),
        concurrency
    );

    let mut join_set: JoinSet<(usize, std::result::Result<usize, String>)> = JoinSet::new();
    let mut task_index: HashMap<tokio::task::Id, usize> = HashMap::new();
    let mut results: Vec<Option<std::result::Result<usize, String>>> = vec![None; names.len()];
    let mut pending = names.iter().cloned().enumerate();

    fn spawn_task(
        join_set: &mut JoinSet<(usize, std::result::Result<usize, String>)>,
        task_index: &mut HashMap<tokio::task::Id, usize>,
        service: Arc<IngestionService>,
        index: usize,
        name: String,
    ) {
        let handle = join_set.spawn(async move {
            let result = ingest_source(&service, &name).await;
            (index, result)
        });
        task_index.insert(handle.id(), index);
    }

    for _ in 0..concurrency {
        if let Some((index, name)) = pending.next() {
            spawn_task(&mut join_set, &mut task_index, Arc::clone(&service), index, name);
        }
    }

    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((_, (index, result))) => results[index] = Some(result),
            Err(e) => {
                if let Some(&index) = task_index.get(&e.id()) {
                    tracing::error!("Headline task for '{}' aborted: {}", names[index], e);
                    results[index] = Some(Err(format!("Task join error: {}", e)));
                }
            }
        }

        if let Some((index, name)) = pending.next() {
            spawn_task(&mut join_set, &mut task_index, Arc::clone(&service), index, name);
        }
    }

    let outcomes = names
        .into_iter()
        .zip(results)
        .map(|(source_name, result)| SourceOutcome {
            source_name,
            result: result.unwrap_or_else(|| Err("Task did not report".to_string())),
        })
        .collect();

    Ok(finish(HeadlineMode::Concurrent, started_at, outcomes))
}

/// Ingest headlines for every stored source one at a time, in listing order
pub async fn run_headline_fetch_sequential(
    service: &IngestionService,
    sources: &dyn SourceStore,
) -> Result<FetchRun> {
    let started_at = Utc::now();
    let stored = sources.list_all().await?;
    let mut outcomes = Vec::with_capacity(stored.len());

    for source in stored {
        let result = ingest_source(service, &source.name).await;
        outcomes.push(SourceOutcome {
            source_name: source.name,
            result,
        });
    }

    Ok(finish(HeadlineMode::Sequential, started_at, outcomes))
}

fn finish(mode: HeadlineMode, started_at: DateTime<Utc>, outcomes: Vec<SourceOutcome>) -> FetchRun {
    let run = FetchRun {
        mode,
        started_at,
        finished_at: Utc::now(),
        outcomes,
    };

    tracing::info!(
        mode = ?run.mode,
        sources = run.outcomes.len(),
        new_articles = run.new_articles(),
        failures = run.failures().len(),
        elapsed_ms = run.elapsed().num_milliseconds(),
        "Headline fetch run finished"
    );

    run
}
