use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, HeadlineMode};
use crate::ingest::IngestionService;
use crate::Result;

use super::tasks::{
    run_headline_fetch_concurrent, run_headline_fetch_sequential, run_source_refresh, FetchRun,
};

/// Events emitted by the scheduler after each run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The source list was refreshed
    SourcesRefreshed { new_sources: usize },
    /// A per-source headline run finished
    HeadlinesFetched { new_articles: usize, failures: usize },
    /// A background run failed as a whole
    Error { task: String, message: String },
}

/// Background scheduler driving source refreshes and headline fetches
pub struct SchedulerService {
    service: Arc<IngestionService>,
    config: Arc<AppConfig>,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl SchedulerService {
    pub fn new(service: Arc<IngestionService>, config: Arc<AppConfig>) -> Self {
        Self {
            service,
            config,
            event_tx: None,
        }
    }

    /// Set the event sender for run notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    /// Run both refresh loops until the shutdown signal
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let sources_secs = self.config.sync.source_refresh_interval_secs;
        let headlines_secs = self.config.sync.headline_refresh_interval_secs;

        if sources_secs == 0 && headlines_secs == 0 {
            info!("Background scheduler disabled (both refresh intervals are 0)");
            let _ = shutdown.changed().await;
            return;
        }

        info!(
            "Scheduler started: sources={}s, headlines={}s, mode={:?}",
            sources_secs, headlines_secs, self.config.sync.headline_mode
        );

        // A disabled loop keeps a placeholder period; its select arm is guarded off
        let mut sources_interval = tokio::time::interval(Duration::from_secs(sources_secs.max(1)));
        let mut headlines_interval = tokio::time::interval(Duration::from_secs(headlines_secs.max(1)));

        // Skip the first tick (fires immediately)
        sources_interval.tick().await;
        headlines_interval.tick().await;

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = sources_interval.tick(), if sources_secs > 0 => {
                    debug!("Running scheduled source refresh");
                    if let Err(e) = self.refresh_sources_now().await {
                        error!("Scheduled source refresh failed: {}", e);
                    }
                }

                _ = headlines_interval.tick(), if headlines_secs > 0 => {
                    debug!("Running scheduled headline fetch");
                    if let Err(e) = self.refresh_now().await {
                        error!("Scheduled headline fetch failed: {}", e);
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// Refresh the source list immediately
    pub async fn refresh_sources_now(&self) -> Result<usize> {
        match run_source_refresh(&self.service).await {
            Ok(saved) => {
                let new_sources = saved.len();
                self.send_event(SchedulerEvent::SourcesRefreshed { new_sources });
                Ok(new_sources)
            }
            Err(e) => {
                self.send_event(SchedulerEvent::Error {
                    task: "sources".to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Run a headline fetch immediately in the configured mode
    pub async fn refresh_now(&self) -> Result<FetchRun> {
        let store = self.service.source_store();
        let result = match self.config.sync.headline_mode {
            HeadlineMode::Concurrent => {
                run_headline_fetch_concurrent(
                    Arc::clone(&self.service),
                    store.as_ref(),
                    self.config.sync.max_concurrent_fetches,
                )
                .await
            }
            HeadlineMode::Sequential => {
                run_headline_fetch_sequential(&self.service, store.as_ref()).await
            }
        };

        match result {
            Ok(run) => {
                self.send_event(SchedulerEvent::HeadlinesFetched {
                    new_articles: run.new_articles(),
                    failures: run.failures().len(),
                });
                Ok(run)
            }
            Err(e) => {
                self.send_event(SchedulerEvent::Error {
                    task: "headlines".to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
