use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use headliner_core::api::{self, AppState};
use headliner_core::{AppConfig, IngestionService, SchedulerEvent, SchedulerService};

/// Run the HTTP API and the background scheduler until Ctrl+C
pub async fn run(service: Arc<IngestionService>, config: Arc<AppConfig>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = signal_tx.send(true);
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SchedulerEvent::SourcesRefreshed { new_sources } => {
                    info!("Sources refreshed: {} new", new_sources)
                }
                SchedulerEvent::HeadlinesFetched { new_articles, failures } => {
                    info!("Headlines fetched: {} new, {} failed sources", new_articles, failures)
                }
                SchedulerEvent::Error { task, message } => {
                    warn!("Scheduled {} run failed: {}", task, message)
                }
            }
        }
    });

    let scheduler =
        SchedulerService::new(Arc::clone(&service), Arc::clone(&config)).with_event_sender(event_tx);

    // The first scheduled source refresh is a full period away
    if service.list_sources().await?.is_empty() {
        if let Err(e) = scheduler.refresh_sources_now().await {
            warn!("Initial source refresh failed: {}", e);
        }
    }

    println!(
        "Headliner serving on {}. Press Ctrl+C to stop.",
        config.server.bind_addr
    );
    println!(
        "  Source refresh interval: {} seconds",
        config.sync.source_refresh_interval_secs
    );
    println!(
        "  Headline refresh interval: {} seconds ({:?})",
        config.sync.headline_refresh_interval_secs, config.sync.headline_mode
    );

    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let router = api::router(AppState::new(service));
    let served = api::serve(router, &config.server.bind_addr, shutdown_rx).await;

    // Stop the scheduler even when the listener failed
    let _ = shutdown_tx.send(true);
    scheduler_handle.await?;
    served?;

    println!("Headliner stopped.");

    Ok(())
}
