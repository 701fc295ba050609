use std::sync::Arc;

use anyhow::Result;

use headliner_core::scheduler::{run_headline_fetch_concurrent, run_headline_fetch_sequential};
use headliner_core::{AppConfig, IngestionService};

pub async fn run(service: Arc<IngestionService>, config: &AppConfig, sequential: bool) -> Result<()> {
    let store = service.source_store();

    let run = if sequential {
        println!("Fetching headlines for each source, one at a time...\n");
        run_headline_fetch_sequential(&service, store.as_ref()).await?
    } else {
        let concurrency = config.sync.max_concurrent_fetches;
        println!("Fetching headlines for each source ({} at a time)...\n", concurrency);
        run_headline_fetch_concurrent(Arc::clone(&service), store.as_ref(), concurrency).await?
    };

    if run.outcomes.is_empty() {
        println!("No sources stored yet. Run `headliner sources` first.");
        return Ok(());
    }

    for outcome in &run.outcomes {
        match &outcome.result {
            Ok(count) => println!("  {} - {} new articles", outcome.source_name, count),
            Err(message) => println!("  {} - [ERROR: {}]", outcome.source_name, message),
        }
    }

    println!(
        "\nRefresh complete in {:.1}s. {} new articles, {} failed sources.",
        run.elapsed().num_milliseconds() as f64 / 1000.0,
        run.new_articles(),
        run.failures().len()
    );

    Ok(())
}
