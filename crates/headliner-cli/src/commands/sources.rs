use anyhow::Result;

use headliner_core::IngestionService;

pub async fn run(service: &IngestionService) -> Result<()> {
    println!(
        "Refreshing sources (at most {} new per run)...\n",
        service.policy().source_quota
    );

    let saved = service.ingest_sources().await?;

    for source in &saved {
        println!("  {} ({})", source.name, source.source_id);
    }

    let stored = service.list_sources().await?;
    println!(
        "\nSource refresh complete. {} new, {} stored in total.",
        saved.len(),
        stored.len()
    );

    Ok(())
}
