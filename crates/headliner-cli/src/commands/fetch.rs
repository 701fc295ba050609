use anyhow::Result;

use headliner_core::news::FetchParams;
use headliner_core::IngestionService;

pub async fn run(
    service: &IngestionService,
    country: Option<String>,
    category: Option<String>,
    sources: Option<String>,
) -> Result<()> {
    let params = FetchParams::new(country, category, sources)?;

    println!("Fetching top headlines...\n");

    let saved = service.ingest_headlines(&params).await?;

    for article in &saved {
        let title = article.title.as_deref().unwrap_or("(no title)");
        let source = article.source_name.as_deref().unwrap_or("unknown source");
        println!("  {} [{}]", title, source);
        println!("    {}", article.url);
    }

    println!("\nFetch complete. {} new articles stored.", saved.len());

    Ok(())
}
