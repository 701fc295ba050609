use anyhow::Result;

use headliner_core::storage::{ArticleRepository, ArticleStore, Database};

pub async fn run(db: &Database, limit: u32, offset: u32) -> Result<()> {
    let articles = ArticleRepository::new(db).find_page(limit, offset).await?;

    if articles.is_empty() {
        println!("No stored articles.");
        println!("\nTo fetch headlines, run:");
        println!("  headliner fetch --country us");
        return Ok(());
    }

    println!("Articles {}-{}:\n", offset + 1, offset as usize + articles.len());

    for article in &articles {
        let title = article.title.as_deref().unwrap_or("(no title)");
        let source = article.source_name.as_deref().unwrap_or("unknown source");

        println!("  {} [{}]", title, source);
        println!("    URL: {}", article.url);
        if let Some(published) = article.published_at {
            println!("    Published: {}", published.format("%Y-%m-%d %H:%M"));
        }
        println!();
    }

    Ok(())
}
