use anyhow::Result;
use odx_config::Config;
use odx_engine::{Extractor, Outcome};
use std::path::Path;
use tracing::info;

pub async fn handle(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;

    info!(
        host = %config.host,
        page_size = config.page_size,
        max_records = ?config.max_records,
        output_dir = %config.output_dir.display(),
        "Starting business partner extraction"
    );

    let mut extractor = Extractor::from_config(&config)?;
    let summary = extractor.run().await;

    match &summary.outcome {
        Outcome::Completed => {
            println!("✓ Extraction finished: {} records", summary.processed);
            println!("  Output: {}", config.output_dir.display());
        }
        Outcome::Aborted(reason) => {
            println!(
                "✗ Extraction stopped after {} records: {}",
                summary.processed, reason
            );
            println!("  Output: {}", config.output_dir.display());
        }
    }

    Ok(())
}
