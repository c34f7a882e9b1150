use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use corpus_core::catalog;
use corpus_core::dom::DomResponse;
use corpus_core::queue;
use corpus_core::storage::Storage;
use corpus_core::types::MonotoneIdGenerator;

#[derive(Args)]
pub struct EnqueueArgs {
    /// Path to a saved catalog-page `DomResponse` JSON fixture (its `acts` field).
    #[arg(long)]
    pub fixture: PathBuf,
}

pub async fn run(storage: &Arc<dyn Storage>, args: EnqueueArgs) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.fixture).await?;
    let response: DomResponse = serde_json::from_str(&raw)?;
    let rows = response.acts.unwrap_or_default();

    let (entries, warnings) = catalog::extract_catalog(&rows);
    for warning in &warnings {
        eprintln!(
            "{} row {}: {}",
            "warning:".yellow().bold(),
            warning.row_index,
            warning.reason
        );
    }

    let id_gen = MonotoneIdGenerator::new();
    let result = queue::add_acts_to_queue(storage.as_ref(), &id_gen, &entries, Utc::now()).await?;

    println!(
        "{} added={} skipped_in_queue={} skipped_captured={}",
        "enqueue:".green().bold(),
        result.added,
        result.skipped_in_queue,
        result.skipped_captured
    );
    Ok(())
}
