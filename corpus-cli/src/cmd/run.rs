use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use corpus_core::queue::QueueProcessor;
use corpus_core::storage::Storage;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::fixture::{FixtureDomReader, FixtureHost};

#[derive(Args)]
pub struct RunArgs {
    /// Path to a saved act-page `DomResponse` JSON fixture, used to answer
    /// every extraction in this run.
    #[arg(long)]
    pub fixture: PathBuf,
}

pub async fn run(storage: &Arc<dyn Storage>, args: RunArgs) -> anyhow::Result<()> {
    let dom = FixtureDomReader::load(&args.fixture).await?;
    let fixture_body = dom.current_body_text();
    let host = FixtureHost::new(fixture_body);

    let config = storage.get_queue_config().await?;

    let processor = QueueProcessor::new(
        storage.clone(),
        Arc::new(host),
        Arc::new(dom),
        Uuid::new_v4().to_string(),
    );
    processor.recover_interrupted_processing().await?;

    let cancellation = CancellationToken::new();
    let summary = processor.run(&config, &cancellation).await?;

    println!(
        "{} completed={} errored={} retried={} duplicates_blocked={}",
        "run:".green().bold(),
        summary.completed,
        summary.errored,
        summary.retried,
        summary.duplicates_blocked
    );
    Ok(())
}
