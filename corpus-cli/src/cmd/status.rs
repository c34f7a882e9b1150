use std::sync::Arc;

use colored::Colorize;
use corpus_core::storage::Storage;
use corpus_core::types::QueueStatus;

pub async fn run(storage: &Arc<dyn Storage>) -> anyhow::Result<()> {
    let queue = storage.get_queue().await?;
    let acts = storage.list_acts().await?;
    let failed = storage.get_failed_extractions().await?;

    println!("{}", "queue".bold());
    for item in &queue {
        let status = match item.status {
            QueueStatus::Pending => "pending".normal(),
            QueueStatus::Processing => "processing".yellow(),
            QueueStatus::Completed => "completed".green(),
            QueueStatus::Error => "error".red(),
            QueueStatus::Retrying => "retrying".yellow(),
        };
        println!("  {} {} [{}]", item.internal_id, item.title, status);
    }
    if queue.is_empty() {
        println!("  (empty)");
    }

    println!("{}", "captured acts".bold());
    for act in &acts {
        println!("  {} {}", act.internal_id, act.title_raw);
    }
    if acts.is_empty() {
        println!("  (none)");
    }

    println!("{}", "failed extractions".bold());
    for f in &failed {
        println!(
            "  {} {} attempts={} reason={:?}",
            f.internal_id,
            f.title,
            f.attempts.len(),
            f.failure_reason
        );
    }
    if failed.is_empty() {
        println!("  (none)");
    }

    Ok(())
}
