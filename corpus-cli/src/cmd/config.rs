use std::sync::Arc;

use colored::Colorize;
use corpus_core::storage::Storage;

pub async fn run(storage: &Arc<dyn Storage>) -> anyhow::Result<()> {
    let config = storage.get_queue_config().await?;
    println!("{}", "effective queue configuration".bold());
    println!("  extraction_delay_ms       = {}", config.extraction_delay_ms);
    println!("  minimum_content_threshold = {}", config.minimum_content_threshold);
    println!("  max_retry_attempts        = {}", config.max_retry_attempts);
    println!("  retry_base_delay_ms       = {}", config.retry_base_delay_ms);
    println!("  dom_readiness_timeout_ms  = {}", config.dom_readiness_timeout_ms);
    Ok(())
}
