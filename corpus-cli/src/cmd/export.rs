use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use corpus_core::export::{self, ActExport};
use corpus_core::storage::Storage;

#[derive(Args)]
pub struct ExportArgs {
    /// Directory to write exports into (created if absent).
    #[arg(long, default_value = "./export-out")]
    pub out_dir: PathBuf,
}

pub async fn run(storage: &Arc<dyn Storage>, args: ExportArgs) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&args.out_dir).await?;

    let acts = storage.list_acts().await?;
    let failed = storage.get_failed_extractions().await?;

    let exports: Vec<ActExport> = acts
        .into_iter()
        .map(ActExport::Successful)
        .chain(failed.into_iter().map(ActExport::Failed))
        .collect();

    let timestamp = Utc::now();
    let paths = export::write_batch(&args.out_dir, &exports, timestamp).await?;

    let manifest = storage.get_manifest().await?;
    let manifest_path = export::write_manifest(&args.out_dir, &manifest, timestamp).await?;
    let doc_paths = export::write_research_documents(&args.out_dir, &manifest).await?;

    println!(
        "{} wrote {} act export(s), manifest, and {} research document(s) to {}",
        "export:".green().bold(),
        paths.len(),
        doc_paths.len(),
        args.out_dir.display()
    );
    println!("  {}", manifest_path.display());
    Ok(())
}
