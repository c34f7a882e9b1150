//! Dev/verification harness for `corpus-core`: drives the real pipeline
//! against a saved DOM-response fixture and a local SQLite database instead
//! of a live browser extension. No network navigation happens here — see
//! `fixture.rs`.

mod cmd;
mod fixture;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "corpus", about = "bdlaws corpus pipeline, fixture-driven", version)]
struct Cli {
    /// SQLite database file (created if absent). Defaults to an in-process
    /// in-memory database when omitted.
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a catalog-page fixture and add its entries to the queue.
    Enqueue(cmd::enqueue::EnqueueArgs),
    /// Run the queue processor once against a single act-page fixture.
    Run(cmd::run::RunArgs),
    /// List the current queue, captured acts, and failed extractions.
    Status,
    /// Export captured and failed acts, the manifest, and the research docs.
    Export(cmd::export::ExportArgs),
    /// Print the effective (clamped) queue configuration.
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let storage = cmd::open_storage(cli.db.as_deref()).await?;

    match cli.command {
        Command::Enqueue(args) => cmd::enqueue::run(&storage, args).await,
        Command::Run(args) => cmd::run::run(&storage, args).await,
        Command::Status => cmd::status::run(&storage).await,
        Command::Export(args) => cmd::export::run(&storage, args).await,
        Command::ShowConfig => cmd::config::run(&storage).await,
    }
}
