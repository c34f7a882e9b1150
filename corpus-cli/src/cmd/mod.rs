pub mod config;
pub mod enqueue;
pub mod export;
pub mod run;
pub mod status;

use std::sync::Arc;

use corpus_core::storage::memory::MemoryStorage;
use corpus_core::storage::sqlite::SqliteStorage;
use corpus_core::storage::Storage;

/// Open the SQLite-backed store at `path`, or an in-memory store when no
/// path is given — the same choice `corpus-core` offers any embedder
/// (§4.8 "Durability backends").
pub async fn open_storage(path: Option<&str>) -> anyhow::Result<Arc<dyn Storage>> {
    match path {
        Some(path) => {
            let url = format!("sqlite:{path}?mode=rwc");
            let storage = SqliteStorage::connect(&url).await?;
            Ok(Arc::new(storage))
        }
        None => Ok(Arc::new(MemoryStorage::new())),
    }
}
