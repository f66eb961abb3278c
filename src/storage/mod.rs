pub mod db;
pub mod file;
pub mod import;
pub mod memory;
pub mod models;

pub use db::SqliteStore;
pub use file::JsonFileStore;
pub use import::{import_claims, ImportSummary};
pub use memory::MemoryStore;
pub use models::{ClaimMap, ClaimOutcome, ClaimRecord};

use std::sync::Arc;
use tracing::{error, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;

/// Item -> claimant persistence with first-claim-wins semantics
#[cfg_attr(test, mockall::automock)]
pub trait ClaimStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// False when claims do not survive a restart
    fn is_durable(&self) -> bool {
        true
    }

    fn records(&self) -> Result<Vec<ClaimRecord>>;

    fn load(&self) -> Result<ClaimMap> {
        Ok(models::records_to_map(self.records()?))
    }

    /// Record `name` for `item` only if nobody holds it yet.
    /// The check and the write must be one step against current state.
    fn try_claim(&self, item: &str, name: &str) -> Result<ClaimOutcome>;

    /// Make `item` known without a claimant so guests see it as available.
    /// An existing claim is left alone.
    fn register_item(&self, item: &str) -> Result<()>;
}

pub fn open(config: &StorageConfig) -> Result<Arc<dyn ClaimStore>> {
    let store: Arc<dyn ClaimStore> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(config.path())?),
        StorageBackend::File => Arc::new(JsonFileStore::open(config.path())?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// Open the configured backend, degrading to [`MemoryStore`] when it is
/// unreachable and the fallback is allowed.
pub fn open_with_fallback(config: &StorageConfig) -> Result<Arc<dyn ClaimStore>> {
    match open(config) {
        Ok(store) => Ok(store),
        Err(e) if config.fallback_to_memory => {
            error!(
                "Failed to open {} store at {}: {}",
                config.backend,
                config.path().display(),
                e
            );
            warn!("Falling back to in-memory claims; they will be lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        Err(e) => Err(e),
    }
}
