use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::{
    error::Result,
    storage::{
        models::{ClaimMap, ClaimOutcome, ClaimRecord},
        ClaimStore,
    },
};

/// Flat JSON document store: `{"item": ["claimant"], ...}`.
///
/// Check-and-set is serialised by a process-local lock and every write
/// replaces the document atomically. Processes sharing the same file are
/// not coordinated; use the SQLite backend for that.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if path.exists() {
            // Fail early on a document we could never write back
            read_document(&path)?;
        }

        info!("Claim file ready at {}", path.display());
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    fn write(&self, data: &ClaimMap) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(serde_json::to_string_pretty(data)?.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Parse a claims document; a missing file is an empty registry
pub fn read_document(path: &Path) -> Result<ClaimMap> {
    if !path.exists() {
        return Ok(ClaimMap::new());
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(ClaimMap::new());
    }
    Ok(serde_json::from_str(&raw)?)
}

impl ClaimStore for JsonFileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn records(&self) -> Result<Vec<ClaimRecord>> {
        let _guard = self.lock.lock()?;
        let data = read_document(&self.path)?;

        Ok(data
            .into_iter()
            .map(|(item, names)| match names.into_iter().next() {
                Some(name) => ClaimRecord {
                    item,
                    claimant: Some(name),
                    claimed_at: None,
                },
                None => ClaimRecord::unclaimed(item),
            })
            .collect())
    }

    fn load(&self) -> Result<ClaimMap> {
        let _guard = self.lock.lock()?;
        read_document(&self.path)
    }

    fn try_claim(&self, item: &str, name: &str) -> Result<ClaimOutcome> {
        let _guard = self.lock.lock()?;
        let mut data = read_document(&self.path)?;

        if let Some(existing) = data.get(item).and_then(|names| names.first()) {
            debug!("File store: {} already held by {}", item, existing);
            return Ok(ClaimOutcome::AlreadyClaimed(existing.clone()));
        }

        data.insert(item.to_string(), vec![name.to_string()]);
        self.write(&data)?;
        Ok(ClaimOutcome::Accepted)
    }

    fn register_item(&self, item: &str) -> Result<()> {
        let _guard = self.lock.lock()?;
        let mut data = read_document(&self.path)?;

        if data.contains_key(item) {
            return Ok(());
        }
        data.insert(item.to_string(), Vec::new());
        self.write(&data)
    }
}
