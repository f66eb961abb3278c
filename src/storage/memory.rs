use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{
    error::Result,
    storage::{
        models::{ClaimOutcome, ClaimRecord},
        ClaimStore,
    },
};

/// Volatile store used when no durable backend is available.
/// Claims are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    claims: Mutex<BTreeMap<String, ClaimRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClaimStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn records(&self) -> Result<Vec<ClaimRecord>> {
        Ok(self.claims.lock()?.values().cloned().collect())
    }

    fn try_claim(&self, item: &str, name: &str) -> Result<ClaimOutcome> {
        let mut claims = self.claims.lock()?;
        if let Some(existing) = claims.get(item).and_then(|r| r.claimant.clone()) {
            return Ok(ClaimOutcome::AlreadyClaimed(existing));
        }
        claims.insert(item.to_string(), ClaimRecord::claimed(item, name));
        Ok(ClaimOutcome::Accepted)
    }

    fn register_item(&self, item: &str) -> Result<()> {
        self.claims
            .lock()?
            .entry(item.to_string())
            .or_insert_with(|| ClaimRecord::unclaimed(item));
        Ok(())
    }
}
