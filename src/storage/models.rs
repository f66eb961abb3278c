use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Claim state as served to clients: item -> claimant list (empty = unclaimed)
pub type ClaimMap = BTreeMap<String, Vec<String>>;

/// A registry item and whoever claimed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub item: String,
    pub claimant: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl ClaimRecord {
    pub fn unclaimed(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            claimant: None,
            claimed_at: None,
        }
    }

    pub fn claimed(item: impl Into<String>, claimant: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            claimant: Some(claimant.into()),
            claimed_at: Some(Utc::now()),
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimant.is_some()
    }
}

/// Result of a single conditional claim write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Accepted,
    /// Someone got there first; carries the recorded claimant
    AlreadyClaimed(String),
}

impl ClaimOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ClaimOutcome::Accepted)
    }
}

pub fn records_to_map(records: Vec<ClaimRecord>) -> ClaimMap {
    records
        .into_iter()
        .map(|record| (record.item, record.claimant.into_iter().collect()))
        .collect()
}
