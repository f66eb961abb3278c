use tracing::{error, info};

use crate::claims::batch::ClaimBatch;
use crate::storage::{ClaimOutcome, ClaimStore};

/// Batch-level result of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// At least one claim was accepted
    Claimed,
    /// Nothing accepted: every name was blank or every item was taken
    NothingClaimed,
    /// Nothing accepted and at least one write failed in the store
    StorageFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedClaim {
    pub item: String,
    pub name: String,
}

impl std::fmt::Display for AcceptedClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.item, self.name)
    }
}

/// Partitioned outcome of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub accepted: Vec<AcceptedClaim>,
    /// Items someone else already holds
    pub rejected: Vec<String>,
    /// Items whose write failed; never counted as accepted
    pub failed: Vec<String>,
    /// Accepted claims live only in the volatile fallback store
    pub volatile: bool,
}

impl ReconcileReport {
    pub fn status(&self) -> BatchStatus {
        if !self.accepted.is_empty() {
            BatchStatus::Claimed
        } else if !self.failed.is_empty() {
            BatchStatus::StorageFailure
        } else {
            BatchStatus::NothingClaimed
        }
    }

    /// Accepted claims as "item: name" lines
    pub fn accepted_lines(&self) -> Vec<String> {
        self.accepted.iter().map(ToString::to_string).collect()
    }
}

/// Run every proposal in `batch` against `store`, one conditional write per
/// item. Items are independent: a rejection or failure for one item does
/// not affect the others.
pub fn reconcile(store: &dyn ClaimStore, batch: &ClaimBatch) -> ReconcileReport {
    let mut report = ReconcileReport {
        volatile: !store.is_durable(),
        ..ReconcileReport::default()
    };

    for proposal in batch.entries() {
        match store.try_claim(&proposal.item, &proposal.name) {
            Ok(ClaimOutcome::Accepted) => {
                info!("Item \"{}\" claimed by \"{}\"", proposal.item, proposal.name);
                report.accepted.push(AcceptedClaim {
                    item: proposal.item.clone(),
                    name: proposal.name.clone(),
                });
            }
            Ok(ClaimOutcome::AlreadyClaimed(existing)) => {
                info!(
                    "Item \"{}\" already claimed by \"{}\" - ignored",
                    proposal.item, existing
                );
                report.rejected.push(proposal.item.clone());
            }
            Err(e) => {
                error!(
                    "Failed to record claim for \"{}\" in {} store: {}",
                    proposal.item,
                    store.backend(),
                    e
                );
                report.failed.push(proposal.item.clone());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::storage::{MemoryStore, MockClaimStore, SqliteStore};

    fn batch(pairs: &[(&str, &str)]) -> ClaimBatch {
        ClaimBatch::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_same_claim_twice() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = reconcile(&store, &batch(&[("Crib", "Ana")]));
        assert_eq!(first.accepted_lines(), vec!["Crib: Ana".to_string()]);
        assert!(first.rejected.is_empty());
        assert_eq!(first.status(), BatchStatus::Claimed);

        let second = reconcile(&store, &batch(&[("Crib", "Ana")]));
        assert!(second.accepted.is_empty());
        assert_eq!(second.rejected, vec!["Crib".to_string()]);
        assert_eq!(second.status(), BatchStatus::NothingClaimed);
    }

    #[test]
    fn test_mixed_batch() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.try_claim("Stroller", "Bruno").unwrap();

        let report = reconcile(&store, &batch(&[("Crib", "Ana"), ("Stroller", "Carla")]));

        assert_eq!(report.accepted_lines(), vec!["Crib: Ana".to_string()]);
        assert_eq!(report.rejected, vec!["Stroller".to_string()]);
        assert!(!report.volatile);
        assert_eq!(store.load().unwrap()["Stroller"], vec!["Bruno".to_string()]);
    }

    #[test]
    fn test_blank_batch_never_touches_store() {
        let mut store = MockClaimStore::new();
        store.expect_is_durable().return_const(true);
        store.expect_try_claim().never();

        let report = reconcile(&store, &batch(&[("Crib", "  "), ("Stroller", "")]));
        assert_eq!(report.status(), BatchStatus::NothingClaimed);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_write_failure_is_not_an_acceptance() {
        let mut store = MockClaimStore::new();
        store.expect_is_durable().return_const(true);
        store.expect_backend().return_const("mock");
        store
            .expect_try_claim()
            .withf(|item, _| item == "Crib")
            .returning(|_, _| Err(RegistryError::LockPoisoned("disk gone".to_string())));
        store
            .expect_try_claim()
            .withf(|item, _| item == "Stroller")
            .returning(|_, _| Ok(ClaimOutcome::Accepted));

        let report = reconcile(&store, &batch(&[("Crib", "Ana"), ("Stroller", "Bruno")]));
        assert_eq!(report.failed, vec!["Crib".to_string()]);
        assert_eq!(report.accepted_lines(), vec!["Stroller: Bruno".to_string()]);
        assert_eq!(report.status(), BatchStatus::Claimed);

        let mut broken = MockClaimStore::new();
        broken.expect_is_durable().return_const(true);
        broken.expect_backend().return_const("mock");
        broken
            .expect_try_claim()
            .returning(|_, _| Err(RegistryError::LockPoisoned("disk gone".to_string())));

        let report = reconcile(&broken, &batch(&[("Crib", "Ana")]));
        assert_eq!(report.status(), BatchStatus::StorageFailure);
        assert!(report.accepted.is_empty());
    }

    #[test]
    fn test_memory_store_marks_report_volatile() {
        let store = MemoryStore::new();
        let report = reconcile(&store, &batch(&[("Crib", "Ana")]));
        assert!(report.volatile);
    }

    #[test]
    fn test_concurrent_reconciliations_single_winner() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.db");
        let store: Arc<dyn ClaimStore> = Arc::new(SqliteStore::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let name = format!("guest-{}", i);
                    reconcile(store.as_ref(), &batch(&[("Crib", name.as_str())]))
                })
            })
            .collect();

        let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let accepted = reports.iter().filter(|r| r.status() == BatchStatus::Claimed).count();
        let rejected = reports.iter().filter(|r| r.rejected == ["Crib"]).count();
        assert_eq!(accepted, 1);
        assert_eq!(rejected, 7);
    }
}
