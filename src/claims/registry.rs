use std::sync::Arc;
use tracing::{error, info, warn};

use crate::claims::batch::ClaimBatch;
use crate::claims::reconciler::{reconcile, BatchStatus, ReconcileReport};
use crate::error::{RegistryError, Result};
use crate::notify::{ClaimNotice, NotificationHub};
use crate::storage::{ClaimMap, ClaimStore};

/// Request-facing claim service: one store handle plus the host notifier.
pub struct Registry {
    store: Arc<dyn ClaimStore>,
    notifier: NotificationHub,
}

impl Registry {
    pub fn new(store: Arc<dyn ClaimStore>, notifier: NotificationHub) -> Self {
        if !store.is_durable() {
            warn!("Registry is running on a volatile {} store", store.backend());
        }
        Self { store, notifier }
    }

    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        &self.store
    }

    /// Current claims. Never fails: an unreachable store yields an empty map.
    pub async fn snapshot(&self) -> ClaimMap {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.load()).await {
            Ok(Ok(map)) => map,
            Ok(Err(e)) => {
                error!("Failed to read claims from {} store: {}", self.store.backend(), e);
                ClaimMap::new()
            }
            Err(e) => {
                error!("Claim read task failed: {}", e);
                ClaimMap::new()
            }
        }
    }

    /// Reconcile a batch and, when something was accepted, hand the result
    /// to the notifier without waiting for delivery.
    pub async fn submit(&self, batch: ClaimBatch) -> Result<ReconcileReport> {
        let report = self.reconcile(batch).await?;

        match report.status() {
            BatchStatus::Claimed => {
                info!(
                    accepted = report.accepted.len(),
                    rejected = report.rejected.len(),
                    failed = report.failed.len(),
                    "Claim batch processed"
                );
                self.notifier.dispatch(ClaimNotice::from_report(&report));
            }
            BatchStatus::NothingClaimed => {
                info!(rejected = report.rejected.len(), "Claim batch had nothing to claim");
            }
            BatchStatus::StorageFailure => {
                error!(failed = report.failed.len(), "Claim batch could not be saved");
            }
        }

        Ok(report)
    }

    async fn reconcile(&self, batch: ClaimBatch) -> Result<ReconcileReport> {
        if batch.is_empty() {
            return Ok(ReconcileReport {
                volatile: !self.store.is_durable(),
                ..ReconcileReport::default()
            });
        }

        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || reconcile(store.as_ref(), &batch))
            .await
            .map_err(|e| RegistryError::Other(anyhow::anyhow!("claim task failed: {}", e)))
    }
}
