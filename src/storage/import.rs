use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::error::Result;
use crate::storage::{ClaimMap, ClaimOutcome, ClaimStore};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Already held by someone in the target store
    pub conflicts: usize,
    /// Entries without a claimant, registered as available
    pub empty: usize,
}

/// Seed `store` from a legacy `{item: [name]}` document.
/// Same first-wins rule as live claims: existing claims are never replaced.
pub fn import_claims(store: &dyn ClaimStore, data: &ClaimMap, progress: &ProgressBar) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    progress.set_length(data.len() as u64);

    for (item, names) in data {
        progress.set_message(item.clone());
        let name = names.iter().map(|n| n.trim()).find(|n| !n.is_empty());

        match name {
            None => {
                store.register_item(item)?;
                summary.empty += 1;
            }
            Some(name) => match store.try_claim(item, name)? {
                ClaimOutcome::Accepted => summary.imported += 1,
                ClaimOutcome::AlreadyClaimed(existing) => {
                    warn!("Skipping \"{}\": already claimed by \"{}\"", item, existing);
                    summary.conflicts += 1;
                }
            },
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    info!(
        imported = summary.imported,
        conflicts = summary.conflicts,
        empty = summary.empty,
        "Import finished"
    );
    Ok(summary)
}
