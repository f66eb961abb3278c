pub mod batch;
pub mod reconciler;
pub mod registry;

pub use batch::{ClaimBatch, ProposedClaim};
pub use reconciler::{reconcile, AcceptedClaim, BatchStatus, ReconcileReport};
pub use registry::Registry;
