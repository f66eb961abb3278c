pub mod claims;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod server;
pub mod storage;
pub mod utils;

pub use claims::{ClaimBatch, Registry};
pub use config::Config;
pub use error::{RegistryError, Result};
