use thiserror::Error;

use crate::ledger::LedgerError;
use crate::provider::FetchError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Manifest check failed: {0}")]
    Manifest(#[source] FetchError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Artifact store error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode decoded geometry: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AcquisitionError>;
