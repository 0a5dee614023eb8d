use thiserror::Error;

use crate::ledger::LedgerError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Artifact store error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode danger overlay: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FusionError>;
