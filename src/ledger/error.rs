use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid metadata value for {key}: {value}")]
    InvalidMetadata { key: String, value: String },

    #[error("Radar sweep already stored for {0}")]
    DuplicateRadar(chrono::DateTime<chrono::Utc>),

    #[error("Ledger write lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
