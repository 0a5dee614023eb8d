use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid grid descriptor: x_count={x_count}, y_count={y_count}")]
    InvalidGrid { x_count: f64, y_count: f64 },

    #[error("Invalid vertex offsets: {0:?}")]
    InvalidOffset(String),

    #[error("Invalid delta string: {0:?}")]
    InvalidDeltas(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
