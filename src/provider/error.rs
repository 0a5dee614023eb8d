use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed manifest: {0}")]
    MalformedManifest(#[from] serde_json::Error),

    #[error("Manifest has no entry for {0}")]
    MissingProduct(String),

    #[error("Invalid version {value:?} for {product}")]
    InvalidVersion { product: String, value: String },
}

pub type Result<T> = std::result::Result<T, FetchError>;
