//! Read API over stored artifacts
//!
//! Resolves a product and slot to a ledger record and serves the record's
//! artifact. A record whose artifact is gone is reported as a server error,
//! never as a 404.

mod error;
pub mod models;
mod server;
pub mod services;
pub mod state;
pub(crate) mod utils;

pub use error::ApiError;
pub use server::{router, run};
pub use state::AppState;
