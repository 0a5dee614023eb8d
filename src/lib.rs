pub mod acquisition;
pub mod api;
pub mod config;
pub mod fusion;
pub mod geometry;
pub mod ledger;
pub mod observability;
pub mod pipeline;
pub mod provider;
pub mod retention;
pub mod slots;
pub mod storage;
