use std::sync::Arc;

use crate::ledger::FjallLedger;
use crate::observability::Metrics;
use crate::storage::ArtifactStore;

#[derive(Clone)]
pub struct AppState {
    pub ledger: FjallLedger,
    pub artifacts: ArtifactStore,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(ledger: FjallLedger, artifacts: ArtifactStore, metrics: Arc<Metrics>) -> Self {
        Self {
            ledger,
            artifacts,
            metrics,
        }
    }
}
