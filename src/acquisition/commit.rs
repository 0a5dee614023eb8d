//! Two-phase commit of fetched slices
//!
//! The artifact is written under a temporary key, the ledger insert assigns the
//! id, and only then is the artifact renamed to `{id}.{ext}`. A failed insert
//! discards the temporary object.

use bytes::Bytes;
use tracing::{debug, warn};

use super::Acquisition;
use super::error::Result;
use crate::geometry;
use crate::ledger::{self, FjallLedger};
use crate::provider::FetchError;
use crate::storage::ArtifactKind;

/// Result of fetching and committing one slice
pub(super) enum SliceOutcome {
    Stored(String),
    Skipped,
}

impl Acquisition {
    /// Fetch a provider slice, skipping it on any transport failure
    pub(super) async fn fetch_slice(&self, url: &str) -> Option<Bytes> {
        match self.provider.fetch(url).await {
            Ok(body) => Some(body),
            Err(FetchError::Status { status, .. }) => {
                debug!(url, status, "Slice not available");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "Slice fetch failed");
                None
            }
        }
    }

    /// Decode a contour payload and commit it as a geometry artifact
    pub(super) async fn commit_geometry<F>(
        &self,
        url: &str,
        body: &[u8],
        insert: F,
    ) -> Result<SliceOutcome>
    where
        F: FnOnce(&FjallLedger) -> ledger::Result<String>,
    {
        let collection = match geometry::decode_bytes(body) {
            Ok(collection) => collection,
            Err(e) => {
                warn!(url, error = %e, "Skipping undecodable slice");
                return Ok(SliceOutcome::Skipped);
            }
        };

        let encoded = Bytes::from(serde_json::to_vec(&collection)?);
        self.commit(ArtifactKind::Geometry, encoded, insert).await
    }

    /// Commit raw bytes as an artifact of the given kind
    pub(super) async fn commit<F>(
        &self,
        kind: ArtifactKind,
        data: Bytes,
        insert: F,
    ) -> Result<SliceOutcome>
    where
        F: FnOnce(&FjallLedger) -> ledger::Result<String>,
    {
        let pending = self.artifacts.write_temp(kind, data).await?;

        let id = match insert(&self.ledger) {
            Ok(id) => id,
            Err(e) => {
                if let Err(discard) = self.artifacts.discard(pending).await {
                    warn!(error = %discard, "Failed to discard temporary artifact");
                }
                return Err(e.into());
            }
        };

        self.artifacts.commit(pending, &id).await?;
        Ok(SliceOutcome::Stored(id))
    }
}
