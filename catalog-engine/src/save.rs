//! Save coordination: payload synthesis, the in-flight guard, and commit.
//!
//! The session splits a save into [`SaveCoordinator::begin`] (synchronous,
//! on the mailbox) and [`SaveCoordinator::complete`] (when the gateway call
//! returns) so nothing is mutated while the request is on the wire.

use chrono::{DateTime, Utc};

use catalog_types::CatalogEntry;

use crate::error::SaveError;
use crate::gateway::RemoteCatalogGateway;
use crate::overlay::EditOverlayStore;
use crate::projector::resolve_entries;
use crate::snapshot::AuthoritativeSnapshot;

/// Payload for a full-replace save: every existing entry in its resolved
/// form, then every staged addition with defaults.
pub fn build_payload(
    snapshot: &AuthoritativeSnapshot,
    overlay: &EditOverlayStore,
) -> Vec<CatalogEntry> {
    resolve_entries(snapshot, overlay)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAttempt {
    pub attempt_id: String,
    pub payload: Vec<CatalogEntry>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SaveCoordinator {
    in_flight: Option<SaveAttempt>,
}

impl SaveCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&SaveAttempt> {
        self.in_flight.as_ref()
    }

    /// Freeze the payload for a new attempt, or refuse if one is running.
    pub fn begin(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        overlay: &EditOverlayStore,
    ) -> Result<SaveAttempt, SaveError> {
        if self.in_flight.is_some() {
            return Err(SaveError::AlreadyInProgress);
        }
        if !snapshot.is_loaded() {
            return Err(SaveError::NotLoaded);
        }
        let attempt = SaveAttempt {
            attempt_id: ulid::Ulid::new().to_string(),
            payload: build_payload(snapshot, overlay),
            started_at: Utc::now(),
        };
        self.in_flight = Some(attempt.clone());
        Ok(attempt)
    }

    /// Resolve the running attempt. On success the snapshot becomes the
    /// server response and the overlay is cleared; on failure neither moves.
    pub fn complete(
        &mut self,
        attempt_id: &str,
        result: Result<Vec<CatalogEntry>, SaveError>,
        snapshot: &mut AuthoritativeSnapshot,
        overlay: &mut EditOverlayStore,
    ) -> Result<Vec<CatalogEntry>, SaveError> {
        match &self.in_flight {
            Some(attempt) if attempt.attempt_id == attempt_id => {}
            _ => {
                return Err(SaveError::Transport(format!(
                    "save attempt {attempt_id} is not in flight"
                )))
            }
        }
        self.in_flight = None;

        *snapshot = AuthoritativeSnapshot::new(result?);
        overlay.clear_all();
        Ok(snapshot.entries().to_vec())
    }

    /// Begin, submit, and complete in one call for a caller that already
    /// owns the state exclusively.
    pub async fn save(
        &mut self,
        gateway: &dyn RemoteCatalogGateway,
        snapshot: &mut AuthoritativeSnapshot,
        overlay: &mut EditOverlayStore,
    ) -> Result<Vec<CatalogEntry>, SaveError> {
        let attempt = self.begin(snapshot, overlay)?;
        let result = gateway.save(attempt.payload).await;
        self.complete(&attempt.attempt_id, result, snapshot, overlay)
    }
}
