//! CatalogSessionActor state types.

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use catalog_types::{CatalogEntry, ProcedureDescriptor};

use crate::gateway::SharedCatalogGateway;
use crate::overlay::{EditOverlayStore, ReconcileReport};
use crate::projector::project;
use crate::save::SaveCoordinator;
use crate::snapshot::AuthoritativeSnapshot;

use super::messages::CatalogView;

/// A fetch result held back while a save was in flight.
#[derive(Debug, Clone)]
pub struct BufferedFetch {
    pub generation: u64,
    pub entries: Vec<CatalogEntry>,
}

pub struct CatalogSessionState {
    pub session_id: String,
    pub label: String,
    pub gateway: SharedCatalogGateway,
    pub snapshot: AuthoritativeSnapshot,
    pub overlay: EditOverlayStore,
    pub procedures: Vec<ProcedureDescriptor>,
    pub saves: SaveCoordinator,
    /// Generation handed to the most recently issued catalog fetch.
    pub issued_generation: u64,
    /// Newest generation whose data the snapshot reflects (or supersedes).
    pub applied_generation: u64,
    pub buffered_fetch: Option<BufferedFetch>,
    pub last_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub tasks: Vec<JoinHandle<()>>,
}

impl CatalogSessionState {
    pub fn new(session_id: String, label: String, gateway: SharedCatalogGateway) -> Self {
        Self {
            session_id,
            label,
            gateway,
            snapshot: AuthoritativeSnapshot::default(),
            overlay: EditOverlayStore::new(),
            procedures: Vec::new(),
            saves: SaveCoordinator::new(),
            issued_generation: 0,
            applied_generation: 0,
            buffered_fetch: None,
            last_error: None,
            last_synced_at: None,
            tasks: Vec::new(),
        }
    }

    pub fn view(&self) -> CatalogView {
        CatalogView {
            session_id: self.session_id.clone(),
            entries: project(&self.snapshot, &self.overlay, &self.procedures),
            dirty: self.overlay.is_dirty(),
            save_in_flight: self.saves.is_in_flight(),
            refresh_deferred: self.buffered_fetch.is_some(),
            last_error: self.last_error.clone(),
            last_synced_at: self.last_synced_at,
        }
    }

    pub fn next_generation(&mut self) -> u64 {
        self.issued_generation += 1;
        self.issued_generation
    }

    pub fn is_stale(&self, generation: u64) -> bool {
        generation <= self.applied_generation
    }

    /// Replace the snapshot with fetched data and reconcile pending edits.
    pub fn apply_catalog(&mut self, generation: u64, entries: Vec<CatalogEntry>) -> ReconcileReport {
        self.snapshot = AuthoritativeSnapshot::new(entries);
        self.applied_generation = generation;
        self.last_synced_at = Some(Utc::now());
        self.last_error = None;
        self.overlay.reconcile(&self.snapshot)
    }

    pub fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
    }
}
