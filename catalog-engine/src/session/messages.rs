//! CatalogSessionActor message types.
//!
//! Presentation intents plus the completion messages spawned gateway calls
//! post back into the mailbox.

use chrono::{DateTime, Utc};
use ractor::RpcReplyPort;
use serde::Serialize;

use catalog_types::{CatalogEntry, CatalogEntryKey, ProcedureDescriptor};

use crate::error::{FetchError, SaveError};
use crate::overlay::{EditOutcome, ReconcileReport};
use crate::projector::{AvailableProcedure, EffectiveEntry};

#[derive(Debug)]
pub enum CatalogSessionMsg {
    SetEnabled {
        key: CatalogEntryKey,
        value: bool,
        reply: RpcReplyPort<EditOutcome>,
    },
    ToggleEnabled {
        key: CatalogEntryKey,
        reply: RpcReplyPort<EditOutcome>,
    },
    SetPrice {
        key: CatalogEntryKey,
        value: Option<i64>,
        reply: RpcReplyPort<EditOutcome>,
    },
    SetDuration {
        key: CatalogEntryKey,
        value: Option<u32>,
        reply: RpcReplyPort<EditOutcome>,
    },
    ToggleAddition {
        key: CatalogEntryKey,
        reply: RpcReplyPort<EditOutcome>,
    },
    DiscardAdditions {
        reply: RpcReplyPort<usize>,
    },
    Save {
        reply: RpcReplyPort<Result<Vec<CatalogEntry>, SaveError>>,
    },
    Refresh {
        reply: RpcReplyPort<Result<RefreshOutcome, FetchError>>,
    },
    RefreshProcedures {
        reply: RpcReplyPort<Result<usize, FetchError>>,
    },
    GetView {
        reply: RpcReplyPort<CatalogView>,
    },
    ListAvailableProcedures {
        species: Option<String>,
        reply: RpcReplyPort<Vec<AvailableProcedure>>,
    },
    SaveFinished {
        attempt_id: String,
        result: Result<Vec<CatalogEntry>, SaveError>,
        reply: RpcReplyPort<Result<Vec<CatalogEntry>, SaveError>>,
    },
    CatalogFetched {
        generation: u64,
        result: Result<Vec<CatalogEntry>, FetchError>,
        reply: RpcReplyPort<Result<RefreshOutcome, FetchError>>,
    },
    ProceduresFetched {
        result: Result<Vec<ProcedureDescriptor>, FetchError>,
        reply: RpcReplyPort<Result<usize, FetchError>>,
    },
}

/// What a completed catalog fetch did to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// The snapshot was replaced and the overlay reconciled against it.
    Applied {
        entries: usize,
        report: ReconcileReport,
    },
    /// A save was in flight; the result is held until the save resolves.
    Deferred,
    /// A newer fetch or a save already moved the snapshot past this result.
    Superseded,
}

/// Consistent read of one session: projection, dirtiness and sync status
/// all taken from the same snapshot/overlay pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView {
    pub session_id: String,
    pub entries: Vec<EffectiveEntry>,
    pub dirty: bool,
    pub save_in_flight: bool,
    pub refresh_deferred: bool,
    pub last_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}
