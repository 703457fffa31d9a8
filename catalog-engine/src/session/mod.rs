//! CatalogSessionActor - single mutation authority for one provider's
//! catalog-editing session.
//!
//! All edits, saves and refreshes are serialized through the mailbox. Gateway
//! calls run in spawned tasks and report back with completion messages, so
//! snapshot and overlay only ever change inside a handler.

mod handle;
mod messages;
mod state;

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef};

use catalog_types::{CatalogEntry, CatalogEntryKey, ProcedureDescriptor};

pub use handle::CatalogSessionHandle;
pub use messages::{CatalogSessionMsg, CatalogView, RefreshOutcome};
pub use state::{BufferedFetch, CatalogSessionState};

use crate::error::{FetchError, SaveError};
use crate::gateway::SharedCatalogGateway;
use crate::overlay::{EditOutcome, EditOverlayStore, ReconcileReport};
use crate::projector::available_procedures;
use crate::snapshot::AuthoritativeSnapshot;

#[derive(Debug, Default)]
pub struct CatalogSessionActor;

#[derive(Clone)]
pub struct CatalogSessionArguments {
    pub gateway: SharedCatalogGateway,
    pub label: String,
}

#[async_trait]
impl Actor for CatalogSessionActor {
    type Msg = CatalogSessionMsg;
    type State = CatalogSessionState;
    type Arguments = CatalogSessionArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let session_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            actor_id = %myself.get_id(),
            session_id = %session_id,
            label = %args.label,
            "CatalogSessionActor starting"
        );
        Ok(CatalogSessionState::new(session_id, args.label, args.gateway))
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CatalogSessionMsg::SetEnabled { key, value, reply } => {
                let outcome = Self::apply_edit(state, "set_enabled", &key, |overlay, snapshot| {
                    overlay.set_enabled(snapshot, &key, value)
                });
                let _ = reply.send(outcome);
            }
            CatalogSessionMsg::ToggleEnabled { key, reply } => {
                let outcome = Self::apply_edit(state, "toggle_enabled", &key, |overlay, snapshot| {
                    overlay.toggle_enabled(snapshot, &key)
                });
                let _ = reply.send(outcome);
            }
            CatalogSessionMsg::SetPrice { key, value, reply } => {
                let outcome = Self::apply_edit(state, "set_price", &key, |overlay, snapshot| {
                    overlay.set_price_override(snapshot, &key, value)
                });
                let _ = reply.send(outcome);
            }
            CatalogSessionMsg::SetDuration { key, value, reply } => {
                let outcome = Self::apply_edit(state, "set_duration", &key, |overlay, snapshot| {
                    overlay.set_duration_override(snapshot, &key, value)
                });
                let _ = reply.send(outcome);
            }
            CatalogSessionMsg::ToggleAddition { key, reply } => {
                let outcome = Self::apply_edit(state, "toggle_addition", &key, |overlay, snapshot| {
                    overlay.toggle_addition(snapshot, &key)
                });
                let _ = reply.send(outcome);
            }
            CatalogSessionMsg::DiscardAdditions { reply } => {
                let dropped = if state.saves.is_in_flight() {
                    tracing::debug!(
                        session_id = %state.session_id,
                        "Discard refused while a save is in flight"
                    );
                    0
                } else {
                    let dropped = state.overlay.discard_additions();
                    tracing::debug!(
                        session_id = %state.session_id,
                        dropped,
                        "Discarded staged additions"
                    );
                    dropped
                };
                let _ = reply.send(dropped);
            }
            CatalogSessionMsg::Save { reply } => {
                self.handle_save(&myself, state, reply);
            }
            CatalogSessionMsg::Refresh { reply } => {
                let generation = state.next_generation();
                let gateway = state.gateway.clone();
                let session_ref = myself.clone();
                tracing::debug!(session_id = %state.session_id, generation, "Catalog refresh issued");
                let task = tokio::spawn(async move {
                    let result = gateway.fetch_catalog().await;
                    let _ = session_ref.send_message(CatalogSessionMsg::CatalogFetched {
                        generation,
                        result,
                        reply,
                    });
                });
                state.track(task);
            }
            CatalogSessionMsg::RefreshProcedures { reply } => {
                let gateway = state.gateway.clone();
                let session_ref = myself.clone();
                let task = tokio::spawn(async move {
                    let result = gateway.fetch_master_procedures().await;
                    let _ = session_ref
                        .send_message(CatalogSessionMsg::ProceduresFetched { result, reply });
                });
                state.track(task);
            }
            CatalogSessionMsg::GetView { reply } => {
                let _ = reply.send(state.view());
            }
            CatalogSessionMsg::ListAvailableProcedures { species, reply } => {
                let available = available_procedures(
                    &state.snapshot,
                    &state.overlay,
                    &state.procedures,
                    species.as_deref(),
                );
                let _ = reply.send(available);
            }
            CatalogSessionMsg::SaveFinished {
                attempt_id,
                result,
                reply,
            } => {
                let outcome = Self::handle_save_finished(state, &attempt_id, result);
                let _ = reply.send(outcome);
            }
            CatalogSessionMsg::CatalogFetched {
                generation,
                result,
                reply,
            } => {
                let outcome = Self::handle_catalog_fetched(state, generation, result);
                let _ = reply.send(outcome);
            }
            CatalogSessionMsg::ProceduresFetched { result, reply } => {
                let outcome = Self::handle_procedures_fetched(state, result);
                let _ = reply.send(outcome);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let in_flight = state.tasks.iter().filter(|t| !t.is_finished()).count();
        for task in state.tasks.drain(..) {
            task.abort();
        }
        tracing::info!(
            actor_id = %myself.get_id(),
            session_id = %state.session_id,
            label = %state.label,
            aborted_calls = in_flight,
            dirty = state.overlay.is_dirty(),
            "CatalogSessionActor stopped"
        );
        Ok(())
    }
}

impl CatalogSessionActor {
    fn handle_save(
        &self,
        myself: &ActorRef<CatalogSessionMsg>,
        state: &mut CatalogSessionState,
        reply: ractor::RpcReplyPort<Result<Vec<CatalogEntry>, SaveError>>,
    ) {
        let attempt = match state.saves.begin(&state.snapshot, &state.overlay) {
            Ok(attempt) => attempt,
            Err(err) => {
                tracing::warn!(session_id = %state.session_id, error = %err, "Catalog save refused");
                let _ = reply.send(Err(err));
                return;
            }
        };

        tracing::info!(
            session_id = %state.session_id,
            label = %state.label,
            attempt_id = %attempt.attempt_id,
            entries = attempt.payload.len(),
            additions = state.overlay.additions().len(),
            "Submitting catalog save"
        );

        let gateway = state.gateway.clone();
        let session_ref = myself.clone();
        let task = tokio::spawn(async move {
            let result = gateway.save(attempt.payload).await;
            let _ = session_ref.send_message(CatalogSessionMsg::SaveFinished {
                attempt_id: attempt.attempt_id,
                result,
                reply,
            });
        });
        state.track(task);
    }

    fn handle_save_finished(
        state: &mut CatalogSessionState,
        attempt_id: &str,
        result: Result<Vec<CatalogEntry>, SaveError>,
    ) -> Result<Vec<CatalogEntry>, SaveError> {
        let outcome =
            state
                .saves
                .complete(attempt_id, result, &mut state.snapshot, &mut state.overlay);
        let buffered = state.buffered_fetch.take();

        match &outcome {
            Ok(entries) => {
                // A fetch issued before this point, even after `begin`, may have
                // been served before the server committed the save.
                state.applied_generation = state.issued_generation;
                state.last_synced_at = Some(chrono::Utc::now());
                state.last_error = None;
                tracing::info!(
                    session_id = %state.session_id,
                    label = %state.label,
                    attempt_id,
                    entries = entries.len(),
                    "Catalog saved"
                );
                if let Some(buffered) = buffered {
                    tracing::debug!(
                        session_id = %state.session_id,
                        generation = buffered.generation,
                        "Dropping deferred refresh superseded by save response"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    attempt_id,
                    error = %err,
                    "Catalog save failed, pending edits kept"
                );
                if let Some(buffered) = buffered {
                    if !state.is_stale(buffered.generation) {
                        let report = state.apply_catalog(buffered.generation, buffered.entries);
                        Self::log_reconcile(state, &report);
                    }
                }
                state.last_error = Some(err.to_string());
            }
        }
        outcome
    }

    fn handle_catalog_fetched(
        state: &mut CatalogSessionState,
        generation: u64,
        result: Result<Vec<CatalogEntry>, FetchError>,
    ) -> Result<RefreshOutcome, FetchError> {
        if state.is_stale(generation) {
            tracing::debug!(session_id = %state.session_id, generation, "Ignoring superseded catalog fetch");
            return result.map(|_| RefreshOutcome::Superseded);
        }

        let entries = match result {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    generation,
                    error = %err,
                    "Catalog refresh failed, keeping previous snapshot"
                );
                state.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        if state.saves.is_in_flight() {
            let newer = state
                .buffered_fetch
                .as_ref()
                .map_or(true, |held| generation > held.generation);
            if !newer {
                return Ok(RefreshOutcome::Superseded);
            }
            tracing::info!(
                session_id = %state.session_id,
                generation,
                "Catalog refresh deferred until save resolves"
            );
            state.buffered_fetch = Some(BufferedFetch {
                generation,
                entries,
            });
            return Ok(RefreshOutcome::Deferred);
        }

        let count = entries.len();
        let report = state.apply_catalog(generation, entries);
        Self::log_reconcile(state, &report);
        Ok(RefreshOutcome::Applied {
            entries: count,
            report,
        })
    }

    fn handle_procedures_fetched(
        state: &mut CatalogSessionState,
        result: Result<Vec<ProcedureDescriptor>, FetchError>,
    ) -> Result<usize, FetchError> {
        match result {
            Ok(procedures) => {
                let count = procedures.len();
                state.procedures = procedures;
                tracing::debug!(session_id = %state.session_id, procedures = count, "Master procedures loaded");
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(session_id = %state.session_id, error = %err, "Master procedure fetch failed");
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Run one overlay mutation, refusing it while a save is in flight: a
    /// successful save clears the overlay, and the frozen payload would not
    /// carry the edit.
    fn apply_edit(
        state: &mut CatalogSessionState,
        intent: &str,
        key: &CatalogEntryKey,
        edit: impl FnOnce(&mut EditOverlayStore, &AuthoritativeSnapshot) -> EditOutcome,
    ) -> EditOutcome {
        let outcome = if state.saves.is_in_flight() {
            EditOutcome::Busy
        } else {
            edit(&mut state.overlay, &state.snapshot)
        };
        tracing::debug!(
            session_id = %state.session_id,
            intent,
            key = %key,
            outcome = ?outcome,
            dirty = state.overlay.is_dirty(),
            "Catalog edit"
        );
        outcome
    }

    fn log_reconcile(state: &CatalogSessionState, report: &ReconcileReport) {
        if !report.orphaned_keys.is_empty() {
            tracing::warn!(
                session_id = %state.session_id,
                orphaned = ?report.orphaned_keys,
                "Dropped pending edits for entries deleted upstream"
            );
        }
        if !report.collapsed_keys.is_empty() || !report.absorbed_additions.is_empty() {
            tracing::info!(
                session_id = %state.session_id,
                collapsed = ?report.collapsed_keys,
                absorbed = ?report.absorbed_additions,
                "Pending edits now match upstream"
            );
        }
        tracing::debug!(
            session_id = %state.session_id,
            label = %state.label,
            entries = state.snapshot.len(),
            dirty = state.overlay.is_dirty(),
            "Catalog snapshot replaced"
        );
    }
}
