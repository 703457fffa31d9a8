//! Effective view projection - pure logic, no actor state.
//!
//! The view is recomputed wholesale from the snapshot and overlay on every
//! read; it is never patched incrementally.

use std::collections::HashMap;

use serde::Serialize;

use catalog_types::{CatalogEntry, CatalogEntryKey, ProcedureDescriptor};

use crate::overlay::EditOverlayStore;
use crate::snapshot::AuthoritativeSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Unchanged,
    Modified,
    Staged,
}

/// One row of the effective view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveEntry {
    pub entry: CatalogEntry,
    pub display_name: Option<String>,
    pub status: EntryStatus,
}

/// A master-list procedure the provider does not offer yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableProcedure {
    pub descriptor: ProcedureDescriptor,
    pub staged: bool,
}

/// Snapshot entries with edits applied, then staged additions, in that order.
pub fn project(
    snapshot: &AuthoritativeSnapshot,
    overlay: &EditOverlayStore,
    procedures: &[ProcedureDescriptor],
) -> Vec<EffectiveEntry> {
    let names: HashMap<&CatalogEntryKey, &str> = procedures
        .iter()
        .map(|p| (&p.key, p.display_name.as_str()))
        .collect();
    let display_name = |key: &CatalogEntryKey| names.get(key).map(|name| (*name).to_string());

    let existing = snapshot.entries().iter().map(|entry| EffectiveEntry {
        entry: overlay.fields().resolve(entry),
        display_name: display_name(&entry.key),
        status: if overlay.is_modified(&entry.key) {
            EntryStatus::Modified
        } else {
            EntryStatus::Unchanged
        },
    });

    let staged = overlay.additions().iter().map(|key| EffectiveEntry {
        entry: CatalogEntry::staged(key.clone()),
        display_name: display_name(key),
        status: EntryStatus::Staged,
    });

    existing.chain(staged).collect()
}

/// Resolved entries only, in projection order. This is the save payload.
pub fn resolve_entries(
    snapshot: &AuthoritativeSnapshot,
    overlay: &EditOverlayStore,
) -> Vec<CatalogEntry> {
    snapshot
        .entries()
        .iter()
        .map(|entry| overlay.fields().resolve(entry))
        .chain(overlay.additions().iter().cloned().map(CatalogEntry::staged))
        .collect()
}

/// Procedures that can still be added, optionally limited to one species.
pub fn available_procedures(
    snapshot: &AuthoritativeSnapshot,
    overlay: &EditOverlayStore,
    procedures: &[ProcedureDescriptor],
    species: Option<&str>,
) -> Vec<AvailableProcedure> {
    procedures
        .iter()
        .filter(|p| !snapshot.contains(&p.key))
        .filter(|p| species.map_or(true, |s| p.supports_species(s)))
        .map(|p| AvailableProcedure {
            descriptor: p.clone(),
            staged: overlay.additions().contains(&p.key),
        })
        .collect()
}
