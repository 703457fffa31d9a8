//! Pending local edits layered over the authoritative snapshot.
//!
//! Every mutator enforces the collapse rule eagerly: a field edit equal to
//! the snapshot value is removed instead of stored, so an empty overlay is
//! exactly "no effective change". Staged additions never name a key the
//! snapshot already holds.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use catalog_types::{CatalogEntry, CatalogEntryKey};

use crate::snapshot::AuthoritativeSnapshot;

/// What a single edit intent did to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOutcome {
    /// The overlay now holds a change for the key.
    Staged,
    /// The overlay no longer holds a change for the key.
    Collapsed,
    /// The intent does not apply to this key; nothing changed.
    Ignored,
    /// A save is in flight; the intent was refused and nothing changed.
    Busy,
}

/// Field-level overrides keyed by entry. Absence means "use the snapshot".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingFieldEdits {
    pub enabled: HashMap<CatalogEntryKey, bool>,
    pub price: HashMap<CatalogEntryKey, Option<i64>>,
    pub duration: HashMap<CatalogEntryKey, Option<u32>>,
}

impl PendingFieldEdits {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.price.is_empty() && self.duration.is_empty()
    }

    /// Overlay the edits on one authoritative entry.
    pub fn resolve(&self, entry: &CatalogEntry) -> CatalogEntry {
        let mut resolved = entry.clone();
        if let Some(enabled) = self.enabled.get(&entry.key) {
            resolved = resolved.with_enabled(*enabled);
        }
        if let Some(price) = self.price.get(&entry.key) {
            resolved = resolved.with_price_override(*price);
        }
        if let Some(duration) = self.duration.get(&entry.key) {
            resolved = resolved.with_duration_override(*duration);
        }
        resolved
    }

    pub fn clear(&mut self) {
        self.enabled.clear();
        self.price.clear();
        self.duration.clear();
    }
}

/// Insertion-ordered set of keys staged for addition on the next save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingAdditions {
    keys: Vec<CatalogEntryKey>,
}

impl PendingAdditions {
    pub fn contains(&self, key: &CatalogEntryKey) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntryKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Flip membership. Returns `true` if the key is now staged.
    fn toggle(&mut self, key: &CatalogEntryKey) -> bool {
        if let Some(pos) = self.keys.iter().position(|k| k == key) {
            self.keys.remove(pos);
            false
        } else {
            self.keys.push(key.clone());
            true
        }
    }

    fn clear(&mut self) -> usize {
        let dropped = self.keys.len();
        self.keys.clear();
        dropped
    }
}

/// Keys touched when the overlay was re-checked against a fresh snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Edits dropped because their entry no longer exists upstream.
    pub orphaned_keys: BTreeSet<CatalogEntryKey>,
    /// Edits dropped because upstream now holds the same value.
    pub collapsed_keys: BTreeSet<CatalogEntryKey>,
    /// Staged additions dropped because upstream now holds the entry.
    pub absorbed_additions: Vec<CatalogEntryKey>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.orphaned_keys.is_empty()
            && self.collapsed_keys.is_empty()
            && self.absorbed_additions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOverlayStore {
    fields: PendingFieldEdits,
    additions: PendingAdditions,
}

impl EditOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &PendingFieldEdits {
        &self.fields
    }

    pub fn additions(&self) -> &PendingAdditions {
        &self.additions
    }

    pub fn set_enabled(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        key: &CatalogEntryKey,
        value: bool,
    ) -> EditOutcome {
        match snapshot.get(key) {
            Some(entry) => stage_field(&mut self.fields.enabled, key, value, &entry.enabled),
            None => EditOutcome::Ignored,
        }
    }

    /// Flip the effective enabled flag of an existing entry.
    pub fn toggle_enabled(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        key: &CatalogEntryKey,
    ) -> EditOutcome {
        let Some(entry) = snapshot.get(key) else {
            return EditOutcome::Ignored;
        };
        let current = self
            .fields
            .enabled
            .get(key)
            .copied()
            .unwrap_or(entry.enabled);
        stage_field(&mut self.fields.enabled, key, !current, &entry.enabled)
    }

    pub fn set_price_override(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        key: &CatalogEntryKey,
        value: Option<i64>,
    ) -> EditOutcome {
        match snapshot.get(key) {
            Some(entry) => stage_field(&mut self.fields.price, key, value, &entry.price_override),
            None => EditOutcome::Ignored,
        }
    }

    pub fn set_duration_override(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        key: &CatalogEntryKey,
        value: Option<u32>,
    ) -> EditOutcome {
        match snapshot.get(key) {
            Some(entry) => stage_field(
                &mut self.fields.duration,
                key,
                value,
                &entry.duration_override_minutes,
            ),
            None => EditOutcome::Ignored,
        }
    }

    /// Stage or unstage a new entry. Keys already in the snapshot are ignored,
    /// and so is everything until a catalog has been loaded.
    pub fn toggle_addition(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        key: &CatalogEntryKey,
    ) -> EditOutcome {
        if !snapshot.is_loaded() || snapshot.contains(key) {
            return EditOutcome::Ignored;
        }
        if self.additions.toggle(key) {
            EditOutcome::Staged
        } else {
            EditOutcome::Collapsed
        }
    }

    /// Drop every staged addition; field edits are kept. Returns how many were dropped.
    pub fn discard_additions(&mut self) -> usize {
        self.additions.clear()
    }

    pub fn clear_all(&mut self) {
        self.fields.clear();
        self.additions.clear();
    }

    pub fn is_dirty(&self) -> bool {
        crate::dirty::is_dirty(&self.fields, &self.additions)
    }

    pub fn is_modified(&self, key: &CatalogEntryKey) -> bool {
        crate::dirty::is_modified(&self.fields, key)
    }

    /// Re-establish the collapse and no-duplicate-addition rules against a
    /// replacement snapshot. Edits for keys deleted upstream are dropped.
    pub fn reconcile(&mut self, snapshot: &AuthoritativeSnapshot) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        reconcile_field(&mut self.fields.enabled, snapshot, |e| &e.enabled, &mut report);
        reconcile_field(
            &mut self.fields.price,
            snapshot,
            |e| &e.price_override,
            &mut report,
        );
        reconcile_field(
            &mut self.fields.duration,
            snapshot,
            |e| &e.duration_override_minutes,
            &mut report,
        );

        // A key can be collapsed in one map and still edited in another.
        report.collapsed_keys
            .retain(|key| !crate::dirty::is_modified(&self.fields, key));

        self.additions.keys.retain(|key| {
            if snapshot.contains(key) {
                report.absorbed_additions.push(key.clone());
                false
            } else {
                true
            }
        });

        report
    }
}

fn stage_field<T: PartialEq>(
    edits: &mut HashMap<CatalogEntryKey, T>,
    key: &CatalogEntryKey,
    value: T,
    authoritative: &T,
) -> EditOutcome {
    if value == *authoritative {
        edits.remove(key);
        EditOutcome::Collapsed
    } else {
        edits.insert(key.clone(), value);
        EditOutcome::Staged
    }
}

fn reconcile_field<T: PartialEq>(
    edits: &mut HashMap<CatalogEntryKey, T>,
    snapshot: &AuthoritativeSnapshot,
    field: impl Fn(&CatalogEntry) -> &T,
    report: &mut ReconcileReport,
) {
    edits.retain(|key, value| match snapshot.get(key) {
        None => {
            report.orphaned_keys.insert(key.clone());
            false
        }
        Some(entry) if *field(entry) == *value => {
            report.collapsed_keys.insert(key.clone());
            false
        }
        Some(_) => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, enabled: bool, price: Option<i64>) -> CatalogEntry {
        CatalogEntry {
            key: key.into(),
            enabled,
            price_override: price,
            duration_override_minutes: None,
        }
    }

    fn snapshot() -> AuthoritativeSnapshot {
        AuthoritativeSnapshot::new(vec![
            entry("vac01", true, None),
            entry("dent02", false, Some(4500)),
        ])
    }

    #[test]
    fn test_price_equal_to_authoritative_is_never_stored() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();

        let outcome = overlay.set_price_override(&snapshot, &"dent02".into(), Some(4500));
        assert_eq!(outcome, EditOutcome::Collapsed);
        assert!(!overlay.fields().price.contains_key(&CatalogEntryKey::from("dent02")));
        assert!(!overlay.is_dirty());
    }

    #[test]
    fn test_price_round_trip_returns_to_clean() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        let key: CatalogEntryKey = "vac01".into();

        assert_eq!(
            overlay.set_price_override(&snapshot, &key, Some(500)),
            EditOutcome::Staged
        );
        assert!(overlay.is_dirty());

        assert_eq!(
            overlay.set_price_override(&snapshot, &key, None),
            EditOutcome::Collapsed
        );
        assert!(!overlay.is_dirty());
    }

    #[test]
    fn test_fields_are_independent_streams() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        let key: CatalogEntryKey = "vac01".into();

        overlay.set_enabled(&snapshot, &key, false);
        overlay.set_duration_override(&snapshot, &key, Some(30));
        overlay.set_enabled(&snapshot, &key, true);

        assert!(overlay.fields().enabled.is_empty());
        assert_eq!(overlay.fields().duration.get(&key), Some(&Some(30)));
        assert!(overlay.is_dirty());
    }

    #[test]
    fn test_toggle_enabled_twice_collapses() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        let key: CatalogEntryKey = "dent02".into();

        assert_eq!(overlay.toggle_enabled(&snapshot, &key), EditOutcome::Staged);
        assert_eq!(overlay.fields().enabled.get(&key), Some(&true));
        assert_eq!(overlay.toggle_enabled(&snapshot, &key), EditOutcome::Collapsed);
        assert!(!overlay.is_dirty());
    }

    #[test]
    fn test_field_edits_ignore_staged_and_unknown_keys() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        let staged: CatalogEntryKey = "consult01".into();

        overlay.toggle_addition(&snapshot, &staged);
        assert_eq!(
            overlay.set_enabled(&snapshot, &staged, false),
            EditOutcome::Ignored
        );
        assert_eq!(
            overlay.set_price_override(&snapshot, &"nope".into(), Some(1)),
            EditOutcome::Ignored
        );
        assert!(overlay.fields().is_empty());
    }

    #[test]
    fn test_toggle_addition_twice_restores_prior_state() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        overlay.toggle_addition(&snapshot, &"groom03".into());
        let before = overlay.additions().clone();

        let key: CatalogEntryKey = "consult01".into();
        assert_eq!(overlay.toggle_addition(&snapshot, &key), EditOutcome::Staged);
        assert_eq!(overlay.toggle_addition(&snapshot, &key), EditOutcome::Collapsed);
        assert_eq!(overlay.additions(), &before);
    }

    #[test]
    fn test_toggle_addition_rejects_existing_entry() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        assert_eq!(
            overlay.toggle_addition(&snapshot, &"vac01".into()),
            EditOutcome::Ignored
        );
        assert!(overlay.additions().is_empty());
    }

    #[test]
    fn test_additions_keep_selection_order() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        for key in ["z9", "a1", "m5"] {
            overlay.toggle_addition(&snapshot, &key.into());
        }
        let keys: Vec<&str> = overlay.additions().iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["z9", "a1", "m5"]);
    }

    #[test]
    fn test_discard_additions_keeps_field_edits() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        overlay.set_price_override(&snapshot, &"vac01".into(), Some(900));
        overlay.toggle_addition(&snapshot, &"consult01".into());

        assert_eq!(overlay.discard_additions(), 1);
        assert!(overlay.additions().is_empty());
        assert!(overlay.is_dirty());

        overlay.clear_all();
        assert!(!overlay.is_dirty());
    }

    #[test]
    fn test_reconcile_drops_orphans_and_recollapses() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        overlay.set_price_override(&snapshot, &"vac01".into(), Some(1200));
        overlay.set_enabled(&snapshot, &"dent02".into(), true);
        overlay.toggle_addition(&snapshot, &"consult01".into());
        overlay.toggle_addition(&snapshot, &"groom03".into());

        // Upstream deleted vac01, enabled dent02, and added consult01.
        let refreshed = AuthoritativeSnapshot::new(vec![
            entry("dent02", true, Some(4500)),
            entry("consult01", true, None),
        ]);
        let report = overlay.reconcile(&refreshed);

        assert_eq!(
            report.orphaned_keys,
            BTreeSet::from([CatalogEntryKey::from("vac01")])
        );
        assert_eq!(
            report.collapsed_keys,
            BTreeSet::from([CatalogEntryKey::from("dent02")])
        );
        assert_eq!(report.absorbed_additions, vec![CatalogEntryKey::from("consult01")]);
        assert!(overlay.fields().is_empty());
        let staged: Vec<&str> = overlay.additions().iter().map(|k| k.as_str()).collect();
        assert_eq!(staged, vec!["groom03"]);
    }

    #[test]
    fn test_reconcile_keeps_key_still_edited_elsewhere_out_of_collapsed() {
        let snapshot = snapshot();
        let mut overlay = EditOverlayStore::new();
        let key: CatalogEntryKey = "dent02".into();
        overlay.set_enabled(&snapshot, &key, true);
        overlay.set_price_override(&snapshot, &key, Some(5000));

        let refreshed = AuthoritativeSnapshot::new(vec![entry("dent02", true, Some(4500))]);
        let report = overlay.reconcile(&refreshed);

        assert!(report.collapsed_keys.is_empty());
        assert!(overlay.fields().enabled.is_empty());
        assert_eq!(overlay.fields().price.get(&key), Some(&Some(5000)));
    }

    #[test]
    fn test_additions_wait_for_a_loaded_catalog() {
        let unloaded = AuthoritativeSnapshot::default();
        let mut overlay = EditOverlayStore::new();

        assert_eq!(
            overlay.toggle_addition(&unloaded, &"vac01".into()),
            EditOutcome::Ignored
        );
        assert!(!overlay.is_dirty());

        let empty_but_loaded = AuthoritativeSnapshot::new(Vec::new());
        assert_eq!(
            overlay.toggle_addition(&empty_but_loaded, &"vac01".into()),
            EditOutcome::Staged
        );
    }
}
