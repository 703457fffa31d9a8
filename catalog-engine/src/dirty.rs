//! Unsaved-changes signal.

use catalog_types::CatalogEntryKey;

use crate::overlay::{PendingAdditions, PendingFieldEdits};

/// True iff anything is pending.
///
/// No comparison against the snapshot is needed: the overlay never stores an
/// edit equal to the authoritative value.
pub fn is_dirty(fields: &PendingFieldEdits, additions: &PendingAdditions) -> bool {
    !fields.is_empty() || !additions.is_empty()
}

/// True iff any field of an existing entry has a pending edit.
pub fn is_modified(fields: &PendingFieldEdits, key: &CatalogEntryKey) -> bool {
    fields.enabled.contains_key(key)
        || fields.price.contains_key(key)
        || fields.duration.contains_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::EditOverlayStore;
    use crate::snapshot::AuthoritativeSnapshot;
    use catalog_types::CatalogEntry;

    #[test]
    fn test_empty_overlay_is_clean() {
        assert!(!is_dirty(
            &PendingFieldEdits::default(),
            &PendingAdditions::default()
        ));
    }

    #[test]
    fn test_any_single_stream_makes_dirty() {
        let snapshot = AuthoritativeSnapshot::new(vec![CatalogEntry::staged("vac01".into())]);

        let mut overlay = EditOverlayStore::new();
        overlay.set_duration_override(&snapshot, &"vac01".into(), Some(45));
        assert!(is_dirty(overlay.fields(), overlay.additions()));

        let mut overlay = EditOverlayStore::new();
        overlay.toggle_addition(&snapshot, &"consult01".into());
        assert!(is_dirty(overlay.fields(), overlay.additions()));
    }

    #[test]
    fn test_is_modified_is_per_key() {
        let snapshot = AuthoritativeSnapshot::new(vec![
            CatalogEntry::staged("vac01".into()),
            CatalogEntry::staged("dent02".into()),
        ]);
        let mut overlay = EditOverlayStore::new();
        overlay.set_enabled(&snapshot, &"dent02".into(), false);

        assert!(is_modified(overlay.fields(), &CatalogEntryKey::from("dent02")));
        assert!(!is_modified(overlay.fields(), &CatalogEntryKey::from("vac01")));

        overlay.set_enabled(&snapshot, &"dent02".into(), true);
        assert!(!is_modified(overlay.fields(), &CatalogEntryKey::from("dent02")));
    }
}
