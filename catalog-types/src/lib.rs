//! Shared types between the catalog engine and the remote catalog API
//!
//! These types are used by both:
//! - the provider-side catalog session (edit overlay, projection, save)
//! - the HTTP gateway talking to the marketplace backend
//!
//! Serializable with serde for JSON over HTTP

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Keys
// ============================================================================

/// Stable identifier for an offerable procedure.
///
/// Unique across a provider's catalog and the master procedure list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CatalogEntryKey(pub String);

impl CatalogEntryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogEntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogEntryKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CatalogEntryKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A provider's customization of one procedure.
///
/// Immutable value: edits produce a new entry, they never patch one in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub key: CatalogEntryKey,
    pub enabled: bool,
    /// Price in minor currency units; `None` means the marketplace default.
    #[serde(default)]
    pub price_override: Option<i64>,
    #[serde(default)]
    pub duration_override_minutes: Option<u32>,
}

impl CatalogEntry {
    /// Default entry for a procedure staged for addition.
    pub fn staged(key: CatalogEntryKey) -> Self {
        Self {
            key,
            enabled: true,
            price_override: None,
            duration_override_minutes: None,
        }
    }

    pub fn with_enabled(&self, enabled: bool) -> Self {
        Self {
            enabled,
            ..self.clone()
        }
    }

    pub fn with_price_override(&self, price_override: Option<i64>) -> Self {
        Self {
            price_override,
            ..self.clone()
        }
    }

    pub fn with_duration_override(&self, duration_override_minutes: Option<u32>) -> Self {
        Self {
            duration_override_minutes,
            ..self.clone()
        }
    }
}

/// Master-list descriptor of a procedure a provider may offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureDescriptor {
    pub key: CatalogEntryKey,
    pub display_name: String,
    #[serde(default)]
    pub compatible_species: BTreeSet<String>,
}

impl ProcedureDescriptor {
    /// Case-insensitive species compatibility check.
    pub fn supports_species(&self, species: &str) -> bool {
        self.compatible_species
            .iter()
            .any(|s| s.eq_ignore_ascii_case(species.trim()))
    }
}

// ============================================================================
// API envelopes
// ============================================================================

/// Error body returned by the catalog API on non-success statuses.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn describe(&self) -> Option<&str> {
        let non_blank = |s: &&str| !s.trim().is_empty();
        self.error
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.message.as_deref().filter(non_blank))
    }
}
