//! Error types surfaced at the catalog session boundary.
//!
//! Every variant is recoverable: the session keeps its previous snapshot and
//! all pending edits, and the presentation layer shows the `Display` text.

use catalog_types::CatalogEntry;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Catalog request failed: {0}")]
    Transport(String),

    #[error("Catalog server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Could not read catalog response: {0}")]
    Decode(String),

    #[error("Catalog session closed")]
    SessionClosed,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// Server-side validation failure. The submitted payload is echoed back
    /// unchanged so the caller can inspect or retry it.
    #[error("Catalog changes rejected: {reason}")]
    Rejected {
        reason: String,
        payload: Vec<CatalogEntry>,
    },

    #[error("A catalog save is already in progress")]
    AlreadyInProgress,

    /// Nothing has been fetched yet, so a full-replace payload would drop
    /// every entry the server holds.
    #[error("Catalog has not been loaded yet")]
    NotLoaded,

    #[error("Catalog save failed: {0}")]
    Transport(String),

    #[error("Catalog session closed")]
    SessionClosed,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Catalog session closed")]
    Closed,
}

impl From<SessionError> for FetchError {
    fn from(_: SessionError) -> Self {
        FetchError::SessionClosed
    }
}

impl From<SessionError> for SaveError {
    fn from(_: SessionError) -> Self {
        SaveError::SessionClosed
    }
}
