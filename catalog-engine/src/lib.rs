//! Catalog Engine - provider catalog editing session
//!
//! Holds a provider's authoritative catalog, layers uncommitted edits on top
//! of it, projects the effective view, and reconciles the overlay with the
//! server on save and refresh. One [`session::CatalogSessionActor`] owns all
//! of that state; callers talk to it through [`session::CatalogSessionHandle`].

pub mod config;
pub mod dirty;
pub mod error;
pub mod gateway;
pub mod overlay;
pub mod projector;
pub mod save;
pub mod session;
pub mod snapshot;

pub use catalog_types::{CatalogEntry, CatalogEntryKey, ProcedureDescriptor};
pub use error::{FetchError, SaveError, SessionError};
pub use gateway::{RemoteCatalogGateway, SharedCatalogGateway};
pub use overlay::{EditOutcome, EditOverlayStore, ReconcileReport};
pub use projector::{AvailableProcedure, EffectiveEntry, EntryStatus};
pub use session::{CatalogSessionArguments, CatalogSessionHandle, CatalogView, RefreshOutcome};
