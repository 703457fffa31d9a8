//! Remote catalog gateway boundary.
//!
//! The session only ever talks to the marketplace through this trait so the
//! HTTP client can be swapped for the in-memory gateway in tests.

mod http;
mod memory;

use async_trait::async_trait;
use std::sync::Arc;

use catalog_types::{CatalogEntry, ProcedureDescriptor};

use crate::error::{FetchError, SaveError};

pub use http::HttpCatalogGateway;
pub use memory::InMemoryCatalogGateway;

pub type SharedCatalogGateway = Arc<dyn RemoteCatalogGateway>;

#[async_trait]
pub trait RemoteCatalogGateway: Send + Sync {
    /// The provider's authoritative catalog.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, FetchError>;

    /// Every procedure a provider may offer.
    async fn fetch_master_procedures(&self) -> Result<Vec<ProcedureDescriptor>, FetchError>;

    /// Full-replace save. The response is the server's canonical catalog and
    /// may differ from `payload` when the server applies corrections.
    async fn save(&self, payload: Vec<CatalogEntry>) -> Result<Vec<CatalogEntry>, SaveError>;
}
