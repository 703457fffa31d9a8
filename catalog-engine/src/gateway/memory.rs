use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use catalog_types::{CatalogEntry, ProcedureDescriptor};

use super::RemoteCatalogGateway;
use crate::error::{FetchError, SaveError};

/// In-process stand-in for the catalog API.
///
/// Saves replace the stored catalog with the payload. Saves and catalog
/// fetches can be held open with [`pause_saves`](Self::pause_saves) /
/// [`pause_fetches`](Self::pause_fetches) to exercise in-flight races, and a
/// single failure can be queued for the next call.
#[derive(Debug)]
pub struct InMemoryCatalogGateway {
    catalog: Mutex<Vec<CatalogEntry>>,
    procedures: Mutex<Vec<ProcedureDescriptor>>,
    next_save_error: Mutex<Option<SaveError>>,
    next_fetch_error: Mutex<Option<FetchError>>,
    saved_payloads: Mutex<Vec<Vec<CatalogEntry>>>,
    save_gate: watch::Sender<bool>,
    fetch_gate: watch::Sender<bool>,
    save_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl InMemoryCatalogGateway {
    pub fn new(catalog: Vec<CatalogEntry>, procedures: Vec<ProcedureDescriptor>) -> Self {
        let (save_gate, _) = watch::channel(true);
        let (fetch_gate, _) = watch::channel(true);
        Self {
            catalog: Mutex::new(catalog),
            procedures: Mutex::new(procedures),
            next_save_error: Mutex::new(None),
            next_fetch_error: Mutex::new(None),
            saved_payloads: Mutex::new(Vec::new()),
            save_gate,
            fetch_gate,
            save_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the upstream catalog, as if edited from another device.
    pub async fn set_catalog(&self, catalog: Vec<CatalogEntry>) {
        *self.catalog.lock().await = catalog;
    }

    pub async fn catalog(&self) -> Vec<CatalogEntry> {
        self.catalog.lock().await.clone()
    }

    pub async fn fail_next_save(&self, error: SaveError) {
        *self.next_save_error.lock().await = Some(error);
    }

    pub async fn fail_next_fetch(&self, error: FetchError) {
        *self.next_fetch_error.lock().await = Some(error);
    }

    pub async fn saved_payloads(&self) -> Vec<Vec<CatalogEntry>> {
        self.saved_payloads.lock().await.clone()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn pause_saves(&self) {
        self.save_gate.send_replace(false);
    }

    pub fn resume_saves(&self) {
        self.save_gate.send_replace(true);
    }

    pub fn pause_fetches(&self) {
        self.fetch_gate.send_replace(false);
    }

    pub fn resume_fetches(&self) {
        self.fetch_gate.send_replace(true);
    }

    async fn wait_open(gate: &watch::Sender<bool>) {
        let mut rx = gate.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let _ = rx.wait_for(|open| *open).await;
    }
}

#[async_trait]
impl RemoteCatalogGateway for InMemoryCatalogGateway {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.catalog.lock().await.clone();
        Self::wait_open(&self.fetch_gate).await;
        if let Some(err) = self.next_fetch_error.lock().await.take() {
            return Err(err);
        }
        Ok(snapshot)
    }

    async fn fetch_master_procedures(&self) -> Result<Vec<ProcedureDescriptor>, FetchError> {
        Ok(self.procedures.lock().await.clone())
    }

    async fn save(&self, payload: Vec<CatalogEntry>) -> Result<Vec<CatalogEntry>, SaveError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        Self::wait_open(&self.save_gate).await;
        if let Some(err) = self.next_save_error.lock().await.take() {
            return Err(err);
        }
        self.saved_payloads.lock().await.push(payload.clone());
        *self.catalog.lock().await = payload.clone();
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_replaces_catalog_and_records_payload() {
        let gateway = InMemoryCatalogGateway::new(Vec::new(), Vec::new());
        let payload = vec![CatalogEntry::staged("vac01".into())];

        let saved = gateway.save(payload.clone()).await.unwrap();

        assert_eq!(saved, payload);
        assert_eq!(gateway.catalog().await, payload);
        assert_eq!(gateway.saved_payloads().await, vec![payload]);
        assert_eq!(gateway.save_calls(), 1);
    }

    #[tokio::test]
    async fn test_queued_failure_applies_once() {
        let gateway = InMemoryCatalogGateway::new(Vec::new(), Vec::new());
        gateway
            .fail_next_fetch(FetchError::Transport("offline".to_string()))
            .await;

        assert!(gateway.fetch_catalog().await.is_err());
        assert!(gateway.fetch_catalog().await.is_ok());
        assert_eq!(gateway.fetch_calls(), 2);
    }
}
