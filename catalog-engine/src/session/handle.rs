//! Typed client for a running catalog session.

use ractor::{Actor, ActorRef, SpawnErr};
use tokio::task::JoinHandle;

use catalog_types::{CatalogEntry, CatalogEntryKey};

use crate::error::{FetchError, SaveError, SessionError};
use crate::overlay::EditOutcome;
use crate::projector::AvailableProcedure;

use super::messages::{CatalogSessionMsg, CatalogView, RefreshOutcome};
use super::{CatalogSessionActor, CatalogSessionArguments};

#[derive(Debug, Clone)]
pub struct CatalogSessionHandle {
    actor: ActorRef<CatalogSessionMsg>,
}

impl CatalogSessionHandle {
    pub async fn spawn(
        args: CatalogSessionArguments,
    ) -> Result<(Self, JoinHandle<()>), SpawnErr> {
        let (actor, join) = Actor::spawn(None, CatalogSessionActor, args).await?;
        Ok((Self { actor }, join))
    }

    pub fn from_ref(actor: ActorRef<CatalogSessionMsg>) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorRef<CatalogSessionMsg> {
        &self.actor
    }

    pub async fn set_enabled(
        &self,
        key: impl Into<CatalogEntryKey>,
        value: bool,
    ) -> Result<EditOutcome, SessionError> {
        let key = key.into();
        ractor::call!(self.actor, |reply| CatalogSessionMsg::SetEnabled {
            key,
            value,
            reply
        })
        .map_err(|_| SessionError::Closed)
    }

    pub async fn toggle_enabled(
        &self,
        key: impl Into<CatalogEntryKey>,
    ) -> Result<EditOutcome, SessionError> {
        let key = key.into();
        ractor::call!(self.actor, |reply| CatalogSessionMsg::ToggleEnabled {
            key,
            reply
        })
        .map_err(|_| SessionError::Closed)
    }

    /// `None` clears the override back to the master default.
    pub async fn set_price(
        &self,
        key: impl Into<CatalogEntryKey>,
        value: Option<i64>,
    ) -> Result<EditOutcome, SessionError> {
        let key = key.into();
        ractor::call!(self.actor, |reply| CatalogSessionMsg::SetPrice {
            key,
            value,
            reply
        })
        .map_err(|_| SessionError::Closed)
    }

    pub async fn set_duration(
        &self,
        key: impl Into<CatalogEntryKey>,
        value: Option<u32>,
    ) -> Result<EditOutcome, SessionError> {
        let key = key.into();
        ractor::call!(self.actor, |reply| CatalogSessionMsg::SetDuration {
            key,
            value,
            reply
        })
        .map_err(|_| SessionError::Closed)
    }

    pub async fn toggle_addition(
        &self,
        key: impl Into<CatalogEntryKey>,
    ) -> Result<EditOutcome, SessionError> {
        let key = key.into();
        ractor::call!(self.actor, |reply| CatalogSessionMsg::ToggleAddition {
            key,
            reply
        })
        .map_err(|_| SessionError::Closed)
    }

    /// Returns how many staged additions were dropped; none while a save is in flight.
    pub async fn discard_additions(&self) -> Result<usize, SessionError> {
        ractor::call!(self.actor, |reply| CatalogSessionMsg::DiscardAdditions {
            reply
        })
        .map_err(|_| SessionError::Closed)
    }

    /// Submit the full resolved catalog. Resolves once the gateway answers;
    /// edits issued meanwhile come back [`EditOutcome::Busy`].
    pub async fn save(&self) -> Result<Vec<CatalogEntry>, SaveError> {
        ractor::call!(self.actor, |reply| CatalogSessionMsg::Save { reply })
            .unwrap_or_else(|_| Err(SaveError::SessionClosed))
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome, FetchError> {
        ractor::call!(self.actor, |reply| CatalogSessionMsg::Refresh { reply })
            .unwrap_or_else(|_| Err(FetchError::SessionClosed))
    }

    pub async fn refresh_procedures(&self) -> Result<usize, FetchError> {
        ractor::call!(self.actor, |reply| CatalogSessionMsg::RefreshProcedures {
            reply
        })
        .unwrap_or_else(|_| Err(FetchError::SessionClosed))
    }

    pub async fn view(&self) -> Result<CatalogView, SessionError> {
        ractor::call!(self.actor, |reply| CatalogSessionMsg::GetView { reply })
            .map_err(|_| SessionError::Closed)
    }

    pub async fn available_procedures(
        &self,
        species: Option<String>,
    ) -> Result<Vec<AvailableProcedure>, SessionError> {
        ractor::call!(self.actor, |reply| {
            CatalogSessionMsg::ListAvailableProcedures { species, reply }
        })
        .map_err(|_| SessionError::Closed)
    }

    pub fn stop(&self) {
        self.actor.stop(Some("catalog session closed".to_string()));
    }
}
