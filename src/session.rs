//! The session store: the one live identity, its durable copy and its change feed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use crate::{
    auth,
    error::SessionError,
    models::{Identity, UserRecord},
    storage::IdentityStorageState,
};

/// The on-disk shape: token and user travel together in one record.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedIdentity {
    token: String,
    user: UserRecord,
}

/// SessionStore
///
/// Holds at most one `Identity`. Every transition (set or clear) is persisted before it
/// becomes visible in memory, and transitions are serialized so the durable copy and the
/// in-memory copy never disagree. Reads are synchronous and never touch storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: IdentityStorageState,
    current: Arc<watch::Sender<Option<Identity>>>,
    transition: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(storage: IdentityStorageState) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            storage,
            current: Arc::new(current),
            transition: Arc::new(Mutex::new(())),
        }
    }

    /// initialize
    ///
    /// Loads the persisted identity into memory. Any read or parse failure, a blank token
    /// or an expired JWT is treated as "no identity" and is never returned as an error.
    pub async fn initialize(&self) -> Option<Identity> {
        let _guard = self.transition.lock().await;

        let identity = match self.storage.load().await {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedIdentity>(&raw) {
                Ok(persisted) if !persisted.token.trim().is_empty() => {
                    Some(Identity::new(persisted.token, persisted.user))
                }
                Ok(_) => {
                    tracing::warn!("persisted identity has an empty token; ignoring it");
                    None
                }
                Err(error) => {
                    tracing::warn!(%error, "persisted identity is corrupt; starting signed out");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(%error, "could not read persisted identity; starting signed out");
                None
            }
        };

        let identity = identity.filter(|identity| {
            let expired = auth::is_expired(&identity.token, Utc::now());
            if expired {
                tracing::info!(username = %identity.username, "persisted token has expired");
            }
            !expired
        });

        if let Some(identity) = &identity {
            tracing::info!(
                username = %identity.username,
                role = %identity.role,
                "restored identity"
            );
        }
        self.current.send_replace(identity.clone());
        identity
    }

    /// set_identity
    ///
    /// Replaces the identity (no merge with the previous one) and persists token and user
    /// as one record. On a storage failure nothing changes in memory.
    pub async fn set_identity(
        &self,
        token: impl Into<String>,
        user: UserRecord,
    ) -> Result<Identity, SessionError> {
        let identity = Identity::new(token, user);
        let record = serde_json::to_string(&PersistedIdentity {
            token: identity.token.clone(),
            user: identity.user(),
        })?;

        let _guard = self.transition.lock().await;
        self.storage.save(&record).await?;
        self.current.send_replace(Some(identity.clone()));

        tracing::info!(username = %identity.username, role = %identity.role, "identity set");
        Ok(identity)
    }

    /// clear_identity
    ///
    /// Removes the persisted record, then the in-memory identity.
    pub async fn clear_identity(&self) -> Result<(), SessionError> {
        let _guard = self.transition.lock().await;
        self.storage.remove().await?;
        let previous = self.current.send_replace(None);

        if let Some(previous) = previous {
            tracing::info!(username = %previous.username, "identity cleared");
        }
        Ok(())
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Bearer token of the live identity, if any.
    pub fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|identity| identity.token.clone())
    }

    /// A feed of identity transitions, starting from the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}
