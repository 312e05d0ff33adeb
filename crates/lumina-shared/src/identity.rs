use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::constants::SESSION_KEY;
use crate::error::IdentityError;
use crate::types::{Actor, ActorId};

/// Source of the "current actor". Issuing credentials is out of its hands;
/// it only reports who is signed in and notifies when that changes.
pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> Option<Actor>;

    /// Register for sign-in / sign-out notifications. Dropping the returned
    /// handle unsubscribes.
    fn subscribe(&self) -> Subscription;
}

/// Change notifications from an [`IdentityProvider`].
pub struct Subscription {
    rx: watch::Receiver<Option<Actor>>,
}

impl Subscription {
    /// Wait for the next sign-in / sign-out. Returns `None` once the provider
    /// is gone.
    pub async fn changed(&mut self) -> Option<Option<Actor>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn current(&self) -> Option<Actor> {
        self.rx.borrow().clone()
    }

    pub fn unsubscribe(self) {}
}

/// Serializable session persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub actor: Actor,
    pub signed_in_at: DateTime<Utc>,
}

/// In-process identity provider backed by an optional session file.
pub struct Session {
    tx: watch::Sender<Option<Actor>>,
    path: Option<PathBuf>,
}

impl Session {
    /// A session that lives only in memory.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx, path: None }
    }

    /// Open a session persisted at `path`, restoring a previous sign-in.
    /// An unreadable file counts as signed out.
    pub fn open(path: &Path) -> Self {
        let restored = std::fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str::<StoredSession>(&json).ok())
            .map(|stored| stored.actor);

        if let Some(actor) = &restored {
            tracing::info!(actor = %actor.id, "session restored");
        }

        let (tx, _rx) = watch::channel(restored);
        Self {
            tx,
            path: Some(path.to_path_buf()),
        }
    }

    /// Open the session file kept in `dir`.
    pub fn open_in(dir: &Path) -> Self {
        Self::open(&dir.join(format!("{SESSION_KEY}.json")))
    }

    /// Sign in, minting a fresh actor id.
    pub fn login(&self, email: &str, name: Option<&str>) -> Result<Actor, IdentityError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(IdentityError::MissingEmail);
        }

        let actor = Actor {
            id: ActorId::generate(),
            email: Some(email.to_string()),
            name: name.map(str::to_string),
        };

        if let Some(path) = &self.path {
            let stored = StoredSession {
                actor: actor.clone(),
                signed_in_at: Utc::now(),
            };
            let json = serde_json::to_string_pretty(&stored)
                .map_err(|e| IdentityError::SessionFile(e.to_string()))?;
            std::fs::write(path, json).map_err(|e| IdentityError::SessionFile(e.to_string()))?;
        }

        tracing::info!(actor = %actor.id, "signed in");
        self.tx.send_replace(Some(actor.clone()));
        Ok(actor)
    }

    pub fn logout(&self) -> Result<(), IdentityError> {
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(IdentityError::SessionFile(e.to_string())),
            }
        }

        if let Some(actor) = self.tx.send_replace(None) {
            tracing::info!(actor = %actor.id, "signed out");
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for Session {
    fn current_actor(&self) -> Option<Actor> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }
}
