//! Session repository: the process-wide `(user, token)` pair.
//!
//! Every component that reads or clears the session goes through a
//! [`SessionRepository`]; nothing looks the session up ambiently. The
//! request client may clear it whenever the server rejects the token, so
//! holders must re-read it after every suspension point.

use crate::persistence::{self, PersistenceError};
use notebook_core::{Session, User};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

pub trait SessionRepository: Send + Sync {
    /// Current session, if both user and token are present.
    fn get(&self) -> Option<Session>;

    /// Replace the session. The in-memory copy is updated even when the
    /// durable write fails.
    fn set(&self, session: &Session) -> Result<(), PersistenceError>;

    /// Forget the session. The in-memory copy is cleared even when the
    /// durable delete fails.
    fn clear(&self) -> Result<(), PersistenceError>;
}

/// Session held only in memory. Used by tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    current: RwLock<Option<Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            current: RwLock::new(Some(session)),
        }
    }
}

impl SessionRepository for MemorySessionRepository {
    fn get(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, session: &Session) -> Result<(), PersistenceError> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// On-disk layout. Both fields must be present for a session to exist.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    current_user: Option<User>,
    #[serde(default)]
    token: Option<String>,
}

impl StoredSession {
    fn into_session(self) -> Option<Session> {
        match (self.current_user, self.token) {
            (Some(user), Some(token)) if !token.is_empty() => Some(Session::new(user, token)),
            _ => None,
        }
    }
}

/// Session persisted as a JSON file and cached in memory.
#[derive(Debug)]
pub struct FileSessionRepository {
    path: PathBuf,
    current: RwLock<Option<Session>>,
}

impl FileSessionRepository {
    /// Open the repository, restoring any session stored at `path`.
    ///
    /// A missing, partial or malformed file yields an empty repository;
    /// malformed contents are logged and left for the next write to replace.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match persistence::load::<StoredSession>(&path) {
            Ok(Some(stored)) => {
                let session = stored.into_session();
                if session.is_none() {
                    debug!(path = %path.display(), "stored session incomplete; starting signed out");
                }
                session
            }
            Ok(None) => None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding unreadable stored session");
                None
            }
        };
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionRepository for FileSessionRepository {
    fn get(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, session: &Session) -> Result<(), PersistenceError> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        let stored = StoredSession {
            current_user: Some(session.user.clone()),
            token: Some(session.token.clone()),
        };
        persistence::save(&self.path, &stored)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        persistence::remove(&self.path)
    }
}
