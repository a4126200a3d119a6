//! Application wiring.
//!
//! Builds the shared session repository, picks a backend from the
//! configuration and hands both to the stores.

use crate::api_client::RestClient;
use crate::auth::AuthStore;
use crate::backend::{AuthBackend, LocalBackend, NotesBackend, RestBackend};
use crate::config::{BackendKind, ClientConfig};
use crate::error::ClientError;
use crate::nav::{Navigator, Route};
use crate::notes::NotesStore;
use crate::session::{FileSessionRepository, SessionRepository};
use std::sync::Arc;
use tracing::debug;

pub struct App {
    pub config: ClientConfig,
    pub navigator: Navigator,
    pub sessions: Arc<dyn SessionRepository>,
    pub auth: AuthStore,
    pub notes: NotesStore,
}

impl App {
    /// Wire the app from `config`, restoring any persisted session.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let sessions: Arc<dyn SessionRepository> =
            Arc::new(FileSessionRepository::open(&config.session_path));
        Self::with_sessions(config, sessions)
    }

    pub fn with_sessions(
        config: ClientConfig,
        sessions: Arc<dyn SessionRepository>,
    ) -> Result<Self, ClientError> {
        let initial = if sessions.get().is_some() {
            Route::Notes
        } else {
            Route::Login
        };
        let navigator = Navigator::new(initial);

        let (auth_backend, notes_backend): (Arc<dyn AuthBackend>, Arc<dyn NotesBackend>) =
            match config.backend {
                BackendKind::Rest => {
                    let client = RestClient::new(&config, sessions.clone(), navigator.clone())?;
                    let backend = Arc::new(RestBackend::new(client));
                    (backend.clone() as Arc<dyn AuthBackend>, backend as Arc<dyn NotesBackend>)
                }
                BackendKind::Local => {
                    let backend = Arc::new(LocalBackend::open(&config.local_store_path)?);
                    (backend.clone() as Arc<dyn AuthBackend>, backend as Arc<dyn NotesBackend>)
                }
            };
        debug!(backend = ?config.backend, signed_in = sessions.get().is_some(), "app initialized");

        Ok(Self {
            auth: AuthStore::new(auth_backend, sessions.clone()),
            notes: NotesStore::new(notes_backend, sessions.clone()),
            config,
            navigator,
            sessions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionRepository;

    fn local_config(dir: &std::path::Path) -> ClientConfig {
        ClientConfig {
            backend: BackendKind::Local,
            session_path: dir.join("session.json"),
            local_store_path: dir.join("store.json"),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_local_app_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(local_config(dir.path())).unwrap();
        assert_eq!(app.navigator.current(), Route::Login);

        app.auth.register("a@x.com", "A", "p1").await.unwrap();
        app.notes.create("Todo", Some("buy milk")).await.unwrap();

        let reopened = App::new(local_config(dir.path())).unwrap();
        assert!(reopened.auth.is_authenticated());
        assert_eq!(reopened.navigator.current(), Route::Notes);
        assert_eq!(reopened.notes.fetch_all().await.unwrap().len(), 1);
    }

    #[test]
    fn test_rest_app_builds_without_network() {
        let app = App::with_sessions(
            ClientConfig::default(),
            Arc::new(MemorySessionRepository::new()),
        )
        .unwrap();
        assert!(!app.auth.is_authenticated());
    }
}
