//! Auth session store.
//!
//! Thin state machine over the shared [`SessionRepository`]: login and
//! register move to Authenticated and persist the session, logout returns to
//! Unauthenticated without a network call. The accessors always read the
//! repository, so a session cleared by the request client on 401 is visible
//! here immediately.

use crate::backend::AuthBackend;
use crate::busy::BusyCounter;
use crate::session::SessionRepository;
use notebook_core::{ApiResult, LoginRequest, RegisterRequest, Session, User};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AuthStore {
    backend: Arc<dyn AuthBackend>,
    sessions: Arc<dyn SessionRepository>,
    busy: BusyCounter,
}

impl AuthStore {
    pub fn new(backend: Arc<dyn AuthBackend>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            backend,
            sessions,
            busy: BusyCounter::new(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let _busy = self.busy.enter();
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = Session::from(self.backend.login(&req).await?);
        self.establish(&session);
        info!(user_id = %session.user.id, "logged in");
        Ok(session)
    }

    pub async fn register(&self, email: &str, name: &str, password: &str) -> ApiResult<Session> {
        let _busy = self.busy.enter();
        let req = RegisterRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        };
        let session = Session::from(self.backend.register(&req).await?);
        self.establish(&session);
        info!(user_id = %session.user.id, "registered");
        Ok(session)
    }

    /// Sign out locally. Never fails; a durable copy that cannot be erased is
    /// only logged.
    pub fn logout(&self) {
        let user = self.current_user();
        if let Err(err) = self.sessions.clear() {
            warn!(error = %err, "failed to erase stored session");
        }
        match user {
            Some(user) => info!(user_id = %user.id, "logged out"),
            None => info!("logout without an active session"),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.sessions.get().is_some()
    }

    pub fn session(&self) -> Option<Session> {
        self.sessions.get()
    }

    pub fn current_user(&self) -> Option<User> {
        self.sessions.get().map(|s| s.user)
    }

    pub fn token(&self) -> Option<String> {
        self.sessions.get().map(|s| s.token)
    }

    pub fn is_loading(&self) -> bool {
        self.busy.is_busy()
    }

    fn establish(&self, session: &Session) {
        if let Err(err) = self.sessions.set(session) {
            warn!(error = %err, "session is active but could not be persisted");
        }
    }
}
