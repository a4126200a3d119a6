//! Navigation signal between the stores and whatever renders them.
//!
//! The client only ever pushes the user back to [`Route::Login`]; the other
//! routes exist so a front end can publish where it is.

use notebook_core::NoteId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Login,
    Register,
    Notes,
    NoteDetail(NoteId),
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Notes => "Notes",
            Route::NoteDetail(_) => "Note",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Notes | Route::NoteDetail(_))
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    tx: Arc<watch::Sender<Route>>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Route {
        self.tx.borrow().clone()
    }

    pub fn navigate(&self, route: Route) {
        self.tx.send_replace(route);
    }

    /// Send the user to the login entry point.
    pub fn redirect_to_login(&self) {
        self.navigate(Route::Login);
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}
