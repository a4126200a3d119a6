//! Notebook client library.
//!
//! Session handling, the notes cache and the REST request client used by the
//! `notebook` binary.

pub mod api_client;
pub mod auth;
pub mod backend;
pub mod busy;
pub mod config;
pub mod error;
pub mod nav;
pub mod notes;
pub mod persistence;
pub mod session;
pub mod state;
pub mod telemetry;

pub use api_client::RestClient;
pub use auth::AuthStore;
pub use backend::{AuthBackend, LocalBackend, NotesBackend, RestBackend};
pub use busy::{BusyCounter, BusyGuard};
pub use config::{BackendKind, ClientConfig, ConfigError, LogConfig};
pub use error::ClientError;
pub use nav::{Navigator, Route};
pub use notes::NotesStore;
pub use session::{FileSessionRepository, MemorySessionRepository, SessionRepository};
pub use state::App;
