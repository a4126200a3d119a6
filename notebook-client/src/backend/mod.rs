//! Backend traits for authentication and note storage.
//!
//! The stores only see these traits. [`RestBackend`] talks to the HTTP API;
//! [`LocalBackend`] keeps users and notes on the local machine and stands in
//! for the server during development and tests.

mod local;
mod rest;

pub use local::LocalBackend;
pub use rest::RestBackend;

use async_trait::async_trait;
use notebook_core::{
    ApiResult, AuthResponse, CreateNoteRequest, LoginRequest, Note, NoteId, RegisterRequest,
    UpdateNoteRequest, UserId,
};

/// Account operations.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a session.
    async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse>;

    /// Create an account and open a session for it.
    async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse>;
}

/// Note CRUD scoped to a single owner.
///
/// `owner` is the id of the session user. The REST backend ignores it
/// because the server derives the owner from the bearer token.
#[async_trait]
pub trait NotesBackend: Send + Sync {
    async fn list_notes(&self, owner: UserId) -> ApiResult<Vec<Note>>;

    /// `Ok(None)` when the note does not exist or belongs to someone else.
    async fn get_note(&self, owner: UserId, id: &NoteId) -> ApiResult<Option<Note>>;

    async fn create_note(&self, owner: UserId, req: &CreateNoteRequest) -> ApiResult<Note>;

    async fn update_note(
        &self,
        owner: UserId,
        id: &NoteId,
        req: &UpdateNoteRequest,
    ) -> ApiResult<Note>;

    async fn delete_note(&self, owner: UserId, id: &NoteId) -> ApiResult<()>;
}
