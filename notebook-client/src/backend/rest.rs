//! Backend over the Notebook REST API.

use super::{AuthBackend, NotesBackend};
use crate::api_client::RestClient;
use async_trait::async_trait;
use notebook_core::{
    ApiResult, AuthResponse, CreateNoteRequest, LoginRequest, Note, NoteId, RegisterRequest,
    UpdateNoteRequest, UserId,
};
use serde::de::IgnoredAny;

#[derive(Clone)]
pub struct RestBackend {
    client: RestClient,
}

impl RestBackend {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }
}

/// Ids are opaque, so the id is percent-encoded as a single path segment.
fn note_path(id: &NoteId) -> String {
    format!("/api/notes/{}", urlencoding::encode(id.as_str()))
}

#[async_trait]
impl AuthBackend for RestBackend {
    async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse> {
        self.client.post("/api/auth/login", req).await
    }

    async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.client.post("/api/auth/register", req).await
    }
}

#[async_trait]
impl NotesBackend for RestBackend {
    async fn list_notes(&self, _owner: UserId) -> ApiResult<Vec<Note>> {
        self.client.get("/api/notes").await
    }

    async fn get_note(&self, _owner: UserId, id: &NoteId) -> ApiResult<Option<Note>> {
        match self.client.get::<Note>(&note_path(id)).await {
            Ok(note) => Ok(Some(note)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_note(&self, _owner: UserId, req: &CreateNoteRequest) -> ApiResult<Note> {
        self.client.post("/api/notes", req).await
    }

    async fn update_note(
        &self,
        _owner: UserId,
        id: &NoteId,
        req: &UpdateNoteRequest,
    ) -> ApiResult<Note> {
        self.client.put(&note_path(id), req).await
    }

    async fn delete_note(&self, _owner: UserId, id: &NoteId) -> ApiResult<()> {
        self.client.delete::<IgnoredAny>(&note_path(id)).await?;
        Ok(())
    }
}
