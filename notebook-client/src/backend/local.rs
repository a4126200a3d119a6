//! Local mock backend.
//!
//! Keeps accounts and notes in memory and, when opened on a path, rewrites a
//! JSON file after every mutation. A mutation is applied to a copy of the
//! data, persisted, then swapped in, so a failed write leaves the previous
//! state intact.

use super::{AuthBackend, NotesBackend};
use crate::persistence::{self, PersistenceError};
use async_trait::async_trait;
use chrono::Utc;
use notebook_core::{
    ApiError, ApiResult, AuthResponse, CreateNoteRequest, LoginRequest, Note, NoteId,
    RegisterRequest, UpdateNoteRequest, User, UserId,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

const ACCESS_DENIED: &str = "Note not found or access denied";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    id: UserId,
    email: String,
    name: String,
    password_hash: String,
}

impl StoredUser {
    fn public(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalData {
    #[serde(default)]
    users: Vec<StoredUser>,
    #[serde(default)]
    notes: Vec<Note>,
}

impl LocalData {
    fn next_user_id(&self) -> UserId {
        let max = self.users.iter().map(|u| u.id.get()).max().unwrap_or(0);
        UserId::new(max + 1)
    }

    fn owned_note_mut(&mut self, owner: UserId, id: &NoteId) -> ApiResult<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| &n.id == id && n.owner_id == owner)
            .ok_or_else(|| ApiError::not_found(ACCESS_DENIED))
    }
}

#[derive(Debug, Default)]
pub struct LocalBackend {
    data: RwLock<LocalData>,
    path: Option<PathBuf>,
}

impl LocalBackend {
    /// Backend whose data lives only as long as the value.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Backend persisted at `path`, loading whatever is already there.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let data = persistence::load::<LocalData>(&path)?.unwrap_or_default();
        debug!(
            path = %path.display(),
            users = data.users.len(),
            notes = data.notes.len(),
            "local store opened"
        );
        Ok(Self {
            data: RwLock::new(data),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read<R>(&self, f: impl FnOnce(&LocalData) -> R) -> R {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn commit<R>(&self, f: impl FnOnce(&mut LocalData) -> ApiResult<R>) -> ApiResult<R> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if let Some(path) = &self.path {
            persistence::save(path, &next).map_err(|e| ApiError::storage(e.to_string()))?;
        }
        *guard = next;
        Ok(out)
    }
}

fn hash_password(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn issue_token(user: UserId) -> String {
    format!("local_token_{}_{}", user, Utc::now().timestamp_millis())
}

#[async_trait]
impl AuthBackend for LocalBackend {
    async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse> {
        let user = self.read(|data| {
            data.users
                .iter()
                .find(|u| u.email == req.email)
                .filter(|u| u.password_hash == hash_password(&u.email, &req.password))
                .map(StoredUser::public)
        });
        let user = user.ok_or_else(ApiError::invalid_credentials)?;
        info!(user_id = %user.id, "local login");
        Ok(AuthResponse {
            token: issue_token(user.id),
            user,
        })
    }

    async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse> {
        if req.email.trim().is_empty() {
            return Err(ApiError::validation("Email is required"));
        }
        if req.password.is_empty() {
            return Err(ApiError::validation("Password is required"));
        }
        let user = self.commit(|data| {
            if data.users.iter().any(|u| u.email == req.email) {
                return Err(ApiError::conflict("User with this email already exists"));
            }
            let stored = StoredUser {
                id: data.next_user_id(),
                email: req.email.clone(),
                name: req.name.clone(),
                password_hash: hash_password(&req.email, &req.password),
            };
            let user = stored.public();
            data.users.push(stored);
            Ok(user)
        })?;
        info!(user_id = %user.id, "local account registered");
        Ok(AuthResponse {
            token: issue_token(user.id),
            user,
        })
    }
}

#[async_trait]
impl NotesBackend for LocalBackend {
    async fn list_notes(&self, owner: UserId) -> ApiResult<Vec<Note>> {
        Ok(self.read(|data| {
            data.notes
                .iter()
                .filter(|n| n.owner_id == owner)
                .cloned()
                .collect()
        }))
    }

    async fn get_note(&self, owner: UserId, id: &NoteId) -> ApiResult<Option<Note>> {
        Ok(self.read(|data| {
            data.notes
                .iter()
                .find(|n| &n.id == id && n.owner_id == owner)
                .cloned()
        }))
    }

    async fn create_note(&self, owner: UserId, req: &CreateNoteRequest) -> ApiResult<Note> {
        self.commit(|data| {
            let now = Utc::now();
            let note = Note {
                id: NoteId::new(format!("note_{}", Uuid::now_v7().simple())),
                title: req.title.clone(),
                content: req.content.clone().unwrap_or_default(),
                created_at: now,
                updated_at: now,
                owner_id: owner,
            };
            data.notes.push(note.clone());
            Ok(note)
        })
    }

    async fn update_note(
        &self,
        owner: UserId,
        id: &NoteId,
        req: &UpdateNoteRequest,
    ) -> ApiResult<Note> {
        self.commit(|data| {
            let note = data.owned_note_mut(owner, id)?;
            note.apply(req, Utc::now());
            Ok(note.clone())
        })
    }

    async fn delete_note(&self, owner: UserId, id: &NoteId) -> ApiResult<()> {
        self.commit(|data| {
            let index = data
                .notes
                .iter()
                .position(|n| &n.id == id && n.owner_id == owner)
                .ok_or_else(|| ApiError::not_found(ACCESS_DENIED))?;
            data.notes.remove(index);
            Ok(())
        })
    }
}
