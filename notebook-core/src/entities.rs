//! Entity and request types exchanged with the Notebook backend.
//!
//! Wire names follow the backend's camelCase JSON. Timestamps are RFC 3339.

use crate::identity::{NoteId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// An authenticated account as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

/// The `(user, token)` pair representing an authenticated client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

/// A personal text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Older backends call this field `userId`.
    #[serde(alias = "userId")]
    pub owner_id: UserId,
}

impl Note {
    /// Merge the present fields of `changes` into this note and stamp `updated_at`.
    pub fn apply(&mut self, changes: &UpdateNoteRequest, now: Timestamp) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Payload returned by both login and register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session::new(response.user, response.token)
    }
}

/// Request to create a new note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl CreateNoteRequest {
    pub fn new(title: impl Into<String>, content: Option<String>) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }
}

/// Partial update of a note. Absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl UpdateNoteRequest {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Drop every field whose value already matches `current`.
    pub fn changes_against(&self, current: &Note) -> UpdateNoteRequest {
        UpdateNoteRequest {
            title: self.title.clone().filter(|t| *t != current.title),
            content: self.content.clone().filter(|c| *c != current.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_note() -> Note {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Note {
            id: NoteId::new("note_1"),
            title: "Todo".to_string(),
            content: "buy milk".to_string(),
            created_at: at,
            updated_at: at,
            owner_id: UserId::new(1),
        }
    }

    #[test]
    fn test_note_uses_camel_case_wire_names() {
        let json = serde_json::to_value(sample_note()).unwrap();
        assert_eq!(json["ownerId"], 1);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn test_note_accepts_legacy_user_id_field() {
        let json = r#"{
            "id": "n1",
            "title": "t",
            "content": "c",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
            "userId": 7
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.owner_id, UserId::new(7));
    }

    #[test]
    fn test_update_request_omits_absent_fields() {
        let req = UpdateNoteRequest::default().content("x");
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"content":"x"}"#);
    }

    #[test]
    fn test_changes_against_drops_unchanged_fields() {
        let note = sample_note();
        let req = UpdateNoteRequest::default()
            .title("Todo")
            .content("buy milk and eggs");
        let diff = req.changes_against(&note);
        assert_eq!(diff.title, None);
        assert_eq!(diff.content.as_deref(), Some("buy milk and eggs"));
    }

    #[test]
    fn test_apply_keeps_missing_fields() {
        let mut note = sample_note();
        let later = note.updated_at + chrono::Duration::seconds(5);
        note.apply(&UpdateNoteRequest::default().content("new"), later);
        assert_eq!(note.title, "Todo");
        assert_eq!(note.content, "new");
        assert_eq!(note.updated_at, later);
    }
}
