//! Notebook Test Utilities
//!
//! Shared test infrastructure for the Notebook workspace:
//! - Proptest generators for notes, users and view options
//! - Fixtures for common sessions and notes
//! - Backend wrappers that count or hold back calls
//! - Assertions on [`ApiError`] classification

pub use notebook_client::{LocalBackend, MemorySessionRepository, NotesStore, SessionRepository};
pub use notebook_core::{
    ApiError, ApiResult, ErrorKind, Note, NoteId, Session, SortOption, Timestamp, User, UserId,
    ViewState,
};

use async_trait::async_trait;
use notebook_client::{AuthBackend, NotesBackend};
use notebook_core::{
    AuthResponse, CreateNoteRequest, LoginRequest, RegisterRequest, UpdateNoteRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Notebook types.

    use super::*;
    use proptest::prelude::*;

    /// Timestamps between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now)
        })
    }

    pub fn arb_sort_option() -> impl Strategy<Value = SortOption> {
        prop::sample::select(SortOption::all().to_vec())
    }

    pub fn arb_user() -> impl Strategy<Value = User> {
        (1i64..1000, "[a-z]{1,8}", "[A-Z][a-z]{0,8}").prop_map(|(id, local, name)| User {
            id: UserId::new(id),
            email: format!("{}@example.com", local),
            name,
        })
    }

    /// A note owned by `owner` with `updated_at` never before `created_at`.
    pub fn arb_note(owner: UserId) -> impl Strategy<Value = Note> {
        (
            "[a-z0-9]{4,12}",
            "[A-Za-z ]{0,16}",
            "[A-Za-z ]{0,32}",
            arb_timestamp(),
            0i64..86_400,
        )
            .prop_map(move |(id, title, content, created_at, delta)| Note {
                id: NoteId::new(format!("note_{}", id)),
                title,
                content,
                created_at,
                updated_at: created_at + chrono::Duration::seconds(delta),
                owner_id: owner,
            })
    }

    /// Up to `max` notes with distinct ids.
    pub fn arb_notes(owner: UserId, max: usize) -> impl Strategy<Value = Vec<Note>> {
        prop::collection::vec(arb_note(owner), 0..max).prop_map(|notes| {
            notes
                .into_iter()
                .enumerate()
                .map(|(i, mut note)| {
                    note.id = NoteId::new(format!("{}_{}", note.id, i));
                    note
                })
                .collect()
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    pub fn sample_user(id: i64) -> User {
        User {
            id: UserId::new(id),
            email: format!("user{}@example.com", id),
            name: format!("User {}", id),
        }
    }

    pub fn sample_session(id: i64) -> Session {
        Session::new(sample_user(id), format!("token-{}", id))
    }

    /// Session repository already holding [`sample_session`] for `id`.
    pub fn signed_in(id: i64) -> Arc<MemorySessionRepository> {
        Arc::new(MemorySessionRepository::with_session(sample_session(id)))
    }

    /// Note created `hours` after 2024-01-01T00:00Z and never updated.
    pub fn note_at(id: &str, title: &str, owner: i64, hours: i64) -> Note {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours);
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: String::new(),
            created_at: at,
            updated_at: at,
            owner_id: UserId::new(owner),
        }
    }
}

// ============================================================================
// BACKEND WRAPPERS
// ============================================================================

/// Forwards to `inner` and counts every call.
#[derive(Debug, Default)]
pub struct CountingBackend<B> {
    inner: B,
    calls: AtomicUsize,
}

impl<B> CountingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<B: AuthBackend> AuthBackend for CountingBackend<B> {
    async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse> {
        self.hit();
        self.inner.login(req).await
    }

    async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.hit();
        self.inner.register(req).await
    }
}

#[async_trait]
impl<B: NotesBackend> NotesBackend for CountingBackend<B> {
    async fn list_notes(&self, owner: UserId) -> ApiResult<Vec<Note>> {
        self.hit();
        self.inner.list_notes(owner).await
    }

    async fn get_note(&self, owner: UserId, id: &NoteId) -> ApiResult<Option<Note>> {
        self.hit();
        self.inner.get_note(owner, id).await
    }

    async fn create_note(&self, owner: UserId, req: &CreateNoteRequest) -> ApiResult<Note> {
        self.hit();
        self.inner.create_note(owner, req).await
    }

    async fn update_note(
        &self,
        owner: UserId,
        id: &NoteId,
        req: &UpdateNoteRequest,
    ) -> ApiResult<Note> {
        self.hit();
        self.inner.update_note(owner, id, req).await
    }

    async fn delete_note(&self, owner: UserId, id: &NoteId) -> ApiResult<()> {
        self.hit();
        self.inner.delete_note(owner, id).await
    }
}

/// Holds every notes call until the test hands out a permit with
/// [`GatedBackend::release`], so overlapping operations can be observed.
#[derive(Debug)]
pub struct GatedBackend<B> {
    inner: B,
    gate: Semaphore,
    entered: AtomicUsize,
    completed: AtomicUsize,
}

impl<B> GatedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            entered: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Let `n` waiting or future calls through.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Calls that reached the gate.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Calls that passed the gate and returned.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    async fn pass(&self) -> ApiResult<()> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ApiError::unknown(e.to_string()))?;
        permit.forget();
        Ok(())
    }

    fn done<T>(&self, result: ApiResult<T>) -> ApiResult<T> {
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl<B: NotesBackend> NotesBackend for GatedBackend<B> {
    async fn list_notes(&self, owner: UserId) -> ApiResult<Vec<Note>> {
        self.pass().await?;
        let result = self.inner.list_notes(owner).await;
        self.done(result)
    }

    async fn get_note(&self, owner: UserId, id: &NoteId) -> ApiResult<Option<Note>> {
        self.pass().await?;
        let result = self.inner.get_note(owner, id).await;
        self.done(result)
    }

    async fn create_note(&self, owner: UserId, req: &CreateNoteRequest) -> ApiResult<Note> {
        self.pass().await?;
        let result = self.inner.create_note(owner, req).await;
        self.done(result)
    }

    async fn update_note(
        &self,
        owner: UserId,
        id: &NoteId,
        req: &UpdateNoteRequest,
    ) -> ApiResult<Note> {
        self.pass().await?;
        let result = self.inner.update_note(owner, id, req).await;
        self.done(result)
    }

    async fn delete_note(&self, owner: UserId, id: &NoteId) -> ApiResult<()> {
        self.pass().await?;
        let result = self.inner.delete_note(owner, id).await;
        self.done(result)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on error classification.

    use super::*;

    /// Assert that `result` failed with an error of `kind`.
    #[track_caller]
    pub fn assert_kind<T: std::fmt::Debug>(result: &ApiResult<T>, kind: ErrorKind) {
        match result {
            Err(err) => assert_eq!(err.kind(), kind, "unexpected error kind for {:?}", err),
            Ok(value) => panic!("Expected {:?} error, got Ok: {:?}", kind, value),
        }
    }

    /// Assert that `result` failed with wire code `code`.
    #[track_caller]
    pub fn assert_code<T: std::fmt::Debug>(result: &ApiResult<T>, code: &str) {
        match result {
            Err(err) => assert_eq!(err.code, code, "unexpected error code for {:?}", err),
            Ok(value) => panic!("Expected {} error, got Ok: {:?}", code, value),
        }
    }
}
