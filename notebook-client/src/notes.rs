//! Notes collection store.
//!
//! Caches the signed-in user's notes and mirrors every CRUD call into that
//! cache. Ownership is tracked alongside the cache: when the session user
//! changes, the next operation discards the previous user's notes, and a
//! response that arrives after the session changed is returned to the caller
//! but never applied.
//!
//! Presentation order is never stored. [`NotesStore::view`] derives it from
//! the cache and the current [`ViewState`] on every call.

use crate::backend::NotesBackend;
use crate::busy::{BusyCounter, BusyGuard};
use crate::session::SessionRepository;
use notebook_core::{
    derive_view, ApiError, ApiResult, CreateNoteRequest, Note, NoteId, Session, SortOption,
    UpdateNoteRequest, UserId, ViewState,
};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Collection {
    owner: Option<UserId>,
    notes: Vec<Note>,
}

impl Collection {
    /// Replace the note with the same id in place, or append it.
    fn upsert(&mut self, note: Note) {
        match self.notes.iter_mut().find(|n| n.id == note.id) {
            Some(slot) => *slot = note,
            None => self.notes.push(note),
        }
    }

    fn replace_existing(&mut self, note: Note) {
        if let Some(slot) = self.notes.iter_mut().find(|n| n.id == note.id) {
            *slot = note;
        }
    }

    fn remove(&mut self, id: &NoteId) {
        self.notes.retain(|n| &n.id != id);
    }
}

pub struct NotesStore {
    backend: Arc<dyn NotesBackend>,
    sessions: Arc<dyn SessionRepository>,
    collection: RwLock<Collection>,
    view: RwLock<ViewState>,
    busy: BusyCounter,
    last_error: RwLock<Option<String>>,
}

impl NotesStore {
    pub fn new(backend: Arc<dyn NotesBackend>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            backend,
            sessions,
            collection: RwLock::new(Collection::default()),
            view: RwLock::new(ViewState::default()),
            busy: BusyCounter::new(),
            last_error: RwLock::new(None),
        }
    }

    /// Replace the cache with the server's set of notes.
    pub async fn fetch_all(&self) -> ApiResult<Vec<Note>> {
        let (session, _busy) = self.begin()?;
        let owner = session.user_id();
        let result = self.backend.list_notes(owner).await;
        let fetched = self.record("fetch_all", result)?;

        let mut fresh = Collection {
            owner: Some(owner),
            notes: Vec::with_capacity(fetched.len()),
        };
        for note in fetched {
            if note.owner_id == owner {
                fresh.upsert(note);
            } else {
                warn!(note_id = %note.id, owner = %note.owner_id, "dropping note owned by another user");
            }
        }
        let notes = fresh.notes;
        let count = notes.len();
        let snapshot = notes.clone();
        self.apply(&session, move |c| c.notes = notes);
        info!(count, "notes fetched");
        Ok(snapshot)
    }

    /// Look up a single note on the server. The cache is left alone.
    pub async fn fetch_one(&self, id: &NoteId) -> ApiResult<Option<Note>> {
        let (session, _busy) = self.begin()?;
        let result = self.backend.get_note(session.user_id(), id).await;
        self.record("fetch_one", result)
    }

    pub async fn create(&self, title: &str, content: Option<&str>) -> ApiResult<Note> {
        let (session, _busy) = self.begin()?;
        let req = CreateNoteRequest::new(title, content.map(str::to_string));
        let result = self.backend.create_note(session.user_id(), &req).await;
        let note = self.record("create", result.and_then(|n| owned_by(&session, n)))?;

        let cached = note.clone();
        self.apply(&session, move |c| c.upsert(cached));
        info!(note_id = %note.id, "note created");
        Ok(note)
    }

    /// Send the fields of `changes` that differ from the cached copy.
    ///
    /// When the note is cached and nothing differs, the cached note is
    /// returned without contacting the backend.
    pub async fn update(&self, id: &NoteId, changes: UpdateNoteRequest) -> ApiResult<Note> {
        let (session, _busy) = self.begin()?;
        let cached = self.cached(id);
        let changes = match &cached {
            Some(current) => changes.changes_against(current),
            None => changes,
        };
        if changes.is_empty() {
            if let Some(current) = cached {
                debug!(note_id = %id, "update has no changes; skipping request");
                return Ok(current);
            }
        }

        let result = self.backend.update_note(session.user_id(), id, &changes).await;
        let note = self.record("update", result.and_then(|n| owned_by(&session, n)))?;

        let cached = note.clone();
        self.apply(&session, move |c| c.replace_existing(cached));
        info!(note_id = %note.id, "note updated");
        Ok(note)
    }

    /// Delete a note. A note the backend no longer knows counts as deleted.
    pub async fn delete(&self, id: &NoteId) -> ApiResult<()> {
        let (session, _busy) = self.begin()?;
        match self.backend.delete_note(session.user_id(), id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                debug!(note_id = %id, "note already gone on the backend");
            }
            Err(err) => return self.record("delete", Err(err)),
        }

        self.apply(&session, |c| c.remove(id));
        info!(note_id = %id, "note deleted");
        Ok(())
    }

    /// The cache filtered and sorted by the current view state.
    pub fn view(&self) -> Vec<Note> {
        let state = self.view_state();
        self.with_visible(|notes| derive_view(notes, &state).into_iter().cloned().collect())
    }

    /// Cached notes in the order they were loaded or created.
    pub fn notes(&self) -> Vec<Note> {
        self.with_visible(|notes| notes.to_vec())
    }

    pub fn get(&self, id: &NoteId) -> Option<Note> {
        self.with_visible(|notes| notes.iter().find(|n| &n.id == id).cloned())
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.view.write().unwrap_or_else(PoisonError::into_inner).search_query = query.into();
    }

    pub fn set_sort_option(&self, option: SortOption) {
        self.view.write().unwrap_or_else(PoisonError::into_inner).sort_option = option;
    }

    pub fn search_query(&self) -> String {
        self.view_state().search_query
    }

    pub fn sort_option(&self) -> SortOption {
        self.view_state().sort_option
    }

    pub fn view_state(&self) -> ViewState {
        self.view.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_loading(&self) -> bool {
        self.busy.is_busy()
    }

    /// Message of the most recent failed operation, cleared when the next one starts.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the cache and the recorded error.
    pub fn clear(&self) {
        *self.collection.write().unwrap_or_else(PoisonError::into_inner) = Collection::default();
        self.set_last_error(None);
    }

    /// Entry point of every backend operation: clears the previous error,
    /// requires a session, resynchronizes the cache owner and marks the
    /// store busy.
    fn begin(&self) -> ApiResult<(Session, BusyGuard<'_>)> {
        self.set_last_error(None);
        let Some(session) = self.sessions.get() else {
            return self.record("begin", Err(ApiError::not_authenticated()));
        };
        self.sync_owner(session.user_id());
        Ok((session, self.busy.enter()))
    }

    fn sync_owner(&self, user: UserId) {
        let mut collection = self.collection.write().unwrap_or_else(PoisonError::into_inner);
        if collection.owner != Some(user) {
            if let Some(previous) = collection.owner {
                info!(previous = %previous, current = %user, "session user changed; discarding cached notes");
            }
            collection.notes.clear();
            collection.owner = Some(user);
        }
    }

    /// Mutate the cache only if `session` is still the active session and
    /// still owns the cache.
    fn apply(&self, session: &Session, f: impl FnOnce(&mut Collection)) -> bool {
        if self.sessions.get().as_ref() != Some(session) {
            debug!("session changed while the request was in flight; response not applied");
            return false;
        }
        let mut collection = self.collection.write().unwrap_or_else(PoisonError::into_inner);
        if collection.owner != Some(session.user_id()) {
            return false;
        }
        f(&mut collection);
        true
    }

    fn cached(&self, id: &NoteId) -> Option<Note> {
        self.collection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .notes
            .iter()
            .find(|n| &n.id == id)
            .cloned()
    }

    fn with_visible<R>(&self, f: impl FnOnce(&[Note]) -> R) -> R {
        let current = self.sessions.get().map(|s| s.user_id());
        let collection = self.collection.read().unwrap_or_else(PoisonError::into_inner);
        if current.is_some() && collection.owner == current {
            f(&collection.notes)
        } else {
            f(&[])
        }
    }

    fn record<T>(&self, op: &'static str, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(err) = &result {
            warn!(op, code = %err.code, error = %err, "notes operation failed");
            self.set_last_error(Some(err.message.clone()));
        }
        result
    }

    fn set_last_error(&self, message: Option<String>) {
        *self.last_error.write().unwrap_or_else(PoisonError::into_inner) = message;
    }
}

/// A mutation answered with another user's note is rejected, never cached.
fn owned_by(session: &Session, note: Note) -> ApiResult<Note> {
    if note.owner_id == session.user_id() {
        return Ok(note);
    }
    warn!(note_id = %note.id, owner = %note.owner_id, "backend returned a note owned by another user");
    Err(ApiError::invalid_response("Note belongs to another user"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use crate::session::MemorySessionRepository;
    use async_trait::async_trait;
    use notebook_core::{ErrorKind, User};

    fn session_for(id: i64) -> Session {
        Session::new(
            User {
                id: UserId::new(id),
                email: format!("user{}@x.com", id),
                name: format!("User {}", id),
            },
            format!("tok-{}", id),
        )
    }

    fn signed_in(id: i64) -> (NotesStore, Arc<MemorySessionRepository>) {
        let sessions = Arc::new(MemorySessionRepository::with_session(session_for(id)));
        let store = NotesStore::new(Arc::new(LocalBackend::in_memory()), sessions.clone());
        (store, sessions)
    }

    #[tokio::test]
    async fn test_create_appends_backend_note() {
        let (store, _) = signed_in(1);
        let note = store.create("Todo", Some("buy milk")).await.unwrap();
        assert!(!note.id.is_empty());
        assert_eq!(note.owner_id, UserId::new(1));
        assert_eq!(store.notes(), vec![note]);
    }

    #[tokio::test]
    async fn test_update_without_changes_skips_backend() {
        let (store, _) = signed_in(1);
        let note = store.create("Todo", Some("buy milk")).await.unwrap();
        let same = store
            .update(&note.id, UpdateNoteRequest::default().title("Todo"))
            .await
            .unwrap();
        assert_eq!(same, note);
        assert_eq!(same.updated_at, note.updated_at);
    }

    #[tokio::test]
    async fn test_update_replaces_cached_entry() {
        let (store, _) = signed_in(1);
        let note = store.create("Todo", Some("buy milk")).await.unwrap();
        let updated = store
            .update(&note.id, UpdateNoteRequest::default().content("buy eggs"))
            .await
            .unwrap();
        assert_eq!(updated.title, "Todo");
        assert_eq!(store.get(&note.id).unwrap().content, "buy eggs");
        assert_eq!(store.notes().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_update_reports_not_found() {
        let (store, _) = signed_in(1);
        let err = store
            .update(&NoteId::new("missing"), UpdateNoteRequest::default().title("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.last_error().as_deref(), Some("Note not found or access denied"));
    }

    #[tokio::test]
    async fn test_fetch_one_leaves_cache_alone() {
        let (store, _) = signed_in(1);
        let note = store.create("Todo", None).await.unwrap();
        store.clear();
        assert_eq!(store.fetch_one(&note.id).await.unwrap(), Some(note));
        assert!(store.notes().is_empty());
        assert_eq!(store.fetch_one(&NoteId::new("nope")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unauthenticated_calls_fail() {
        let store = NotesStore::new(
            Arc::new(LocalBackend::in_memory()),
            Arc::new(MemorySessionRepository::new()),
        );
        let err = store.fetch_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
        assert_eq!(store.last_error().as_deref(), Some("User not authenticated"));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_next_operation_clears_error() {
        let (store, _) = signed_in(1);
        store
            .update(&NoteId::new("missing"), UpdateNoteRequest::default().title("x"))
            .await
            .unwrap_err();
        assert!(store.last_error().is_some());
        store.fetch_all().await.unwrap();
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn test_view_follows_view_state() {
        let (store, _) = signed_in(1);
        store.create("Shopping", Some("cat food")).await.unwrap();
        store.create("Work", None).await.unwrap();
        store.create("Category List", None).await.unwrap();

        store.set_search_query("  CAT ");
        store.set_sort_option(SortOption::TitleAsc);
        let titles: Vec<String> = store.view().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Category List", "Shopping"]);
        assert_eq!(store.notes().len(), 3);
    }

    #[tokio::test]
    async fn test_cache_hidden_after_logout() {
        let (store, sessions) = signed_in(1);
        store.create("Todo", None).await.unwrap();
        sessions.clear().unwrap();
        assert!(store.notes().is_empty());
        assert!(store.view().is_empty());
    }

    /// Backend whose listing signs the user out before answering.
    struct SignsOutMidFlight {
        inner: LocalBackend,
        sessions: Arc<MemorySessionRepository>,
    }

    #[async_trait]
    impl NotesBackend for SignsOutMidFlight {
        async fn list_notes(&self, owner: UserId) -> ApiResult<Vec<Note>> {
            let notes = self.inner.list_notes(owner).await;
            self.sessions.clear().unwrap();
            notes
        }

        async fn get_note(&self, owner: UserId, id: &NoteId) -> ApiResult<Option<Note>> {
            self.inner.get_note(owner, id).await
        }

        async fn create_note(&self, owner: UserId, req: &CreateNoteRequest) -> ApiResult<Note> {
            self.inner.create_note(owner, req).await
        }

        async fn update_note(
            &self,
            owner: UserId,
            id: &NoteId,
            req: &UpdateNoteRequest,
        ) -> ApiResult<Note> {
            self.inner.update_note(owner, id, req).await
        }

        async fn delete_note(&self, owner: UserId, id: &NoteId) -> ApiResult<()> {
            self.inner.delete_note(owner, id).await
        }
    }

    #[tokio::test]
    async fn test_response_after_sign_out_is_not_applied() {
        let sessions = Arc::new(MemorySessionRepository::with_session(session_for(1)));
        let backend = SignsOutMidFlight {
            inner: LocalBackend::in_memory(),
            sessions: sessions.clone(),
        };
        backend
            .inner
            .create_note(UserId::new(1), &CreateNoteRequest::new("Todo", None))
            .await
            .unwrap();
        let store = NotesStore::new(Arc::new(backend), sessions.clone());

        let fetched = store.fetch_all().await.unwrap();
        assert_eq!(fetched.len(), 1);

        sessions.set(&session_for(1)).unwrap();
        assert!(store.notes().is_empty());
    }

    /// Backend that answers every mutation with a note owned by user 2.
    struct ForeignOwner;

    fn foreign_note(id: &str, title: &str) -> Note {
        let at = chrono::Utc::now();
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: String::new(),
            created_at: at,
            updated_at: at,
            owner_id: UserId::new(2),
        }
    }

    #[async_trait]
    impl NotesBackend for ForeignOwner {
        async fn list_notes(&self, _owner: UserId) -> ApiResult<Vec<Note>> {
            Ok(Vec::new())
        }

        async fn get_note(&self, _owner: UserId, _id: &NoteId) -> ApiResult<Option<Note>> {
            Ok(None)
        }

        async fn create_note(&self, _owner: UserId, req: &CreateNoteRequest) -> ApiResult<Note> {
            Ok(foreign_note("n_foreign", &req.title))
        }

        async fn update_note(
            &self,
            _owner: UserId,
            id: &NoteId,
            _req: &UpdateNoteRequest,
        ) -> ApiResult<Note> {
            Ok(foreign_note(id.as_str(), "hijacked"))
        }

        async fn delete_note(&self, _owner: UserId, _id: &NoteId) -> ApiResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_foreign_mutation_result_is_rejected() {
        let sessions = Arc::new(MemorySessionRepository::with_session(session_for(1)));
        let store = NotesStore::new(Arc::new(ForeignOwner), sessions);

        let err = store.create("Todo", None).await.unwrap_err();
        assert_eq!(err.code, "INVALID_RESPONSE");
        assert!(store.notes().is_empty());
        assert!(store.last_error().is_some());

        let err = store
            .update(&NoteId::new("n_foreign"), UpdateNoteRequest::default().title("x"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "INVALID_RESPONSE");
        assert!(store.notes().iter().all(|n| n.owner_id == UserId::new(1)));
        assert!(!store.is_loading());
    }
}
