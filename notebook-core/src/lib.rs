//! Notebook Core - Data Types
//!
//! Entities, identifiers, the response envelope, the error taxonomy and the
//! derived note view. No I/O lives here; every other crate depends on this.

pub mod entities;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod view;

pub use entities::{
    AuthResponse, CreateNoteRequest, LoginRequest, Note, RegisterRequest, Session,
    UpdateNoteRequest, User,
};
pub use envelope::{failure_body, success_body, Envelope, ErrorBody};
pub use error::{ApiError, ApiResult, ErrorCode, ErrorKind};
pub use identity::{NoteId, Timestamp, UserId};
pub use view::{derive_view, ParseSortOptionError, SortOption, ViewState};
