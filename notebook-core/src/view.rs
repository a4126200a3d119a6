//! Derived note views: search filtering and stable multi-key sorting.
//!
//! Views are a pure function of the collection, the search query and the
//! sort option. They borrow from the collection and are recomputed on every
//! read.

use crate::entities::Note;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Presentation order of the notes list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    CreatedDesc,
    CreatedAsc,
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    TitleAsc,
    TitleDesc,
}

impl SortOption {
    pub fn all() -> &'static [SortOption] {
        &[
            SortOption::CreatedDesc,
            SortOption::CreatedAsc,
            SortOption::UpdatedDesc,
            SortOption::UpdatedAsc,
            SortOption::TitleAsc,
            SortOption::TitleDesc,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::CreatedDesc => "created-desc",
            SortOption::CreatedAsc => "created-asc",
            SortOption::UpdatedDesc => "updated-desc",
            SortOption::UpdatedAsc => "updated-asc",
            SortOption::TitleAsc => "title-asc",
            SortOption::TitleDesc => "title-desc",
        }
    }

    /// Compare two notes under this option. Equal keys compare `Equal` so a
    /// stable sort keeps collection order.
    pub fn compare(&self, a: &Note, b: &Note) -> Ordering {
        match self {
            SortOption::CreatedDesc => b.created_at.cmp(&a.created_at),
            SortOption::CreatedAsc => a.created_at.cmp(&b.created_at),
            SortOption::UpdatedDesc => b.updated_at.cmp(&a.updated_at),
            SortOption::UpdatedAsc => a.updated_at.cmp(&b.updated_at),
            SortOption::TitleAsc => compare_titles(&a.title, &b.title),
            SortOption::TitleDesc => compare_titles(&b.title, &a.title),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort option '{0}' (expected one of created-desc, created-asc, updated-desc, updated-asc, title-asc, title-desc)")]
pub struct ParseSortOptionError(pub String);

impl FromStr for SortOption {
    type Err = ParseSortOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::all()
            .iter()
            .copied()
            .find(|opt| opt.as_str() == s.trim())
            .ok_or_else(|| ParseSortOptionError(s.to_string()))
    }
}

/// Title ordering: accent- and case-insensitive first, then case-insensitive,
/// then raw text.
fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Compatibility-decomposed, lowercased text with combining marks removed,
/// so "Éclair" sorts next to "eclair" rather than after "z".
fn collation_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Ephemeral view parameters. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search_query: String,
    pub sort_option: SortOption,
}

impl ViewState {
    pub fn new(search_query: impl Into<String>, sort_option: SortOption) -> Self {
        Self {
            search_query: search_query.into(),
            sort_option,
        }
    }
}

/// True when `note` matches the (already trimmed and case-folded) needle.
fn matches(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle) || note.content.to_lowercase().contains(needle)
}

/// Filter and sort `notes` according to `state`.
pub fn derive_view<'a>(notes: &'a [Note], state: &ViewState) -> Vec<&'a Note> {
    let needle = state.search_query.trim().to_lowercase();
    let mut view: Vec<&Note> = if needle.is_empty() {
        notes.iter().collect()
    } else {
        notes.iter().filter(|n| matches(n, &needle)).collect()
    };
    view.sort_by(|a, b| state.sort_option.compare(a, b));
    view
}
