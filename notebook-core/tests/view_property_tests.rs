//! Property tests for the derived note view.

use chrono::{Duration, TimeZone, Utc};
use notebook_core::{derive_view, Note, NoteId, SortOption, UserId, ViewState};
use proptest::prelude::*;
use std::cmp::Ordering;

fn arb_sort_option() -> impl Strategy<Value = SortOption> {
    prop::sample::select(SortOption::all().to_vec())
}

/// Notes drawn from a tiny key space so that ties are frequent.
fn arb_notes() -> impl Strategy<Value = Vec<Note>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["alpha", "Alpha", "beta", "Cat list", "dog"]),
            prop::sample::select(vec!["", "buy milk", "CATALOG", "misc"]),
            0i64..4,
            0i64..4,
        ),
        0..24,
    )
    .prop_map(|rows| {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(i, (title, content, created, updated))| Note {
                id: NoteId::new(format!("n{}", i)),
                title: title.to_string(),
                content: content.to_string(),
                created_at: base + Duration::hours(created),
                updated_at: base + Duration::hours(created + updated),
                owner_id: UserId::new(1),
            })
            .collect()
    })
}

fn position(notes: &[Note], id: &NoteId) -> usize {
    notes.iter().position(|n| &n.id == id).unwrap()
}

proptest! {
    #[test]
    fn sort_is_stable_for_every_option(notes in arb_notes(), sort in arb_sort_option()) {
        let view = derive_view(&notes, &ViewState::new("", sort));
        prop_assert_eq!(view.len(), notes.len());
        for pair in view.windows(2) {
            let ord = sort.compare(pair[0], pair[1]);
            prop_assert_ne!(ord, Ordering::Greater);
            if ord == Ordering::Equal {
                prop_assert!(position(&notes, &pair[0].id) < position(&notes, &pair[1].id));
            }
        }
    }

    #[test]
    fn filter_keeps_exactly_the_matching_notes(
        notes in arb_notes(),
        query in prop::sample::select(vec!["cat", "CAT", " milk ", "zzz", "a", ""]),
        sort in arb_sort_option(),
    ) {
        let view = derive_view(&notes, &ViewState::new(query, sort));
        let needle = query.trim().to_lowercase();
        let expected: Vec<&NoteId> = notes
            .iter()
            .filter(|n| {
                needle.is_empty()
                    || n.title.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
            })
            .map(|n| &n.id)
            .collect();
        prop_assert_eq!(view.len(), expected.len());
        for note in &view {
            prop_assert!(expected.contains(&&note.id));
        }
    }

    #[test]
    fn view_never_mutates_collection(notes in arb_notes(), sort in arb_sort_option()) {
        let before = notes.clone();
        let _ = derive_view(&notes, &ViewState::new("a", sort));
        prop_assert_eq!(before, notes);
    }
}

#[test]
fn cat_matches_category_list() {
    let now = Utc::now();
    let notes = vec![Note {
        id: NoteId::new("1"),
        title: "Category List".to_string(),
        content: String::new(),
        created_at: now,
        updated_at: now,
        owner_id: UserId::new(1),
    }];
    let view = derive_view(&notes, &ViewState::new("cat", SortOption::default()));
    assert_eq!(view.len(), 1);
}

#[test]
fn identical_updated_at_title_ties_keep_collection_order() {
    let now = Utc::now();
    let make = |id: &str, title: &str| Note {
        id: NoteId::new(id),
        title: title.to_string(),
        content: String::new(),
        created_at: now,
        updated_at: now,
        owner_id: UserId::new(1),
    };
    let notes = vec![make("first", "Same"), make("second", "Same")];
    let view = derive_view(&notes, &ViewState::new("", SortOption::TitleAsc));
    assert_eq!(view[0].id.as_str(), "first");
    assert_eq!(view[1].id.as_str(), "second");
}
