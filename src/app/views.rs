//! Pure computations over the snapshot, recomputed on demand by the render
//! path. No state of their own.

use std::collections::BTreeSet;

use crate::remote::Note;

/// Union of every note's tags, deduplicated and lexicographically sorted.
pub fn tag_universe(notes: &[Note]) -> Vec<String> {
    let mut tags = BTreeSet::new();
    for note in notes {
        for tag in &note.tags {
            tags.insert(tag.clone());
        }
    }
    tags.into_iter().collect()
}

/// The snapshot as the list pane shows it: unchanged when no tag filter is
/// active, otherwise narrowed to notes carrying the tag. Order is inherited
/// from the snapshot, never re-sorted here.
pub fn visible_notes<'a>(notes: &'a [Note], active_tag: Option<&str>) -> Vec<&'a Note> {
    match active_tag {
        None => notes.iter().collect(),
        Some(tag) => notes
            .iter()
            .filter(|note| note.tags.iter().any(|t| t == tag))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_with_tags(id: i64, tags: &[&str]) -> Note {
        Note {
            id,
            title: format!("note {id}"),
            content: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn tag_universe_deduplicates_and_sorts() {
        let notes = vec![
            note_with_tags(1, &["work", "urgent"]),
            note_with_tags(2, &["home", "work"]),
            note_with_tags(3, &[]),
        ];
        assert_eq!(tag_universe(&notes), vec!["home", "urgent", "work"]);
    }

    #[test]
    fn tag_universe_of_untagged_snapshot_is_empty() {
        let notes = vec![note_with_tags(1, &[]), note_with_tags(2, &[])];
        assert!(tag_universe(&notes).is_empty());
    }

    #[test]
    fn visible_notes_without_filter_is_the_whole_snapshot() {
        let notes = vec![note_with_tags(1, &["a"]), note_with_tags(2, &[])];
        let visible = visible_notes(&notes, None);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn visible_notes_filters_by_tag_preserving_order() {
        let notes = vec![
            note_with_tags(5, &["work"]),
            note_with_tags(3, &["home"]),
            note_with_tags(9, &["work", "home"]),
        ];
        let visible = visible_notes(&notes, Some("work"));
        let ids: Vec<i64> = visible.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 9]);
    }
}
