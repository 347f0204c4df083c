use crate::remote::{Note, NoteFields, NotesBackend};

/// Draft copy of the selected note's editable fields. Decoupled from the
/// snapshot: it is overwritten on selection changes and successful
/// refreshes, and otherwise free to diverge until saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    pub title: String,
    pub content: String,
    /// Tags as one comma-delimited line, exactly as the user types it.
    pub tags_input: String,
}

impl EditBuffer {
    fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            tags_input: note.tags.join(", "),
        }
    }

    fn as_fields(&self) -> NoteFields {
        NoteFields {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: parse_tag_list(&self.tags_input),
        }
    }
}

/// Comma-split, trim each piece, drop empties. `"a, b ,, c"` becomes
/// `["a", "b", "c"]`.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// The authoritative local mirror of the remote collection, plus the
/// selection, draft, and filter criteria that hang off it. All mutation
/// goes through the named operations below; each leaves the state
/// consistent even when the remote call inside it fails.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub notes: Vec<Note>,
    pub loading: bool,
    /// A save or delete is in flight; the display layer disables mutating
    /// controls while set. Overlapping operations are otherwise not
    /// mutually excluded.
    pub busy: bool,
    pub error: Option<String>,
    pub selected_id: Option<i64>,
    pub edit: EditBuffer,
    pub search_query: String,
    pub active_tag: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_note(&self) -> Option<&Note> {
        let id = self.selected_id?;
        self.notes.iter().find(|note| note.id == id)
    }

    /// Replace the snapshot from the remote, sorted newest-first, and
    /// reconcile selection and draft against it. A failed fetch records the
    /// error and leaves the previous snapshot untouched.
    pub async fn refresh<B: NotesBackend>(&mut self, remote: &B) {
        self.loading = true;
        let query = self.search_query.trim();
        let query = (!query.is_empty()).then_some(query);
        match remote.list(query).await {
            Ok(mut notes) => {
                sort_newest_first(&mut notes);
                self.notes = notes;
                self.reconcile_selection();
                self.reload_edit_buffer();
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        self.loading = false;
    }

    /// Point the selection at `id` and overwrite the draft from that note,
    /// discarding unsaved edits. Selecting an id absent from the snapshot
    /// leaves a dangling selection (and an empty draft) until the next
    /// refresh reconciles it.
    pub fn select(&mut self, id: i64) {
        self.selected_id = Some(id);
        self.reload_edit_buffer();
    }

    /// Create a note with empty defaults, pull the canonical collection,
    /// and select the new note.
    pub async fn create<B: NotesBackend>(&mut self, remote: &B) {
        self.busy = true;
        match remote.create(&NoteFields::default()).await {
            Ok(created) => {
                self.refresh(remote).await;
                self.selected_id = Some(created.id);
                if self.selected_note().is_some() {
                    self.reload_edit_buffer();
                } else {
                    // The current search filtered the new note out of the
                    // snapshot; seed the draft from the create response so
                    // the user can still type into it.
                    self.edit = EditBuffer::from_note(&created);
                }
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        self.busy = false;
    }

    /// Push the draft to the remote as a full-field update, then refresh to
    /// pick up server-assigned state such as the new `updated_at`. On
    /// failure the draft is left exactly as typed.
    pub async fn save<B: NotesBackend>(&mut self, remote: &B) {
        let Some(id) = self.selected_id else {
            return;
        };
        self.busy = true;
        match remote.update(id, &self.edit.as_fields()).await {
            Ok(_) => self.refresh(remote).await,
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        self.busy = false;
    }

    /// Delete the selected note after the injected confirmation grants it.
    /// Declining aborts without touching anything.
    pub async fn delete<B, F>(&mut self, remote: &B, confirm: F)
    where
        B: NotesBackend,
        F: FnOnce(&Note) -> bool,
    {
        let Some(note) = self.selected_note().cloned() else {
            return;
        };
        if !confirm(&note) {
            return;
        }
        self.busy = true;
        match remote.delete(note.id).await {
            Ok(()) => {
                self.selected_id = None;
                self.edit = EditBuffer::default();
                self.refresh(remote).await;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        self.busy = false;
    }

    /// Store the query. Execution is explicit via [`Self::run_search`], not
    /// per keystroke.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub async fn run_search<B: NotesBackend>(&mut self, remote: &B) {
        self.refresh(remote).await;
    }

    /// Update the tag filter criterion only; no remote call.
    pub fn set_active_tag(&mut self, tag: Option<String>) {
        self.active_tag = tag;
    }

    fn reconcile_selection(&mut self) {
        let still_present = self
            .selected_id
            .is_some_and(|id| self.notes.iter().any(|note| note.id == id));
        if !still_present {
            self.selected_id = self.notes.first().map(|note| note.id);
        }
    }

    fn reload_edit_buffer(&mut self) {
        self.edit = match self.selected_note() {
            Some(note) => EditBuffer::from_note(note),
            None => EditBuffer::default(),
        };
    }
}

/// Descending by effective timestamp, raw string comparison. `sort_by` is
/// stable, so equal keys keep their incoming order.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.effective_timestamp().cmp(a.effective_timestamp()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{RemoteError, RemoteResult};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn note(id: i64, title: &str, updated_at: Option<&str>) -> Note {
        Note {
            id,
            title: title.to_string(),
            content: format!("{title} body"),
            tags: Vec::new(),
            created_at: None,
            updated_at: updated_at.map(str::to_string),
        }
    }

    fn tagged(mut base: Note, tags: &[&str]) -> Note {
        base.tags = tags.iter().map(|t| t.to_string()).collect();
        base
    }

    #[derive(Default)]
    struct FakeInner {
        notes: Vec<Note>,
        next_id: i64,
        fail_with: Option<u16>,
        last_update: Option<(i64, NoteFields)>,
    }

    /// In-memory stand-in for the remote service. Query matching is a
    /// case-insensitive substring check over title and content, which is
    /// one valid choice for the semantics the real remote owns.
    #[derive(Default)]
    struct FakeRemote {
        inner: Mutex<FakeInner>,
    }

    impl FakeRemote {
        fn seeded(notes: Vec<Note>) -> Self {
            let next_id = notes.iter().map(|n| n.id).max().unwrap_or(0) + 1;
            Self {
                inner: Mutex::new(FakeInner {
                    notes,
                    next_id,
                    ..FakeInner::default()
                }),
            }
        }

        /// Make the next operation fail with the given status.
        fn fail_next(&self, status: u16) {
            self.inner.lock().unwrap().fail_with = Some(status);
        }

        fn last_update(&self) -> Option<(i64, NoteFields)> {
            self.inner.lock().unwrap().last_update.clone()
        }

        fn check_failure(inner: &mut FakeInner) -> RemoteResult<()> {
            match inner.fail_with.take() {
                Some(status) => Err(RemoteError::RequestFailed { status }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl NotesBackend for FakeRemote {
        async fn list(&self, query: Option<&str>) -> RemoteResult<Vec<Note>> {
            let mut inner = self.inner.lock().unwrap();
            Self::check_failure(&mut inner)?;
            let notes = match query {
                Some(q) => {
                    let needle = q.to_lowercase();
                    inner
                        .notes
                        .iter()
                        .filter(|n| {
                            n.title.to_lowercase().contains(&needle)
                                || n.content.to_lowercase().contains(&needle)
                        })
                        .cloned()
                        .collect()
                }
                None => inner.notes.clone(),
            };
            Ok(notes)
        }

        async fn get(&self, id: i64) -> RemoteResult<Note> {
            let mut inner = self.inner.lock().unwrap();
            Self::check_failure(&mut inner)?;
            inner
                .notes
                .iter()
                .find(|n| n.id == id)
                .cloned()
                .ok_or(RemoteError::RequestFailed { status: 404 })
        }

        async fn create(&self, fields: &NoteFields) -> RemoteResult<Note> {
            let mut inner = self.inner.lock().unwrap();
            Self::check_failure(&mut inner)?;
            let id = inner.next_id;
            inner.next_id += 1;
            let created = Note {
                id,
                title: fields.title.clone(),
                content: fields.content.clone(),
                tags: fields.tags.clone(),
                created_at: Some(format!("2024-06-01T00:00:{:02}Z", id % 60)),
                updated_at: None,
            };
            inner.notes.push(created.clone());
            Ok(created)
        }

        async fn update(&self, id: i64, fields: &NoteFields) -> RemoteResult<Note> {
            let mut inner = self.inner.lock().unwrap();
            Self::check_failure(&mut inner)?;
            inner.last_update = Some((id, fields.clone()));
            let note = inner
                .notes
                .iter_mut()
                .find(|n| n.id == id)
                .ok_or(RemoteError::RequestFailed { status: 404 })?;
            note.title = fields.title.clone();
            note.content = fields.content.clone();
            note.tags = fields.tags.clone();
            note.updated_at = Some("2024-06-02T00:00:00Z".into());
            Ok(note.clone())
        }

        async fn delete(&self, id: i64) -> RemoteResult<()> {
            let mut inner = self.inner.lock().unwrap();
            Self::check_failure(&mut inner)?;
            inner.notes.retain(|n| n.id != id);
            Ok(())
        }
    }

    #[test]
    fn tag_list_parsing_trims_and_drops_empty_pieces() {
        assert_eq!(parse_tag_list("a, b ,, c"), vec!["a", "b", "c"]);
        assert_eq!(parse_tag_list(""), Vec::<String>::new());
        assert_eq!(parse_tag_list(" , ,"), Vec::<String>::new());
        assert_eq!(parse_tag_list("solo"), vec!["solo"]);
    }

    #[tokio::test]
    async fn refresh_sorts_descending_by_effective_timestamp() {
        let mut older = note(1, "older", Some("2024-01-01T00:00:00Z"));
        older.created_at = Some("2023-12-01T00:00:00Z".into());
        let created_only = Note {
            updated_at: None,
            created_at: Some("2024-03-01T00:00:00Z".into()),
            ..note(2, "created-only", None)
        };
        let newest = note(3, "newest", Some("2024-05-01T00:00:00Z"));
        let undated = note(4, "undated", None);

        let remote = FakeRemote::seeded(vec![older, created_only, newest, undated]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;

        let order: Vec<i64> = state.notes.iter().map(|n| n.id).collect();
        assert_eq!(order, vec![3, 2, 1, 4]);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn refresh_is_stable_for_equal_sort_keys() {
        let same = "2024-04-01T00:00:00Z";
        let remote = FakeRemote::seeded(vec![
            note(10, "first", Some(same)),
            note(11, "second", Some(same)),
            note(12, "third", Some(same)),
        ]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        let order: Vec<i64> = state.notes.iter().map(|n| n.id).collect();
        assert_eq!(order, vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn refresh_falls_back_to_first_entry_when_selection_vanishes() {
        let remote = FakeRemote::seeded(vec![
            note(3, "kept", Some("2024-05-01T00:00:00Z")),
            note(7, "other", Some("2024-04-01T00:00:00Z")),
        ]);
        let mut state = ViewState::new();
        state.selected_id = Some(5);
        state.refresh(&remote).await;
        assert_eq!(state.selected_id, Some(3));
        assert_eq!(state.edit.title, "kept");
    }

    #[tokio::test]
    async fn refresh_clears_selection_when_snapshot_is_empty() {
        let remote = FakeRemote::seeded(Vec::new());
        let mut state = ViewState::new();
        state.selected_id = Some(5);
        state.edit.title = "stale draft".into();
        state.refresh(&remote).await;
        assert_eq!(state.selected_id, None);
        assert_eq!(state.edit, EditBuffer::default());
    }

    #[tokio::test]
    async fn refresh_failure_preserves_snapshot_and_sets_error() {
        let remote = FakeRemote::seeded(vec![note(1, "only", Some("2024-01-01T00:00:00Z"))]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        assert_eq!(state.notes.len(), 1);

        remote.fail_next(500);
        state.refresh(&remote).await;
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.selected_id, Some(1));
        assert_matches!(state.error.as_deref(), Some(msg) if msg.contains("500"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn successful_refresh_clears_a_previous_error() {
        let remote = FakeRemote::seeded(vec![note(1, "only", None)]);
        let mut state = ViewState::new();
        remote.fail_next(502);
        state.refresh(&remote).await;
        assert!(state.error.is_some());

        state.refresh(&remote).await;
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn select_overwrites_the_draft_from_the_snapshot() {
        let remote = FakeRemote::seeded(vec![
            note(1, "alpha", Some("2024-05-01T00:00:00Z")),
            tagged(note(2, "beta", Some("2024-04-01T00:00:00Z")), &["work", "home"]),
        ]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        assert_eq!(state.selected_id, Some(1));

        state.edit.title = "half-typed change".into();
        state.select(2);
        assert_eq!(state.edit.title, "beta");
        assert_eq!(state.edit.tags_input, "work, home");
    }

    #[tokio::test]
    async fn save_submits_parsed_tags_from_the_buffer() {
        let remote = FakeRemote::seeded(vec![note(1, "alpha", None)]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        state.edit.tags_input = "a, b ,, c".into();
        state.save(&remote).await;

        let (id, fields) = remote.last_update().expect("update sent");
        assert_eq!(id, 1);
        assert_eq!(fields.tags, vec!["a", "b", "c"]);
        assert_eq!(state.error, None);
        // Refresh after save pulled the canonical tags back into the draft.
        assert_eq!(state.edit.tags_input, "a, b, c");
    }

    #[tokio::test]
    async fn save_without_selection_is_a_no_op() {
        let remote = FakeRemote::seeded(Vec::new());
        let mut state = ViewState::new();
        state.edit.title = "orphan".into();
        state.save(&remote).await;
        assert_eq!(remote.last_update(), None);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn failing_save_preserves_state_and_keeps_the_draft_as_typed() {
        let remote = FakeRemote::seeded(vec![
            note(1, "alpha", Some("2024-05-01T00:00:00Z")),
            note(2, "beta", Some("2024-04-01T00:00:00Z")),
        ]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        state.edit.title = "unsaved work".into();

        remote.fail_next(500);
        state.save(&remote).await;

        assert_eq!(state.notes.len(), 2);
        assert_eq!(state.selected_id, Some(1));
        assert_eq!(state.notes[0].title, "alpha");
        assert_eq!(state.edit.title, "unsaved work");
        assert_matches!(state.error.as_deref(), Some(msg) if msg.contains("500"));
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn create_on_empty_snapshot_selects_the_new_note() {
        let remote = FakeRemote::seeded(Vec::new());
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        assert_eq!(state.selected_id, None);

        state.create(&remote).await;
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.selected_id, Some(state.notes[0].id));
        assert_eq!(state.edit, EditBuffer::default());
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn failed_create_leaves_selection_and_draft_untouched() {
        let remote = FakeRemote::seeded(vec![note(1, "alpha", None)]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        state.edit.content = "draft in progress".into();

        remote.fail_next(503);
        state.create(&remote).await;

        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.selected_id, Some(1));
        assert_eq!(state.edit.content, "draft in progress");
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn deleting_the_only_note_empties_snapshot_and_selection() {
        let remote = FakeRemote::seeded(vec![note(1, "only", None)]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        assert_eq!(state.selected_id, Some(1));

        state.delete(&remote, |_| true).await;
        assert_eq!(state.selected_id, None);
        assert!(state.notes.is_empty());
        assert_eq!(state.edit, EditBuffer::default());
    }

    #[tokio::test]
    async fn declined_confirmation_aborts_delete() {
        let remote = FakeRemote::seeded(vec![note(1, "kept", None)]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;

        state.delete(&remote, |_| false).await;
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.selected_id, Some(1));
    }

    #[tokio::test]
    async fn search_query_is_forwarded_to_the_remote() {
        let remote = FakeRemote::seeded(vec![
            note(1, "grocery run", None),
            note(2, "meeting notes", None),
        ]);
        let mut state = ViewState::new();
        state.set_search("grocery");
        state.run_search(&remote).await;
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].id, 1);

        state.set_search("");
        state.run_search(&remote).await;
        assert_eq!(state.notes.len(), 2);
    }

    #[tokio::test]
    async fn active_tag_changes_no_remote_state() {
        let remote = FakeRemote::seeded(vec![tagged(note(1, "alpha", None), &["work"])]);
        let mut state = ViewState::new();
        state.refresh(&remote).await;
        state.set_active_tag(Some("work".into()));
        assert_eq!(state.active_tag.as_deref(), Some("work"));
        // The snapshot itself is untouched; filtering happens in the view.
        assert_eq!(state.notes.len(), 1);
    }
}
