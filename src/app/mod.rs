use std::io::Stdout;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::remote::RemoteNotesClient;
use crate::ui;

pub mod editor;
pub mod state;
pub mod views;

pub use editor::EditField;
pub use state::{EditBuffer, ViewState};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    Refresh,
    NewNote,
    EnterEdit,
    StartSearch,
    DeleteNote,
    CycleTagFilter,
    ClearTagFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Search,
    Editor,
}

/// Modal asking the user to confirm a pending delete. Enter proceeds,
/// Esc/n cancels.
#[derive(Debug, Clone)]
pub struct DeleteOverlay {
    pub note_id: i64,
    pub title: String,
}

pub struct App {
    pub config: Arc<AppConfig>,
    remote: RemoteNotesClient,
    state: ViewState,
    focus: Focus,
    edit_field: EditField,
    cursor: usize,
    overlay: Option<DeleteOverlay>,
    list_state: ListState,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Arc<AppConfig>, remote: RemoteNotesClient) -> Self {
        Self {
            config,
            remote,
            state: ViewState::new(),
            focus: Focus::List,
            edit_field: EditField::Title,
            cursor: 0,
            overlay: None,
            list_state: ListState::default(),
            status: Some("j/k move • a new • e edit • d delete • / search • f filter • q quit".into()),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        // Startup load: nothing is selected yet, so this also picks the
        // initial selection.
        self.state.refresh(&self.remote).await;

        let mut events = EventStream::new();
        loop {
            terminal
                .draw(|frame| {
                    let visible =
                        views::visible_notes(&self.state.notes, self.state.active_tag.as_deref());
                    let selected = self
                        .state
                        .selected_id
                        .and_then(|id| visible.iter().position(|note| note.id == id));
                    self.list_state.select(selected);
                    let view = ui::AppView {
                        state: &self.state,
                        visible: &visible,
                        focus: self.focus,
                        edit_field: self.edit_field,
                        cursor: self.cursor,
                        overlay: self.overlay.as_ref(),
                        status: self.status.as_deref(),
                        preview_lines: self.config.ui.preview_lines as usize,
                    };
                    ui::draw_app(frame, &view, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let Some(event) = events.next().await else {
                break;
            };
            match event.context("reading terminal event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
                Event::Resize(_, _) => {
                    // next draw adapts to the new size
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if self.overlay.is_some() {
            self.handle_overlay_key(key).await;
            return;
        }
        match self.focus {
            Focus::Search => self.handle_search_key(key).await,
            Focus::Editor => self.handle_editor_key(key).await,
            Focus::List => self.handle_list_key(key).await,
        }
    }

    async fn handle_list_key(&mut self, key: KeyEvent) {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        let action = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Char('r') if plain => Some(Action::Refresh),
            KeyCode::Char('a') if plain => Some(Action::NewNote),
            KeyCode::Char('e') if plain => Some(Action::EnterEdit),
            KeyCode::Enter => Some(Action::EnterEdit),
            KeyCode::Char('d') if plain => Some(Action::DeleteNote),
            KeyCode::Char('/') if plain => Some(Action::StartSearch),
            KeyCode::Char('f') if plain => Some(Action::CycleTagFilter),
            KeyCode::Char('F') => Some(Action::ClearTagFilter),
            _ => None,
        };
        if let Some(action) = action {
            self.handle_action(action).await;
        }
    }

    async fn handle_action(&mut self, action: Action) {
        // The display layer's half of the serialization bargain: while a
        // remote call is in flight nothing else may start one.
        if self.state.loading || self.state.busy {
            if matches!(action, Action::Quit) {
                self.should_quit = true;
            }
            return;
        }
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.move_selection(1),
            Action::SelectPrevious => self.move_selection(-1),
            Action::Refresh => {
                self.state.refresh(&self.remote).await;
                self.report_outcome("Notes refreshed");
            }
            Action::NewNote => {
                self.state.create(&self.remote).await;
                if self.state.error.is_none() {
                    self.enter_editor(EditField::Title);
                    self.status = Some("Note created; type a title • Ctrl-s save".into());
                } else {
                    self.report_outcome("");
                }
            }
            Action::EnterEdit => {
                if self.state.selected_note().is_some() {
                    self.enter_editor(EditField::Content);
                    self.status = Some("Editing: Tab field • Ctrl-s save • Esc back".into());
                } else {
                    self.status = Some("No note selected".into());
                }
            }
            Action::StartSearch => {
                self.focus = Focus::Search;
                self.status = Some("Search: type query • Enter run • Esc clear".into());
            }
            Action::DeleteNote => {
                if let Some(note) = self.state.selected_note() {
                    self.overlay = Some(DeleteOverlay {
                        note_id: note.id,
                        title: note.title.clone(),
                    });
                    self.status = Some("Delete note: Enter confirm • Esc cancel".into());
                } else {
                    self.status = Some("No note selected".into());
                }
            }
            Action::CycleTagFilter => self.cycle_tag_filter(),
            Action::ClearTagFilter => {
                self.state.set_active_tag(None);
                self.status = Some("Tag filter cleared".into());
            }
        }
    }

    async fn handle_overlay_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('n') => {
                self.overlay = None;
                self.status = Some("Delete canceled".into());
            }
            KeyCode::Enter | KeyCode::Char('y') => {
                self.overlay = None;
                // The modal round-trip was the human confirmation; the
                // closure just records the grant.
                self.state.delete(&self.remote, |_| true).await;
                self.cursor = 0;
                self.report_outcome("Note deleted");
            }
            _ => {}
        }
    }

    async fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.set_search(String::new());
                self.state.run_search(&self.remote).await;
                self.focus = Focus::List;
                self.report_outcome("Search cleared");
            }
            KeyCode::Enter => {
                self.state.run_search(&self.remote).await;
                self.focus = Focus::List;
                self.report_outcome("Search updated");
            }
            KeyCode::Backspace => {
                let mut query = self.state.search_query.clone();
                query.pop();
                self.state.set_search(query);
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                let mut query = self.state.search_query.clone();
                query.push(ch);
                self.state.set_search(query);
            }
            _ => {}
        }
    }

    async fn handle_editor_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('s') = key.code {
                if self.state.busy || self.state.loading {
                    return;
                }
                self.state.save(&self.remote).await;
                // A successful save refreshed the draft from the server;
                // the cursor may now point past the end of the field.
                self.cursor = editor::clamp(self.field_buffer(), self.cursor);
                self.report_outcome("Saved");
                return;
            }
        }

        match key.code {
            KeyCode::Esc => {
                self.focus = Focus::List;
                self.status = Some("Back to list; draft kept until saved or reselected".into());
            }
            KeyCode::Tab => {
                self.edit_field = self.edit_field.next();
                self.cursor = self.field_buffer().len();
            }
            KeyCode::Enter => {
                if self.edit_field == EditField::Content {
                    let mut cursor = self.cursor;
                    editor::insert_newline(&mut self.state.edit.content, &mut cursor);
                    self.cursor = cursor;
                } else {
                    self.edit_field = self.edit_field.next();
                    self.cursor = self.field_buffer().len();
                }
            }
            KeyCode::Backspace => {
                let mut cursor = self.cursor;
                editor::backspace(self.field_buffer_mut(), &mut cursor);
                self.cursor = cursor;
            }
            KeyCode::Delete => {
                let mut cursor = self.cursor;
                editor::delete_forward(self.field_buffer_mut(), &mut cursor);
                self.cursor = cursor;
            }
            KeyCode::Left => {
                let mut cursor = self.cursor;
                editor::move_left(self.field_buffer(), &mut cursor);
                self.cursor = cursor;
            }
            KeyCode::Right => {
                let mut cursor = self.cursor;
                editor::move_right(self.field_buffer(), &mut cursor);
                self.cursor = cursor;
            }
            KeyCode::Up if self.edit_field == EditField::Content => {
                let mut cursor = self.cursor;
                editor::move_up(&self.state.edit.content, &mut cursor);
                self.cursor = cursor;
            }
            KeyCode::Down if self.edit_field == EditField::Content => {
                let mut cursor = self.cursor;
                editor::move_down(&self.state.edit.content, &mut cursor);
                self.cursor = cursor;
            }
            KeyCode::Home => {
                let mut cursor = self.cursor;
                editor::move_line_start(self.field_buffer(), &mut cursor);
                self.cursor = cursor;
            }
            KeyCode::End => {
                let mut cursor = self.cursor;
                editor::move_line_end(self.field_buffer(), &mut cursor);
                self.cursor = cursor;
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                let mut cursor = self.cursor;
                editor::insert_char(self.field_buffer_mut(), &mut cursor, ch);
                self.cursor = cursor;
            }
            _ => {}
        }
    }

    fn enter_editor(&mut self, field: EditField) {
        self.focus = Focus::Editor;
        self.edit_field = field;
        self.cursor = self.field_buffer().len();
    }

    fn field_buffer(&self) -> &String {
        match self.edit_field {
            EditField::Title => &self.state.edit.title,
            EditField::Tags => &self.state.edit.tags_input,
            EditField::Content => &self.state.edit.content,
        }
    }

    fn field_buffer_mut(&mut self) -> &mut String {
        match self.edit_field {
            EditField::Title => &mut self.state.edit.title,
            EditField::Tags => &mut self.state.edit.tags_input,
            EditField::Content => &mut self.state.edit.content,
        }
    }

    /// Move the selection within the currently visible (tag-filtered) list.
    fn move_selection(&mut self, delta: isize) {
        let visible: Vec<i64> =
            views::visible_notes(&self.state.notes, self.state.active_tag.as_deref())
                .iter()
                .map(|note| note.id)
                .collect();
        if visible.is_empty() {
            return;
        }
        let next = match self
            .state
            .selected_id
            .and_then(|id| visible.iter().position(|&v| v == id))
        {
            Some(current) => {
                (current as isize + delta).clamp(0, visible.len() as isize - 1) as usize
            }
            None => 0,
        };
        self.state.select(visible[next]);
    }

    fn cycle_tag_filter(&mut self) {
        let universe = views::tag_universe(&self.state.notes);
        if universe.is_empty() {
            self.status = Some("No tags on the current notes".into());
            return;
        }
        let next = match self.state.active_tag.as_deref() {
            None => Some(universe[0].clone()),
            Some(current) => match universe.iter().position(|tag| tag == current) {
                Some(idx) if idx + 1 < universe.len() => Some(universe[idx + 1].clone()),
                _ => None,
            },
        };
        self.status = match &next {
            Some(tag) => Some(format!("Filtering by tag '{tag}'")),
            None => Some("Tag filter cleared".into()),
        };
        self.state.set_active_tag(next);
    }

    fn report_outcome(&mut self, success: &str) {
        if let Some(err) = &self.state.error {
            tracing::error!(%err, "remote operation failed");
            self.status = None;
        } else if !success.is_empty() {
            self.status = Some(success.to_string());
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
