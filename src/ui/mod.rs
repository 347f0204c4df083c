use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::app::state::ViewState;
use crate::app::{views, DeleteOverlay, EditField, Focus};
use crate::highlight::build_highlight_regex;
use crate::remote::Note;

/// Everything one frame needs, assembled by the app shell. The note refs in
/// `visible` point into the state snapshot.
pub struct AppView<'a> {
    pub state: &'a ViewState,
    pub visible: &'a [&'a Note],
    pub focus: Focus,
    pub edit_field: EditField,
    pub cursor: usize,
    pub overlay: Option<&'a DeleteOverlay>,
    pub status: Option<&'a str>,
    pub preview_lines: usize,
}

pub fn draw_app(frame: &mut Frame, view: &AppView, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(frame.size());

    draw_tag_bar(frame, view, vertical[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(vertical[1]);

    draw_note_list(frame, view, columns[0], list_state);
    draw_edit_pane(frame, view, columns[1]);
    draw_status_bar(frame, view, vertical[2]);

    if let Some(overlay) = view.overlay {
        draw_delete_overlay(frame, overlay);
    }
}

fn draw_tag_bar(frame: &mut Frame, view: &AppView, area: Rect) {
    let universe = views::tag_universe(&view.state.notes);
    let mut spans = vec![Span::styled("Tags ", Style::default().fg(Color::Gray))];
    if universe.is_empty() {
        spans.push(Span::styled(
            "(none)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    for tag in &universe {
        let active = view.state.active_tag.as_deref() == Some(tag.as_str());
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(format!(" {tag} "), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_note_list(frame: &mut Frame, view: &AppView, area: Rect, list_state: &mut ListState) {
    let block_style = if matches!(view.focus, Focus::List) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let highlight_regex = build_highlight_regex(&view.state.search_query);
    let highlight_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut items = Vec::with_capacity(view.visible.len());
    for note in view.visible {
        let mut lines = Vec::new();
        let mut title_spans = highlight_line(
            title_or_placeholder(note),
            highlight_regex.as_ref(),
            highlight_style,
            Style::default().add_modifier(Modifier::BOLD),
        );
        if !note.tags.is_empty() {
            title_spans.push(Span::styled(
                format!("  [{}]", note.tags.join(", ")),
                Style::default().fg(Color::Cyan),
            ));
        }
        lines.push(Line::from(title_spans));
        lines.push(Line::from(Span::styled(
            format!("Updated {}", timestamp_label(note)),
            Style::default().fg(Color::Gray),
        )));
        for preview_line in preview(&note.content, view.preview_lines) {
            lines.push(Line::from(highlight_line_owned(
                preview_line,
                highlight_regex.as_ref(),
                highlight_style,
                Style::default().fg(Color::DarkGray),
            )));
        }
        items.push(ListItem::new(lines));
    }

    let title = if view.state.search_query.trim().is_empty() {
        format!("Notes ({})", view.visible.len())
    } else {
        format!(
            "Notes ({}) — search: {}",
            view.visible.len(),
            view.state.search_query
        )
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(block_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(40, 40, 60))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▌ ");

    frame.render_stateful_widget(list, area, list_state);
}

fn draw_edit_pane(frame: &mut Frame, view: &AppView, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(area);

    draw_field(
        frame,
        view,
        rows[0],
        EditField::Title,
        &view.state.edit.title,
    );
    draw_field(
        frame,
        view,
        rows[1],
        EditField::Tags,
        &view.state.edit.tags_input,
    );
    draw_content_field(frame, view, rows[2]);
}

fn field_block(view: &AppView, field: EditField) -> Block<'static> {
    let focused = matches!(view.focus, Focus::Editor) && view.edit_field == field;
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .title(field.label())
        .style(style)
}

fn draw_field(frame: &mut Frame, view: &AppView, area: Rect, field: EditField, value: &str) {
    frame.render_widget(Paragraph::new(value).block(field_block(view, field)), area);
    if matches!(view.focus, Focus::Editor) && view.edit_field == field {
        let offset = view.cursor.min(value.len());
        let x = area.x + 1 + value[..offset].width() as u16;
        frame.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1);
    }
}

fn draw_content_field(frame: &mut Frame, view: &AppView, area: Rect) {
    let content = &view.state.edit.content;
    frame.render_widget(
        Paragraph::new(content.as_str())
            .block(field_block(view, EditField::Content))
            .wrap(Wrap { trim: false }),
        area,
    );
    if matches!(view.focus, Focus::Editor) && view.edit_field == EditField::Content {
        let offset = view.cursor.min(content.len());
        let before = &content[..offset];
        let row = before.matches('\n').count() as u16;
        let column = before.rsplit('\n').next().unwrap_or("").width() as u16;
        let x = (area.x + 1 + column).min(area.right().saturating_sub(2));
        let y = (area.y + 1 + row).min(area.bottom().saturating_sub(2));
        frame.set_cursor(x, y);
    }
}

fn draw_status_bar(frame: &mut Frame, view: &AppView, area: Rect) {
    let first = if let Some(error) = view.state.error.as_deref() {
        Line::from(Span::styled(
            format!("✗ {error}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    } else if let Some(status) = view.status {
        Line::from(Span::styled(status, Style::default().fg(Color::Gray)))
    } else {
        Line::from(Span::raw(""))
    };

    let mut indicators = Vec::new();
    if view.state.loading {
        indicators.push(Span::styled(
            "⟳ loading  ",
            Style::default().fg(Color::Yellow),
        ));
    }
    if view.state.busy {
        indicators.push(Span::styled(
            "… working  ",
            Style::default().fg(Color::Yellow),
        ));
    }
    if matches!(view.focus, Focus::Search) {
        indicators.push(Span::styled(
            format!("/{}", view.state.search_query),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(tag) = view.state.active_tag.as_deref() {
        indicators.push(Span::styled(
            format!("  tag:{tag}"),
            Style::default().fg(Color::Cyan),
        ));
    }
    let second = Line::from(indicators);

    frame.render_widget(Paragraph::new(vec![first, second]), area);
}

fn draw_delete_overlay(frame: &mut Frame, overlay: &DeleteOverlay) {
    let area = centered_rect(frame.size(), 50, 5);
    frame.render_widget(Clear, area);
    let title = if overlay.title.is_empty() {
        format!("note #{}", overlay.note_id)
    } else {
        format!("\"{}\"", overlay.title)
    };
    let body = vec![
        Line::from(Span::raw(format!("Delete {title}?"))),
        Line::from(Span::styled(
            "Enter confirm • Esc cancel",
            Style::default().fg(Color::Gray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(body).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm delete")
                .style(Style::default().fg(Color::Red)),
        ),
        area,
    );
}

fn centered_rect(outer: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);
    Rect {
        x: outer.x + (outer.width - width) / 2,
        y: outer.y + (outer.height - height) / 2,
        width,
        height,
    }
}

fn title_or_placeholder(note: &Note) -> &str {
    if note.title.trim().is_empty() {
        "(untitled)"
    } else {
        &note.title
    }
}

fn timestamp_label(note: &Note) -> &str {
    let stamp = note.effective_timestamp();
    if stamp.is_empty() {
        "—"
    } else {
        stamp
    }
}

/// First `limit` non-empty lines of the content, with an ellipsis marker
/// when more follow.
fn preview(content: &str, limit: usize) -> Vec<String> {
    if limit == 0 {
        return Vec::new();
    }
    let mut lines: Vec<String> = Vec::with_capacity(limit);
    let mut rest = false;
    for line in content.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        if lines.len() == limit {
            rest = true;
            break;
        }
        lines.push(trimmed.to_string());
    }
    if rest {
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    lines
}

fn highlight_line<'a>(
    text: &'a str,
    regex: Option<&Regex>,
    highlight: Style,
    base: Style,
) -> Vec<Span<'a>> {
    let Some(regex) = regex else {
        return vec![Span::styled(text, base)];
    };
    let mut spans = Vec::new();
    let mut last = 0;
    for hit in regex.find_iter(text) {
        if hit.start() > last {
            spans.push(Span::styled(&text[last..hit.start()], base));
        }
        spans.push(Span::styled(hit.as_str(), highlight));
        last = hit.end();
    }
    if last < text.len() {
        spans.push(Span::styled(&text[last..], base));
    }
    if spans.is_empty() {
        spans.push(Span::styled(text, base));
    }
    spans
}

fn highlight_line_owned(
    text: String,
    regex: Option<&Regex>,
    highlight: Style,
    base: Style,
) -> Vec<Span<'static>> {
    highlight_line(&text, regex, highlight, base)
        .into_iter()
        .map(|span| Span::styled(span.content.into_owned(), span.style))
        .collect()
}
