//! Cursor-and-keystroke editing over the draft fields. The buffer text
//! itself lives in [`crate::app::state::EditBuffer`]; this module only
//! manipulates a `String` plus a byte offset, keeping the offset on
//! grapheme boundaries so multi-byte input behaves.

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Tags,
    Content,
}

impl EditField {
    pub fn next(self) -> Self {
        match self {
            EditField::Title => EditField::Tags,
            EditField::Tags => EditField::Content,
            EditField::Content => EditField::Title,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EditField::Title => "Title",
            EditField::Tags => "Tags",
            EditField::Content => "Content",
        }
    }
}

pub fn insert_char(buffer: &mut String, cursor: &mut usize, ch: char) {
    let mut scratch = [0u8; 4];
    let encoded = ch.encode_utf8(&mut scratch);
    buffer.insert_str(*cursor, encoded);
    *cursor += encoded.len();
}

pub fn insert_newline(buffer: &mut String, cursor: &mut usize) {
    buffer.insert(*cursor, '\n');
    *cursor += 1;
}

pub fn backspace(buffer: &mut String, cursor: &mut usize) -> bool {
    if *cursor == 0 {
        return false;
    }
    let prev = prev_grapheme_boundary(buffer, *cursor);
    buffer.drain(prev..*cursor);
    *cursor = prev;
    true
}

pub fn delete_forward(buffer: &mut String, cursor: &mut usize) -> bool {
    if *cursor >= buffer.len() {
        return false;
    }
    let next = next_grapheme_boundary(buffer, *cursor);
    if next == *cursor {
        return false;
    }
    buffer.drain(*cursor..next);
    true
}

pub fn move_left(buffer: &str, cursor: &mut usize) {
    if *cursor > 0 {
        *cursor = prev_grapheme_boundary(buffer, *cursor);
    }
}

pub fn move_right(buffer: &str, cursor: &mut usize) {
    if *cursor < buffer.len() {
        *cursor = next_grapheme_boundary(buffer, *cursor);
    }
}

pub fn move_line_start(buffer: &str, cursor: &mut usize) {
    *cursor = line_start(buffer, *cursor);
}

pub fn move_line_end(buffer: &str, cursor: &mut usize) {
    *cursor = line_end(buffer, *cursor);
}

pub fn move_up(buffer: &str, cursor: &mut usize) {
    let current_start = line_start(buffer, *cursor);
    if current_start == 0 {
        *cursor = 0;
        return;
    }
    let column = column_at(buffer, current_start, *cursor);
    let prev_start = line_start(buffer, current_start - 1);
    *cursor = position_for_column(buffer, prev_start, column);
}

pub fn move_down(buffer: &str, cursor: &mut usize) {
    let current_end = line_end(buffer, *cursor);
    if current_end == buffer.len() {
        *cursor = buffer.len();
        return;
    }
    let column = column_at(buffer, line_start(buffer, *cursor), *cursor);
    *cursor = position_for_column(buffer, current_end + 1, column);
}

/// Clamp a possibly stale offset back onto a grapheme boundary inside the
/// buffer. Used after the buffer is replaced underneath the cursor.
pub fn clamp(buffer: &str, cursor: usize) -> usize {
    if cursor >= buffer.len() {
        return buffer.len();
    }
    let mut last = 0;
    for (idx, _) in buffer.grapheme_indices(true) {
        if idx > cursor {
            break;
        }
        last = idx;
    }
    last
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in text[..cursor].grapheme_indices(true) {
        last = idx;
    }
    last
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor >= text.len() {
        return text.len();
    }
    match text[cursor..].graphemes(true).next() {
        Some(grapheme) => cursor + grapheme.len(),
        None => text.len(),
    }
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

fn column_at(text: &str, line_start: usize, cursor: usize) -> usize {
    text[line_start..cursor].graphemes(true).count()
}

fn position_for_column(text: &str, line_start: usize, column: usize) -> usize {
    let line_end = line_end(text, line_start);
    let mut position = line_start;
    let mut count = 0;
    for grapheme in text[line_start..line_end].graphemes(true) {
        if count >= column {
            break;
        }
        position += grapheme.len();
        count += 1;
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_backspace_handle_multibyte_graphemes() {
        let mut buffer = String::from("naïve");
        let mut cursor = buffer.len();
        insert_char(&mut buffer, &mut cursor, '!');
        assert_eq!(buffer, "naïve!");
        assert!(backspace(&mut buffer, &mut cursor));
        assert!(backspace(&mut buffer, &mut cursor));
        assert_eq!(buffer, "naïv");
        assert_eq!(cursor, buffer.len());
    }

    #[test]
    fn backspace_at_start_is_a_no_op() {
        let mut buffer = String::from("abc");
        let mut cursor = 0;
        assert!(!backspace(&mut buffer, &mut cursor));
        assert_eq!(buffer, "abc");
    }

    #[test]
    fn vertical_movement_keeps_the_column_where_possible() {
        let buffer = String::from("first line\nsecond\nthird line");
        let mut cursor = 8; // inside "first line"
        move_down(&buffer, &mut cursor);
        // "second" is shorter than column 8, so the cursor lands at its end
        assert_eq!(&buffer[..cursor], "first line\nsecond");
        move_down(&buffer, &mut cursor);
        move_up(&buffer, &mut cursor);
        move_up(&buffer, &mut cursor);
        assert_eq!(line_start(&buffer, cursor), 0);
    }

    #[test]
    fn line_start_and_end_bracket_the_cursor_line() {
        let buffer = "alpha\nbeta\ngamma";
        let mut cursor = 7; // inside "beta"
        move_line_start(buffer, &mut cursor);
        assert_eq!(cursor, 6);
        move_line_end(buffer, &mut cursor);
        assert_eq!(cursor, 10);
    }

    #[test]
    fn clamp_recovers_from_a_shrunken_buffer() {
        assert_eq!(clamp("ab", 10), 2);
        assert_eq!(clamp("ab", 1), 1);
        assert_eq!(clamp("", 3), 0);
    }
}
