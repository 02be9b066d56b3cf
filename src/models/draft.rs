//! The live text buffer of a composer

use serde::{Deserialize, Serialize};

/// Draft text plus cursor.
///
/// `cursor` is a byte offset into `text` and is kept on a char boundary by
/// every mutating method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Text buffer
    pub text: String,
    /// Cursor byte offset
    pub cursor: usize,
}

impl Draft {
    /// Create a draft with the cursor at the end
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    /// Replace the text, clamping the cursor
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.set_cursor(self.cursor);
    }

    /// Move the cursor, clamped to the text and snapped down to a char boundary
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = floor_char_boundary(&self.text, cursor);
    }

    /// Text before the cursor
    pub fn before(&self) -> &str {
        &self.text[..self.cursor]
    }

    /// Text from the cursor on
    pub fn after(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Insert text at the cursor and advance past it
    pub fn insert(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    /// Delete the char before the cursor
    pub fn backspace(&mut self) {
        if let Some(ch) = self.before().chars().next_back() {
            let start = self.cursor - ch.len_utf8();
            self.text.replace_range(start..self.cursor, "");
            self.cursor = start;
        }
    }

    /// Replace `range` with `replacement` and put the cursor right after it
    pub fn splice(&mut self, range: std::ops::Range<usize>, replacement: &str) {
        let start = floor_char_boundary(&self.text, range.start);
        let end = floor_char_boundary(&self.text, range.end).max(start);
        self.text.replace_range(start..end, replacement);
        self.cursor = start + replacement.len();
    }

    /// Append a block on its own line and move the cursor to the end
    pub fn append_line(&mut self, line: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.cursor = self.text.len();
    }

    /// Whether the text is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Empty the buffer
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Largest char boundary `<= index`, clamped to the string length
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
