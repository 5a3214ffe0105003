// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{Runes, runes_width};

/// What the completion engine needs from the buffer that holds the line being edited.
pub trait LineBuffer {
    /// The whole line.
    fn runes(&self) -> Runes;

    /// Insert at the cursor, and move the cursor past the inserted runes.
    fn write_runes(&mut self, runes: &[char]);

    /// Cursor position, in runes from the start of the line.
    fn cursor_offset(&self) -> usize;

    /// Display width of the prompt, in columns.
    fn prompt_display_width(&self) -> usize;

    /// How many screen rows the line occupies from the cursor's row to its last row,
    /// counting the cursor's row.
    fn cursor_line_count(&self) -> usize;

    /// The (at most) `n` runes right before the cursor.
    fn slice_before_cursor(&self, n: usize) -> Runes;
}

/// An in-memory [`LineBuffer`] that wraps at a fixed screen width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuneLineBuffer {
    pub prompt: String,
    pub buf: Runes,
    pub cursor: usize,
    pub screen_width: usize,
}

impl RuneLineBuffer {
    #[must_use]
    pub fn new(prompt: &str, screen_width: usize) -> Self {
        Self {
            prompt: prompt.to_string(),
            buf: Runes::new(),
            cursor: 0,
            screen_width,
        }
    }

    /// Replace the line and put the cursor at its end.
    pub fn set_line(&mut self, text: &str) {
        self.buf = text.chars().collect();
        self.cursor = self.buf.len();
    }

    pub fn set_cursor(&mut self, cursor: usize) { self.cursor = cursor.min(self.buf.len()); }

    #[must_use]
    pub fn line(&self) -> String { self.buf.iter().collect() }

    fn rows_for(&self, display_width: usize) -> usize {
        if self.screen_width == 0 {
            return 1;
        }
        display_width.div_ceil(self.screen_width)
    }
}

impl LineBuffer for RuneLineBuffer {
    fn runes(&self) -> Runes { self.buf.clone() }

    fn write_runes(&mut self, runes: &[char]) {
        self.buf.splice(self.cursor..self.cursor, runes.iter().copied());
        self.cursor += runes.len();
    }

    fn cursor_offset(&self) -> usize { self.cursor }

    fn prompt_display_width(&self) -> usize { runes_width(&self.prompt.chars().collect::<Runes>()) }

    fn cursor_line_count(&self) -> usize {
        let prompt_width = self.prompt_display_width();
        let total_rows = self.rows_for(prompt_width + runes_width(&self.buf));
        let cursor_row = if self.cursor == 0 || self.screen_width == 0 {
            0
        } else {
            (prompt_width + runes_width(&self.buf[..self.cursor])) / self.screen_width
        };
        total_rows.saturating_sub(cursor_row).max(1)
    }

    fn slice_before_cursor(&self, n: usize) -> Runes {
        let start = self.cursor.saturating_sub(n);
        self.buf[start..self.cursor].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_runes_inserts_at_cursor() {
        let mut buf = RuneLineBuffer::new("> ", 80);
        buf.set_line("gt");
        buf.set_cursor(1);
        buf.write_runes(&['i']);
        assert_eq!(buf.line(), "git");
        assert_eq!(buf.cursor_offset(), 2);
    }

    #[test]
    fn test_slice_before_cursor_is_clamped() {
        let mut buf = RuneLineBuffer::new("", 80);
        buf.set_line("show");
        assert_eq!(buf.slice_before_cursor(2), vec!['o', 'w']);
        assert_eq!(buf.slice_before_cursor(10), vec!['s', 'h', 'o', 'w']);
        assert!(buf.slice_before_cursor(0).is_empty());
    }

    #[test]
    fn test_cursor_line_count_on_wrapped_line() {
        // Prompt (2) + 15 runes on a 10 column screen is 2 rows.
        let mut buf = RuneLineBuffer::new("> ", 10);
        buf.set_line("abcdefghijklmno");
        assert_eq!(buf.cursor_line_count(), 1);
        buf.set_cursor(3);
        assert_eq!(buf.cursor_line_count(), 2);
        assert_eq!(RuneLineBuffer::new("> ", 10).cursor_line_count(), 1);
    }
}
