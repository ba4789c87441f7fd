//! Edit buffer with selection and composing range tracking.
//!
//! Positions and counts are in characters (Unicode scalar values), which is
//! what the IME and the engine agree on. The text is stored as UTF-8 and
//! converted to byte offsets only at the edges.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::job_queue::ReplaceJob;

/// A `(start, count)` span of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub count: usize,
}

impl TextRange {
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    /// A zero-length range.
    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            count: 0,
        }
    }

    /// Build from `start..end`; `end` must not precede `start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            start,
            count: end - start,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.count
    }

    pub fn is_caret(&self) -> bool {
        self.count == 0
    }

    /// Where this range ends up after `edit` is applied, or `None` when the
    /// edit removed all of it.
    ///
    /// A range starting at or after the end of the removed span shifts by the
    /// length difference. A range that overlaps the removed span keeps its
    /// surviving parts; when the edit sits strictly inside the range the
    /// inserted text becomes part of it.
    pub fn translate(&self, edit: &ReplaceJob) -> Option<TextRange> {
        let edit_start = edit.start;
        let edit_end = edit.start + edit.removed;
        let inserted = edit.inserted_len();

        if self.start >= edit_end {
            return Some(TextRange::new(self.start - edit.removed + inserted, self.count));
        }
        if self.end() <= edit_start {
            return Some(*self);
        }
        if self.start >= edit_start && self.end() <= edit_end {
            return None;
        }

        let before = edit_start.saturating_sub(self.start);
        let after = self.end().saturating_sub(edit_end);
        if self.start <= edit_start && edit_end <= self.end() {
            return Some(TextRange::new(self.start, before + after + inserted));
        }
        if self.start < edit_start {
            // Tail removed.
            return Some(TextRange::new(self.start, before));
        }
        // Head removed; the surviving tail follows the inserted text.
        Some(TextRange::new(edit_start + inserted, after))
    }
}

/// Text plus selection and optional composing range.
///
/// Invariants: `selection.end() <= len()` and, when present,
/// `composing.end() <= len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    len: usize,
    selection: TextRange,
    composing: Option<TextRange>,
    version: u64,
}

impl EditBuffer {
    /// Create a buffer with the caret at the end of `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            text,
            len,
            selection: TextRange::caret(len),
            composing: None,
            version: 0,
        }
    }

    /// Get the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn selection(&self) -> TextRange {
        self.selection
    }

    pub fn composing(&self) -> Option<TextRange> {
        self.composing
    }

    /// Bumped on every text change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Validate a span against the current length.
    pub fn check_range(&self, what: &'static str, range: TextRange) -> Result<()> {
        if range.end() > self.len {
            return Err(SessionError::range(
                what,
                range.start as i64,
                range.count as i64,
                self.len,
            ));
        }
        Ok(())
    }

    /// Intersect a possibly out-of-range `(start, count)` span with the buffer.
    pub fn clamp_range(&self, start: i64, count: i64) -> TextRange {
        let len = self.len as i64;
        let end = start.saturating_add(count);
        let start = start.clamp(0, len);
        let end = end.clamp(start, len);
        TextRange::from_bounds(start as usize, end as usize)
    }

    /// Replace `removed` chars at `start` with `inserted`.
    ///
    /// Selection and composing range are translated through the edit; callers
    /// that position the caret explicitly do so afterwards.
    pub fn replace(&mut self, start: usize, removed: usize, inserted: &str) -> Result<ReplaceJob> {
        self.check_range("replace range", TextRange::new(start, removed))?;

        let job = ReplaceJob::new(start, removed, inserted);
        let from = self.byte_offset(start);
        let to = self.byte_offset(start + removed);
        self.text.replace_range(from..to, inserted);
        self.len = self.len - removed + job.inserted_len();
        self.version += 1;

        self.composing = self.composing.and_then(|c| c.translate(&job));
        self.selection = self
            .selection
            .translate(&job)
            .unwrap_or_else(|| TextRange::caret(start + job.inserted_len()));

        Ok(job)
    }

    /// Set the selection; fails when it reaches past the end.
    pub fn set_selection(&mut self, selection: TextRange) -> Result<()> {
        self.check_range("selection", selection)?;
        self.selection = selection;
        Ok(())
    }

    /// Collapse the selection to a caret at `pos`, clamped into the buffer.
    pub fn set_caret(&mut self, pos: i64) {
        let pos = pos.clamp(0, self.len as i64) as usize;
        self.selection = TextRange::caret(pos);
    }

    /// Set or clear the composing range.
    pub fn set_composing(&mut self, composing: Option<TextRange>) -> Result<()> {
        if let Some(range) = composing {
            self.check_range("composing range", range)?;
        }
        self.composing = composing;
        Ok(())
    }

    pub fn clear_composing(&mut self) {
        self.composing = None;
    }

    /// Characters in `range`, clamped to the buffer.
    pub fn slice(&self, range: TextRange) -> &str {
        let start = range.start.min(self.len);
        let end = range.end().min(self.len);
        &self.text[self.byte_offset(start)..self.byte_offset(end)]
    }

    /// Byte offset of char position `pos` (clamped to the end).
    fn byte_offset(&self, pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(pos)
            .map_or(self.text.len(), |(i, _)| i)
    }
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_caret_at_end() {
        let buf = EditBuffer::new("héllo");
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.selection(), TextRange::caret(5));
        assert_eq!(buf.composing(), None);
        assert_eq!(buf.version(), 0);
    }

    #[test]
    fn test_replace_multibyte() {
        let mut buf = EditBuffer::new("你好世界");
        let job = buf.replace(1, 2, "ab").unwrap();
        assert_eq!(buf.text(), "你ab界");
        assert_eq!(job, ReplaceJob::new(1, 2, "ab"));
        assert_eq!(buf.version(), 1);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_replace_out_of_range() {
        let mut buf = EditBuffer::new("abc");
        let err = buf.replace(2, 2, "").unwrap_err();
        assert!(matches!(err, SessionError::Range { len: 3, .. }));
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.version(), 0);
    }

    #[test]
    fn test_caret_after_insert_shifts() {
        let mut buf = EditBuffer::new("abc");
        buf.set_caret(1);
        buf.replace(1, 0, "xy").unwrap();
        assert_eq!(buf.selection(), TextRange::caret(3));
        buf.replace(0, 1, "").unwrap();
        assert_eq!(buf.selection(), TextRange::caret(2));
    }

    #[test]
    fn test_composing_shift_and_clear() {
        let mut buf = EditBuffer::new("abcdef");
        buf.set_composing(Some(TextRange::new(3, 2))).unwrap();

        buf.replace(0, 1, "XY").unwrap();
        assert_eq!(buf.composing(), Some(TextRange::new(4, 2)));

        buf.replace(4, 2, "").unwrap();
        assert_eq!(buf.composing(), None);
    }

    #[test]
    fn test_composing_partial_overlap() {
        let mut buf = EditBuffer::new("abcde");
        buf.set_composing(Some(TextRange::new(2, 3))).unwrap();
        // Delete the last two composing chars.
        buf.replace(3, 2, "").unwrap();
        assert_eq!(buf.composing(), Some(TextRange::new(2, 1)));
    }

    #[test]
    fn test_composing_head_replaced_with_longer_text() {
        let mut buf = EditBuffer::new("abcdef");
        buf.set_composing(Some(TextRange::new(2, 3))).unwrap();
        buf.replace(1, 2, "XYZ").unwrap();
        assert_eq!(buf.text(), "aXYZdef");
        let composing = buf.composing().unwrap();
        assert_eq!(composing, TextRange::new(4, 2));
        assert_eq!(buf.slice(composing), "de");
    }

    #[test]
    fn test_translate_tail_replaced() {
        let range = TextRange::new(1, 3);
        let job = ReplaceJob::new(3, 2, "XYZ");
        assert_eq!(range.translate(&job), Some(TextRange::new(1, 2)));
    }

    #[test]
    fn test_translate_edit_inside_range() {
        let range = TextRange::new(1, 4);
        let job = ReplaceJob::new(2, 1, "xyz");
        assert_eq!(range.translate(&job), Some(TextRange::new(1, 6)));
    }

    #[test]
    fn test_set_caret_clamps() {
        let mut buf = EditBuffer::new("ab");
        buf.set_caret(-4);
        assert_eq!(buf.selection(), TextRange::caret(0));
        buf.set_caret(10);
        assert_eq!(buf.selection(), TextRange::caret(2));
    }

    #[test]
    fn test_clamp_range() {
        let buf = EditBuffer::new("abcd");
        assert_eq!(buf.clamp_range(-2, 3), TextRange::new(0, 1));
        assert_eq!(buf.clamp_range(3, 5), TextRange::new(3, 1));
        assert_eq!(buf.clamp_range(9, 1), TextRange::new(4, 0));
        assert_eq!(buf.clamp_range(2, -1), TextRange::new(2, 0));
    }

    #[test]
    fn test_slice() {
        let buf = EditBuffer::new("你好世界");
        assert_eq!(buf.slice(TextRange::new(1, 2)), "好世");
        assert_eq!(buf.slice(TextRange::new(3, 9)), "界");
    }
}
