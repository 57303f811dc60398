//! Rope-backed text buffer with atomic edit application.
//!
//! The buffer owns the document's current character content. Edits are
//! applied to a working copy and committed only when every step has passed
//! its bounds check, so readers never observe a partially applied edit.

use ropey::Rope;

use crate::error::{CodocError, Result};
use crate::op::EditStep;

/// The document's current content.
///
/// All offsets and counts are in characters. Mutation happens exclusively
/// through [`TextBuffer::apply`] (edits) and [`TextBuffer::set_text`]
/// (link-time replacement).
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    contents: Rope,
}

impl TextBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding `text`.
    pub fn from_text(text: &str) -> Self {
        Self {
            contents: Rope::from_str(text),
        }
    }

    /// Replace the entire content, e.g. when linking a file.
    pub fn set_text(&mut self, text: &str) {
        self.contents = Rope::from_str(text);
    }

    /// The full content as a string.
    pub fn text(&self) -> String {
        self.contents.to_string()
    }

    /// Content length in characters.
    pub fn len_chars(&self) -> usize {
        self.contents.len_chars()
    }

    /// Apply an ordered list of edit steps atomically.
    ///
    /// Steps walk a single cursor, starting at character offset 0: `skip`
    /// advances it, `insert` splices text at it, `delete` removes characters
    /// at it. A `skip` or `delete` that would move past the end of the
    /// content fails the whole edit; the live content is only replaced once
    /// every step has applied, so a failed edit leaves the buffer untouched.
    ///
    /// On success, returns the new content for checksum computation.
    pub fn apply(&mut self, ops: &[EditStep]) -> Result<String> {
        let mut work = self.contents.clone();
        let mut cursor = 0usize;

        for op in ops {
            match op {
                EditStep::Skip(n) => {
                    if cursor + n > work.len_chars() {
                        return Err(CodocError::EditOutOfBounds {
                            op: "skip",
                            at: cursor + n,
                            len: work.len_chars(),
                        });
                    }
                    cursor += n;
                }
                EditStep::Insert(text) => {
                    work.insert(cursor, text);
                    cursor += text.chars().count();
                }
                EditStep::Delete(n) => {
                    if cursor + n > work.len_chars() {
                        return Err(CodocError::EditOutOfBounds {
                            op: "delete",
                            at: cursor + n,
                            len: work.len_chars(),
                        });
                    }
                    work.remove(cursor..cursor + n);
                }
            }
        }

        self.contents = work;
        Ok(self.contents.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = TextBuffer::new();
        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.len_chars(), 0);
    }

    #[test]
    fn test_insert_into_empty() {
        let mut buffer = TextBuffer::new();
        let result = buffer
            .apply(&[EditStep::Insert("hello".to_string())])
            .unwrap();
        assert_eq!(result, "hello");
        assert_eq!(buffer.text(), "hello");
    }

    #[test]
    fn test_skip_insert_skip() {
        let mut buffer = TextBuffer::from_text("abc");
        let result = buffer
            .apply(&[
                EditStep::Skip(1),
                EditStep::Insert("X".to_string()),
                EditStep::Skip(2),
            ])
            .unwrap();
        assert_eq!(result, "aXbc");
    }

    #[test]
    fn test_delete_range() {
        let mut buffer = TextBuffer::from_text("hello world");
        buffer
            .apply(&[EditStep::Skip(5), EditStep::Delete(6)])
            .unwrap();
        assert_eq!(buffer.text(), "hello");
    }

    #[test]
    fn test_delete_then_insert() {
        let mut buffer = TextBuffer::from_text("hello world");
        buffer
            .apply(&[
                EditStep::Skip(6),
                EditStep::Delete(5),
                EditStep::Insert("codoc".to_string()),
            ])
            .unwrap();
        assert_eq!(buffer.text(), "hello codoc");
    }

    #[test]
    fn test_skip_past_bounds_fails() {
        let mut buffer = TextBuffer::from_text("abc");
        let err = buffer.apply(&[EditStep::Skip(10)]).unwrap_err();
        assert!(matches!(
            err,
            CodocError::EditOutOfBounds { op: "skip", at: 10, len: 3 }
        ));
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_delete_past_bounds_fails() {
        let mut buffer = TextBuffer::from_text("abc");
        let err = buffer
            .apply(&[EditStep::Skip(2), EditStep::Delete(2)])
            .unwrap_err();
        assert!(matches!(err, CodocError::EditOutOfBounds { op: "delete", .. }));
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_failed_edit_discards_earlier_steps() {
        // The first two steps are valid; the final skip is not. Nothing may
        // be committed.
        let mut buffer = TextBuffer::from_text("abc");
        let err = buffer
            .apply(&[
                EditStep::Skip(1),
                EditStep::Insert("X".to_string()),
                EditStep::Skip(100),
            ])
            .unwrap_err();
        assert!(matches!(err, CodocError::EditOutOfBounds { .. }));
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_offsets_are_char_based() {
        let mut buffer = TextBuffer::from_text("héllo wörld");
        assert_eq!(buffer.len_chars(), 11);

        buffer
            .apply(&[
                EditStep::Skip(1),
                EditStep::Delete(1),
                EditStep::Insert("ê".to_string()),
            ])
            .unwrap();
        assert_eq!(buffer.text(), "hêllo wörld");

        // A skip to exactly the end is in bounds.
        buffer.apply(&[EditStep::Skip(11)]).unwrap();
    }

    #[test]
    fn test_empty_edit_is_a_noop() {
        let mut buffer = TextBuffer::from_text("abc");
        let result = buffer.apply(&[]).unwrap();
        assert_eq!(result, "abc");
    }
}
