//! Character-level diffing between in-memory content and disk content.
//!
//! When the linked file changes on disk outside the live session, the drift
//! is expressed as an ordinary edit - a skip/insert/delete step list that
//! transforms the in-memory content into the on-disk content - and fed
//! through the same mutation path as a network edit.

use std::time::Duration;

use similar::{ChangeTag, TextDiff};

use crate::op::EditStep;

/// Upper bound on diff computation; past it the diff degrades gracefully to
/// coarser (but still correct) steps.
const DIFF_TIMEOUT: Duration = Duration::from_secs(1);

/// Compute the edit steps that transform `old` into `new`.
///
/// Adjacent steps of the same kind are merged and a trailing skip is
/// dropped, so identical inputs yield an empty list. All counts are in
/// characters.
pub fn diff_ops(old: &str, new: &str) -> Vec<EditStep> {
    let mut config = TextDiff::configure();
    let diff = config.timeout(DIFF_TIMEOUT).diff_chars(old, new);

    let mut ops: Vec<EditStep> = Vec::new();
    for change in diff.iter_all_changes() {
        let chars = change.value().chars().count();
        match change.tag() {
            ChangeTag::Equal => match ops.last_mut() {
                Some(EditStep::Skip(n)) => *n += chars,
                _ => ops.push(EditStep::Skip(chars)),
            },
            ChangeTag::Delete => match ops.last_mut() {
                Some(EditStep::Delete(n)) => *n += chars,
                _ => ops.push(EditStep::Delete(chars)),
            },
            ChangeTag::Insert => match ops.last_mut() {
                Some(EditStep::Insert(text)) => text.push_str(change.value()),
                _ => ops.push(EditStep::Insert(change.value().to_string())),
            },
        }
    }

    if let Some(EditStep::Skip(_)) = ops.last() {
        ops.pop();
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;

    fn assert_round_trip(old: &str, new: &str) {
        let ops = diff_ops(old, new);
        let mut buffer = TextBuffer::from_text(old);
        let result = buffer.apply(&ops).unwrap();
        assert_eq!(result, new, "ops {:?} did not transform {:?} into {:?}", ops, old, new);
    }

    #[test]
    fn test_identical_content_yields_no_ops() {
        assert!(diff_ops("hello", "hello").is_empty());
        assert!(diff_ops("", "").is_empty());
    }

    #[test]
    fn test_pure_insertion() {
        let ops = diff_ops("hello", "hello world");
        assert_eq!(
            ops,
            vec![EditStep::Skip(5), EditStep::Insert(" world".to_string())]
        );
    }

    #[test]
    fn test_pure_deletion() {
        let ops = diff_ops("hello world", "hello");
        assert_eq!(ops, vec![EditStep::Skip(5), EditStep::Delete(6)]);
    }

    #[test]
    fn test_insert_into_empty() {
        let ops = diff_ops("", "fresh");
        assert_eq!(ops, vec![EditStep::Insert("fresh".to_string())]);
    }

    #[test]
    fn test_adjacent_changes_are_merged() {
        // Whatever shape the diff takes, no two adjacent steps may share a
        // kind.
        let ops = diff_ops("abcdef", "axydef");
        for pair in ops.windows(2) {
            let same = matches!(
                (&pair[0], &pair[1]),
                (EditStep::Skip(_), EditStep::Skip(_))
                    | (EditStep::Insert(_), EditStep::Insert(_))
                    | (EditStep::Delete(_), EditStep::Delete(_))
            );
            assert!(!same, "adjacent steps of the same kind: {:?}", ops);
        }
        assert_round_trip("abcdef", "axydef");
    }

    #[test]
    fn test_round_trip_replacement() {
        assert_round_trip("the quick brown fox", "the slow brown dog");
    }

    #[test]
    fn test_round_trip_multibyte() {
        assert_round_trip("héllo wörld", "héllo wörld!");
        assert_round_trip("naïve", "naive");
        assert_round_trip("日本語のテキスト", "日本語の長いテキスト");
    }

    #[test]
    fn test_round_trip_full_rewrite() {
        assert_round_trip("completely different", "nothing in common here");
    }

    #[test]
    fn test_no_trailing_skip() {
        let ops = diff_ops("hello world", "hello, world");
        assert!(!matches!(ops.last(), Some(EditStep::Skip(_))));
    }
}
