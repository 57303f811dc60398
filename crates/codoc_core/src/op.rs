//! Edit steps, authorship and content checksums.
//!
//! An edit is an ordered list of [`EditStep`]s applied left-to-right against
//! a single running character offset. Every accepted edit is recorded in the
//! history log together with a CRC32 of the content it produced, which lets
//! a receiver detect desync without re-transmitting the full document.

use serde::{Deserialize, Serialize};

/// User id recorded when the acting session is unknown.
///
/// Reconciled filesystem edits carry this sentinel: downstream consumers must
/// treat it as "system/external", never as a real user.
pub const UNKNOWN_USER_ID: u32 = 0;

/// User id recorded on the synthetic history entry written at link time.
pub const SYSTEM_USER_ID: u32 = 1;

/// Fixed user id attributed to agent-authored edits.
pub const GHOSTWRITER_USER_ID: u32 = 2;

/// A single component of an edit.
///
/// Serialized in its wire shape: `{"skip": 3}`, `{"insert": "text"}`,
/// `{"delete": 2}`. Counts are in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditStep {
    /// Advance the cursor by `n` characters without changing content.
    Skip(usize),
    /// Splice text in at the cursor and advance past it.
    Insert(String),
    /// Remove `n` characters at the cursor.
    Delete(usize),
}

/// Provenance of an edit, distinguishing human sessions from automated
/// agents. Affects which user id the edit is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Author {
    /// Edit originated from a human editing session.
    User,
    /// Edit originated from an automated agent.
    Ghostwriter,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Author::User => write!(f, "user"),
            Author::Ghostwriter => write!(f, "ghostwriter"),
        }
    }
}

impl std::str::FromStr for Author {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Author::User),
            "ghostwriter" => Ok(Author::Ghostwriter),
            _ => Err(format!("Unknown author: {}", s)),
        }
    }
}

/// CRC32 of the document content bytes.
///
/// Fast integrity hash appended to every history entry, used by receivers to
/// detect desync without a full content transfer.
pub fn checksum(contents: &str) -> u32 {
    crc32fast::hash(contents.as_bytes())
}
