//! Error taxonomy for text input sessions.
//!
//! Filter rejections are not errors: they are reported through
//! [`EditOutcome::Rejected`] because an IME routinely offers characters a
//! numeric field cannot take.

use thiserror::Error;

/// Errors surfaced by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// An index pair fell outside the buffer.
    #[error("{what} out of range: start {start}, count {count}, buffer length {len}")]
    Range {
        what: &'static str,
        start: i64,
        count: i64,
        len: usize,
    },

    /// The IME asked for something this engine does not implement.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// An operation arrived while no session was open.
    #[error("no text input session is open")]
    NoSession,

    /// A field kind value from the other side of the boundary was not recognised.
    #[error("invalid field kind value {0}")]
    InvalidFieldKind(i32),

    /// A wire batch referenced text outside its blob or carried negative values.
    #[error("malformed edit batch: {0}")]
    MalformedBatch(String),
}

impl SessionError {
    pub(crate) fn range(what: &'static str, start: i64, count: i64, len: usize) -> Self {
        Self::Range {
            what,
            start,
            count,
            len,
        }
    }
}

/// Result of an edit operation that reached the buffer logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The buffer (or composing/selection state) changed.
    Applied,
    /// The filter dropped every character of a non-empty candidate.
    Rejected,
    /// Nothing to do, e.g. delete at position 0.
    Unchanged,
}

pub type Result<T> = std::result::Result<T, SessionError>;
