//! Per-session editing state.
//!
//! A `Session` bundles the edit buffer, the pending job queue and the field
//! kind for one editing interaction. It is owned by the
//! [`SessionController`](crate::SessionController) and never handed out
//! mutably to anyone else.

use serde::{Deserialize, Serialize};

use crate::edit_buffer::{EditBuffer, TextRange};
use crate::error::Result;
use crate::field_kind::{FieldKind, InputType};
use crate::host::SessionId;
use crate::job_queue::JobQueue;
use crate::Config;

/// Action key shown on the soft keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorAction {
    Unspecified,
    Go,
    Search,
    Send,
    Next,
    #[default]
    Done,
}

impl EditorAction {
    /// Android `EditorInfo.IME_ACTION_*` value.
    pub fn android_code(self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::Go => 2,
            Self::Search => 3,
            Self::Send => 4,
            Self::Next => 5,
            Self::Done => 6,
        }
    }

    pub fn from_android_code(code: i32) -> Self {
        match code {
            2 => Self::Go,
            3 => Self::Search,
            4 => Self::Send,
            5 => Self::Next,
            6 => Self::Done,
            _ => Self::Unspecified,
        }
    }
}

/// What the engine asks for when it opens a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginSessionInfo {
    pub text: String,
    pub field_kind: FieldKind,
    pub selection: TextRange,
}

impl BeginSessionInfo {
    /// Caret at the end of `text`.
    pub fn new(text: impl Into<String>, field_kind: FieldKind) -> Self {
        let text = text.into();
        let end = text.chars().count();
        Self {
            text,
            field_kind,
            selection: TextRange::caret(end),
        }
    }

    pub fn with_selection(mut self, selection: TextRange) -> Self {
        self.selection = selection;
        self
    }
}

/// Attributes reported to the IME when it connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorInfo {
    pub initial_sel_start: usize,
    pub initial_sel_end: usize,
    pub ime_action: EditorAction,
    pub input_type: InputType,
    pub hint_locale: String,
}

/// Snapshot of the whole text for IMEs that extract it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub selection_start: usize,
    pub selection_end: usize,
}

/// State of one open editing session.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    kind: FieldKind,
    pub(crate) buffer: EditBuffer,
    pub(crate) queue: JobQueue,
    pub(crate) pre_batch_selection: TextRange,
    initial_selection: TextRange,
}

impl Session {
    /// Create a session; the requested selection must fit the initial text.
    pub fn new(id: SessionId, info: BeginSessionInfo) -> Result<Self> {
        let mut buffer = EditBuffer::new(info.text);
        buffer.set_selection(info.selection)?;
        Ok(Self {
            id,
            kind: info.field_kind,
            pre_batch_selection: info.selection,
            initial_selection: info.selection,
            buffer,
            queue: JobQueue::new(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn field_kind(&self) -> FieldKind {
        self.kind
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn selection(&self) -> TextRange {
        self.buffer.selection()
    }

    pub fn composing(&self) -> Option<TextRange> {
        self.buffer.composing()
    }

    pub fn batch_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Jobs waiting for the outermost batch to close.
    pub fn pending_jobs(&self) -> &[crate::job_queue::ReplaceJob] {
        self.queue.pending()
    }

    /// The span a commit or compose replaces: the composing range when one
    /// is active, otherwise the selection.
    pub fn replace_target(&self) -> TextRange {
        self.buffer
            .composing()
            .unwrap_or_else(|| self.buffer.selection())
    }

    pub fn editor_info(&self, config: &Config) -> EditorInfo {
        EditorInfo {
            initial_sel_start: self.initial_selection.start,
            initial_sel_end: self.initial_selection.end(),
            ime_action: config.ime_action,
            input_type: self.kind.input_type(),
            hint_locale: config.hint_locale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;

    #[test]
    fn test_begin_info_defaults_to_caret_at_end() {
        let info = BeginSessionInfo::new("12.5", FieldKind::Float);
        assert_eq!(info.selection, TextRange::caret(4));
    }

    #[test]
    fn test_new_session_rejects_bad_selection() {
        let info = BeginSessionInfo::new("ab", FieldKind::Text).with_selection(TextRange::new(1, 5));
        let err = Session::new(SessionId(1), info).unwrap_err();
        assert!(matches!(err, SessionError::Range { .. }));
    }

    #[test]
    fn test_replace_target_prefers_composing() {
        let mut session = Session::new(SessionId(1), BeginSessionInfo::new("hello", FieldKind::Text)).unwrap();
        assert_eq!(session.replace_target(), TextRange::caret(5));
        session.buffer.set_composing(Some(TextRange::new(1, 3))).unwrap();
        assert_eq!(session.replace_target(), TextRange::new(1, 3));
    }

    #[test]
    fn test_editor_info() {
        let session = Session::new(
            SessionId(3),
            BeginSessionInfo::new("42", FieldKind::UnsignedInteger),
        )
        .unwrap();
        let info = session.editor_info(&Config::default());
        assert_eq!(info.initial_sel_start, 2);
        assert_eq!(info.initial_sel_end, 2);
        assert_eq!(info.ime_action, EditorAction::Done);
        assert_eq!(info.input_type, InputType::UnsignedNumber);
        assert_eq!(info.hint_locale, "en");
    }

    #[test]
    fn test_editor_action_codes() {
        assert_eq!(EditorAction::Done.android_code(), 6);
        assert_eq!(EditorAction::from_android_code(5), EditorAction::Next);
        assert_eq!(EditorAction::from_android_code(99), EditorAction::Unspecified);
    }
}
