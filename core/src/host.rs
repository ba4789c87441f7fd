//! Capabilities the session engine talks to.
//!
//! [`ImeHost`] is the platform side (the view that owns the soft keyboard);
//! [`TextConsumer`] is the engine side that mirrors the text. Platform
//! adapters implement these; the controller never calls the platform
//! directly.

use serde::{Deserialize, Serialize};

use crate::field_kind::FieldKind;
use crate::wire::WireBatch;

/// Identifies one begin..end span of editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Platform collaborator owning the IME connection. Calls are fire-and-forget.
pub trait ImeHost {
    /// Bring up the soft keyboard for the focused field.
    fn request_focus(&mut self);

    /// Hide the soft keyboard and drop the input connection.
    fn release_focus(&mut self);

    /// Tell the IME where the selection is now (`end` is exclusive).
    fn notify_selection_changed(&mut self, sel_start: usize, sel_end: usize);

    /// Answer a cursor-anchor request. Hosts without anchor support ignore it.
    fn update_cursor_anchor(&mut self, _sel_start: usize, _sel_end: usize) {}
}

/// Engine-side consumer of edits.
pub trait TextConsumer {
    /// A flushed batch, to be applied in record order.
    fn deliver_edit_batch(&mut self, session: SessionId, batch: &WireBatch);

    /// The user finished editing (editor action), or the session was closed.
    fn notify_session_ended(&mut self, session: SessionId);

    /// Echo of the resolved field kind when a session opens.
    fn notify_session_opened(&mut self, session: SessionId, kind: FieldKind);
}
