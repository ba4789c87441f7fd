//! Session controller: turns IME operations into buffer edits and batches.
//!
//! The controller owns at most one open [`Session`]. Every operation filters
//! the candidate text, mutates the buffer, and pushes a replace job; the job
//! queue decides whether the job goes out now or when the outermost batch
//! edit closes.
//!
//! All methods run on the thread that owns the IME connection. There is no
//! locking because there is exactly one mutator.

use tracing::{debug, trace, warn};

use crate::edit_buffer::{EditBuffer, TextRange};
use crate::error::{EditOutcome, Result, SessionError};
use crate::filter::{is_rejection, FilterChain};
use crate::host::{ImeHost, SessionId, TextConsumer};
use crate::job_queue::EditBatch;
use crate::session::{BeginSessionInfo, EditorAction, EditorInfo, ExtractedText, Session};
use crate::wire::WireBatch;
use crate::{Config, RangePolicy};

/// Whether a key was pressed or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// Device-independent key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A key producing a printable character
    Char(char),
    /// Delete-backward (Android `KEYCODE_DEL`)
    Backspace,
    /// Anything else, by platform key code
    Other(u32),
}

/// Raw key event forwarded by the IME.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub key: Key,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self {
            action: KeyAction::Down,
            key,
        }
    }

    pub fn up(key: Key) -> Self {
        Self {
            action: KeyAction::Up,
            key,
        }
    }
}

/// Relative cursor rule applied after commit/compose.
///
/// A positive `new_cursor_pos` is relative to the last inserted character,
/// anything else to the selection start before the edit.
fn relative_caret(new_cursor_pos: i32, replace_start: usize, inserted: usize, old_sel_start: usize) -> i64 {
    let pos = i64::from(new_cursor_pos);
    if pos > 0 {
        let replace_end = replace_start as i64 + inserted as i64 - 1;
        replace_end + pos
    } else {
        old_sel_start as i64 + pos
    }
}

/// Hand a flushed batch to the consumer.
fn deliver<C: TextConsumer>(consumer: &mut C, config: &Config, session: &Session, batch: EditBatch) {
    if config.log_flushed_text {
        debug!(
            session = %session.id(),
            jobs = batch.len(),
            version = session.buffer().version(),
            text = session.text(),
            "flushing edit batch"
        );
    }
    consumer.deliver_edit_batch(session.id(), &WireBatch::from_batch(&batch));
}

/// Mediates between the IME host and the text consumer.
#[derive(Debug)]
pub struct SessionController<H: ImeHost, C: TextConsumer> {
    host: H,
    consumer: C,
    config: Config,
    session: Option<Session>,
    next_id: u64,
}

impl<H: ImeHost, C: TextConsumer> SessionController<H, C> {
    pub fn new(host: H, consumer: C, config: Config) -> Self {
        Self {
            host,
            consumer,
            config,
            session: None,
            next_id: 1,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The open session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    // ========== Lifecycle ==========

    /// Open a session. A session that is still open is ended first.
    pub fn begin_session(&mut self, info: BeginSessionInfo) -> Result<SessionId> {
        if self.session.is_some() {
            self.end_session();
        }

        let id = SessionId(self.next_id);
        let kind = info.field_kind;
        let session = match Session::new(id, info.clone()) {
            Ok(session) => session,
            Err(err) if self.config.range_policy == RangePolicy::Clamp => {
                warn!(%id, %err, "clamping initial selection");
                let probe = EditBuffer::new(info.text.clone());
                let selection =
                    probe.clamp_range(info.selection.start as i64, info.selection.count as i64);
                Session::new(id, info.with_selection(selection))?
            }
            Err(err) => return Err(err),
        };
        self.next_id += 1;

        debug!(%id, ?kind, len = session.buffer().len(), "begin text input session");
        self.session = Some(session);
        self.host.request_focus();
        self.consumer.notify_session_opened(id, kind);
        Ok(id)
    }

    /// Close the open session. Jobs still pending in an unclosed batch are
    /// delivered before the session goes away.
    pub fn end_session(&mut self) -> Option<SessionId> {
        let mut session = self.session.take()?;
        if let Some(batch) = session.queue.flush() {
            warn!(id = %session.id(), jobs = batch.len(), "session ended inside a batch edit");
            deliver(&mut self.consumer, &self.config, &session, batch);
        }
        debug!(id = %session.id(), "end text input session");
        self.host.release_focus();
        Some(session.id())
    }

    /// Editor action key (e.g. "done"). Signals the end of editing to the
    /// consumer; the platform tears the session down when focus leaves.
    pub fn perform_editor_action(&mut self, action: EditorAction) -> Result<()> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        debug!(id = %session.id(), ?action, "editor action");
        self.consumer.notify_session_ended(session.id());
        Ok(())
    }

    // ========== Text edits ==========

    /// Replace the composing range (or the selection) with `candidate` and
    /// mark the inserted text as composing.
    pub fn set_composing_text(&mut self, candidate: &str, new_cursor_pos: i32) -> Result<EditOutcome> {
        self.replace_with_candidate(candidate, new_cursor_pos, true)
    }

    /// Replace the composing range (or the selection) with `candidate` and
    /// finish composition.
    pub fn commit_text(&mut self, candidate: &str, new_cursor_pos: i32) -> Result<EditOutcome> {
        self.replace_with_candidate(candidate, new_cursor_pos, false)
    }

    fn replace_with_candidate(
        &mut self,
        candidate: &str,
        new_cursor_pos: i32,
        composing: bool,
    ) -> Result<EditOutcome> {
        let Self {
            consumer,
            config,
            session,
            ..
        } = self;
        let session = session.as_mut().ok_or(SessionError::NoSession)?;

        let target = session.replace_target();
        let old_sel_start = session.selection().start;
        let mut chain = FilterChain::for_kind(session.field_kind(), session.text());
        let filtered = chain.apply(target.start, target.count, candidate);
        if is_rejection(candidate, &filtered) {
            // The composing range is left as it was.
            debug!(id = %session.id(), kind = ?chain.kind(), candidate, "filter rejected edit");
            return Ok(EditOutcome::Rejected);
        }

        let job = session.buffer.replace(target.start, target.count, &filtered)?;
        let inserted = job.inserted_len();
        let new_composing = (composing && inserted > 0).then(|| TextRange::new(target.start, inserted));
        session.buffer.set_composing(new_composing)?;
        session
            .buffer
            .set_caret(relative_caret(new_cursor_pos, target.start, inserted, old_sel_start));

        trace!(
            id = %session.id(),
            start = job.start,
            removed = job.removed,
            text = job.text.as_str(),
            composing,
            "replace"
        );
        if let Some(batch) = session.queue.push(job) {
            deliver(consumer, config, session, batch);
        }
        Ok(EditOutcome::Applied)
    }

    /// Mark `start..end` of the existing text as the composing range.
    pub fn set_composing_region(&mut self, start: i64, end: i64) -> Result<EditOutcome> {
        let policy = self.config.range_policy;
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        let range = resolve_range(session, policy, "composing region", start, end.saturating_sub(start))?;
        let composing = (!range.is_caret()).then_some(range);
        session.buffer.set_composing(composing)?;
        Ok(EditOutcome::Applied)
    }

    /// Drop the composing range, keeping its text. Idempotent.
    pub fn finish_composing_text(&mut self) -> Result<EditOutcome> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        if session.composing().is_none() {
            return Ok(EditOutcome::Unchanged);
        }
        session.buffer.clear_composing();
        Ok(EditOutcome::Applied)
    }

    /// Delete `before` chars ahead of the selection start. Deleting after the
    /// selection is not supported.
    pub fn delete_surrounding_text(&mut self, before: i64, after: i64) -> Result<EditOutcome> {
        if after > 0 {
            return Err(SessionError::Unsupported("deleting text after the cursor"));
        }
        if before <= 0 {
            return Ok(EditOutcome::Unchanged);
        }

        let Self {
            consumer,
            config,
            session,
            ..
        } = self;
        let session = session.as_mut().ok_or(SessionError::NoSession)?;
        let sel_start = session.selection().start as i64;
        let range = resolve_range(
            session,
            config.range_policy,
            "delete range",
            sel_start.saturating_sub(before),
            before,
        )?;
        if range.count == 0 {
            return Ok(EditOutcome::Unchanged);
        }

        // Goes through the buffer's translation, so a composing range that
        // overlaps the deleted span shrinks instead of shifting whole.
        let job = session.buffer.replace(range.start, range.count, "")?;
        if let Some(batch) = session.queue.push(job) {
            deliver(consumer, config, session, batch);
        }
        Ok(EditOutcome::Applied)
    }

    /// Code-point variant of [`delete_surrounding_text`](Self::delete_surrounding_text).
    pub fn delete_surrounding_text_in_code_points(&mut self, _before: i64, _after: i64) -> Result<EditOutcome> {
        Err(SessionError::Unsupported("deleting surrounding text in code points"))
    }

    // ========== Selection and batches ==========

    /// Move the selection to `start..end`. The IME is told about the new
    /// selection only outside batch edits.
    pub fn set_selection(&mut self, start: i64, end: i64) -> Result<EditOutcome> {
        let Self {
            host,
            config,
            session,
            ..
        } = self;
        let session = session.as_mut().ok_or(SessionError::NoSession)?;
        let range = resolve_range(session, config.range_policy, "selection", start, end.saturating_sub(start))?;
        if range == session.selection() {
            return Ok(EditOutcome::Unchanged);
        }
        session.buffer.set_selection(range)?;
        if !session.queue.in_batch() {
            host.notify_selection_changed(range.start, range.end());
        }
        Ok(EditOutcome::Applied)
    }

    /// Open a batch edit. Always true: a batch is open afterwards.
    pub fn begin_batch_edit(&mut self) -> Result<bool> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        if session.queue.begin_batch() {
            session.pre_batch_selection = session.selection();
        }
        trace!(id = %session.id(), depth = session.batch_depth(), "begin batch edit");
        Ok(true)
    }

    /// Close one batch level. Returns whether a batch is still open.
    ///
    /// Closing the outermost level flushes every job pushed during the batch
    /// as one group, then reports the selection if it moved.
    pub fn end_batch_edit(&mut self) -> Result<bool> {
        let Self {
            host,
            consumer,
            config,
            session,
            ..
        } = self;
        let session = session.as_mut().ok_or(SessionError::NoSession)?;
        let Some((batch, still_open)) = session.queue.end_batch() else {
            warn!(id = %session.id(), "end batch edit without a matching begin");
            return Ok(false);
        };
        trace!(id = %session.id(), depth = session.batch_depth(), "end batch edit");
        if let Some(batch) = batch {
            deliver(consumer, config, session, batch);
        }
        if !still_open && session.selection() != session.pre_batch_selection {
            let selection = session.selection();
            host.notify_selection_changed(selection.start, selection.end());
        }
        Ok(still_open)
    }

    // ========== Keys ==========

    /// Handle a raw key event. The event is always consumed; the outcome says
    /// whether it changed anything.
    ///
    /// Numeric fields take printable keys as single-character commits.
    /// Backspace deletes the selection, or the character before the caret.
    pub fn send_key_event(&mut self, event: KeyEvent) -> Result<EditOutcome> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        if event.action != KeyAction::Down {
            return Ok(EditOutcome::Unchanged);
        }

        match event.key {
            Key::Char(ch) if session.field_kind().is_numeric() => {
                let mut buf = [0u8; 4];
                self.commit_text(ch.encode_utf8(&mut buf), 1)
            }
            Key::Backspace => self.delete_backward(),
            _ => Ok(EditOutcome::Unchanged),
        }
    }

    fn delete_backward(&mut self) -> Result<EditOutcome> {
        let Self {
            consumer,
            config,
            session,
            ..
        } = self;
        let session = session.as_mut().ok_or(SessionError::NoSession)?;
        let selection = session.selection();
        let range = if !selection.is_caret() {
            selection
        } else if selection.start > 0 {
            TextRange::new(selection.start - 1, 1)
        } else {
            return Ok(EditOutcome::Unchanged);
        };

        let job = session.buffer.replace(range.start, range.count, "")?;
        session.buffer.set_caret(range.start as i64);
        if let Some(batch) = session.queue.push(job) {
            deliver(consumer, config, session, batch);
        }
        Ok(EditOutcome::Applied)
    }

    // ========== Read-back queries ==========

    /// Up to `n` characters before the selection start.
    pub fn text_before_cursor(&self, n: usize) -> Result<String> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        let end = session.selection().start;
        let start = end.saturating_sub(n);
        Ok(session.buffer().slice(TextRange::from_bounds(start, end)).to_string())
    }

    /// Up to `n` characters after the selection end.
    pub fn text_after_cursor(&self, n: usize) -> Result<String> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        let start = session.selection().end();
        Ok(session.buffer().slice(TextRange::new(start, n)).to_string())
    }

    pub fn selected_text(&self) -> Result<String> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        Ok(session.buffer().slice(session.selection()).to_string())
    }

    pub fn extracted_text(&self) -> Result<ExtractedText> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        let selection = session.selection();
        Ok(ExtractedText {
            text: session.text().to_string(),
            selection_start: selection.start,
            selection_end: selection.end(),
        })
    }

    /// Answer a cursor-update request with the current selection.
    pub fn request_cursor_updates(&mut self) -> Result<bool> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        let selection = session.selection();
        self.host.update_cursor_anchor(selection.start, selection.end());
        Ok(true)
    }

    /// Attributes for the IME's connection.
    pub fn editor_info(&self) -> Result<EditorInfo> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        Ok(session.editor_info(&self.config))
    }

    // ========== Hooks this engine does not handle ==========

    pub fn commit_completion(&mut self, _text: &str) -> bool {
        false
    }

    pub fn commit_correction(&mut self, _old: &str, _new: &str) -> bool {
        false
    }

    pub fn perform_context_menu_action(&mut self, _id: i32) -> bool {
        false
    }

    pub fn commit_content(&mut self, _mime_type: &str) -> bool {
        false
    }
}

/// Check `(start, count)` against the session buffer, clamping it under the
/// `Clamp` policy.
fn resolve_range(
    session: &Session,
    policy: RangePolicy,
    what: &'static str,
    start: i64,
    count: i64,
) -> Result<TextRange> {
    let len = session.buffer().len();
    let in_bounds = start >= 0 && count >= 0 && start.saturating_add(count) <= len as i64;
    if in_bounds {
        return Ok(TextRange::new(start as usize, count as usize));
    }
    match policy {
        RangePolicy::Strict => Err(SessionError::range(what, start, count, len)),
        RangePolicy::Clamp => {
            let clamped = session.buffer().clamp_range(start, count);
            warn!(id = %session.id(), what, start, count, len, ?clamped, "clamping out-of-range indices");
            Ok(clamped)
        }
    }
}
