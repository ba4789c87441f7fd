//! Replay scripts: a recorded sequence of IME calls against one session.
//!
//! ```json
//! {
//!   "field_kind": "float",
//!   "text": "1.5",
//!   "ops": [
//!     { "op": "set_selection", "start": 0, "end": 0 },
//!     { "op": "commit_text", "text": "-" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use softinput_core::{
    BeginSessionInfo, Config, EditOutcome, EditorAction, FieldKind, ImeHost, Key, KeyEvent,
    ReplaceJob, SessionController, SessionId, TextConsumer, TextRange, WireBatch,
};

fn default_cursor() -> i32 {
    1
}

/// One IME call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    SetComposingText {
        text: String,
        #[serde(default = "default_cursor")]
        new_cursor_pos: i32,
    },
    CommitText {
        text: String,
        #[serde(default = "default_cursor")]
        new_cursor_pos: i32,
    },
    SetComposingRegion {
        start: i64,
        end: i64,
    },
    FinishComposingText,
    DeleteSurroundingText {
        before: i64,
        #[serde(default)]
        after: i64,
    },
    SetSelection {
        start: i64,
        end: i64,
    },
    BeginBatchEdit,
    EndBatchEdit,
    Backspace,
    Key {
        ch: char,
    },
    EditorAction {
        #[serde(default)]
        action: EditorAction,
    },
    EndSession,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub field_kind: FieldKind,
    #[serde(default)]
    pub text: String,
    /// Initial `[start, end]`; caret at the end when absent
    #[serde(default)]
    pub selection: Option<[usize; 2]>,
    pub ops: Vec<Op>,
}

/// What came out of a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Replay {
    /// Per-op result, in script order
    pub outcomes: Vec<String>,
    /// Every flushed batch, decoded
    pub batches: Vec<Vec<ReplaceJob>>,
    /// Text as rebuilt from the batches alone
    pub mirror: String,
    /// Buffer text when the script ended, if the session is still open
    pub final_text: Option<String>,
    pub selection_notifications: Vec<(usize, usize)>,
    pub ended: bool,
}

/// Host without a keyboard; it only remembers what it was told.
#[derive(Debug, Default)]
struct HeadlessHost {
    selections: Vec<(usize, usize)>,
}

impl ImeHost for HeadlessHost {
    fn request_focus(&mut self) {
        debug!("focus requested");
    }

    fn release_focus(&mut self) {
        debug!("focus released");
    }

    fn notify_selection_changed(&mut self, sel_start: usize, sel_end: usize) {
        debug!(sel_start, sel_end, "selection changed");
        self.selections.push((sel_start, sel_end));
    }
}

#[derive(Debug, Default)]
struct CollectingConsumer {
    batches: Vec<Vec<ReplaceJob>>,
    mirror: String,
    ended: bool,
    error: Option<String>,
}

impl TextConsumer for CollectingConsumer {
    fn deliver_edit_batch(&mut self, session: SessionId, batch: &WireBatch) {
        info!(%session, jobs = batch.len(), "edit batch");
        if let Err(err) = batch.apply_to(&mut self.mirror) {
            self.error.get_or_insert(err.to_string());
        }
        match batch.decode() {
            Ok(batch) => self.batches.push(batch.into_jobs()),
            Err(err) => {
                self.error.get_or_insert(err.to_string());
            }
        }
    }

    fn notify_session_ended(&mut self, session: SessionId) {
        info!(%session, "session ended");
        self.ended = true;
    }

    fn notify_session_opened(&mut self, session: SessionId, kind: FieldKind) {
        info!(%session, ?kind, "session opened");
    }
}

type Controller = SessionController<HeadlessHost, CollectingConsumer>;

fn outcome(result: softinput_core::error::Result<EditOutcome>) -> String {
    match result {
        Ok(EditOutcome::Applied) => "applied".to_string(),
        Ok(EditOutcome::Rejected) => "rejected".to_string(),
        Ok(EditOutcome::Unchanged) => "unchanged".to_string(),
        Err(err) => format!("error: {err}"),
    }
}

fn run_op(controller: &mut Controller, op: &Op) -> String {
    match op {
        Op::SetComposingText {
            text,
            new_cursor_pos,
        } => outcome(controller.set_composing_text(text, *new_cursor_pos)),
        Op::CommitText {
            text,
            new_cursor_pos,
        } => outcome(controller.commit_text(text, *new_cursor_pos)),
        Op::SetComposingRegion { start, end } => {
            outcome(controller.set_composing_region(*start, *end))
        }
        Op::FinishComposingText => outcome(controller.finish_composing_text()),
        Op::DeleteSurroundingText { before, after } => {
            outcome(controller.delete_surrounding_text(*before, *after))
        }
        Op::SetSelection { start, end } => outcome(controller.set_selection(*start, *end)),
        Op::BeginBatchEdit => match controller.begin_batch_edit() {
            Ok(_) => "batch opened".to_string(),
            Err(err) => format!("error: {err}"),
        },
        Op::EndBatchEdit => match controller.end_batch_edit() {
            Ok(true) => "batch still open".to_string(),
            Ok(false) => "batch closed".to_string(),
            Err(err) => format!("error: {err}"),
        },
        Op::Backspace => outcome(controller.send_key_event(KeyEvent::down(Key::Backspace))),
        Op::Key { ch } => outcome(controller.send_key_event(KeyEvent::down(Key::Char(*ch)))),
        Op::EditorAction { action } => match controller.perform_editor_action(*action) {
            Ok(()) => "action sent".to_string(),
            Err(err) => format!("error: {err}"),
        },
        Op::EndSession => match controller.end_session() {
            Some(id) => format!("{id} closed"),
            None => "no session".to_string(),
        },
    }
}

/// Run `script` against a fresh controller.
pub fn replay(script: &Script, config: Config) -> anyhow::Result<Replay> {
    let consumer = CollectingConsumer {
        mirror: script.text.clone(),
        ..CollectingConsumer::default()
    };
    let mut controller = SessionController::new(HeadlessHost::default(), consumer, config);

    let mut info = BeginSessionInfo::new(script.text.clone(), script.field_kind);
    if let Some([start, end]) = script.selection {
        anyhow::ensure!(start <= end, "selection start {start} is after end {end}");
        info = info.with_selection(TextRange::from_bounds(start, end));
    }
    controller.begin_session(info)?;

    let mut outcomes = Vec::with_capacity(script.ops.len());
    for (i, op) in script.ops.iter().enumerate() {
        let result = run_op(&mut controller, op);
        debug!(step = i, ?op, result = result.as_str(), "op");
        outcomes.push(result);
    }

    let final_text = controller.session().map(|s| s.text().to_string());
    let consumer = controller.consumer();
    if let Some(err) = &consumer.error {
        anyhow::bail!("consumer could not apply a batch: {err}");
    }

    Ok(Replay {
        outcomes,
        batches: consumer.batches.clone(),
        mirror: consumer.mirror.clone(),
        final_text,
        selection_notifications: controller.host().selections.clone(),
        ended: consumer.ended,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Script {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        let script = parse(r#"{ "ops": [ { "op": "commit_text", "text": "x" } ] }"#);
        assert_eq!(script.field_kind, FieldKind::Text);
        assert_eq!(
            script.ops,
            vec![Op::CommitText {
                text: "x".to_string(),
                new_cursor_pos: 1
            }]
        );
    }

    #[test]
    fn test_replay_float_field() {
        let script = parse(
            r#"{
                "field_kind": "float",
                "text": "1.5",
                "ops": [
                    { "op": "commit_text", "text": ".2" },
                    { "op": "set_selection", "start": 0, "end": 0 },
                    { "op": "key", "ch": "-" },
                    { "op": "editor_action" }
                ]
            }"#,
        );
        let replay = replay(&script, Config::default()).unwrap();
        assert_eq!(
            replay.outcomes,
            vec!["applied", "applied", "applied", "action sent"]
        );
        assert_eq!(replay.final_text.as_deref(), Some("-1.52"));
        assert_eq!(replay.mirror, "-1.52");
        assert_eq!(replay.batches.len(), 2);
        assert_eq!(replay.selection_notifications, vec![(0, 0)]);
        assert!(replay.ended);
    }

    #[test]
    fn test_replay_batch_and_errors() {
        let script = parse(
            r#"{
                "text": "abc",
                "ops": [
                    { "op": "begin_batch_edit" },
                    { "op": "commit_text", "text": "d" },
                    { "op": "backspace" },
                    { "op": "end_batch_edit" },
                    { "op": "delete_surrounding_text", "before": 0, "after": 1 },
                    { "op": "end_session" },
                    { "op": "commit_text", "text": "x" }
                ]
            }"#,
        );
        let replay = replay(&script, Config::default()).unwrap();
        assert_eq!(replay.batches.len(), 1);
        assert_eq!(replay.batches[0].len(), 2);
        assert_eq!(replay.outcomes[3], "batch closed");
        assert!(replay.outcomes[4].starts_with("error: unsupported"));
        assert_eq!(replay.outcomes[6], "error: no text input session is open");
        assert_eq!(replay.final_text, None);
        assert_eq!(replay.mirror, "abc");
    }

    #[test]
    fn test_replay_rejects_reversed_selection() {
        let script = parse(r#"{ "text": "abc", "selection": [2, 1], "ops": [] }"#);
        assert!(replay(&script, Config::default()).is_err());
    }
}
