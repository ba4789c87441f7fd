#![allow(dead_code)]

use softinput_core::{
    BeginSessionInfo, Config, FieldKind, ImeHost, ReplaceJob, SessionController, SessionId,
    TextConsumer, WireBatch,
};

/// Records every call the controller makes on the platform side.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub focus_requests: usize,
    pub focus_releases: usize,
    pub selections: Vec<(usize, usize)>,
    pub anchors: Vec<(usize, usize)>,
}

impl ImeHost for RecordingHost {
    fn request_focus(&mut self) {
        self.focus_requests += 1;
    }

    fn release_focus(&mut self) {
        self.focus_releases += 1;
    }

    fn notify_selection_changed(&mut self, sel_start: usize, sel_end: usize) {
        self.selections.push((sel_start, sel_end));
    }

    fn update_cursor_anchor(&mut self, sel_start: usize, sel_end: usize) {
        self.anchors.push((sel_start, sel_end));
    }
}

/// Records batches and keeps a mirror of the text, the way an engine would.
#[derive(Debug, Default)]
pub struct RecordingConsumer {
    pub batches: Vec<(SessionId, WireBatch)>,
    pub opened: Vec<(SessionId, FieldKind)>,
    pub ended: Vec<SessionId>,
    pub mirror: String,
}

impl RecordingConsumer {
    /// Decoded jobs of batch `i`.
    pub fn jobs(&self, i: usize) -> Vec<ReplaceJob> {
        self.batches[i].1.decode().unwrap().into_jobs()
    }
}

impl TextConsumer for RecordingConsumer {
    fn deliver_edit_batch(&mut self, session: SessionId, batch: &WireBatch) {
        batch.apply_to(&mut self.mirror).unwrap();
        self.batches.push((session, batch.clone()));
    }

    fn notify_session_ended(&mut self, session: SessionId) {
        self.ended.push(session);
    }

    fn notify_session_opened(&mut self, session: SessionId, kind: FieldKind) {
        self.opened.push((session, kind));
    }
}

pub type Controller = SessionController<RecordingHost, RecordingConsumer>;

/// A controller with an open session on `text`.
pub fn open(kind: FieldKind, text: &str) -> Controller {
    open_with(Config::default(), kind, text)
}

pub fn open_with(config: Config, kind: FieldKind, text: &str) -> Controller {
    let consumer = RecordingConsumer {
        mirror: text.to_string(),
        ..RecordingConsumer::default()
    };
    let mut controller = SessionController::new(RecordingHost::default(), consumer, config);
    controller
        .begin_session(BeginSessionInfo::new(text, kind))
        .unwrap();
    controller
}

pub fn text(controller: &Controller) -> &str {
    controller.session().unwrap().text()
}

pub fn caret(controller: &Controller) -> usize {
    let selection = controller.session().unwrap().selection();
    assert!(selection.is_caret(), "expected a caret, got {selection:?}");
    selection.start
}
