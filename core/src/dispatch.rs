//! Cross-thread dispatch between the engine (producer) thread and the thread
//! that owns the IME.
//!
//! The producer never touches a session directly. It sends typed
//! [`SessionCommand`]s that the UI thread drains in order at a point of its
//! choosing. Flushed edit batches and session notifications travel back as
//! [`ProducerEvent`]s. Both directions are fire-and-forget: nobody blocks
//! waiting for the other side.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::field_kind::FieldKind;
use crate::host::{ImeHost, SessionId, TextConsumer};
use crate::session::BeginSessionInfo;
use crate::view::InputView;
use crate::wire::WireBatch;

/// Requests from the producer thread to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    OpenSession { text: String, field_kind: FieldKind },
    CloseSession,
}

/// Notifications from the UI thread back to the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProducerEvent {
    SessionOpened { session: SessionId, field_kind: FieldKind },
    EditBatchDelivered { session: SessionId, batch: WireBatch },
    SessionEnded { session: SessionId },
}

/// Producer-side handle for opening and closing sessions. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionRequester {
    tx: Sender<SessionCommand>,
}

impl SessionRequester {
    /// Ask the UI thread to open a session on `text`.
    pub fn open_session(&self, text: impl Into<String>, field_kind: FieldKind) {
        self.send(SessionCommand::OpenSession {
            text: text.into(),
            field_kind,
        });
    }

    /// Same as [`open_session`](Self::open_session) with the field kind as
    /// its wire value.
    pub fn open_session_raw(&self, text: impl Into<String>, field_kind: i32) -> Result<()> {
        let field_kind = FieldKind::from_wire(field_kind)?;
        self.open_session(text, field_kind);
        Ok(())
    }

    /// Ask the UI thread to close the open session.
    pub fn close_session(&self) {
        self.send(SessionCommand::CloseSession);
    }

    fn send(&self, command: SessionCommand) {
        if let Err(err) = self.tx.send(command) {
            warn!(command = ?err.0, "UI dispatcher is gone; dropping request");
        }
    }
}

/// UI-side end of the command channel.
#[derive(Debug)]
pub struct UiDispatcher {
    rx: Receiver<SessionCommand>,
}

impl UiDispatcher {
    /// Pop the next queued command without blocking.
    pub fn try_next(&self) -> Option<SessionCommand> {
        match self.rx.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Run every queued command against `view`, in send order. Returns how
    /// many commands ran.
    pub fn drain_into<H: ImeHost, C: TextConsumer>(&self, view: &mut InputView<H, C>) -> usize {
        let mut handled = 0;
        while let Some(command) = self.try_next() {
            handled += 1;
            match command {
                SessionCommand::OpenSession { text, field_kind } => {
                    if let Err(err) = view.begin_input_session(BeginSessionInfo::new(text, field_kind)) {
                        warn!(%err, "could not open requested session");
                    }
                }
                SessionCommand::CloseSession => {
                    if view.end_input_session().is_none() {
                        debug!("close requested with no open session");
                    }
                }
            }
        }
        handled
    }
}

/// Create a connected requester/dispatcher pair.
pub fn session_channel() -> (SessionRequester, UiDispatcher) {
    let (tx, rx) = mpsc::channel();
    (SessionRequester { tx }, UiDispatcher { rx })
}

/// [`TextConsumer`] that forwards everything to the producer thread.
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: Sender<ProducerEvent>,
}

impl ChannelConsumer {
    pub fn new(tx: Sender<ProducerEvent>) -> Self {
        Self { tx }
    }

    /// A consumer plus the receiver the producer drains.
    pub fn channel() -> (Self, Receiver<ProducerEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ProducerEvent) {
        if let Err(err) = self.tx.send(event) {
            warn!(event = ?err.0, "producer is gone; dropping event");
        }
    }
}

impl TextConsumer for ChannelConsumer {
    fn deliver_edit_batch(&mut self, session: SessionId, batch: &WireBatch) {
        self.send(ProducerEvent::EditBatchDelivered {
            session,
            batch: batch.clone(),
        });
    }

    fn notify_session_ended(&mut self, session: SessionId) {
        self.send(ProducerEvent::SessionEnded { session });
    }

    fn notify_session_opened(&mut self, session: SessionId, field_kind: FieldKind) {
        self.send(ProducerEvent::SessionOpened {
            session,
            field_kind,
        });
    }
}
