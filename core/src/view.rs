//! Platform view that owns the input connection.
//!
//! The view begins and ends sessions on request from the engine and answers
//! the platform when it asks for an input connection. Platforms may ask more
//! than once for the same session; every request gets the live session.

use tracing::debug;

use crate::controller::SessionController;
use crate::error::Result;
use crate::host::{ImeHost, SessionId, TextConsumer};
use crate::session::{BeginSessionInfo, EditorInfo};
use crate::Config;

#[derive(Debug)]
pub struct InputView<H: ImeHost, C: TextConsumer> {
    controller: SessionController<H, C>,
    connection_requests: u64,
}

impl<H: ImeHost, C: TextConsumer> InputView<H, C> {
    pub fn new(host: H, consumer: C, config: Config) -> Self {
        Self {
            controller: SessionController::new(host, consumer, config),
            connection_requests: 0,
        }
    }

    pub fn controller(&self) -> &SessionController<H, C> {
        &self.controller
    }

    /// The controller the IME's connection calls into.
    pub fn controller_mut(&mut self) -> &mut SessionController<H, C> {
        &mut self.controller
    }

    /// Start editing `info.text`; a session that is still open is replaced.
    pub fn begin_input_session(&mut self, info: BeginSessionInfo) -> Result<SessionId> {
        self.connection_requests = 0;
        self.controller.begin_session(info)
    }

    /// Stop editing and hide the keyboard. No-op when nothing is open.
    pub fn end_input_session(&mut self) -> Option<SessionId> {
        self.controller.end_session()
    }

    /// The platform asks for an input connection. Returns the attributes of
    /// the live session, or `None` when the view is not editing.
    pub fn on_create_input_connection(&mut self) -> Option<EditorInfo> {
        let info = self.controller.editor_info().ok()?;
        self.connection_requests += 1;
        if self.connection_requests > 1 {
            debug!(
                requests = self.connection_requests,
                "input connection requested again; reusing session"
            );
        }
        Some(info)
    }
}
