//! softinput-core
//!
//! Text input session engine sitting between a platform soft keyboard (IME)
//! and an engine that mirrors the edited text.
//!
//! The IME edits through stateful, synchronous calls (composing spans, batch
//! edits, relative cursor moves). The engine wants an ordered list of replace
//! operations it can apply once per logical edit. Per-field filters (integer,
//! float, ...) vet every character on the way in.
//!
//! Public API:
//! - `FilterChain` / `filter_text` - per-field character validation
//! - `EditBuffer` - text, selection and composing range
//! - `JobQueue` - pending replace jobs and batch depth
//! - `SessionController` - IME operations on the open session
//! - `InputView` - session begin/end and connection requests from the platform
//! - `dispatch` - producer-thread requests and engine-bound events over channels
//! - `Config` - runtime options, loadable from TOML
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{EditOutcome, SessionError};

pub mod field_kind;
pub use field_kind::{FieldKind, InputType};

pub mod filter;
pub use filter::{filter_text, is_rejection, CharValidator, FilterChain};

pub mod edit_buffer;
pub use edit_buffer::{EditBuffer, TextRange};

pub mod job_queue;
pub use job_queue::{EditBatch, JobQueue, ReplaceJob};

pub mod wire;
pub use wire::WireBatch;

pub mod host;
pub use host::{ImeHost, SessionId, TextConsumer};

pub mod session;
pub use session::{BeginSessionInfo, EditorAction, EditorInfo, ExtractedText, Session};

pub mod controller;
pub use controller::{Key, KeyAction, KeyEvent, SessionController};

pub mod view;
pub use view::InputView;

pub mod dispatch;
pub use dispatch::{
    session_channel, ChannelConsumer, ProducerEvent, SessionCommand, SessionRequester, UiDispatcher,
};

/// How out-of-range indices coming from the IME are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// Fail the operation with `SessionError::Range`.
    Strict,
    /// Clamp into the buffer and log a warning.
    #[default]
    Clamp,
}

/// Runtime configuration for text input sessions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Out-of-range index handling
    pub range_policy: RangePolicy,

    /// Debug-log the buffer text after every flush
    pub log_flushed_text: bool,

    /// Locale hint handed to the IME
    pub hint_locale: String,

    /// Action key shown on the keyboard
    pub ime_action: EditorAction,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            range_policy: RangePolicy::Clamp,
            log_flushed_text: true,
            hint_locale: "en".to_string(),
            ime_action: EditorAction::Done,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
