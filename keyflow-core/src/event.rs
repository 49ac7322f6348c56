use std::fmt;
use std::str::FromStr;

use keyflow_io::CapturePath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;

/// Which listener sets receive an event.
///
/// `Input` is the catch-all: it receives every event after the listeners of
/// the event's own category. `Special` is never produced by the capture loop;
/// it is reserved for events synthesized by other subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Input,
    SingleKey,
    Sequence,
    Special,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::Input,
        EventCategory::SingleKey,
        EventCategory::Sequence,
        EventCategory::Special,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::SingleKey => "SingleKey",
            Self::Sequence => "Sequence",
            Self::Special => "Special",
        }
    }

    pub fn is_catch_all(&self) -> bool {
        *self == Self::Input
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventCategory {
    type Err = AgentError;

    /// Accepts the short names and the `*Event` forms (`"SingleKeyEvent"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Input" | "InputEvent" => Ok(Self::Input),
            "SingleKey" | "SingleKeyEvent" => Ok(Self::SingleKey),
            "Sequence" | "SequenceEvent" => Ok(Self::Sequence),
            "Special" | "SpecialEvent" => Ok(Self::Special),
            other => Err(AgentError::UnknownCategory(other.to_string())),
        }
    }
}

/// Capture mode of the agent. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Immediate, per-character capture.
    #[default]
    SingleKey,
    /// Buffered, per-line capture.
    Sequence,
}

impl Mode {
    /// Category attached to events the loop produces in this mode.
    pub fn category(&self) -> EventCategory {
        match self {
            Self::SingleKey => EventCategory::SingleKey,
            Self::Sequence => EventCategory::Sequence,
        }
    }

    pub fn capture_path(&self) -> CapturePath {
        match self {
            Self::SingleKey => CapturePath::Key,
            Self::Sequence => CapturePath::Line,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleKey => "single-key",
            Self::Sequence => "sequence",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::SingleKey => Self::Sequence,
            Self::Sequence => Self::SingleKey,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single-key" | "single_key" | "singlekey" => Ok(Self::SingleKey),
            "sequence" => Ok(Self::Sequence),
            _ => Err(AgentError::UnknownMode(s.to_string())),
        }
    }
}

/// One realized input occurrence. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    value: String,
    /// Owned by this event alone; every constructor allocates its own.
    #[serde(default)]
    extra_arguments: Vec<Value>,
    category: EventCategory,
}

impl Event {
    pub fn new(value: impl Into<String>, category: EventCategory) -> Self {
        Self {
            value: value.into(),
            extra_arguments: Vec::new(),
            category,
        }
    }

    pub fn with_arguments(
        value: impl Into<String>,
        category: EventCategory,
        extra_arguments: Vec<Value>,
    ) -> Self {
        Self {
            value: value.into(),
            extra_arguments,
            category,
        }
    }

    /// A synthesized event for collaborators to raise through `get_listeners`.
    pub fn special(value: impl Into<String>, extra_arguments: Vec<Value>) -> Self {
        Self::with_arguments(value, EventCategory::Special, extra_arguments)
    }

    /// One character in single-key mode, one line in sequence mode.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn extra_arguments(&self) -> &[Value] {
        &self.extra_arguments
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }
}
