//! # Keyflow Core
//!
//! The Input Agent.
//! Runs one background capture loop, wraps every captured unit in a typed
//! [`Event`] and fans it out to the listeners registered for its category,
//! then to the catch-all `Input` listeners.

pub mod agent;
pub mod config;
pub mod error;
pub mod event;
pub mod history;
pub mod registry;
pub mod subscription;

// Re-export the main struct so users can just use `keyflow_core::InputAgent`
pub use agent::{InputAgent, InputHandle, LoopExit};
pub use config::AgentConfig;
pub use error::AgentError;
pub use event::{Event, EventCategory, Mode};
pub use registry::{Listener, ListenerRegistry, listener};
pub use subscription::Subscription;

// The capture layer, for callers that bring their own source.
pub use keyflow_io::{Capture, CaptureError, Platform, ScriptedCapture};
