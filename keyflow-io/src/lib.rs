//! # Keyflow IO
//!
//! The Capture Layer.
//! Knows *how* to pull one raw unit of input off the host and nothing else:
//! no categories, no listeners, no loop. Exactly one strategy is bound per
//! agent, chosen once from the host platform.

pub mod capture;
pub mod console;
pub mod platform;
pub mod posix;
pub mod scripted;
pub mod strategy;

pub use capture::{Capture, CaptureError, CapturePath};
pub use platform::Platform;
pub use scripted::{CaptureJournal, ScriptedCapture, ScriptedUnit};
pub use strategy::{CaptureStrategy, StdinCapture, read_line_from, reset_terminal};
