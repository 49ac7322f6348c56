use std::io::{self, BufRead};

use tracing::{info, warn};

use crate::capture::{Capture, CaptureError};
use crate::platform::Platform;
use crate::{console, posix};

/// The closed set of single-key readers. Picked once, never re-dispatched per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStrategy {
    /// crossterm console events (Windows).
    Console,
    /// termios non-canonical reads (Linux and the fallback).
    PosixTerminal,
}

impl CaptureStrategy {
    /// Bind the reader for `platform`, logging the configuration chosen.
    pub fn for_platform(platform: &Platform) -> Self {
        let strategy = match platform {
            Platform::Windows => Self::Console,
            Platform::Linux => Self::PosixTerminal,
            Platform::Unsupported(name) => {
                warn!(
                    "input: unsupported platform '{}', defaulting to linux behaviour",
                    name
                );
                Self::PosixTerminal
            }
        };

        info!(
            "input: daemon starting, configured for '{}' platform",
            strategy.config_name()
        );
        strategy
    }

    /// The platform configuration this reader belongs to.
    pub fn config_name(&self) -> &'static str {
        match self {
            Self::Console => "windows",
            Self::PosixTerminal => "linux",
        }
    }

    pub fn read_key(&self) -> Result<String, CaptureError> {
        match self {
            Self::Console => console::read_key(),
            Self::PosixTerminal => posix::read_key(),
        }
    }
}

/// Standard input bound to one key strategy. The line path is platform-independent.
#[derive(Debug, Clone, Copy)]
pub struct StdinCapture {
    strategy: CaptureStrategy,
}

impl StdinCapture {
    pub fn new(strategy: CaptureStrategy) -> Self {
        Self { strategy }
    }

    pub fn for_platform(platform: &Platform) -> Self {
        Self::new(CaptureStrategy::for_platform(platform))
    }

    pub fn strategy(&self) -> CaptureStrategy {
        self.strategy
    }
}

impl Capture for StdinCapture {
    fn read_key(&mut self) -> Result<String, CaptureError> {
        self.strategy.read_key()
    }

    fn read_line(&mut self) -> Result<String, CaptureError> {
        read_line_from(&mut io::stdin().lock())
    }

    fn describe(&self) -> String {
        format!("stdin ({})", self.strategy.config_name())
    }
}

/// Read one line verbatim, minus a trailing `\n` or `\r\n`.
pub fn read_line_from<R: BufRead>(reader: &mut R) -> Result<String, CaptureError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(CaptureError::Closed);
    }

    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}

/// Best-effort: put the controlling terminal back into cooked, echoing mode.
/// Call on exit in case the process dies while a key read holds the terminal.
pub fn reset_terminal() -> Result<(), CaptureError> {
    #[cfg(unix)]
    return posix::restore_cooked();
    #[cfg(not(unix))]
    return console::restore_cooked();
}
