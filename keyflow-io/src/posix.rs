//! POSIX terminal key reader (the Linux strategy, and the fallback).
//!
//! One read switches stdin to non-canonical, no-echo mode, pulls exactly one
//! UTF-8 character and puts the previous modes back. If stdin is not a
//! terminal (pipe, file) the byte is read as-is.

use crate::capture::CaptureError;

/// Length of a UTF-8 sequence given its lead byte.
/// Stray continuation bytes and invalid leads count as a single byte.
pub fn utf8_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// Read one character from `reader`, assuming the caller already set up the terminal.
/// A read interrupted by a signal is retried.
pub fn read_char_from<R: std::io::Read>(reader: &mut R) -> Result<String, CaptureError> {
    let mut buf = [0u8; 4];
    loop {
        match reader.read(&mut buf[..1]) {
            Ok(0) => return Err(CaptureError::Closed),
            Ok(_) => break,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let len = utf8_len(buf[0]);
    if len > 1 {
        reader.read_exact(&mut buf[1..len])?;
    }

    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}

#[cfg(unix)]
mod imp {
    use super::read_char_from;
    use crate::capture::CaptureError;
    use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
    use std::io;

    /// Puts the saved modes back when the read finishes, error or not.
    struct ModeGuard {
        saved: Termios,
    }

    impl Drop for ModeGuard {
        fn drop(&mut self) {
            if let Err(e) = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &self.saved) {
                tracing::warn!("input: failed to restore terminal modes: {}", e);
            }
        }
    }

    /// `None` when stdin is not a terminal.
    fn enter_key_mode() -> Result<Option<ModeGuard>, CaptureError> {
        let Ok(saved) = termios::tcgetattr(io::stdin()) else {
            return Ok(None);
        };

        let mut raw = saved.clone();
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &raw).map_err(io::Error::from)?;
        Ok(Some(ModeGuard { saved }))
    }

    pub(crate) fn read_key() -> Result<String, CaptureError> {
        let _guard = enter_key_mode()?;
        let mut stdin = io::stdin().lock();
        read_char_from(&mut stdin)
    }

    pub(crate) fn restore_cooked() -> Result<(), CaptureError> {
        let Ok(mut modes) = termios::tcgetattr(io::stdin()) else {
            return Ok(());
        };
        modes.local_flags.insert(LocalFlags::ICANON | LocalFlags::ECHO);
        termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &modes).map_err(io::Error::from)?;
        Ok(())
    }
}

#[cfg(not(unix))]
mod imp {
    use crate::capture::CaptureError;

    pub(crate) fn read_key() -> Result<String, CaptureError> {
        Err(CaptureError::Unimplemented {
            platform: std::env::consts::OS.to_string(),
        })
    }
}

#[cfg(unix)]
pub(crate) use imp::restore_cooked;
pub(crate) use imp::read_key;
