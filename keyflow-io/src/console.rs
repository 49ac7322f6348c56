//! Console key reader (the Windows strategy).
//!
//! Reads raw key events through crossterm. Raw mode is held only for the
//! duration of one read so the terminal is left cooked between keys.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::capture::CaptureError;

pub(crate) fn read_key() -> Result<String, CaptureError> {
    terminal::enable_raw_mode()?;
    let event = event::read();
    // Restore before surfacing either error.
    let restored = terminal::disable_raw_mode();
    let event = event?;
    restored?;

    Ok(match event {
        Event::Key(key) => key_to_unit(&key),
        _ => String::new(),
    })
}

/// Leave raw mode if a read was cut short. The Windows side of
/// `reset_terminal`; unix uses the termios restore instead.
#[cfg(not(unix))]
pub(crate) fn restore_cooked() -> Result<(), CaptureError> {
    terminal::disable_raw_mode()?;
    Ok(())
}

/// Translate one key event into a capture unit, `getch` style.
///
/// Only presses produce a unit. Ctrl+letter yields the matching control
/// byte (Ctrl+C is `"\x03"`). Keys with no character form yield `""`.
pub fn key_to_unit(key: &KeyEvent) -> String {
    if key.kind != KeyEventKind::Press {
        return String::new();
    }

    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) && c.is_ascii_alphabetic() => {
            char::from(c.to_ascii_lowercase() as u8 & 0x1f).to_string()
        }
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "\n".to_string(),
        KeyCode::Tab => "\t".to_string(),
        KeyCode::Backspace => "\x08".to_string(),
        KeyCode::Esc => "\x1b".to_string(),
        _ => String::new(),
    }
}
