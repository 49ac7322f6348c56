use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use keyflow_io::console::key_to_unit;
use keyflow_io::posix::{read_char_from, utf8_len};
use keyflow_io::{
    Capture, CaptureError, CapturePath, CaptureStrategy, Platform, ScriptedCapture, StdinCapture,
    read_line_from, reset_terminal,
};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

/// Run `f` with a scoped subscriber and return the formatted log lines.
fn captured_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let sink = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .without_time()
        .with_writer(move || SharedWriter(sink.clone()))
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
    (out, text.lines().map(str::to_string).collect())
}

struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl Write for SharedWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn at_level<'a>(lines: &'a [String], level: &str) -> Vec<&'a String> {
    lines.iter().filter(|line| line.contains(level)).collect()
}

/// Fails the first read with EINTR, then serves `bytes`.
struct InterruptedOnce {
    interrupted: bool,
    bytes: Cursor<Vec<u8>>,
}

impl Read for InterruptedOnce {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.interrupted {
            self.interrupted = true;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.bytes.read(buf)
    }
}

// ============================================================================
// Platform Tests
// ============================================================================

#[test]
fn test_platform_from_os_windows() {
    assert_eq!(Platform::from_os("windows"), Platform::Windows);
    assert_eq!(Platform::from_os("win32"), Platform::Windows);
}

#[test]
fn test_platform_from_os_linux() {
    assert_eq!(Platform::from_os("linux"), Platform::Linux);
    assert_eq!(Platform::from_os("Linux"), Platform::Linux);
}

#[test]
fn test_platform_from_os_unsupported_keeps_name() {
    let platform = Platform::from_os("macos");
    assert_eq!(platform, Platform::Unsupported("macos".to_string()));
    assert_eq!(platform.name(), "macos");
    assert!(!platform.is_supported());
}

#[test]
fn test_platform_detect_matches_host() {
    let platform = Platform::detect();
    assert_eq!(platform, Platform::from_os(std::env::consts::OS));
}

#[test]
fn test_platform_display() {
    assert_eq!(Platform::Windows.to_string(), "windows");
    assert_eq!(Platform::Unsupported("freebsd".into()).to_string(), "freebsd");
}

// ============================================================================
// Strategy Selection Tests
// ============================================================================

#[test]
fn test_strategy_for_windows_is_console() {
    assert_eq!(
        CaptureStrategy::for_platform(&Platform::Windows),
        CaptureStrategy::Console
    );
}

#[test]
fn test_strategy_for_linux_is_posix() {
    assert_eq!(
        CaptureStrategy::for_platform(&Platform::Linux),
        CaptureStrategy::PosixTerminal
    );
}

#[test]
fn test_strategy_unsupported_falls_back_to_linux_reader() {
    let strategy = CaptureStrategy::for_platform(&Platform::Unsupported("haiku".into()));
    assert_eq!(strategy, CaptureStrategy::PosixTerminal);
    assert_eq!(strategy.config_name(), "linux");
}

#[test]
fn test_unsupported_platform_warns_once_and_reports_linux() {
    let (strategy, lines) =
        captured_logs(|| CaptureStrategy::for_platform(&Platform::Unsupported("haiku".into())));

    assert_eq!(strategy, CaptureStrategy::PosixTerminal);
    let warnings = at_level(&lines, "WARN");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("unsupported platform 'haiku'"));
    let infos = at_level(&lines, "INFO");
    assert_eq!(infos.len(), 1);
    assert!(infos[0].contains("'linux'"));
}

#[test]
fn test_windows_selection_reports_windows_without_warning() {
    let (_, lines) = captured_logs(|| CaptureStrategy::for_platform(&Platform::Windows));

    assert!(at_level(&lines, "WARN").is_empty());
    let infos = at_level(&lines, "INFO");
    assert_eq!(infos.len(), 1);
    assert!(infos[0].contains("'windows'"));
}

#[test]
fn test_linux_selection_reports_linux_without_warning() {
    let (_, lines) = captured_logs(|| CaptureStrategy::for_platform(&Platform::Linux));

    assert!(at_level(&lines, "WARN").is_empty());
    let infos = at_level(&lines, "INFO");
    assert_eq!(infos.len(), 1);
    assert!(infos[0].contains("'linux'"));
}

#[test]
fn test_stdin_capture_describe_names_configuration() {
    let capture = StdinCapture::for_platform(&Platform::Windows);
    assert_eq!(capture.strategy(), CaptureStrategy::Console);
    assert!(capture.describe().contains("windows"));
}

// ============================================================================
// Line Reader Tests
// ============================================================================

#[test]
fn test_read_line_strips_newline() {
    let mut input = Cursor::new("hello\nworld\n");
    assert_eq!(read_line_from(&mut input).unwrap(), "hello");
    assert_eq!(read_line_from(&mut input).unwrap(), "world");
}

#[test]
fn test_read_line_strips_crlf() {
    let mut input = Cursor::new("dir\r\n");
    assert_eq!(read_line_from(&mut input).unwrap(), "dir");
}

#[test]
fn test_read_line_keeps_inner_whitespace_verbatim() {
    let mut input = Cursor::new("  spaced  out \t\n");
    assert_eq!(read_line_from(&mut input).unwrap(), "  spaced  out \t");
}

#[test]
fn test_read_line_last_line_without_newline() {
    let mut input = Cursor::new("tail");
    assert_eq!(read_line_from(&mut input).unwrap(), "tail");
}

#[test]
fn test_read_line_empty_line_is_a_unit() {
    let mut input = Cursor::new("\n");
    assert_eq!(read_line_from(&mut input).unwrap(), "");
}

#[test]
fn test_read_line_eof_is_closed() {
    let mut input = Cursor::new("");
    assert!(matches!(read_line_from(&mut input), Err(CaptureError::Closed)));
}

// ============================================================================
// POSIX Character Reader Tests
// ============================================================================

#[test]
fn test_utf8_len() {
    assert_eq!(utf8_len(b'q'), 1);
    assert_eq!(utf8_len(0xC3), 2);
    assert_eq!(utf8_len(0xE2), 3);
    assert_eq!(utf8_len(0xF0), 4);
    assert_eq!(utf8_len(0x80), 1);
}

#[test]
fn test_read_char_ascii() {
    let mut input = Cursor::new(b"qz".to_vec());
    assert_eq!(read_char_from(&mut input).unwrap(), "q");
    assert_eq!(read_char_from(&mut input).unwrap(), "z");
}

#[test]
fn test_read_char_multibyte() {
    let mut input = Cursor::new("é→".as_bytes().to_vec());
    assert_eq!(read_char_from(&mut input).unwrap(), "é");
    assert_eq!(read_char_from(&mut input).unwrap(), "→");
}

#[test]
fn test_read_char_eof_is_closed() {
    let mut input = Cursor::new(Vec::new());
    assert!(matches!(read_char_from(&mut input), Err(CaptureError::Closed)));
}

#[test]
fn test_read_char_retries_interrupted_read() {
    let mut input = InterruptedOnce {
        interrupted: false,
        bytes: Cursor::new(b"x".to_vec()),
    };
    assert_eq!(read_char_from(&mut input).unwrap(), "x");
    assert!(input.interrupted);
}

#[test]
fn test_reset_terminal_is_harmless_without_a_held_key_read() {
    assert!(reset_terminal().is_ok());
}

#[test]
fn test_read_char_truncated_sequence_is_io_error() {
    let mut input = Cursor::new(vec![0xE2, 0x86]);
    assert!(matches!(read_char_from(&mut input), Err(CaptureError::Io(_))));
}

// ============================================================================
// Console Key Mapping Tests
// ============================================================================

#[test]
fn test_key_to_unit_char() {
    let key = press(KeyCode::Char('q'), KeyModifiers::NONE);
    assert_eq!(key_to_unit(&key), "q");
}

#[test]
fn test_key_to_unit_shifted_char() {
    let key = press(KeyCode::Char('Q'), KeyModifiers::SHIFT);
    assert_eq!(key_to_unit(&key), "Q");
}

#[test]
fn test_key_to_unit_ctrl_c_is_etx() {
    let key = press(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(key_to_unit(&key), "\x03");
}

#[test]
fn test_key_to_unit_named_keys() {
    assert_eq!(key_to_unit(&press(KeyCode::Enter, KeyModifiers::NONE)), "\n");
    assert_eq!(key_to_unit(&press(KeyCode::Tab, KeyModifiers::NONE)), "\t");
    assert_eq!(key_to_unit(&press(KeyCode::Backspace, KeyModifiers::NONE)), "\x08");
    assert_eq!(key_to_unit(&press(KeyCode::Esc, KeyModifiers::NONE)), "\x1b");
}

#[test]
fn test_key_to_unit_arrow_is_empty() {
    let key = press(KeyCode::Up, KeyModifiers::NONE);
    assert_eq!(key_to_unit(&key), "");
}

#[test]
fn test_key_to_unit_release_is_empty() {
    let mut key = press(KeyCode::Char('a'), KeyModifiers::NONE);
    key.kind = KeyEventKind::Release;
    assert_eq!(key_to_unit(&key), "");
}

// ============================================================================
// ScriptedCapture Tests
// ============================================================================

#[test]
fn test_scripted_yields_units_in_order() {
    let mut capture = ScriptedCapture::new(["a", "b"]);
    assert_eq!(capture.read_key().unwrap(), "a");
    assert_eq!(capture.read_line().unwrap(), "b");
    assert_eq!(capture.remaining(), 0);
}

#[test]
fn test_scripted_exhausted_is_closed() {
    let mut capture = ScriptedCapture::new(Vec::<String>::new());
    assert!(matches!(capture.read_key(), Err(CaptureError::Closed)));
    assert!(matches!(capture.read_line(), Err(CaptureError::Closed)));
}

#[test]
fn test_scripted_failure_is_returned() {
    let mut capture = ScriptedCapture::new(["x"]).then_fail(CaptureError::Unimplemented {
        platform: "linux".into(),
    });
    assert_eq!(capture.read_key().unwrap(), "x");
    let err = capture.read_key().unwrap_err();
    assert!(err.to_string().contains("not implemented"));
    assert!(err.to_string().contains("linux"));
}

#[test]
fn test_scripted_journal_records_paths() {
    let mut capture = ScriptedCapture::new(["k"]).then("line");
    let journal = capture.journal();
    capture.read(CapturePath::Key).unwrap();
    capture.read(CapturePath::Line).unwrap();
    assert_eq!(journal.reads(), vec![CapturePath::Key, CapturePath::Line]);
}

#[test]
fn test_boxed_capture_forwards() {
    let mut capture: Box<dyn Capture> = Box::new(ScriptedCapture::new(["z"]));
    assert!(capture.describe().starts_with("scripted"));
    assert_eq!(capture.read_key().unwrap(), "z");
}
