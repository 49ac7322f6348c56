use thiserror::Error;

/// Which of the two capture paths a read went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapturePath {
    /// Immediate, per-character capture.
    Key,
    /// Buffered, per-line capture.
    Line,
}

/// Failures from a capture source.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The bound strategy has no key reader on this platform.
    #[error("single-key capture is not implemented for platform '{platform}'")]
    Unimplemented { platform: String },

    /// Standard input reached end of file.
    #[error("input stream closed")]
    Closed,

    #[error("capture I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// The blocking "read one unit" contract every capture source honours.
pub trait Capture: Send {
    /// Block until one key is available.
    /// An empty string means the key carried no usable unit (arrows, releases...).
    fn read_key(&mut self) -> Result<String, CaptureError>;

    /// Block until one full line is available, returned without its terminator.
    fn read_line(&mut self) -> Result<String, CaptureError>;

    /// Short name for diagnostics.
    fn describe(&self) -> String;

    fn read(&mut self, path: CapturePath) -> Result<String, CaptureError> {
        match path {
            CapturePath::Key => self.read_key(),
            CapturePath::Line => self.read_line(),
        }
    }
}

impl<C: Capture + ?Sized> Capture for Box<C> {
    fn read_key(&mut self) -> Result<String, CaptureError> {
        (**self).read_key()
    }

    fn read_line(&mut self) -> Result<String, CaptureError> {
        (**self).read_line()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
