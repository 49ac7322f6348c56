use keyflow_io::CaptureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// The category is not addressed by this registry (or the name matches none).
    #[error("unknown event category '{0}'")]
    UnknownCategory(String),

    #[error("unknown input mode '{0}' (expected 'single-key' or 'sequence')")]
    UnknownMode(String),

    #[error("input agent already started")]
    AlreadyStarted,

    #[error("failed to spawn input thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("input loop panicked")]
    LoopPanicked,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    ConfigJson(#[from] serde_json::Error),
}
