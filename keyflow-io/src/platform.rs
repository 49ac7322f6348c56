use std::fmt;

/// Host platform as far as input capture is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    /// Anything else. Carries the raw OS name for diagnostics.
    Unsupported(String),
}

impl Platform {
    /// Read the host OS once.
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (`std::env::consts::OS` style, or `win32`) to a platform.
    pub fn from_os(os: &str) -> Self {
        let os = os.trim().to_ascii_lowercase();
        if os == "windows" || os.starts_with("win32") {
            Self::Windows
        } else if os.starts_with("linux") {
            Self::Linux
        } else {
            Self::Unsupported(os)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
