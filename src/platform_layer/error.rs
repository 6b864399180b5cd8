use std::io;

// Represents errors that can occur while talking to the host or the panel.
//
// None of these are fatal for the controller: the view channel swallows them at its
// boundary, and the bridge logs and skips malformed input lines.
#[derive(Debug)]
pub enum PlatformError {
    /// Reading from or writing to the host stream failed.
    Io(io::Error),
    /// A message could not be encoded or a line could not be decoded.
    Serialization(serde_json::Error),
    /// The panel surface or the host connection is gone.
    ChannelUnavailable(String),
}

impl From<io::Error> for PlatformError {
    fn from(err: io::Error) -> Self {
        PlatformError::Io(err)
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Serialization(err)
    }
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::Io(e) => write!(f, "Host I/O error: {e}"),
            PlatformError::Serialization(e) => write!(f, "Message encoding error: {e}"),
            PlatformError::ChannelUnavailable(s) => write!(f, "Channel unavailable: {s}"),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Io(e) => Some(e),
            PlatformError::Serialization(e) => Some(e),
            PlatformError::ChannelUnavailable(_) => None,
        }
    }
}

/// A specialized `Result` type for platform layer operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
