//! Error types for the generator's named resources

use std::fmt;
use std::path::PathBuf;

/// Failures while creating, opening or using the FIFO and the shared segment
#[derive(Debug)]
pub enum IpcError {
    /// Could not create or open the command FIFO on the generator side
    ChannelCreate { path: PathBuf, source: std::io::Error },
    /// Could not open an existing command FIFO (controller side)
    ChannelOpen { path: PathBuf, source: std::io::Error },
    /// Could not create, size or map the shared-memory segment
    SegmentCreate { name: String, source: std::io::Error },
    /// Could not attach to an existing shared-memory segment
    SegmentOpen { name: String, source: std::io::Error },
    /// A name contained an interior NUL byte
    InvalidName(String),
    /// Command record could not be serialized
    Codec(String),
    /// IO error
    Io(std::io::Error),
}

impl fmt::Display for IpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpcError::ChannelCreate { path, source } => {
                write!(f, "Failed to create FIFO {}: {}", path.display(), source)
            }
            IpcError::ChannelOpen { path, source } => write!(
                f,
                "Failed to open FIFO {} (generator not running?): {}",
                path.display(),
                source
            ),
            IpcError::SegmentCreate { name, source } => {
                write!(f, "Failed to create shared memory {}: {}", name, source)
            }
            IpcError::SegmentOpen { name, source } => write!(
                f,
                "Failed to open shared memory {} (generator not running?): {}",
                name, source
            ),
            IpcError::InvalidName(name) => write!(f, "Invalid resource name: {:?}", name),
            IpcError::Codec(msg) => write!(f, "Command codec error: {}", msg),
            IpcError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for IpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IpcError::ChannelCreate { source, .. }
            | IpcError::ChannelOpen { source, .. }
            | IpcError::SegmentCreate { source, .. }
            | IpcError::SegmentOpen { source, .. } => Some(source),
            IpcError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IpcError {
    fn from(e: std::io::Error) -> Self {
        IpcError::Io(e)
    }
}

/// Result type for IPC operations
pub type IpcResult<T> = Result<T, IpcError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_channel_open_mentions_generator() {
        let err = IpcError::ChannelOpen {
            path: PathBuf::from("/tmp/nowhere"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/tmp/nowhere"));
        assert!(msg.contains("generator not running"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let err: IpcError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, IpcError::Io(_)));
    }
}
