//! Error taxonomy shared across the conversion pipeline.
//!
//! Every failure is unrecoverable for the current run: the caller gets
//! enough context (path, group, dataset or parameter name) to fix the
//! input and run again. There are no retries.

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors produced by the container layer and the conversion pipeline.
#[derive(Debug)]
pub enum BridgeError {
    /// A file, group or dataset does not exist.
    NotFound(String),
    /// The container or a dataset is structurally invalid.
    Format(String),
    /// A caller-supplied parameter is out of range or the input is empty.
    InvalidParameter(String),
    /// An underlying I/O failure.
    Io(String),
    /// The observation collection could not be serialized.
    Serialize(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::NotFound(msg) => write!(f, "not found: {msg}"),
            BridgeError::Format(msg) => write!(f, "format error: {msg}"),
            BridgeError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            BridgeError::Io(msg) => write!(f, "IO error: {msg}"),
            BridgeError::Serialize(msg) => write!(f, "serialize error: {msg}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = BridgeError::NotFound("group '98:D3:21:FC:8B:12/raw'".to_string());
        assert!(err.to_string().contains("98:D3:21:FC:8B:12/raw"));

        let err = BridgeError::InvalidParameter("sampling_rate_hz must be > 0".to_string());
        assert!(err.to_string().starts_with("invalid parameter"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BridgeError = io.into();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
