// Core error taxonomy shared by the transport, object, and file layers.
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("no connected network interface found")]
    NoNetworkInterface,

    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("malformed envelope: {message}")]
    MalformedEnvelope { message: String },

    #[error("unknown type tag: {type_tag}")]
    UnknownType { type_tag: String },

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: u64, max: u32 },

    #[error("connection to {peer} lost: {message}")]
    ConnectionLost { peer: String, message: String },

    #[error("a send to {target_ip} is already in progress")]
    Busy { target_ip: String },

    #[error("transfer of {file_name} failed: {message}")]
    TransferFailed { file_name: String, message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {message}")]
    ConfigError { message: String, field: Option<String> },

    #[error("io error: {message}")]
    Io { message: String, recoverable: bool },
}

impl From<std::io::Error> for CoreError {
    fn from(error: std::io::Error) -> Self {
        let recoverable = matches!(
            error.kind(),
            std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::WouldBlock
                | std::io::ErrorKind::ConnectionReset
        );
        CoreError::Io {
            message: error.to_string(),
            recoverable,
        }
    }
}

impl serde::Serialize for CoreError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("CoreError", 3)?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("recoverable", &self.is_recoverable())?;
        state.end()
    }
}

impl CoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::NoNetworkInterface => "NO_NETWORK_INTERFACE",
            CoreError::FileNotFound { .. } => "FILE_NOT_FOUND",
            CoreError::MalformedEnvelope { .. } => "MALFORMED_ENVELOPE",
            CoreError::UnknownType { .. } => "UNKNOWN_TYPE",
            CoreError::FrameTooLarge { .. } => "FRAME_TOO_LARGE",
            CoreError::ConnectionLost { .. } => "CONNECTION_LOST",
            CoreError::Busy { .. } => "BUSY",
            CoreError::TransferFailed { .. } => "TRANSFER_FAILED",
            CoreError::Cancelled => "CANCELLED",
            CoreError::ConfigError { .. } => "CONFIG_ERROR",
            CoreError::Io { .. } => "IO_ERROR",
        }
    }

    /// Whether the caller might reasonably retry the operation that produced this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CoreError::NoNetworkInterface => false,
            CoreError::FileNotFound { .. } => false,
            CoreError::MalformedEnvelope { .. } => true,
            CoreError::UnknownType { .. } => true,
            CoreError::FrameTooLarge { .. } => false,
            CoreError::ConnectionLost { .. } => true,
            CoreError::Busy { .. } => false,
            CoreError::TransferFailed { .. } => false,
            CoreError::Cancelled => false,
            CoreError::ConfigError { .. } => false,
            CoreError::Io { recoverable, .. } => *recoverable,
        }
    }

    pub fn with_field(message: String, field: &str) -> Self {
        CoreError::ConfigError {
            message,
            field: Some(field.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_failed_is_not_recoverable() {
        let err = CoreError::TransferFailed {
            file_name: "a.bin".to_string(),
            message: "disk full".to_string(),
        };
        assert_eq!(err.error_code(), "TRANSFER_FAILED");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn connection_lost_is_recoverable_but_frame_too_large_is_not() {
        let lost = CoreError::ConnectionLost {
            peer: "10.0.0.1".to_string(),
            message: "reset".to_string(),
        };
        let oversized = CoreError::FrameTooLarge { len: 200, max: 64 };
        assert!(lost.is_recoverable());
        assert!(!oversized.is_recoverable());
    }
}
