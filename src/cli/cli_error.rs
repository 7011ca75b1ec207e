// CLI-specific error types.
use crate::errors::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("invalid command argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) if e.error_code() == "CONFIG_ERROR" => 2,
            CliError::Core(_) => 1,
            CliError::InvalidArgument { .. } => 3,
        }
    }

    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }
}
