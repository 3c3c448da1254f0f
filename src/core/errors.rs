use std::result::Result as StdResult;

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StoreError;

/// Failure categories surfaced to callers of the tracker services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    Consistency,
    Storage,
    Config,
}

/// Unified error type for the service layer.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not authorized: {0}")]
    Authorization(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Consistency failure: {0}")]
    Consistency(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, TrackerError>;

/// Failures that end or interrupt the command shell.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] TrackerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl TrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::Validation(_) => ErrorKind::Validation,
            TrackerError::Authorization(_) => ErrorKind::Authorization,
            TrackerError::NotFound(_) => ErrorKind::NotFound,
            TrackerError::Consistency(_) => ErrorKind::Consistency,
            TrackerError::Storage(_) => ErrorKind::Storage,
            TrackerError::Config(_) => ErrorKind::Config,
        }
    }

    /// Only aborted transactions are worth retrying as a whole.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::Consistency(_))
    }

    /// Validation and authorization failures can be fixed by the caller.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            TrackerError::Validation(_) | TrackerError::Authorization(_) | TrackerError::NotFound(_)
        )
    }
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint(message) => TrackerError::Validation(message),
            StoreError::Aborted(message) | StoreError::Poisoned(message) => {
                TrackerError::Consistency(message)
            }
            StoreError::UnlockedPartition(key) => {
                TrackerError::Consistency(format!("partition {key} is not locked by this transaction"))
            }
            StoreError::UnsupportedSchema { found, supported } => TrackerError::Storage(format!(
                "snapshot schema v{found} is newer than supported v{supported}"
            )),
            StoreError::Io(err) => TrackerError::Storage(err.to_string()),
            StoreError::Serde(message) => TrackerError::Storage(message),
        }
    }
}

impl From<ConfigError> for TrackerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(io) => TrackerError::Storage(io.to_string()),
            ConfigError::Serde(message) | ConfigError::Invalid(message) => {
                TrackerError::Config(message)
            }
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        CliError::Core(err.into())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Core(err.into())
    }
}
