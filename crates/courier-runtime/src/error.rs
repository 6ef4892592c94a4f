//! Runtime error types.

use courier_core::RegistryError;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

use crate::config::ConfigError;

/// Errors raised while wiring a runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A message type was registered twice.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors raised while installing the global subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log directive {directive:?}: {source}")]
    InvalidDirective {
        directive: String,
        #[source]
        source: ParseError,
    },

    /// A global subscriber is already installed.
    #[error(transparent)]
    Init(#[from] TryInitError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
