//! Error types for the Courier core.
//!
//! Errors are split by the phase in which they surface:
//!
//! - [`RegistryError`] is raised while wiring handlers, before any message is
//!   sent. It always indicates a programming mistake.
//! - [`DispatchError`] is raised by `send`/`publish` and fails that single
//!   send only.

use thiserror::Error;

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised while registering handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The message type already has a registration.
    ///
    /// The existing registration is left untouched.
    #[error("message type '{message}' is already registered")]
    DuplicateRegistration {
        /// Name of the message type.
        message: &'static str,
    },
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors raised while dispatching a message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registration exists for the message type.
    #[error("no handlers registered for message type '{message}'")]
    Unregistered {
        /// Name of the message type.
        message: &'static str,
    },

    /// The registration (or a type-erased dispatcher) did not produce a reply
    /// of the type the caller asked for.
    #[error("dispatch of '{message}' did not produce a reply of type '{expected}'")]
    ResultTypeMismatch {
        /// Name of the message type.
        message: &'static str,
        /// Name of the reply type the caller expected.
        expected: &'static str,
    },

    /// Nested dispatch went deeper than the mediator allows.
    #[error("dispatch of '{message}' exceeded the maximum nesting depth of {max_depth}")]
    DepthExceeded {
        /// Name of the message type that would have exceeded the limit.
        message: &'static str,
        /// The configured limit.
        max_depth: usize,
    },

    /// A handler returned an error. The rest of the chain was not run.
    #[error("handler #{index} for '{message}' failed: {source}")]
    Handler {
        /// Name of the message type.
        message: &'static str,
        /// Position of the failing handler in the chain.
        index: usize,
        /// The error returned by the handler, as the handler returned it.
        ///
        /// Use [`anyhow::Error::downcast_ref`] to recover a typed error.
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Converts an error returned by a handler into a dispatch error.
    ///
    /// Errors that already are a [`DispatchError`] (typically propagated from
    /// a nested send with `?`) are returned unchanged.
    pub fn from_handler(message: &'static str, index: usize, err: anyhow::Error) -> Self {
        match err.downcast::<DispatchError>() {
            Ok(nested) => nested,
            Err(err) => Self::Handler {
                message,
                index,
                source: err,
            },
        }
    }

    /// Returns `true` if this error was raised by a handler.
    pub fn is_handler_error(&self) -> bool {
        matches!(self, Self::Handler { .. })
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for registration operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
