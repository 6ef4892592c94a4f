//! Courier Runtime - configuration, logging and wiring for the mediator.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `CourierConfig`)
//! - Subscriber setup for the spans and events emitted by `courier-core`
//! - A wiring-phase `Runtime` that freezes the registry into a shared `Mediator`
//!
//! ```rust,ignore
//! use courier_runtime::Runtime;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut runtime = Runtime::builder().build()?;
//!     runtime.register_void(|| vec![Handler::pure(AuditHook)])?;
//!
//!     let mediator = runtime.start();
//!     mediator.publish(AccountOpened { id: 7 })?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, CourierConfig, LoggingConfig, MediatorConfig,
};
pub use error::{LoggingError, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{Runtime, RuntimeBuilder};

// Re-export tracing for use by applications
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for applications built on Courier.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
