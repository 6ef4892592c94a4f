//! Configuration for the Courier runtime.
//!
//! Layered loading (defaults, files, `COURIER_*` environment) through
//! figment, plus validation of the resulting [`CourierConfig`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CourierConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, MediatorConfig, SpanEventConfig,
};
pub use validation::{MAX_DEPTH_LIMIT, validate_config};
