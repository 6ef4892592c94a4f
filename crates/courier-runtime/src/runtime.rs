//! Wiring-phase orchestration.
//!
//! A [`Runtime`] owns the configuration and a mutable [`Registry`] while the
//! application registers its handlers. [`Runtime::start`] installs logging
//! and freezes the registry into a shared [`Mediator`]; no registration is
//! possible after that point.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use courier_runtime::Runtime;
//!
//! let mut runtime = Runtime::builder().config_file("courier.toml").build()?;
//! runtime.register_default::<GetAccount, _>(|| vec![Handler::reply(AccountLookup)])?;
//!
//! let mediator = runtime.start();
//! let account = mediator.send(GetAccount { id: 7 })?;
//! ```

use std::path::Path;
use std::sync::Arc;

use courier_core::{Handler, InitialReply, Mediator, MediatorOptions, Message, Registry};
use tracing::{debug, info};

use crate::config::{ConfigLoader, CourierConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// Owns configuration and the registry until the mediator is started.
#[derive(Debug)]
pub struct Runtime {
    config: CourierConfig,
    registry: Registry,
}

impl Runtime {
    /// Creates a runtime from an already loaded configuration.
    pub fn new(config: CourierConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
        }
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct access to the registry for any registration style.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Registers `M` with an explicit initial-reply strategy.
    pub fn register<M, F>(
        &mut self,
        create_handlers: F,
        initial_reply: InitialReply<M::Reply>,
    ) -> RuntimeResult<&mut Self>
    where
        M: Message,
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
    {
        self.registry.register(create_handlers, initial_reply)?;
        Ok(self)
    }

    /// Registers a void message.
    pub fn register_void<M, F>(&mut self, create_handlers: F) -> RuntimeResult<&mut Self>
    where
        M: Message<Reply = ()>,
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
    {
        self.registry.register_void(create_handlers)?;
        Ok(self)
    }

    /// Registers a message whose reply is seeded with its `Default`.
    pub fn register_default<M, F>(&mut self, create_handlers: F) -> RuntimeResult<&mut Self>
    where
        M: Message,
        M::Reply: Default,
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
    {
        self.registry.register_default(create_handlers)?;
        Ok(self)
    }

    /// Returns the options the mediator will be started with.
    pub fn mediator_options(&self) -> MediatorOptions {
        MediatorOptions::from(&self.config.mediator)
    }

    /// Installs logging and freezes the registry into a shared mediator.
    pub fn start(self) -> Arc<Mediator> {
        logging::init_from_config(&self.config.logging);

        let options = self.mediator_options();
        debug!(messages = ?self.registry.message_names(), "Registered message types");
        info!(
            registrations = self.registry.len(),
            max_depth = options.max_depth,
            "Mediator started"
        );

        Arc::new(Mediator::with_options(self.registry, options))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(CourierConfig::default())
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Loads and validates configuration, then creates a [`Runtime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Loads exactly this configuration file.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration values programmatically.
    pub fn merge(mut self, config: CourierConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> RuntimeResult<Runtime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;
        Ok(Runtime::new(config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
