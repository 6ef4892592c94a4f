//! # Courier
//!
//! A type-safe in-process mediator for Rust.
//!
//! Callers send a typed message; the handlers registered for its type run in
//! order and thread a reply value from one to the next. Handlers that need to
//! talk to other parts of the application send further messages through the
//! mediator instead of holding references to each other.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  start()  ┌────────────────┐  send(m)  ┌───────────────────────────┐
//! │   Runtime   │──────────▶│ Arc<Mediator>  │──────────▶│ handlers for M, in order  │
//! │ (registry)  │           │ (frozen, Sync) │◀──────────│ seed → h1 → h2 → … → reply│
//! └─────────────┘           └────────────────┘  nested   └───────────────────────────┘
//! ```
//!
//! - **Runtime**: loads configuration, installs logging, owns the registry
//!   while handlers are wired
//! - **Mediator**: immutable and shareable; every send builds a fresh handler
//!   list and folds the reply through it
//! - **Handlers**: four shapes, with or without a reply, with or without
//!   access to the mediator
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[derive(Message)]
//! #[message(reply = "String")]
//! struct Rename {
//!     name: String,
//! }
//!
//! struct ReturnsName;
//!
//! impl HandleReply<Rename> for ReturnsName {
//!     fn handle(&mut self, message: &Rename, _reply: String) -> HandlerResult<String> {
//!         Ok(message.name.clone())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut runtime = Runtime::builder().build()?;
//!     runtime.register_default(|| vec![Handler::reply(ReturnsName)])?;
//!
//!     let mediator = runtime.start();
//!     assert_eq!(mediator.send(Rename { name: "Foo Bar".into() })?, "Foo Bar");
//!     Ok(())
//! }
//! ```
//!
//! ## Deriving `Message`
//!
//! The derive expands to `::courier_core::Message`, so a crate using it
//! needs `courier-core` next to `courier` in its `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! courier = "0.1"
//! courier-core = "0.1"
//! ```
//!
//! Alternatively point the derive at the re-export:
//!
//! ```rust,ignore
//! #[derive(Message)]
//! #[message(reply = "u64", crate = "::courier::core")]
//! struct Count;
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use courier_core as core;
pub use courier_macros as macros;
pub use courier_runtime as runtime;

pub use courier_core::{
    Dispatch, DispatchError, DispatchExt, Handler, InitialReply, Mediator, Message, Registry,
    RegistryError,
};
pub use courier_runtime::{CourierConfig, Runtime};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    // Wiring
    pub use courier_runtime::{ConfigLoader, CourierConfig, Runtime};

    // Messages; the derive shares the trait's name
    pub use courier_core::Message;
    pub use courier_macros::Message;

    // Handlers
    pub use courier_core::{
        Handle, HandleReply, HandleReplyWithMediator, HandleWithMediator, Handler, HandlerResult,
    };

    // Dispatch
    pub use courier_core::{
        Dispatch, DispatchError, DispatchExt, DispatchResult, InitialReply, Mediator,
        MediatorOptions, Registry, RegistryError,
    };
}
