//! # Courier Core
//!
//! The dispatch engine of the Courier in-process mediator.
//!
//! Callers send a typed message; the handlers registered for that message
//! type consume it in order, threading a reply value through the chain.
//!
//! ## Building Blocks
//!
//! - **Messages**: [`Message`] names the reply type of each message type
//! - **Handlers**: four capability shapes ([`Handle`], [`HandleReply`],
//!   [`HandleWithMediator`], [`HandleReplyWithMediator`]) tagged by [`Handler`]
//! - **Registry**: one [`Registration`] (handler factory + [`InitialReply`])
//!   per message type, duplicates rejected
//! - **Mediator**: folds the handler chain for each send; mediator-aware
//!   handlers can send further messages through [`Dispatch`]
//!
//! ## Flow
//!
//! ```text
//!             ┌──────────┐  lookup   ┌──────────────┐
//!  send(m) ──▶│ Mediator │──────────▶│ Registration │
//!             └──────────┘           └──────────────┘
//!                  │  fresh handlers + seed reply
//!                  ▼
//!        reply ─▶ [Pure] ─▶ [Reply] ─▶ [Mediated] ─▶ [MediatedReply] ─▶ reply
//!                                          │
//!                                          └──▶ send(other) (nested)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use courier_core::{Handler, Mediator, Message, Registry};
//!
//! struct Rename {
//!     name: String,
//! }
//!
//! impl Message for Rename {
//!     type Reply = String;
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .register_default(|| {
//!         vec![
//!             Handler::pure_fn(|_: &Rename| Ok(())),
//!             Handler::reply_fn(|m: &Rename, _| Ok(m.name.clone())),
//!         ]
//!     })
//!     .unwrap();
//!
//! let mediator = Mediator::new(registry);
//! let reply = mediator.send(Rename { name: "Foo Bar".into() }).unwrap();
//! assert_eq!(reply, "Foo Bar");
//! ```

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod reply;

pub use dispatcher::{DEFAULT_MAX_DEPTH, Dispatch, DispatchExt, Mediator, MediatorOptions};
pub use error::{DispatchError, DispatchResult, RegistryError, RegistryResult};
pub use handler::{
    Handle, HandleReply, HandleReplyWithMediator, HandleWithMediator, Handler, HandlerResult,
    Shape,
};
pub use message::{BoxedReply, Envelope, Message};
pub use registry::{HandlerFactory, Registration, Registry};
pub use reply::{InitialReply, SeedKind};

/// Prelude for common imports.
pub mod prelude {
    pub use super::dispatcher::{Dispatch, DispatchExt, Mediator, MediatorOptions};
    pub use super::error::{DispatchError, DispatchResult, RegistryError, RegistryResult};
    pub use super::handler::{
        Handle, HandleReply, HandleReplyWithMediator, HandleWithMediator, Handler, HandlerResult,
    };
    pub use super::message::Message;
    pub use super::registry::Registry;
    pub use super::reply::InitialReply;
}
