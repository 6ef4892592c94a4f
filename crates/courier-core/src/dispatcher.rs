//! Message dispatcher for the Courier mediator.
//!
//! This module provides the [`Mediator`], which owns a frozen [`Registry`] and
//! runs the registered handler chain for every message it is given.
//!
//! # The fold
//!
//! For each send:
//!
//! 1. The registration for the message type is looked up (fails fast with
//!    [`DispatchError::Unregistered`])
//! 2. A fresh handler chain and a fresh seed reply are produced
//! 3. Handlers run strictly in order; reply-producing shapes replace the
//!    running reply, the others pass it through
//! 4. The first handler error aborts the chain and is returned
//!
//! # Nested dispatch
//!
//! Mediator-aware handlers receive a `&dyn Dispatch`. Sending through it runs
//! on the same call stack, one level deeper. The mediator keeps no per-send
//! state of its own, so any number of sends may be in flight at once.
//!
//! ```rust,ignore
//! struct AccountExpediter;
//!
//! impl HandleWithMediator<ProcessAccount> for AccountExpediter {
//!     fn handle(&mut self, mediator: &dyn Dispatch, _: &ProcessAccount) -> HandlerResult {
//!         let account = mediator.send(GetAccount)?;
//!         account.process();
//!         Ok(())
//!     }
//! }
//! ```

use tracing::{Level, debug, span, trace};

use crate::error::{DispatchError, DispatchResult};
use crate::message::{BoxedReply, Envelope, Message};
use crate::registry::{Registration, Registry};

/// Default limit on nested dispatch depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

// =============================================================================
// Dispatch capability
// =============================================================================

/// The capability to send messages.
///
/// This is what mediator-aware handlers receive. It is object-safe, so tests
/// can hand a handler a fake implementation instead of a full [`Mediator`].
/// Typed sending is provided by [`DispatchExt`].
pub trait Dispatch {
    /// Runs the handler chain for a type-erased message and returns the
    /// type-erased reply.
    fn dispatch(&self, envelope: Envelope) -> DispatchResult<BoxedReply>;
}

/// Typed sending on top of any [`Dispatch`].
pub trait DispatchExt: Dispatch {
    /// Sends a message and returns its reply.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ResultTypeMismatch`] if the dispatcher replies
    /// with a value that is not an `M::Reply`, in addition to every error the
    /// chain itself can raise.
    fn send<M: Message>(&self, message: M) -> DispatchResult<M::Reply> {
        self.dispatch(Envelope::new(message))?
            .downcast::<M::Reply>()
            .map(|reply| *reply)
            .map_err(|_| DispatchError::ResultTypeMismatch {
                message: M::message_name(),
                expected: std::any::type_name::<M::Reply>(),
            })
    }

    /// Sends a message and discards its reply.
    fn publish<M: Message>(&self, message: M) -> DispatchResult<()> {
        self.send(message).map(drop)
    }
}

impl<D: Dispatch + ?Sized> DispatchExt for D {}

// =============================================================================
// Mediator
// =============================================================================

/// Tunables for a [`Mediator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediatorOptions {
    /// Maximum nesting depth for sends issued from within handlers.
    ///
    /// A send at depth `max_depth` fails with
    /// [`DispatchError::DepthExceeded`]. `0` disables the limit.
    pub max_depth: usize,
}

impl Default for MediatorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The in-process message dispatcher.
///
/// A `Mediator` is built once from a filled [`Registry`] and is immutable
/// afterwards. It is `Send + Sync`; share it with `Arc` between every
/// component that needs to send.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = Registry::new();
/// registry.register_default(|| vec![Handler::reply(ReturnsName)])?;
///
/// let mediator = Mediator::new(registry);
/// let name = mediator.send(Rename { name: "Foo Bar".into() })?;
/// assert_eq!(name, "Foo Bar");
/// ```
pub struct Mediator {
    registry: Registry,
    options: MediatorOptions,
}

impl Mediator {
    /// Creates a mediator with default options.
    pub fn new(registry: Registry) -> Self {
        Self::with_options(registry, MediatorOptions::default())
    }

    /// Creates a mediator with the given options.
    pub fn with_options(registry: Registry, options: MediatorOptions) -> Self {
        Self { registry, options }
    }

    /// Returns the registry this mediator dispatches from.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the options this mediator was built with.
    pub fn options(&self) -> MediatorOptions {
        self.options
    }

    /// Sends a message and returns the final reply of its handler chain.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Unregistered`] if `M` has no registration
    /// - [`DispatchError::Handler`] if a handler fails; later handlers do not run
    /// - any error raised by a nested send, unchanged
    pub fn send<M: Message>(&self, message: M) -> DispatchResult<M::Reply> {
        self.root().send_ref(&message)
    }

    /// Sends a message and discards the reply.
    ///
    /// The message must still be registered.
    pub fn publish<M: Message>(&self, message: M) -> DispatchResult<()> {
        self.send(message).map(drop)
    }

    fn root(&self) -> Scope<'_> {
        Scope {
            mediator: self,
            depth: 0,
        }
    }
}

impl Dispatch for Mediator {
    fn dispatch(&self, envelope: Envelope) -> DispatchResult<BoxedReply> {
        self.root().dispatch(envelope)
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("message_count", &self.registry.len())
            .field("options", &self.options)
            .finish()
    }
}

// =============================================================================
// Scope (internal)
// =============================================================================

/// One level of a send's call stack.
///
/// Handlers of a chain running at depth `n` receive a scope at depth `n + 1`
/// as their `&dyn Dispatch`.
pub(crate) struct Scope<'a> {
    mediator: &'a Mediator,
    depth: usize,
}

impl Scope<'_> {
    fn send_ref<M: Message>(&self, message: &M) -> DispatchResult<M::Reply> {
        let registration = self.mediator.registry.lookup::<M>()?;
        self.run(registration, message)
    }

    /// Folds the registration's handler chain over `message`.
    pub(crate) fn run<M: Message>(
        &self,
        registration: &Registration<M>,
        message: &M,
    ) -> DispatchResult<M::Reply> {
        let name = M::message_name();
        let max_depth = self.mediator.options.max_depth;
        if max_depth != 0 && self.depth >= max_depth {
            debug!(message_type = name, max_depth, "Nested dispatch too deep");
            return Err(DispatchError::DepthExceeded {
                message: name,
                max_depth,
            });
        }

        let span = span!(Level::DEBUG, "send", message_type = name, depth = self.depth);
        let _enter = span.enter();

        let nested = Scope {
            mediator: self.mediator,
            depth: self.depth + 1,
        };
        let handlers = registration.create_handlers();
        let mut reply = registration.initial_reply();

        for (index, mut handler) in handlers.into_iter().enumerate() {
            trace!(index, shape = %handler.shape(), "Invoking handler");
            reply = handler
                .invoke(&nested, message, reply)
                .map_err(|err| {
                    let err = DispatchError::from_handler(name, index, err);
                    debug!(index, error = %err, "Handler chain aborted");
                    err
                })?;
        }

        Ok(reply)
    }
}

impl Dispatch for Scope<'_> {
    fn dispatch(&self, envelope: Envelope) -> DispatchResult<BoxedReply> {
        let registration = self
            .mediator
            .registry
            .lookup_erased(envelope.message_type())
            .ok_or(DispatchError::Unregistered {
                message: envelope.name(),
            })?;
        registration.dispatch(self, envelope)
    }
}
