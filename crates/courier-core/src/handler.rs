//! Handler shapes for the Courier mediator.
//!
//! A handler consumes a message in exactly one of four shapes:
//!
//! | Shape | Trait | Sees the mediator | Produces the reply |
//! |-------|-------|-------------------|--------------------|
//! | [`Shape::Pure`] | [`Handle`] | no | no (passes it through) |
//! | [`Shape::Reply`] | [`HandleReply`] | no | yes |
//! | [`Shape::Mediated`] | [`HandleWithMediator`] | yes | no (passes it through) |
//! | [`Shape::MediatedReply`] | [`HandleReplyWithMediator`] | yes | yes |
//!
//! The shape is fixed when the handler is wrapped in a [`Handler`], so a
//! chain mixing all four can be folded with a single `match`. Every shape for
//! message `M` works with the same reply type `M::Reply`; a result-producing
//! handler with any other reply type does not compile.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! struct ReturnsName;
//!
//! impl HandleReply<Rename> for ReturnsName {
//!     fn handle(&mut self, message: &Rename, _reply: String) -> HandlerResult<String> {
//!         Ok(message.name.clone())
//!     }
//! }
//!
//! let handlers = || vec![
//!     Handler::pure_fn(|message: &Rename| {
//!         tracing::info!(name = %message.name, "renaming");
//!         Ok(())
//!     }),
//!     Handler::reply(ReturnsName),
//! ];
//! ```

use std::fmt;

use crate::dispatcher::Dispatch;
use crate::message::Message;

/// Result type returned by handlers.
///
/// Any error aborts the rest of the chain and is surfaced to the sender.
pub type HandlerResult<T = ()> = anyhow::Result<T>;

// ============================================================================
// Shape Traits
// ============================================================================

/// Consumes a message for its side effects.
pub trait Handle<M: Message> {
    /// Handles the message.
    fn handle(&mut self, message: &M) -> HandlerResult;
}

/// Consumes a message and the running reply, returning the next reply.
pub trait HandleReply<M: Message> {
    /// Handles the message, producing the next running reply.
    fn handle(&mut self, message: &M, reply: M::Reply) -> HandlerResult<M::Reply>;
}

/// Consumes a message with access to the mediator, for nested sends.
pub trait HandleWithMediator<M: Message> {
    /// Handles the message. `mediator` may be used to send further messages.
    fn handle(&mut self, mediator: &dyn Dispatch, message: &M) -> HandlerResult;
}

/// Consumes a message and the running reply with access to the mediator.
pub trait HandleReplyWithMediator<M: Message> {
    /// Handles the message, producing the next running reply. `mediator` may
    /// be used to send further messages while computing it.
    fn handle(
        &mut self,
        mediator: &dyn Dispatch,
        message: &M,
        reply: M::Reply,
    ) -> HandlerResult<M::Reply>;
}

// ============================================================================
// Shape
// ============================================================================

/// The capability shape a [`Handler`] was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// See [`Handle`].
    Pure,
    /// See [`HandleReply`].
    Reply,
    /// See [`HandleWithMediator`].
    Mediated,
    /// See [`HandleReplyWithMediator`].
    MediatedReply,
}

impl Shape {
    /// Returns `true` if handlers of this shape produce the running reply.
    pub fn produces_reply(self) -> bool {
        matches!(self, Self::Reply | Self::MediatedReply)
    }

    /// Returns `true` if handlers of this shape receive the mediator.
    pub fn sees_mediator(self) -> bool {
        matches!(self, Self::Mediated | Self::MediatedReply)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pure => "pure",
            Self::Reply => "reply",
            Self::Mediated => "mediated",
            Self::MediatedReply => "mediated-reply",
        })
    }
}

// ============================================================================
// Handler
// ============================================================================

/// A handler for message `M`, tagged with its shape.
///
/// Handlers are produced fresh for every send by the registration's factory
/// and dropped once the send completes.
pub enum Handler<M: Message> {
    /// A [`Handle`] implementation.
    Pure(Box<dyn Handle<M>>),
    /// A [`HandleReply`] implementation.
    Reply(Box<dyn HandleReply<M>>),
    /// A [`HandleWithMediator`] implementation.
    Mediated(Box<dyn HandleWithMediator<M>>),
    /// A [`HandleReplyWithMediator`] implementation.
    MediatedReply(Box<dyn HandleReplyWithMediator<M>>),
}

impl<M: Message> Handler<M> {
    /// Wraps a side-effect handler.
    pub fn pure(handler: impl Handle<M> + 'static) -> Self {
        Self::Pure(Box::new(handler))
    }

    /// Wraps a result-producing handler.
    pub fn reply(handler: impl HandleReply<M> + 'static) -> Self {
        Self::Reply(Box::new(handler))
    }

    /// Wraps a mediator-aware side-effect handler.
    pub fn mediated(handler: impl HandleWithMediator<M> + 'static) -> Self {
        Self::Mediated(Box::new(handler))
    }

    /// Wraps a mediator-aware result-producing handler.
    pub fn mediated_reply(handler: impl HandleReplyWithMediator<M> + 'static) -> Self {
        Self::MediatedReply(Box::new(handler))
    }

    /// Wraps a closure as a side-effect handler.
    pub fn pure_fn<F>(f: F) -> Self
    where
        F: FnMut(&M) -> HandlerResult + 'static,
    {
        Self::Pure(Box::new(FnHandler(f)))
    }

    /// Wraps a closure as a result-producing handler.
    pub fn reply_fn<F>(f: F) -> Self
    where
        F: FnMut(&M, M::Reply) -> HandlerResult<M::Reply> + 'static,
    {
        Self::Reply(Box::new(FnHandler(f)))
    }

    /// Wraps a closure as a mediator-aware side-effect handler.
    pub fn mediated_fn<F>(f: F) -> Self
    where
        F: FnMut(&dyn Dispatch, &M) -> HandlerResult + 'static,
    {
        Self::Mediated(Box::new(FnHandler(f)))
    }

    /// Wraps a closure as a mediator-aware result-producing handler.
    pub fn mediated_reply_fn<F>(f: F) -> Self
    where
        F: FnMut(&dyn Dispatch, &M, M::Reply) -> HandlerResult<M::Reply> + 'static,
    {
        Self::MediatedReply(Box::new(FnHandler(f)))
    }

    /// Returns the shape this handler was declared with.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Pure(_) => Shape::Pure,
            Self::Reply(_) => Shape::Reply,
            Self::Mediated(_) => Shape::Mediated,
            Self::MediatedReply(_) => Shape::MediatedReply,
        }
    }

    /// Invokes the handler according to its shape and returns the next
    /// running reply. Shapes that do not produce a reply pass `reply` through.
    pub fn invoke(
        &mut self,
        mediator: &dyn Dispatch,
        message: &M,
        reply: M::Reply,
    ) -> HandlerResult<M::Reply> {
        match self {
            Self::Pure(h) => h.handle(message).map(|()| reply),
            Self::Reply(h) => h.handle(message, reply),
            Self::Mediated(h) => h.handle(mediator, message).map(|()| reply),
            Self::MediatedReply(h) => h.handle(mediator, message, reply),
        }
    }
}

impl<M: Message> fmt::Debug for Handler<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.shape()).finish()
    }
}

// ============================================================================
// Closure Handlers
// ============================================================================

/// Adapts a closure to one of the shape traits.
struct FnHandler<F>(F);

impl<M, F> Handle<M> for FnHandler<F>
where
    M: Message,
    F: FnMut(&M) -> HandlerResult,
{
    fn handle(&mut self, message: &M) -> HandlerResult {
        (self.0)(message)
    }
}

impl<M, F> HandleReply<M> for FnHandler<F>
where
    M: Message,
    F: FnMut(&M, M::Reply) -> HandlerResult<M::Reply>,
{
    fn handle(&mut self, message: &M, reply: M::Reply) -> HandlerResult<M::Reply> {
        (self.0)(message, reply)
    }
}

impl<M, F> HandleWithMediator<M> for FnHandler<F>
where
    M: Message,
    F: FnMut(&dyn Dispatch, &M) -> HandlerResult,
{
    fn handle(&mut self, mediator: &dyn Dispatch, message: &M) -> HandlerResult {
        (self.0)(mediator, message)
    }
}

impl<M, F> HandleReplyWithMediator<M> for FnHandler<F>
where
    M: Message,
    F: FnMut(&dyn Dispatch, &M, M::Reply) -> HandlerResult<M::Reply>,
{
    fn handle(
        &mut self,
        mediator: &dyn Dispatch,
        message: &M,
        reply: M::Reply,
    ) -> HandlerResult<M::Reply> {
        (self.0)(mediator, message, reply)
    }
}
