//! Message types for the Courier mediator.
//!
//! - [`Message`] - Trait implemented by every type that can be sent
//! - [`Envelope`] - Type-erased message used by the [`Dispatch`] capability
//!
//! [`Dispatch`]: crate::dispatcher::Dispatch

use std::any::{Any, TypeId};

// ============================================================================
// Message Trait
// ============================================================================

/// A value that can be sent through a [`Mediator`](crate::Mediator).
///
/// Every message type names the reply type its handler chain produces. The
/// reply is threaded through the chain, seeded by the registration's
/// [`InitialReply`](crate::InitialReply). Messages that only trigger side
/// effects use `()`.
///
/// # Derive Macro
///
/// ```rust,ignore
/// use courier::Message;
///
/// #[derive(Message)]
/// #[message(reply = "String")]
/// pub struct Rename {
///     pub name: String,
/// }
///
/// #[derive(Message)]
/// pub struct ProcessAccount;
/// ```
pub trait Message: Any {
    /// The value produced by this message's handler chain.
    type Reply: 'static;

    /// Returns the human-readable name of this message type.
    ///
    /// Used in errors and log output. Defaults to the Rust type name.
    fn message_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A type-erased reply produced by [`Dispatch::dispatch`](crate::Dispatch::dispatch).
pub type BoxedReply = Box<dyn Any>;

/// A type-erased container for a message.
///
/// `Envelope` carries a message through the object-safe
/// [`Dispatch`](crate::Dispatch) capability, together with the message's name
/// so that errors can be reported before the concrete type is recovered.
pub struct Envelope {
    name: &'static str,
    body: Box<dyn Any>,
}

impl Envelope {
    /// Wraps a message.
    pub fn new<M: Message>(message: M) -> Self {
        Self {
            name: M::message_name(),
            body: Box::new(message),
        }
    }

    /// Returns the name of the wrapped message type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the `TypeId` of the wrapped message.
    pub fn message_type(&self) -> TypeId {
        (*self.body).type_id()
    }

    /// Returns `true` if the envelope holds a message of type `M`.
    pub fn is<M: Message>(&self) -> bool {
        self.body.is::<M>()
    }

    /// Attempts to borrow the wrapped message as `M`.
    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        self.body.downcast_ref()
    }

    /// Recovers the wrapped message, handing the envelope back on mismatch.
    pub fn downcast<M: Message>(self) -> Result<M, Self> {
        let name = self.name;
        self.body
            .downcast::<M>()
            .map(|message| *message)
            .map_err(|body| Self { name, body })
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("message", &self.name)
            .finish_non_exhaustive()
    }
}
