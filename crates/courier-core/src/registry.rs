//! Registry of message registrations.
//!
//! The [`Registry`] maps each message type to exactly one [`Registration`]:
//! a handler factory plus an [`InitialReply`]. It is filled during wiring and
//! then frozen into a [`Mediator`](crate::Mediator), which makes registration
//! after the first send impossible by construction.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dispatcher::Scope;
use crate::error::{DispatchError, DispatchResult, RegistryError, RegistryResult};
use crate::handler::Handler;
use crate::message::{BoxedReply, Envelope, Message};
use crate::reply::{InitialReply, SeedKind};

/// Factory producing a fresh handler chain for each send.
pub type HandlerFactory<M> = Arc<dyn Fn() -> Vec<Handler<M>> + Send + Sync>;

// =============================================================================
// Registration
// =============================================================================

/// The stored pairing of a handler factory and an initial-reply strategy for
/// one message type.
pub struct Registration<M: Message> {
    create_handlers: HandlerFactory<M>,
    initial_reply: InitialReply<M::Reply>,
}

impl<M: Message> Registration<M> {
    /// Creates a registration.
    pub fn new<F>(create_handlers: F, initial_reply: InitialReply<M::Reply>) -> Self
    where
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
    {
        Self {
            create_handlers: Arc::new(create_handlers),
            initial_reply,
        }
    }

    /// Produces a fresh, ordered handler chain.
    pub fn create_handlers(&self) -> Vec<Handler<M>> {
        (self.create_handlers)()
    }

    /// Produces a fresh seed reply.
    pub fn initial_reply(&self) -> M::Reply {
        self.initial_reply.produce()
    }

    /// Returns the seed strategy.
    pub fn seed_kind(&self) -> SeedKind {
        self.initial_reply.kind()
    }
}

impl<M: Message> std::fmt::Debug for Registration<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("message", &M::message_name())
            .field("initial_reply", &self.initial_reply)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Type-erased registration (internal)
// =============================================================================

/// Object-safe view of a [`Registration`] so registrations for unrelated
/// message types can share one map.
pub(crate) trait ErasedRegistration: Send + Sync {
    fn message_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// Runs the chain for a type-erased message.
    fn dispatch(&self, scope: &Scope<'_>, envelope: Envelope) -> DispatchResult<BoxedReply>;
}

impl<M: Message> ErasedRegistration for Registration<M> {
    fn message_name(&self) -> &'static str {
        M::message_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dispatch(&self, scope: &Scope<'_>, envelope: Envelope) -> DispatchResult<BoxedReply> {
        // Registrations are resolved by the envelope's own `TypeId`, so this
        // downcast only fails if the entry was stored under the wrong key.
        let message = envelope
            .downcast::<M>()
            .map_err(|_| DispatchError::Unregistered {
                message: M::message_name(),
            })?;
        let reply = scope.run(self, &message)?;
        Ok(Box::new(reply))
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Mapping from message type to its [`Registration`].
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = Registry::new();
///
/// registry.register_default(|| vec![Handler::reply(ReturnsName)])?;
/// registry.register_void(|| vec![Handler::mediated(AccountExpediter)])?;
///
/// let mediator = Mediator::new(registry);
/// ```
#[derive(Default)]
pub struct Registry {
    entries: HashMap<TypeId, Box<dyn ErasedRegistration>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers the handler chain and initial reply for message type `M`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRegistration`] if `M` is already
    /// registered. The existing registration stays in effect.
    pub fn register<M, F>(
        &mut self,
        create_handlers: F,
        initial_reply: InitialReply<M::Reply>,
    ) -> RegistryResult<()>
    where
        M: Message,
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
    {
        self.insert(Registration::new(create_handlers, initial_reply))
    }

    /// Registers a void message; the running reply is `()`.
    pub fn register_void<M, F>(&mut self, create_handlers: F) -> RegistryResult<()>
    where
        M: Message<Reply = ()>,
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
    {
        self.register(create_handlers, InitialReply::none())
    }

    /// Registers a message whose reply is seeded with `M::Reply::default()`.
    pub fn register_default<M, F>(&mut self, create_handlers: F) -> RegistryResult<()>
    where
        M: Message,
        M::Reply: Default,
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
    {
        self.register(create_handlers, InitialReply::new_instance())
    }

    /// Registers a message whose reply is seeded by `initial_reply`.
    pub fn register_with<M, F, S>(
        &mut self,
        create_handlers: F,
        initial_reply: S,
    ) -> RegistryResult<()>
    where
        M: Message,
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
        S: Fn() -> M::Reply + Send + Sync + 'static,
    {
        self.register(create_handlers, InitialReply::from_fn(initial_reply))
    }

    /// Registers a message whose scalar reply is seeded with its zero value.
    pub fn register_scalar<M, F>(&mut self, create_handlers: F) -> RegistryResult<()>
    where
        M: Message,
        M::Reply: Default + Copy,
        F: Fn() -> Vec<Handler<M>> + Send + Sync + 'static,
    {
        self.register(create_handlers, InitialReply::scalar())
    }

    /// Inserts a prepared registration.
    pub fn insert<M: Message>(&mut self, registration: Registration<M>) -> RegistryResult<()> {
        let message = M::message_name();

        match self.entries.entry(TypeId::of::<M>()) {
            Entry::Occupied(_) => {
                warn!(message_type = message, "Duplicate registration rejected");
                Err(RegistryError::DuplicateRegistration { message })
            }
            Entry::Vacant(slot) => {
                debug!(
                    message_type = message,
                    seed = %registration.seed_kind(),
                    "Registered message"
                );
                slot.insert(Box::new(registration));
                Ok(())
            }
        }
    }

    /// Looks up the registration for message type `M`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Unregistered`] if `M` has no registration.
    pub fn lookup<M: Message>(&self) -> DispatchResult<&Registration<M>> {
        let message = M::message_name();
        let entry = self
            .entries
            .get(&TypeId::of::<M>())
            .ok_or(DispatchError::Unregistered { message })?;

        // Entries are keyed by `TypeId::of::<M>()`; a failed downcast means a
        // corrupted map, never a caller error.
        entry
            .as_any()
            .downcast_ref::<Registration<M>>()
            .ok_or(DispatchError::ResultTypeMismatch {
                message,
                expected: std::any::type_name::<M::Reply>(),
            })
    }

    /// Looks up a registration by the `TypeId` of its message type.
    pub(crate) fn lookup_erased(&self, message_type: TypeId) -> Option<&dyn ErasedRegistration> {
        self.entries.get(&message_type).map(|entry| &**entry)
    }

    /// Returns `true` if message type `M` is registered.
    pub fn contains<M: Message>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<M>())
    }

    /// Returns the number of registered message types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the names of all registered message types, sorted.
    pub fn message_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|e| e.message_name()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("messages", &self.message_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResult;

    struct Rename {
        name: String,
    }

    impl Message for Rename {
        type Reply = String;
    }

    struct Tick;

    impl Message for Tick {
        type Reply = ();
    }

    fn returns_name() -> Vec<Handler<Rename>> {
        vec![Handler::reply_fn(|m: &Rename, _| Ok(m.name.clone()))]
    }

    fn returns_constant() -> Vec<Handler<Rename>> {
        vec![Handler::reply_fn(|_: &Rename, _| -> HandlerResult<String> {
            Ok("constant".into())
        })]
    }

    #[test]
    fn test_lookup_unregistered() {
        let registry = Registry::new();

        let err = registry.lookup::<Rename>().unwrap_err();
        assert!(matches!(err, DispatchError::Unregistered { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register_default(returns_name).unwrap();

        let registration = registry.lookup::<Rename>().unwrap();
        assert_eq!(registration.seed_kind(), SeedKind::NewInstance);
        assert_eq!(registration.initial_reply(), "");
        assert_eq!(registration.create_handlers().len(), 1);
        assert!(registry.contains::<Rename>());
        assert!(!registry.contains::<Tick>());
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = Registry::new();
        registry
            .register_with(returns_name, || "first".to_string())
            .unwrap();

        let err = registry
            .register_with(returns_constant, || "second".to_string())
            .unwrap_err();

        assert!(matches!(err, RegistryError::DuplicateRegistration { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup::<Rename>().unwrap().initial_reply(), "first");
    }

    #[test]
    fn test_duplicate_detected_across_seed_strategies() {
        let mut registry = Registry::new();
        registry.register_void(|| Vec::<Handler<Tick>>::new()).unwrap();

        assert!(registry.register_default(|| Vec::<Handler<Tick>>::new()).is_err());
        assert_eq!(
            registry.lookup::<Tick>().unwrap().seed_kind(),
            SeedKind::None
        );
    }

    #[test]
    fn test_factory_runs_per_call() {
        let mut registry = Registry::new();
        registry.register_default(returns_name).unwrap();
        let registration = registry.lookup::<Rename>().unwrap();

        let first = registration.create_handlers();
        let second = registration.create_handlers();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_message_names_sorted() {
        let mut registry = Registry::new();
        registry.register_void(|| Vec::<Handler<Tick>>::new()).unwrap();
        registry.register_default(returns_name).unwrap();

        let names = registry.message_names();
        assert_eq!(names.len(), 2);
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }
}
