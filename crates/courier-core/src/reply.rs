//! Initial-reply strategies.
//!
//! Every registration carries an [`InitialReply`] that produces the seed value
//! threaded through the handler chain. The strategies differ only in how they
//! are constructed; all of them are stored as the same zero-argument factory.

use std::fmt;
use std::sync::Arc;

/// How an [`InitialReply`] produces its seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedKind {
    /// Void message; the seed is `()`.
    None,
    /// A freshly default-constructed value.
    NewInstance,
    /// The zero value of a scalar type.
    Scalar,
    /// A caller-supplied factory.
    Custom,
}

impl fmt::Display for SeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::NewInstance => "new-instance",
            Self::Scalar => "scalar",
            Self::Custom => "custom",
        })
    }
}

/// Produces the seed reply for each send.
///
/// The factory runs once per send, so every send starts from a fresh value.
///
/// # Example
///
/// ```rust,ignore
/// // Void message
/// let seed = InitialReply::none();
///
/// // `Default` value
/// let seed = InitialReply::<NameViewModel>::new_instance();
///
/// // Caller-supplied, e.g. a partially initialised view model
/// let seed = InitialReply::from_fn(|| NameViewModel::with_locale("en"));
///
/// // Zero value of a scalar
/// let seed = InitialReply::<i32>::scalar();
/// ```
pub struct InitialReply<R> {
    factory: Arc<dyn Fn() -> R + Send + Sync>,
    kind: SeedKind,
}

impl InitialReply<()> {
    /// Seed for void messages.
    pub fn none() -> Self {
        Self {
            factory: Arc::new(|| ()),
            kind: SeedKind::None,
        }
    }
}

impl<R: Default + 'static> InitialReply<R> {
    /// Seeds each send with `R::default()`.
    pub fn new_instance() -> Self {
        Self {
            factory: Arc::new(R::default),
            kind: SeedKind::NewInstance,
        }
    }
}

impl<R: Default + Copy + 'static> InitialReply<R> {
    /// Seeds each send with the zero value of a scalar type.
    pub fn scalar() -> Self {
        Self {
            factory: Arc::new(R::default),
            kind: SeedKind::Scalar,
        }
    }
}

impl<R: 'static> InitialReply<R> {
    /// Seeds each send with the value returned by `factory`.
    pub fn from_fn<F>(factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            kind: SeedKind::Custom,
        }
    }

    /// Produces a fresh seed.
    pub fn produce(&self) -> R {
        (self.factory)()
    }

    /// Returns the strategy this seed was built with.
    pub fn kind(&self) -> SeedKind {
        self.kind
    }
}

impl<R> Clone for InitialReply<R> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            kind: self.kind,
        }
    }
}

impl<R> fmt::Debug for InitialReply<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitialReply")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
