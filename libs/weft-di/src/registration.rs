//! Registration keys, lifetimes and the per-entry metadata the container
//! keeps about every registered service.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::container::Resolver;
use crate::error::DiResult;

/// Type-erased shared value slot. Concrete services are stored as
/// `Arc<T>`; trait objects are stored as `Arc<Arc<dyn T>>` so the outer
/// `Arc` satisfies `Any` while the inner one keeps the unsized target.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Provider closure held by a registration.
pub(crate) type Provider = Arc<dyn Fn(&Resolver<'_>) -> DiResult<AnyArc> + Send + Sync>;

/// How instances of a registration are shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance for the whole container.
    Singleton,
    /// One instance per [`Scope`](crate::Scope); the root container acts
    /// as its own scope.
    Scoped,
    /// A fresh instance on every resolution. The default.
    Transient,
}

/// Identifies a registration: either a concrete type or a trait object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Type(TypeId, &'static str),
    Trait(TypeId, &'static str),
}

impl Key {
    pub(crate) fn of_type<T: 'static>() -> Self {
        Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    pub(crate) fn of_trait<T: ?Sized + 'static>() -> Self {
        Key::Trait(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Human-readable name of the registered type or trait.
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) | Key::Trait(_, name) => name,
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Type(_, name) => write!(f, "Type({name})"),
            Key::Trait(_, name) => write!(f, "Trait({name})"),
        }
    }
}

/// Marker recorded on a registration when an interception wrapper type has
/// been associated with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterceptorTag {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl InterceptorTag {
    pub fn of<I: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<I>(),
            type_name: std::any::type_name::<I>(),
        }
    }

    /// Whether the tag refers to the type `I`.
    pub fn is<I: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<I>()
    }
}

/// A single container entry.
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) provider: Provider,
    pub(crate) interceptor: Option<InterceptorTag>,
    pub(crate) metadata: Option<AnyArc>,
}

impl Registration {
    pub(crate) fn new(provider: Provider) -> Self {
        Self {
            lifetime: Lifetime::Transient,
            provider,
            interceptor: None,
            metadata: None,
        }
    }

    pub(crate) fn describe(&self, key: Key) -> ServiceDescriptor {
        ServiceDescriptor {
            key,
            lifetime: self.lifetime,
            interceptor: self.interceptor,
            has_metadata: self.metadata.is_some(),
        }
    }
}

/// Read-only view of a registration, for diagnostics and test assertions.
#[derive(Clone, Debug)]
pub struct ServiceDescriptor {
    pub key: Key,
    pub lifetime: Lifetime,
    pub interceptor: Option<InterceptorTag>,
    pub has_metadata: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker {}

    #[test]
    fn test_key_display_name() {
        let key = Key::of_type::<String>();
        assert!(key.display_name().contains("String"));
        let key = Key::of_trait::<dyn Marker>();
        assert!(key.display_name().contains("Marker"));
    }

    #[test]
    fn test_keys_distinguish_type_from_trait() {
        assert_ne!(Key::of_type::<String>(), Key::of_type::<u32>());
        assert_eq!(Key::of_type::<String>(), Key::of_type::<String>());
    }

    #[test]
    fn test_interceptor_tag_matches_type() {
        let tag = InterceptorTag::of::<String>();
        assert!(tag.is::<String>());
        assert!(!tag.is::<u32>());
    }
}
