//! The built container: typed resolution, scopes and introspection.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{DiError, DiResult};
use crate::registration::{AnyArc, Key, Lifetime, Provider, Registration, ServiceDescriptor};

/// Immutable registry produced by
/// [`ContainerBuilder::build`](crate::ContainerBuilder::build).
///
/// Cloning is cheap; all clones share the same registrations and singleton
/// cache. The root container doubles as a scope for `Scoped` registrations,
/// so they resolve here too; use [`Container::begin_scope`] for isolated
/// per-activation instances.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    entries: HashMap<Key, Registration>,
    singletons: DashMap<Key, AnyArc>,
    root_scoped: DashMap<Key, AnyArc>,
}

impl Container {
    pub(crate) fn from_entries(entries: HashMap<Key, Registration>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                entries,
                singletons: DashMap::new(),
                root_scoped: DashMap::new(),
            }),
        }
    }

    /// Resolves the concrete type `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolver().resolve::<T>()
    }

    /// Resolves `T` if registered; `Ok(None)` when it is not.
    pub fn resolve_optional<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolver().resolve_optional::<T>()
    }

    /// Resolves the trait object `Arc<T>`.
    pub fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolver().resolve_trait::<T>()
    }

    /// Opens a child scope with its own cache for `Scoped` registrations.
    pub fn begin_scope(&self) -> Scope {
        Scope {
            inner: self.inner.clone(),
            cache: DashMap::new(),
        }
    }

    /// Descriptor of the registration for `T`, if any.
    pub fn describe<T: Send + Sync + 'static>(&self) -> Option<ServiceDescriptor> {
        self.describe_key(Key::of_type::<T>())
    }

    /// Descriptor of the registration for the trait object `T`, if any.
    pub fn describe_trait<T: ?Sized + 'static>(&self) -> Option<ServiceDescriptor> {
        self.describe_key(Key::of_trait::<T>())
    }

    /// Descriptors of every registration, sorted by display name.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut all: Vec<_> = self
            .inner
            .entries
            .iter()
            .map(|(key, registration)| registration.describe(*key))
            .collect();
        all.sort_by_key(|descriptor| descriptor.key.display_name());
        all
    }

    /// Metadata of type `M` attached to the registration for `T`.
    pub fn metadata_of<T, M>(&self) -> Option<Arc<M>>
    where
        T: Send + Sync + 'static,
        M: Send + Sync + 'static,
    {
        let registration = self.inner.entries.get(&Key::of_type::<T>())?;
        let metadata = registration.metadata.clone()?;
        metadata.downcast::<M>().ok()
    }

    /// Number of registrations held by the container.
    pub fn registration_count(&self) -> usize {
        self.inner.entries.len()
    }

    fn describe_key(&self, key: Key) -> Option<ServiceDescriptor> {
        self.inner
            .entries
            .get(&key)
            .map(|registration| registration.describe(key))
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            inner: &self.inner,
            scope: None,
            stack: RefCell::new(Vec::new()),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.inner.entries.len())
            .finish_non_exhaustive()
    }
}

/// A child resolution scope.
///
/// `Scoped` registrations resolve to one shared instance per scope, held in
/// the scope's cache and dropped with it. Singletons still come from the
/// root; transients are built fresh as always.
pub struct Scope {
    inner: Arc<ContainerInner>,
    cache: DashMap<Key, AnyArc>,
}

impl Scope {
    /// Resolves the concrete type `T` within this scope.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolver().resolve::<T>()
    }

    /// Resolves `T` if registered or seeded; `Ok(None)` when it is not.
    pub fn resolve_optional<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolver().resolve_optional::<T>()
    }

    /// Resolves the trait object `Arc<T>` within this scope.
    pub fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolver().resolve_trait::<T>()
    }

    /// Seeds a ready-made instance of `T` into this scope. Resolution
    /// chains running in the scope see it like any `Scoped` registration,
    /// no container entry required. Seeding the same type again replaces
    /// the previous value.
    pub fn provide<T: Send + Sync + 'static>(&self, value: T) {
        self.cache.insert(Key::of_type::<T>(), Arc::new(value) as AnyArc);
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            inner: &self.inner,
            scope: Some(&self.cache),
            stack: RefCell::new(Vec::new()),
        }
    }
}

/// Resolution context handed to provider closures and
/// [`Injectable`](crate::Injectable) recipes.
///
/// Re-entrant: providers resolve their own dependencies through it, and the
/// context tracks the chain to report cycles instead of overflowing.
pub struct Resolver<'a> {
    inner: &'a ContainerInner,
    scope: Option<&'a DashMap<Key, AnyArc>>,
    stack: RefCell<Vec<Key>>,
}

impl Resolver<'_> {
    /// Resolves the concrete type `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let erased = self.resolve_key(Key::of_type::<T>())?;
        erased.downcast::<T>().map_err(|_| DiError::TypeMismatch {
            service: std::any::type_name::<T>(),
        })
    }

    /// Resolves `T` if registered; `Ok(None)` when it is not.
    pub fn resolve_optional<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        match self.resolve::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(DiError::NotRegistered { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolves the trait object `Arc<T>`.
    pub fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let erased = self.resolve_key(Key::of_trait::<T>())?;
        erased
            .downcast::<Arc<T>>()
            .map(|outer| (*outer).clone())
            .map_err(|_| DiError::TypeMismatch {
                service: std::any::type_name::<T>(),
            })
    }

    fn resolve_key(&self, key: Key) -> DiResult<AnyArc> {
        // Seeded values and already-cached scoped instances short-circuit
        // before any registration lookup.
        let cached = match self.scope {
            Some(scope) => scope.get(&key).map(|v| v.value().clone()),
            None => self.inner.root_scoped.get(&key).map(|v| v.value().clone()),
        };
        if let Some(value) = cached {
            return Ok(value);
        }

        let registration = self
            .inner
            .entries
            .get(&key)
            .ok_or_else(|| DiError::NotRegistered {
                service: key.display_name(),
            })?;

        {
            let mut stack = self.stack.borrow_mut();
            if stack.contains(&key) {
                let mut path: Vec<&'static str> =
                    stack.iter().map(|k| k.display_name()).collect();
                path.push(key.display_name());
                return Err(DiError::CircularDependency { path });
            }
            stack.push(key);
        }

        let result = match registration.lifetime {
            Lifetime::Transient => (registration.provider)(self),
            Lifetime::Singleton => self.cached(&self.inner.singletons, key, &registration.provider),
            Lifetime::Scoped => {
                let cache = self.scope.unwrap_or(&self.inner.root_scoped);
                self.cached(cache, key, &registration.provider)
            }
        };

        self.stack.borrow_mut().pop();
        result
    }

    fn cached(
        &self,
        cache: &DashMap<Key, AnyArc>,
        key: Key,
        provider: &Provider,
    ) -> DiResult<AnyArc> {
        if let Some(existing) = cache.get(&key) {
            return Ok(existing.value().clone());
        }
        // Construct outside the cache lock; resolution may recurse into the
        // same map. First insert wins so racing resolvers share one value.
        let built = provider(self)?;
        let shared = cache.entry(key).or_insert(built).value().clone();
        Ok(shared)
    }
}
