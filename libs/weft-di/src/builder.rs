//! Container assembly: registrations accumulate here, then `build()`
//! freezes them and runs the scheduled build callbacks.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::{Container, Resolver};
use crate::error::{DiError, DiResult};
use crate::injectable::Injectable;
use crate::registration::{AnyArc, InterceptorTag, Key, Lifetime, Provider, Registration};

type BuildCallback = Box<dyn FnOnce(&Container) -> anyhow::Result<()> + Send>;

/// Accumulates registrations and build callbacks.
///
/// Re-registering a key replaces the previous entry (last wins). Nothing is
/// validated until [`ContainerBuilder::build`], which assembles the
/// container and then runs every scheduled callback in order; the first
/// callback error aborts the build.
#[derive(Default)]
pub struct ContainerBuilder {
    entries: HashMap<Key, Registration>,
    callbacks: Vec<BuildCallback>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for the concrete type `T`. Default lifetime is
    /// [`Lifetime::Transient`].
    pub fn register_factory<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let provider: Provider = Arc::new(move |cx| factory(cx).map(|v| Arc::new(v) as AnyArc));
        self.insert(Key::of_type::<T>(), provider)
    }

    /// Registers an already-constructed instance of `T` as a singleton.
    pub fn register_instance<T: Send + Sync + 'static>(
        &mut self,
        value: T,
    ) -> RegistrationBuilder<'_, T> {
        let shared = Arc::new(value);
        let provider: Provider = Arc::new(move |_| Ok(shared.clone() as AnyArc));
        self.insert(Key::of_type::<T>(), provider)
            .lifetime(Lifetime::Singleton)
    }

    /// Registers an instance that is already shared, without re-wrapping
    /// it; resolution hands out clones of the given `Arc`.
    pub fn register_arc<T: Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
    ) -> RegistrationBuilder<'_, T> {
        let provider: Provider = Arc::new(move |_| Ok(value.clone() as AnyArc));
        self.insert(Key::of_type::<T>(), provider)
            .lifetime(Lifetime::Singleton)
    }

    /// Registers `T` using its [`Injectable`] recipe.
    pub fn register_injectable<T: Injectable>(&mut self) -> RegistrationBuilder<'_, T> {
        self.register_factory(T::inject)
    }

    /// Registers a factory producing the trait object `Arc<T>`, resolvable
    /// through [`Container::resolve_trait`](crate::Container::resolve_trait).
    pub fn register_trait_factory<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let provider: Provider = Arc::new(move |cx| factory(cx).map(|v| Arc::new(v) as AnyArc));
        self.insert(Key::of_trait::<T>(), provider)
    }

    /// Registers an existing trait object as a singleton.
    pub fn register_trait_instance<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
    ) -> RegistrationBuilder<'_, T> {
        let provider: Provider = Arc::new(move |_| Ok(Arc::new(value.clone()) as AnyArc));
        self.insert(Key::of_trait::<T>(), provider)
            .lifetime(Lifetime::Singleton)
    }

    /// Whether a registration for the concrete type `T` exists.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.entries.contains_key(&Key::of_type::<T>())
    }

    /// Whether a registration for the trait object `T` exists.
    pub fn contains_trait<T: ?Sized + 'static>(&self) -> bool {
        self.entries.contains_key(&Key::of_trait::<T>())
    }

    /// Schedules `callback` to run against the built container. Callbacks
    /// run exactly once, in scheduling order, inside `build()`.
    pub fn on_built<F>(&mut self, callback: F)
    where
        F: FnOnce(&Container) -> anyhow::Result<()> + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Freezes the registrations into a [`Container`] and runs the build
    /// callbacks. A callback error surfaces as [`DiError::BuildCallback`]
    /// with its cause chain intact; no rollback is attempted.
    pub fn build(self) -> Result<Container, DiError> {
        let container = Container::from_entries(self.entries);
        tracing::debug!(
            registrations = container.registration_count(),
            callbacks = self.callbacks.len(),
            "container assembled"
        );
        for callback in self.callbacks {
            callback(&container).map_err(|source| DiError::BuildCallback { source })?;
        }
        Ok(container)
    }

    fn insert<T: ?Sized>(&mut self, key: Key, provider: Provider) -> RegistrationBuilder<'_, T> {
        let registration = Registration::new(provider);
        let entry = match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                tracing::debug!(service = key.display_name(), "registration replaced");
                occupied.insert(registration);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(registration),
        };
        RegistrationBuilder {
            entry,
            _marker: PhantomData,
        }
    }
}

/// Fluent handle over a single registration, returned by the `register_*`
/// methods. All configuration applies immediately; the handle can simply be
/// dropped when no further configuration is needed.
pub struct RegistrationBuilder<'a, T: ?Sized> {
    entry: &'a mut Registration,
    _marker: PhantomData<fn(&T)>,
}

impl<'a, T: ?Sized> RegistrationBuilder<'a, T> {
    /// Sets the sharing lifetime.
    pub fn lifetime(self, lifetime: Lifetime) -> Self {
        self.entry.lifetime = lifetime;
        self
    }

    /// Records the interception wrapper type `I` on this registration. The
    /// tag is metadata only; applying the wrapper is up to whoever
    /// activates the service.
    pub fn intercepted_by<I: 'static>(self) -> Self {
        self.entry.interceptor = Some(InterceptorTag::of::<I>());
        self
    }

    /// Attaches caller-defined metadata, retrievable through
    /// [`Container::metadata_of`](crate::Container::metadata_of).
    pub fn with_metadata<M: Send + Sync + 'static>(self, metadata: M) -> Self {
        self.entry.metadata = Some(Arc::new(metadata));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Config {
        name: &'static str,
    }

    trait Greeter: Send + Sync {
        fn hello(&self) -> &'static str;
    }

    struct EnGreeter;

    impl Greeter for EnGreeter {
        fn hello(&self) -> &'static str {
            "hello"
        }
    }

    #[test]
    fn test_last_registration_wins() {
        let mut builder = ContainerBuilder::new();
        builder.register_instance(Config { name: "first" });
        builder.register_instance(Config { name: "second" });
        let container = builder.build().unwrap();
        let config = container.resolve::<Config>().unwrap();
        assert_eq!(config.name, "second");
    }

    #[test]
    fn test_contains_probes() {
        let mut builder = ContainerBuilder::new();
        assert!(!builder.contains::<Config>());
        builder.register_instance(Config { name: "x" });
        assert!(builder.contains::<Config>());
        assert!(!builder.contains_trait::<dyn Greeter>());
        builder.register_trait_instance::<dyn Greeter>(Arc::new(EnGreeter));
        assert!(builder.contains_trait::<dyn Greeter>());
    }

    #[test]
    fn test_registration_builder_configures_entry() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_factory(|_| Ok(Config { name: "cfg" }))
            .lifetime(Lifetime::Scoped)
            .intercepted_by::<EnGreeter>()
            .with_metadata("extra");
        let container = builder.build().unwrap();

        let descriptor = container.describe::<Config>().unwrap();
        assert_eq!(descriptor.lifetime, Lifetime::Scoped);
        assert!(descriptor.interceptor.unwrap().is::<EnGreeter>());
        assert!(descriptor.has_metadata);
        let meta = container.metadata_of::<Config, &'static str>().unwrap();
        assert_eq!(*meta, "extra");
    }

    #[test]
    fn test_build_callbacks_run_in_order() {
        static ORDER: AtomicUsize = AtomicUsize::new(0);
        let mut builder = ContainerBuilder::new();
        builder.on_built(|_| {
            assert_eq!(ORDER.fetch_add(1, Ordering::SeqCst), 0);
            Ok(())
        });
        builder.on_built(|_| {
            assert_eq!(ORDER.fetch_add(1, Ordering::SeqCst), 1);
            Ok(())
        });
        builder.build().unwrap();
        assert_eq!(ORDER.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_build_callback_error_aborts_build() {
        let mut builder = ContainerBuilder::new();
        builder.register_instance(Config { name: "kept" });
        builder.on_built(|_| Err(anyhow::anyhow!("wiring refused")));
        let err = builder.build().unwrap_err();
        match err {
            DiError::BuildCallback { source } => {
                assert!(source.to_string().contains("wiring refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_callback_sees_registrations() {
        let mut builder = ContainerBuilder::new();
        builder.register_instance(Config { name: "visible" });
        builder.on_built(|container| {
            let config = container.resolve::<Config>()?;
            assert_eq!(config.name, "visible");
            Ok(())
        });
        builder.build().unwrap();
    }
}
