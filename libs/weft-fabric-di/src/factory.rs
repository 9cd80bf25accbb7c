//! Factory-registration capabilities: how a built container reaches the
//! runtime.
//!
//! The registration extensions never talk to the [`ServiceRuntime`]
//! directly. Their build callbacks resolve one of the capability traits
//! below from the container and hand it a type-erased activator; the
//! shipped implementation, [`RuntimeRegistration`], wraps the activator in
//! a runtime factory that opens a fresh scope per activation, seeds the
//! activation context into it, and keeps the scope alive alongside the
//! instance.

use std::sync::Arc;

use weft_di::{Container, Scope};
use weft_fabric::runtime::{
    ImplementationInfo, ServiceRuntime, StatefulFactory, StatefulInstance, StatelessFactory,
    StatelessInstance,
};
use weft_fabric::{StatefulService, StatelessService};

/// Produces the runtime-facing stateful service for one activation scope.
pub type StatefulActivator =
    Arc<dyn Fn(&Scope) -> anyhow::Result<Arc<dyn StatefulService>> + Send + Sync>;

/// Produces the runtime-facing stateless service for one activation scope.
pub type StatelessActivator =
    Arc<dyn Fn(&Scope) -> anyhow::Result<Arc<dyn StatelessService>> + Send + Sync>;

/// Capability to record a stateful activation factory with the runtime.
pub trait StatefulFactoryRegistration: Send + Sync {
    fn register_stateful_factory(
        &self,
        container: &Container,
        service_type_name: &str,
        implementation: ImplementationInfo,
        activator: StatefulActivator,
    ) -> anyhow::Result<()>;
}

/// Capability to record a stateless activation factory with the runtime.
pub trait StatelessFactoryRegistration: Send + Sync {
    fn register_stateless_factory(
        &self,
        container: &Container,
        service_type_name: &str,
        implementation: ImplementationInfo,
        activator: StatelessActivator,
    ) -> anyhow::Result<()>;
}

/// Forwards factory registrations to a [`ServiceRuntime`].
pub struct RuntimeRegistration {
    runtime: Arc<ServiceRuntime>,
}

impl RuntimeRegistration {
    pub fn new(runtime: Arc<ServiceRuntime>) -> Self {
        Self { runtime }
    }
}

impl StatefulFactoryRegistration for RuntimeRegistration {
    fn register_stateful_factory(
        &self,
        container: &Container,
        service_type_name: &str,
        implementation: ImplementationInfo,
        activator: StatefulActivator,
    ) -> anyhow::Result<()> {
        let container = container.clone();
        let factory: StatefulFactory = Arc::new(move |context| {
            let scope = container.begin_scope();
            scope.provide(context);
            let service = activator(&scope)?;
            Ok(StatefulInstance::with_scope(service, scope))
        });
        self.runtime
            .register_stateful(service_type_name, implementation, factory)?;
        Ok(())
    }
}

impl StatelessFactoryRegistration for RuntimeRegistration {
    fn register_stateless_factory(
        &self,
        container: &Container,
        service_type_name: &str,
        implementation: ImplementationInfo,
        activator: StatelessActivator,
    ) -> anyhow::Result<()> {
        let container = container.clone();
        let factory: StatelessFactory = Arc::new(move |context| {
            let scope = container.begin_scope();
            scope.provide(context);
            let service = activator(&scope)?;
            Ok(StatelessInstance::with_scope(service, scope))
        });
        self.runtime
            .register_stateless(service_type_name, implementation, factory)?;
        Ok(())
    }
}
