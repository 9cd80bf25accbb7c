//! One-call bootstrap for everything the registration extensions need at
//! build time.

use std::sync::Arc;

use weft_di::{ContainerBuilder, Lifetime};
use weft_fabric::ServiceRuntime;

use crate::factory::{
    RuntimeRegistration, StatefulFactoryRegistration, StatelessFactoryRegistration,
};
use crate::interceptor::TracingInterceptor;

/// Registers hosting support with the container: the runtime handle itself
/// (as a singleton, so services may depend on it), the default
/// [`TracingInterceptor`] (unless the caller registered their own), and the
/// factory-registration capabilities backed by `runtime`.
///
/// Call this once per builder, before `build`; without it, every scheduled
/// service registration callback fails the build.
pub fn register_fabric_support(builder: &mut ContainerBuilder, runtime: Arc<ServiceRuntime>) {
    builder.register_arc(runtime.clone());
    if !builder.contains::<TracingInterceptor>() {
        builder
            .register_injectable::<TracingInterceptor>()
            .lifetime(Lifetime::Singleton);
    }

    let registration = Arc::new(RuntimeRegistration::new(runtime));
    builder.register_trait_instance::<dyn StatefulFactoryRegistration>(registration.clone());
    builder.register_trait_instance::<dyn StatelessFactoryRegistration>(registration);
    tracing::debug!("service hosting support registered");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_registers_capabilities() {
        let mut builder = ContainerBuilder::new();
        register_fabric_support(&mut builder, Arc::new(ServiceRuntime::new()));
        assert!(builder.contains_trait::<dyn StatefulFactoryRegistration>());
        assert!(builder.contains_trait::<dyn StatelessFactoryRegistration>());
        assert!(builder.contains::<TracingInterceptor>());
        assert!(builder.contains::<ServiceRuntime>());

        let container = builder.build().unwrap();
        assert!(container.resolve::<ServiceRuntime>().is_ok());
        assert!(container
            .resolve_trait::<dyn StatefulFactoryRegistration>()
            .is_ok());
        let descriptor = container
            .describe_trait::<dyn StatelessFactoryRegistration>()
            .unwrap();
        assert_eq!(descriptor.lifetime, Lifetime::Singleton);
    }

    #[test]
    fn test_caller_interceptor_registration_wins() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_instance(TracingInterceptor::new())
            .with_metadata("caller-owned");
        register_fabric_support(&mut builder, Arc::new(ServiceRuntime::new()));

        let container = builder.build().unwrap();
        // A re-registration would have dropped the metadata marker.
        let marker = container
            .metadata_of::<TracingInterceptor, &'static str>()
            .unwrap();
        assert_eq!(*marker, "caller-owned");
    }
}
