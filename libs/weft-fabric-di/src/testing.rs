//! Assertion helpers for tests that verify service registrations.
//!
//! These look only at container registration metadata and runtime
//! registration records; nothing here activates a service.

use std::any::TypeId;

use weft_di::{Container, Lifetime, ServiceDescriptor};
use weft_fabric::{ServiceKind, ServiceRuntime};

/// Descriptor of the container registration for `S`, if any.
pub fn registration_of<S: Send + Sync + 'static>(
    container: &Container,
) -> Option<ServiceDescriptor> {
    container.describe::<S>()
}

/// Panics unless `S` is registered with [`Lifetime::Scoped`].
pub fn assert_registered_per_scope<S: Send + Sync + 'static>(container: &Container) {
    let descriptor = describe_or_panic::<S>(container);
    assert_eq!(
        descriptor.lifetime,
        Lifetime::Scoped,
        "service type '{}' must be registered per lifetime scope, found {:?}",
        std::any::type_name::<S>(),
        descriptor.lifetime
    );
}

/// Panics unless the registration for `S` records `I` as its interception
/// wrapper type.
pub fn assert_intercepted_by<S, I>(container: &Container)
where
    S: Send + Sync + 'static,
    I: 'static,
{
    let descriptor = describe_or_panic::<S>(container);
    match descriptor.interceptor {
        Some(tag) if tag.is::<I>() => {}
        Some(tag) => panic!(
            "service type '{}' is intercepted by '{}', expected '{}'",
            std::any::type_name::<S>(),
            tag.type_name,
            std::any::type_name::<I>()
        ),
        None => panic!(
            "service type '{}' has no interceptor recorded",
            std::any::type_name::<S>()
        ),
    }
}

/// Panics unless the runtime recorded a factory for `service_type_name`
/// of the given kind, implemented by `S`.
pub fn assert_factory_recorded<S: 'static>(
    runtime: &ServiceRuntime,
    service_type_name: &str,
    kind: ServiceKind,
) {
    let info = match runtime.registration(service_type_name) {
        Some(info) => info,
        None => panic!("no factory recorded for service type '{service_type_name}'"),
    };
    assert_eq!(
        info.kind, kind,
        "factory for '{service_type_name}' is {}, expected {kind}",
        info.kind
    );
    assert_eq!(
        info.implementation.type_id,
        TypeId::of::<S>(),
        "factory for '{service_type_name}' is implemented by '{}', expected '{}'",
        info.implementation.type_name,
        std::any::type_name::<S>()
    );
}

fn describe_or_panic<S: Send + Sync + 'static>(container: &Container) -> ServiceDescriptor {
    match container.describe::<S>() {
        Some(descriptor) => descriptor,
        None => panic!(
            "service type '{}' is not registered with the container",
            std::any::type_name::<S>()
        ),
    }
}
