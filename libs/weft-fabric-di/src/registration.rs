//! The registration extensions: the public workflow of this crate.

use std::sync::Arc;

use anyhow::Context as _;

use weft_di::{ContainerBuilder, Injectable, Lifetime, RegistrationBuilder, Scope};
use weft_fabric::runtime::ImplementationInfo;
use weft_fabric::{
    InterceptedStateful, InterceptedStateless, Interceptor, ProxySupport, StatefulService,
    StatelessService,
};

use crate::error::FabricDiError;
use crate::factory::{
    StatefulActivator, StatefulFactoryRegistration, StatelessActivator,
    StatelessFactoryRegistration,
};
use crate::interceptor::TracingInterceptor;

/// Service registration methods for [`ContainerBuilder`].
///
/// Each method validates its inputs, registers the service with the
/// container (per lifetime scope, tagged with its interception wrapper) and
/// schedules a build callback that records an activation factory with the
/// runtime under the given manifest type name. Validation failures
/// reject the call before the builder is touched; failures only
/// discoverable at build time (hosting support missing, duplicate type
/// name) surface from `ContainerBuilder::build`.
///
/// The returned [`RegistrationBuilder`] allows further fluent
/// configuration of the underlying registration.
pub trait FabricBuilderExt {
    /// Registers a stateful service type under `service_type_name`, using
    /// the default [`TracingInterceptor`].
    fn register_stateful_service<S>(
        &mut self,
        service_type_name: &str,
    ) -> Result<RegistrationBuilder<'_, S>, FabricDiError>
    where
        S: StatefulService + Injectable;

    /// Registers a stateful service type with an explicit interceptor
    /// type. `I` is registered as a singleton on the caller's behalf
    /// unless a registration for it already exists.
    fn register_stateful_service_with<S, I>(
        &mut self,
        service_type_name: &str,
    ) -> Result<RegistrationBuilder<'_, S>, FabricDiError>
    where
        S: StatefulService + Injectable,
        I: Interceptor + Injectable;

    /// Registers a stateless service type under `service_type_name`, using
    /// the default [`TracingInterceptor`].
    fn register_stateless_service<S>(
        &mut self,
        service_type_name: &str,
    ) -> Result<RegistrationBuilder<'_, S>, FabricDiError>
    where
        S: StatelessService + Injectable;

    /// Registers a stateless service type with an explicit interceptor
    /// type.
    fn register_stateless_service_with<S, I>(
        &mut self,
        service_type_name: &str,
    ) -> Result<RegistrationBuilder<'_, S>, FabricDiError>
    where
        S: StatelessService + Injectable,
        I: Interceptor + Injectable;
}

impl FabricBuilderExt for ContainerBuilder {
    fn register_stateful_service<S>(
        &mut self,
        service_type_name: &str,
    ) -> Result<RegistrationBuilder<'_, S>, FabricDiError>
    where
        S: StatefulService + Injectable,
    {
        self.register_stateful_service_with::<S, TracingInterceptor>(service_type_name)
    }

    fn register_stateful_service_with<S, I>(
        &mut self,
        service_type_name: &str,
    ) -> Result<RegistrationBuilder<'_, S>, FabricDiError>
    where
        S: StatefulService + Injectable,
        I: Interceptor + Injectable,
    {
        let type_name = validate::<S>(service_type_name, S::proxy_support())?;
        tracing::debug!(
            service_type = %type_name,
            implementation = std::any::type_name::<S>(),
            "registering stateful service"
        );

        self.on_built(move |container| {
            let registration = container
                .resolve_trait::<dyn StatefulFactoryRegistration>()
                .context(SUPPORT_MISSING)?;
            let activator: StatefulActivator = Arc::new(|scope: &Scope| {
                let service = scope.resolve::<S>()?;
                let interceptor = scope.resolve::<I>()?;
                Ok(Arc::new(InterceptedStateful::new(
                    std::any::type_name::<S>(),
                    service,
                    interceptor,
                )))
            });
            registration.register_stateful_factory(
                container,
                &type_name,
                ImplementationInfo::of::<S>(),
                activator,
            )
        });

        ensure_interceptor::<I>(self);
        Ok(self
            .register_injectable::<S>()
            .intercepted_by::<I>()
            .lifetime(Lifetime::Scoped))
    }

    fn register_stateless_service<S>(
        &mut self,
        service_type_name: &str,
    ) -> Result<RegistrationBuilder<'_, S>, FabricDiError>
    where
        S: StatelessService + Injectable,
    {
        self.register_stateless_service_with::<S, TracingInterceptor>(service_type_name)
    }

    fn register_stateless_service_with<S, I>(
        &mut self,
        service_type_name: &str,
    ) -> Result<RegistrationBuilder<'_, S>, FabricDiError>
    where
        S: StatelessService + Injectable,
        I: Interceptor + Injectable,
    {
        let type_name = validate::<S>(service_type_name, S::proxy_support())?;
        tracing::debug!(
            service_type = %type_name,
            implementation = std::any::type_name::<S>(),
            "registering stateless service"
        );

        self.on_built(move |container| {
            let registration = container
                .resolve_trait::<dyn StatelessFactoryRegistration>()
                .context(SUPPORT_MISSING)?;
            let activator: StatelessActivator = Arc::new(|scope: &Scope| {
                let service = scope.resolve::<S>()?;
                let interceptor = scope.resolve::<I>()?;
                Ok(Arc::new(InterceptedStateless::new(
                    std::any::type_name::<S>(),
                    service,
                    interceptor,
                )))
            });
            registration.register_stateless_factory(
                container,
                &type_name,
                ImplementationInfo::of::<S>(),
                activator,
            )
        });

        ensure_interceptor::<I>(self);
        Ok(self
            .register_injectable::<S>()
            .intercepted_by::<I>()
            .lifetime(Lifetime::Scoped))
    }
}

const SUPPORT_MISSING: &str =
    "service hosting support is not registered; call register_fabric_support on the builder first";

/// Both validations run before the builder is mutated in any way.
fn validate<S: 'static>(
    service_type_name: &str,
    support: ProxySupport,
) -> Result<Arc<str>, FabricDiError> {
    if service_type_name.trim().is_empty() {
        return Err(FabricDiError::EmptyServiceTypeName);
    }
    if support == ProxySupport::Sealed {
        return Err(FabricDiError::SealedService {
            service_type: std::any::type_name::<S>(),
        });
    }
    Ok(Arc::from(service_type_name))
}

/// Interceptors the caller registered win; otherwise `I` is registered as
/// a singleton built from its [`Injectable`] recipe.
fn ensure_interceptor<I: Interceptor + Injectable>(builder: &mut ContainerBuilder) {
    if !builder.contains::<I>() {
        builder
            .register_injectable::<I>()
            .lifetime(Lifetime::Singleton);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use weft_di::{DiError, DiResult, Resolver};

    struct Plain;

    #[async_trait]
    impl StatelessService for Plain {
        async fn run(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Injectable for Plain {
        fn inject(_resolver: &Resolver<'_>) -> DiResult<Self> {
            Ok(Plain)
        }
    }

    struct Pinned;

    #[async_trait]
    impl StatelessService for Pinned {
        async fn run(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            Ok(())
        }

        fn proxy_support() -> ProxySupport
        where
            Self: Sized,
        {
            ProxySupport::Sealed
        }
    }

    impl Injectable for Pinned {
        fn inject(_resolver: &Resolver<'_>) -> DiResult<Self> {
            Ok(Pinned)
        }
    }

    #[test]
    fn test_empty_type_name_rejected_without_mutation() {
        let mut builder = ContainerBuilder::new();
        let err = builder
            .register_stateless_service::<Plain>("  ")
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err, FabricDiError::EmptyServiceTypeName);
        assert!(!builder.contains::<Plain>());
        // No callback was scheduled either: building without hosting
        // support succeeds.
        builder.build().unwrap();
    }

    #[test]
    fn test_sealed_type_rejected_without_mutation() {
        let mut builder = ContainerBuilder::new();
        let err = builder
            .register_stateless_service::<Pinned>("PinnedService")
            .map(|_| ())
            .unwrap_err();
        match err {
            FabricDiError::SealedService { service_type } => {
                assert!(service_type.contains("Pinned"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!builder.contains::<Pinned>());
        builder.build().unwrap();
    }

    #[test]
    fn test_registration_forced_per_scope() {
        let runtime = Arc::new(weft_fabric::ServiceRuntime::new());
        let mut builder = ContainerBuilder::new();
        crate::support::register_fabric_support(&mut builder, runtime);

        // A prior registration with a different lifetime is replaced and
        // forced back to Scoped.
        builder
            .register_injectable::<Plain>()
            .lifetime(Lifetime::Singleton);
        builder
            .register_stateless_service::<Plain>("PlainService")
            .map(|_| ())
            .unwrap();
        assert!(builder.contains::<TracingInterceptor>());

        let container = builder.build().unwrap();
        let descriptor = container.describe::<Plain>().unwrap();
        assert_eq!(descriptor.lifetime, Lifetime::Scoped);
        assert!(descriptor.interceptor.unwrap().is::<TracingInterceptor>());
    }

    #[test]
    fn test_missing_support_fails_build() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_stateless_service::<Plain>("PlainService")
            .map(|_| ())
            .unwrap();
        let err = builder.build().unwrap_err();
        match err {
            DiError::BuildCallback { source } => {
                assert!(source.to_string().contains("register_fabric_support"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
