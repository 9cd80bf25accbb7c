//! The service-type registry: factories keyed by manifest type name,
//! activation, and introspection.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::contracts::{
    ServiceKind, StatefulContext, StatefulService, StatelessContext, StatelessService,
};
use crate::error::FabricError;
use crate::manifest::ServiceManifest;

/// Concrete implementation type behind a registered service type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImplementationInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}

impl ImplementationInfo {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// An activated stateful replica.
///
/// The `scope` slot keeps whatever owns the instance's dependencies
/// (typically the DI scope it was resolved from) alive exactly as long as
/// the instance; dropping the instance drops the scope with it.
pub struct StatefulInstance {
    service: Arc<dyn StatefulService>,
    scope: Option<Box<dyn Any + Send + Sync>>,
}

impl StatefulInstance {
    pub fn new(service: Arc<dyn StatefulService>) -> Self {
        Self {
            service,
            scope: None,
        }
    }

    pub fn with_scope(
        service: Arc<dyn StatefulService>,
        scope: impl Any + Send + Sync,
    ) -> Self {
        Self {
            service,
            scope: Some(Box::new(scope)),
        }
    }

    pub fn service(&self) -> &Arc<dyn StatefulService> {
        &self.service
    }
}

impl std::fmt::Debug for StatefulInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatefulInstance")
            .field("scoped", &self.scope.is_some())
            .finish_non_exhaustive()
    }
}

/// An activated stateless instance. See [`StatefulInstance`] for the
/// `scope` slot semantics.
pub struct StatelessInstance {
    service: Arc<dyn StatelessService>,
    scope: Option<Box<dyn Any + Send + Sync>>,
}

impl StatelessInstance {
    pub fn new(service: Arc<dyn StatelessService>) -> Self {
        Self {
            service,
            scope: None,
        }
    }

    pub fn with_scope(
        service: Arc<dyn StatelessService>,
        scope: impl Any + Send + Sync,
    ) -> Self {
        Self {
            service,
            scope: Some(Box::new(scope)),
        }
    }

    pub fn service(&self) -> &Arc<dyn StatelessService> {
        &self.service
    }
}

impl std::fmt::Debug for StatelessInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatelessInstance")
            .field("scoped", &self.scope.is_some())
            .finish_non_exhaustive()
    }
}

/// Factory the runtime invokes to activate a stateful replica.
pub type StatefulFactory =
    Arc<dyn Fn(StatefulContext) -> anyhow::Result<StatefulInstance> + Send + Sync>;

/// Factory the runtime invokes to activate a stateless instance.
pub type StatelessFactory =
    Arc<dyn Fn(StatelessContext) -> anyhow::Result<StatelessInstance> + Send + Sync>;

/// What the runtime knows about one registered service type.
#[derive(Clone, Debug)]
pub struct ServiceTypeInfo {
    pub service_type_name: Arc<str>,
    pub kind: ServiceKind,
    pub implementation: ImplementationInfo,
}

struct StatefulEntry {
    info: ServiceTypeInfo,
    factory: StatefulFactory,
}

struct StatelessEntry {
    info: ServiceTypeInfo,
    factory: StatelessFactory,
}

/// Registry of service-type factories.
///
/// A type name maps to exactly one factory, stateful or stateless;
/// registering a name twice is rejected. Activation mints a fresh context
/// (new partition id, monotonic replica/instance id) per call.
#[derive(Default)]
pub struct ServiceRuntime {
    stateful: DashMap<Arc<str>, StatefulEntry>,
    stateless: DashMap<Arc<str>, StatelessEntry>,
    next_replica_id: AtomicU64,
    next_instance_id: AtomicU64,
}

impl ServiceRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stateful factory under `service_type_name`.
    pub fn register_stateful(
        &self,
        service_type_name: &str,
        implementation: ImplementationInfo,
        factory: StatefulFactory,
    ) -> Result<(), FabricError> {
        let name: Arc<str> = Arc::from(service_type_name);
        if self.stateless.contains_key(&name) || self.stateful.contains_key(&name) {
            return Err(FabricError::DuplicateServiceType(name.to_string()));
        }
        let info = ServiceTypeInfo {
            service_type_name: name.clone(),
            kind: ServiceKind::Stateful,
            implementation,
        };
        tracing::info!(
            service_type = %name,
            implementation = implementation.type_name,
            "stateful service type registered"
        );
        self.stateful.insert(name, StatefulEntry { info, factory });
        Ok(())
    }

    /// Registers a stateless factory under `service_type_name`.
    pub fn register_stateless(
        &self,
        service_type_name: &str,
        implementation: ImplementationInfo,
        factory: StatelessFactory,
    ) -> Result<(), FabricError> {
        let name: Arc<str> = Arc::from(service_type_name);
        if self.stateful.contains_key(&name) || self.stateless.contains_key(&name) {
            return Err(FabricError::DuplicateServiceType(name.to_string()));
        }
        let info = ServiceTypeInfo {
            service_type_name: name.clone(),
            kind: ServiceKind::Stateless,
            implementation,
        };
        tracing::info!(
            service_type = %name,
            implementation = implementation.type_name,
            "stateless service type registered"
        );
        self.stateless
            .insert(name, StatelessEntry { info, factory });
        Ok(())
    }

    /// Info for one registered type name, if any.
    pub fn registration(&self, service_type_name: &str) -> Option<ServiceTypeInfo> {
        if let Some(entry) = self.stateful.get(service_type_name) {
            return Some(entry.info.clone());
        }
        self.stateless
            .get(service_type_name)
            .map(|entry| entry.info.clone())
    }

    /// Every registered type, sorted by name.
    pub fn registrations(&self) -> Vec<ServiceTypeInfo> {
        let mut all: Vec<ServiceTypeInfo> = self
            .stateful
            .iter()
            .map(|entry| entry.info.clone())
            .chain(self.stateless.iter().map(|entry| entry.info.clone()))
            .collect();
        all.sort_by(|a, b| a.service_type_name.cmp(&b.service_type_name));
        all
    }

    /// Activates a stateful replica of the named type.
    pub fn activate_stateful(
        &self,
        service_type_name: &str,
    ) -> Result<StatefulInstance, FabricError> {
        let (name, factory) = {
            let entry = self
                .stateful
                .get(service_type_name)
                .ok_or_else(|| FabricError::UnknownServiceType(service_type_name.to_string()))?;
            (entry.info.service_type_name.clone(), entry.factory.clone())
        };
        let context = StatefulContext {
            service_type_name: name.clone(),
            partition_id: Uuid::new_v4(),
            replica_id: self.next_replica_id.fetch_add(1, Ordering::Relaxed),
        };
        tracing::debug!(
            service_type = %name,
            partition_id = %context.partition_id,
            replica_id = context.replica_id,
            "activating stateful replica"
        );
        factory(context).map_err(|source| FabricError::Activation {
            service_type_name: name.to_string(),
            source,
        })
    }

    /// Activates a stateless instance of the named type.
    pub fn activate_stateless(
        &self,
        service_type_name: &str,
    ) -> Result<StatelessInstance, FabricError> {
        let (name, factory) = {
            let entry = self
                .stateless
                .get(service_type_name)
                .ok_or_else(|| FabricError::UnknownServiceType(service_type_name.to_string()))?;
            (entry.info.service_type_name.clone(), entry.factory.clone())
        };
        let context = StatelessContext {
            service_type_name: name.clone(),
            partition_id: Uuid::new_v4(),
            instance_id: self.next_instance_id.fetch_add(1, Ordering::Relaxed),
        };
        tracing::debug!(
            service_type = %name,
            partition_id = %context.partition_id,
            instance_id = context.instance_id,
            "activating stateless instance"
        );
        factory(context).map_err(|source| FabricError::Activation {
            service_type_name: name.to_string(),
            source,
        })
    }

    /// Checks that every manifest entry has a registered factory of the
    /// matching kind. Registered types missing from the manifest are only
    /// warned about.
    pub fn verify_manifest(&self, manifest: &ServiceManifest) -> Result<(), FabricError> {
        for entry in &manifest.services {
            match self.registration(&entry.name) {
                Some(info) if info.kind == entry.kind => {}
                _ => {
                    return Err(FabricError::ManifestMismatch {
                        name: entry.name.clone(),
                        kind: entry.kind,
                    })
                }
            }
        }
        for info in self.registrations() {
            let listed = manifest
                .services
                .iter()
                .any(|entry| entry.name.as_str() == info.service_type_name.as_ref());
            if !listed {
                tracing::warn!(
                    service_type = %info.service_type_name,
                    "registered service type is missing from the manifest"
                );
            }
        }
        Ok(())
    }
}
