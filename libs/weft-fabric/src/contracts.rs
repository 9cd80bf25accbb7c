//! Service contracts and activation contexts.
//!
//! These traits are the seam between service implementations and the
//! runtime. Implementations stay unaware of how they were constructed or
//! whether an interception wrapper sits in front of them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::interception::ProxySupport;

/// Whether a service type keeps replica-local state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Stateful,
    Stateless,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Stateful => f.write_str("stateful"),
            ServiceKind::Stateless => f.write_str("stateless"),
        }
    }
}

/// Activation context of a stateful replica.
///
/// Minted by the runtime per activation and made available to the
/// instance's construction (the activation scope is seeded with it).
#[derive(Clone, Debug)]
pub struct StatefulContext {
    /// Type name the service manifest assigns to this service.
    pub service_type_name: Arc<str>,
    pub partition_id: Uuid,
    pub replica_id: u64,
}

/// Activation context of a stateless instance.
#[derive(Clone, Debug)]
pub struct StatelessContext {
    /// Type name the service manifest assigns to this service.
    pub service_type_name: Arc<str>,
    pub partition_id: Uuid,
    pub instance_id: u64,
}

/// A service type that owns replica-local state.
///
/// `run` is the replica's long-running work and is expected to return
/// promptly once `cancel` fires; `close` runs after `run` completes and is
/// the place to flush state.
#[async_trait]
pub trait StatefulService: Send + Sync + 'static {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether instances may be wrapped by an interception proxy. Types
    /// that must stay unwrapped override this to [`ProxySupport::Sealed`].
    fn proxy_support() -> ProxySupport
    where
        Self: Sized,
    {
        ProxySupport::Proxyable
    }
}

/// A service type without local state; instances are interchangeable.
#[async_trait]
pub trait StatelessService: Send + Sync + 'static {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()>;

    /// Whether instances may be wrapped by an interception proxy.
    fn proxy_support() -> ProxySupport
    where
        Self: Sized,
    {
        ProxySupport::Proxyable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_kind_serde_round() {
        let yaml = serde_yaml::to_string(&ServiceKind::Stateful).unwrap();
        assert_eq!(yaml.trim(), "stateful");
        let parsed: ServiceKind = serde_yaml::from_str("stateless").unwrap();
        assert_eq!(parsed, ServiceKind::Stateless);
    }

    #[test]
    fn test_default_proxy_support_is_proxyable() {
        struct Plain;

        #[async_trait]
        impl StatelessService for Plain {
            async fn run(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
                Ok(())
            }
        }

        assert_eq!(Plain::proxy_support(), ProxySupport::Proxyable);
    }
}
