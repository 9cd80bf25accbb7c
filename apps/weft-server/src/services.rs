//! Demo services hosted by this binary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weft_di::{ContainerBuilder, DiResult, Injectable, Resolver};
use weft_fabric::{
    ManifestEntry, ServiceKind, ServiceManifest, StatefulContext, StatefulService,
    StatelessContext, StatelessService,
};
use weft_fabric_di::{FabricBuilderExt, FabricDiError};

/// Stateful demo: counts ticks for its replica and reports the total on
/// close.
pub struct CounterService {
    context: Arc<StatefulContext>,
    ticks: AtomicU64,
}

impl Injectable for CounterService {
    fn inject(resolver: &Resolver<'_>) -> DiResult<Self> {
        Ok(Self {
            context: resolver.resolve::<StatefulContext>()?,
            ticks: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl StatefulService for CounterService {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let count = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::debug!(
                        service_type = %self.context.service_type_name,
                        replica = self.context.replica_id,
                        count,
                        "tick"
                    );
                }
            }
        }
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        tracing::info!(
            service_type = %self.context.service_type_name,
            replica = self.context.replica_id,
            total = self.ticks.load(Ordering::Relaxed),
            "counter closed"
        );
        Ok(())
    }
}

/// Stateless demo: emits a periodic liveness log line.
pub struct HeartbeatService {
    context: Arc<StatelessContext>,
}

impl Injectable for HeartbeatService {
    fn inject(resolver: &Resolver<'_>) -> DiResult<Self> {
        Ok(Self {
            context: resolver.resolve::<StatelessContext>()?,
        })
    }
}

#[async_trait]
impl StatelessService for HeartbeatService {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    tracing::info!(
                        service_type = %self.context.service_type_name,
                        instance = self.context.instance_id,
                        "heartbeat"
                    );
                }
            }
        }
        Ok(())
    }
}

/// Registers every demo service type with the container builder.
pub fn register_demo_services(builder: &mut ContainerBuilder) -> Result<(), FabricDiError> {
    builder.register_stateful_service::<CounterService>("CounterService")?;
    builder.register_stateless_service::<HeartbeatService>("HeartbeatService")?;
    Ok(())
}

/// Manifest matching [`register_demo_services`], used when the
/// configuration names no manifest file.
pub fn default_manifest() -> ServiceManifest {
    ServiceManifest {
        services: vec![
            ManifestEntry {
                name: "CounterService".to_string(),
                kind: ServiceKind::Stateful,
            },
            ManifestEntry {
                name: "HeartbeatService".to_string(),
                kind: ServiceKind::Stateless,
            },
        ],
    }
}
