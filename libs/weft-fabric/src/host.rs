//! Drives the lifecycle of every registered service type in-process:
//! activate, run until cancelled, close, in that order.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::contracts::ServiceKind;
use crate::error::FabricError;
use crate::runtime::{ServiceRuntime, ServiceTypeInfo};

/// Lifecycle driver over a [`ServiceRuntime`].
///
/// `open_all` activates one instance per registered service type and spawns
/// its `run` under a child cancellation token. `shutdown` cancels, waits up
/// to the given timeout, then aborts stragglers. Run and close failures are
/// logged, never propagated; an activation failure aborts `open_all`.
pub struct ServiceHost {
    runtime: Arc<ServiceRuntime>,
    cancel: CancellationToken,
    running: Mutex<Vec<RunningService>>,
}

struct RunningService {
    service_type_name: Arc<str>,
    handle: JoinHandle<()>,
}

impl ServiceHost {
    pub fn new(runtime: Arc<ServiceRuntime>) -> Self {
        Self {
            runtime,
            cancel: CancellationToken::new(),
            running: Mutex::new(Vec::new()),
        }
    }

    /// Token cancelled when [`ServiceHost::shutdown`] begins; callers may
    /// also cancel it themselves to stop the services early.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Activates and starts every registered service type.
    pub fn open_all(&self) -> Result<(), FabricError> {
        tracing::info!("Phase: open services");
        for info in self.runtime.registrations() {
            let handle = self.open_one(&info)?;
            tracing::info!(
                service_type = %info.service_type_name,
                kind = %info.kind,
                "service opened"
            );
            self.running.lock().push(RunningService {
                service_type_name: info.service_type_name.clone(),
                handle,
            });
        }
        Ok(())
    }

    /// Cancels all services and waits up to `timeout` for their tasks to
    /// finish; tasks still running after the deadline are aborted.
    pub async fn shutdown(&self, timeout: Duration) {
        tracing::info!(timeout = ?timeout, "Phase: shutdown services");
        self.cancel.cancel();
        let drained: Vec<RunningService> = {
            let mut running = self.running.lock();
            running.drain(..).collect()
        };
        let deadline = tokio::time::Instant::now() + timeout;
        for service in drained {
            let abort = service.handle.abort_handle();
            match tokio::time::timeout_at(deadline, service.handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    tracing::error!(
                        service_type = %service.service_type_name,
                        "service task failed: {join_err}"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        service_type = %service.service_type_name,
                        "service did not stop within the timeout; aborting its task"
                    );
                    abort.abort();
                }
            }
        }
        tracing::info!("service host stopped");
    }

    fn open_one(&self, info: &ServiceTypeInfo) -> Result<JoinHandle<()>, FabricError> {
        let cancel = self.cancel.child_token();
        let name = info.service_type_name.clone();
        let span = tracing::info_span!("service", service_type = %name, kind = %info.kind);
        let handle = match info.kind {
            ServiceKind::Stateful => {
                let instance = self.runtime.activate_stateful(&name)?;
                tokio::spawn(
                    async move {
                        if let Err(err) = instance.service().run(cancel).await {
                            tracing::error!("stateful service run failed: {err:#}");
                        }
                        if let Err(err) = instance.service().close().await {
                            tracing::warn!("stateful service close failed: {err:#}");
                        }
                    }
                    .instrument(span),
                )
            }
            ServiceKind::Stateless => {
                let instance = self.runtime.activate_stateless(&name)?;
                tokio::spawn(
                    async move {
                        if let Err(err) = instance.service().run(cancel).await {
                            tracing::error!("stateless service run failed: {err:#}");
                        }
                    }
                    .instrument(span),
                )
            }
        };
        Ok(handle)
    }
}
