//! weft-fabric-di: registers container-built services with the weft
//! runtime.
//!
//! The extension methods in [`FabricBuilderExt`] are the whole public
//! workflow: they validate the service type, register it with the
//! container (per lifetime scope, behind an interception wrapper), and
//! schedule a build callback that records an activation factory with the
//! [`ServiceRuntime`](weft_fabric::ServiceRuntime) under the manifest type
//! name. One call to [`register_fabric_support`] wires in everything the
//! callbacks resolve.
//!
//! ```no_run
//! use std::sync::Arc;
//! use weft_di::ContainerBuilder;
//! use weft_fabric::ServiceRuntime;
//! use weft_fabric_di::{register_fabric_support, FabricBuilderExt};
//! # use async_trait::async_trait;
//! # use tokio_util::sync::CancellationToken;
//! # struct Worker;
//! # #[async_trait]
//! # impl weft_fabric::StatelessService for Worker {
//! #     async fn run(&self, _cancel: CancellationToken) -> anyhow::Result<()> { Ok(()) }
//! # }
//! # impl weft_di::Injectable for Worker {
//! #     fn inject(_: &weft_di::Resolver<'_>) -> weft_di::DiResult<Self> { Ok(Worker) }
//! # }
//!
//! # fn main() -> anyhow::Result<()> {
//! let runtime = Arc::new(ServiceRuntime::new());
//! let mut builder = ContainerBuilder::new();
//! register_fabric_support(&mut builder, runtime.clone());
//! builder.register_stateless_service::<Worker>("WorkerService")?;
//! let _container = builder.build()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod factory;
pub mod interceptor;
pub mod registration;
pub mod support;
pub mod testing;

pub use error::FabricDiError;
pub use factory::{
    RuntimeRegistration, StatefulActivator, StatefulFactoryRegistration, StatelessActivator,
    StatelessFactoryRegistration,
};
pub use interceptor::TracingInterceptor;
pub use registration::FabricBuilderExt;
pub use support::register_fabric_support;
