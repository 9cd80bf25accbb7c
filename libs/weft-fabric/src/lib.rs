//! weft-fabric: the service-hosting surface of the weft runtime.
//!
//! A process hosts *service types*: named units of work the runtime
//! activates on demand. Implementations provide the [`StatefulService`] or
//! [`StatelessService`] contract, a factory for each type is registered
//! with the [`ServiceRuntime`] under the type name the service manifest
//! assigns, and the [`ServiceHost`] drives activation and shutdown.
//!
//! Interception is first-class: an [`Interceptor`] can wrap every
//! runtime-facing call on a service through the decorators in
//! [`interception`], without the service knowing.

pub mod contracts;
pub mod error;
pub mod host;
pub mod interception;
pub mod manifest;
pub mod runtime;

pub use contracts::{
    ServiceKind, StatefulContext, StatefulService, StatelessContext, StatelessService,
};
pub use error::FabricError;
pub use host::ServiceHost;
pub use interception::{
    InterceptedStateful, InterceptedStateless, Interceptor, Invocation, ProxySupport,
    ServiceMethod,
};
pub use manifest::{ManifestEntry, ServiceManifest};
pub use runtime::{
    ImplementationInfo, ServiceRuntime, ServiceTypeInfo, StatefulFactory, StatefulInstance,
    StatelessFactory, StatelessInstance,
};
