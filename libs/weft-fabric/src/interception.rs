//! Call interception for hosted services.
//!
//! An [`Interceptor`] sits between the runtime and a service instance: the
//! decorators here route every contract method through
//! [`Interceptor::intercept`], handing it an [`Invocation`] that describes
//! the call and owns the `proceed` future. Interceptors may observe the
//! call, wrap it, or skip `proceed` entirely.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::contracts::{StatefulService, StatelessService};

/// Declared interception eligibility of a service type.
///
/// There is no runtime reflection to consult here: a type that must never
/// be wrapped says so by overriding `proxy_support` on its contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxySupport {
    /// Instances may be wrapped by an interception proxy. The default.
    Proxyable,
    /// Instances must be used as-is; registration paths that would wrap
    /// them reject the type instead.
    Sealed,
}

/// The contract method an invocation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceMethod {
    Run,
    Close,
}

impl std::fmt::Display for ServiceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceMethod::Run => f.write_str("run"),
            ServiceMethod::Close => f.write_str("close"),
        }
    }
}

/// One intercepted call: target type name, method, and the pending inner
/// call. Consuming `proceed` executes the wrapped service method.
pub struct Invocation<'a> {
    target: &'static str,
    method: ServiceMethod,
    proceed: BoxFuture<'a, anyhow::Result<()>>,
}

impl<'a> Invocation<'a> {
    pub fn new(
        target: &'static str,
        method: ServiceMethod,
        proceed: BoxFuture<'a, anyhow::Result<()>>,
    ) -> Self {
        Self {
            target,
            method,
            proceed,
        }
    }

    /// Concrete type name of the wrapped service implementation.
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn method(&self) -> ServiceMethod {
        self.method
    }

    /// Runs the wrapped service method.
    pub async fn proceed(self) -> anyhow::Result<()> {
        self.proceed.await
    }
}

/// Wraps calls the runtime makes into a hosted service.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    async fn intercept(&self, invocation: Invocation<'_>) -> anyhow::Result<()>;
}

/// Interception decorator for stateful services.
pub struct InterceptedStateful {
    target: &'static str,
    inner: Arc<dyn StatefulService>,
    interceptor: Arc<dyn Interceptor>,
}

impl InterceptedStateful {
    pub fn new(
        target: &'static str,
        inner: Arc<dyn StatefulService>,
        interceptor: Arc<dyn Interceptor>,
    ) -> Self {
        Self {
            target,
            inner,
            interceptor,
        }
    }
}

#[async_trait]
impl StatefulService for InterceptedStateful {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let inner = self.inner.clone();
        let invocation = Invocation::new(
            self.target,
            ServiceMethod::Run,
            Box::pin(async move { inner.run(cancel).await }),
        );
        self.interceptor.intercept(invocation).await
    }

    async fn close(&self) -> anyhow::Result<()> {
        let inner = self.inner.clone();
        let invocation = Invocation::new(
            self.target,
            ServiceMethod::Close,
            Box::pin(async move { inner.close().await }),
        );
        self.interceptor.intercept(invocation).await
    }

    // Wrappers never get wrapped again.
    fn proxy_support() -> ProxySupport
    where
        Self: Sized,
    {
        ProxySupport::Sealed
    }
}

/// Interception decorator for stateless services.
pub struct InterceptedStateless {
    target: &'static str,
    inner: Arc<dyn StatelessService>,
    interceptor: Arc<dyn Interceptor>,
}

impl InterceptedStateless {
    pub fn new(
        target: &'static str,
        inner: Arc<dyn StatelessService>,
        interceptor: Arc<dyn Interceptor>,
    ) -> Self {
        Self {
            target,
            inner,
            interceptor,
        }
    }
}

#[async_trait]
impl StatelessService for InterceptedStateless {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let inner = self.inner.clone();
        let invocation = Invocation::new(
            self.target,
            ServiceMethod::Run,
            Box::pin(async move { inner.run(cancel).await }),
        );
        self.interceptor.intercept(invocation).await
    }

    fn proxy_support() -> ProxySupport
    where
        Self: Sized,
    {
        ProxySupport::Sealed
    }
}
