//! The default interceptor: a tracing span around every service call.

use async_trait::async_trait;
use tracing::Instrument;

use weft_di::{DiResult, Injectable, Resolver};
use weft_fabric::{Interceptor, Invocation};

/// Wraps each intercepted call in a `service_call` debug span and logs the
/// outcome. Registered automatically by
/// [`register_fabric_support`](crate::register_fabric_support) and used by
/// every service registration that does not name its own interceptor.
#[derive(Default)]
pub struct TracingInterceptor;

impl TracingInterceptor {
    pub fn new() -> Self {
        Self
    }
}

impl Injectable for TracingInterceptor {
    fn inject(_resolver: &Resolver<'_>) -> DiResult<Self> {
        Ok(Self)
    }
}

#[async_trait]
impl Interceptor for TracingInterceptor {
    async fn intercept(&self, invocation: Invocation<'_>) -> anyhow::Result<()> {
        let service = invocation.target();
        let method = invocation.method();
        let span = tracing::debug_span!("service_call", service, method = %method);
        let result = invocation.proceed().instrument(span).await;
        match &result {
            Ok(()) => tracing::debug!(service, method = %method, "service call completed"),
            Err(err) => {
                tracing::warn!(service, method = %method, "service call failed: {err:#}")
            }
        }
        result
    }
}
