//! End-to-end coverage of the registration workflow: container builder in,
//! runtime factory out, activation through the interception wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use weft_di::{ContainerBuilder, DiError, DiResult, Injectable, Lifetime, Resolver};
use weft_fabric::{
    Interceptor, Invocation, ServiceKind, ServiceRuntime, StatefulContext, StatefulService,
    StatelessService,
};
use weft_fabric_di::{register_fabric_support, testing, FabricBuilderExt, TracingInterceptor};

#[derive(Default)]
struct Ledger {
    entries: Mutex<Vec<String>>,
}

impl Ledger {
    fn record(&self, entry: String) {
        self.entries.lock().push(entry);
    }

    fn snapshot(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

struct HeartbeatService;

#[async_trait]
impl StatelessService for HeartbeatService {
    async fn run(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Injectable for HeartbeatService {
    fn inject(_resolver: &Resolver<'_>) -> DiResult<Self> {
        Ok(HeartbeatService)
    }
}

struct ScopedBuddy;

impl Injectable for ScopedBuddy {
    fn inject(_resolver: &Resolver<'_>) -> DiResult<Self> {
        Ok(ScopedBuddy)
    }
}

struct CounterService {
    context: StatefulContext,
    ledger: Arc<Ledger>,
    buddy_a: Arc<ScopedBuddy>,
    buddy_b: Arc<ScopedBuddy>,
}

impl Injectable for CounterService {
    fn inject(resolver: &Resolver<'_>) -> DiResult<Self> {
        // Activation seeds the real context into the scope; resolving from
        // the bare root falls back to a standalone one.
        let context = resolver
            .resolve_optional::<StatefulContext>()?
            .map(|ctx| ctx.as_ref().clone())
            .unwrap_or_else(|| StatefulContext {
                service_type_name: Arc::from("standalone"),
                partition_id: Uuid::nil(),
                replica_id: 0,
            });
        Ok(Self {
            context,
            ledger: resolver.resolve::<Ledger>()?,
            buddy_a: resolver.resolve::<ScopedBuddy>()?,
            buddy_b: resolver.resolve::<ScopedBuddy>()?,
        })
    }
}

#[async_trait]
impl StatefulService for CounterService {
    async fn run(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.ledger.record(format!(
            "run:{}:{}:shared={}",
            self.context.service_type_name,
            self.context.replica_id,
            Arc::ptr_eq(&self.buddy_a, &self.buddy_b)
        ));
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.ledger
            .record(format!("close:{}", self.context.replica_id));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingInterceptor {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Interceptor for RecordingInterceptor {
    async fn intercept(&self, invocation: Invocation<'_>) -> anyhow::Result<()> {
        self.calls
            .lock()
            .push(format!("{}:{}", invocation.target(), invocation.method()));
        invocation.proceed().await
    }
}

impl Injectable for RecordingInterceptor {
    fn inject(_resolver: &Resolver<'_>) -> DiResult<Self> {
        Ok(Self::default())
    }
}

#[test]
fn test_stateless_registration_end_to_end() {
    let runtime = Arc::new(ServiceRuntime::new());
    let mut builder = ContainerBuilder::new();
    register_fabric_support(&mut builder, runtime.clone());
    builder
        .register_stateless_service::<HeartbeatService>("Foo")
        .unwrap();

    let container = builder.build().unwrap();

    testing::assert_registered_per_scope::<HeartbeatService>(&container);
    testing::assert_intercepted_by::<HeartbeatService, TracingInterceptor>(&container);
    testing::assert_factory_recorded::<HeartbeatService>(&runtime, "Foo", ServiceKind::Stateless);
    // The base registration resolves on its own, interception aside.
    assert!(container.resolve::<HeartbeatService>().is_ok());
}

#[tokio::test]
async fn test_custom_interceptor_applied_on_activation() {
    let runtime = Arc::new(ServiceRuntime::new());
    let interceptor = Arc::new(RecordingInterceptor::default());

    let mut builder = ContainerBuilder::new();
    register_fabric_support(&mut builder, runtime.clone());
    // The caller's instance wins over the auto-registration.
    builder.register_arc(interceptor.clone());
    builder
        .register_stateless_service_with::<HeartbeatService, RecordingInterceptor>("Heartbeat")
        .unwrap();

    let container = builder.build().unwrap();
    testing::assert_intercepted_by::<HeartbeatService, RecordingInterceptor>(&container);

    let instance = runtime.activate_stateless("Heartbeat").unwrap();
    instance
        .service()
        .run(CancellationToken::new())
        .await
        .unwrap();

    let calls = interceptor.calls.lock().clone();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("HeartbeatService"));
    assert!(calls[0].ends_with(":run"));
}

#[tokio::test]
async fn test_stateful_activation_gets_scoped_context() {
    let runtime = Arc::new(ServiceRuntime::new());
    let ledger = Arc::new(Ledger::default());

    let mut builder = ContainerBuilder::new();
    register_fabric_support(&mut builder, runtime.clone());
    builder.register_arc(ledger.clone());
    builder
        .register_injectable::<ScopedBuddy>()
        .lifetime(Lifetime::Scoped);
    builder
        .register_stateful_service::<CounterService>("Counter")
        .unwrap();

    let container = builder.build().unwrap();
    testing::assert_factory_recorded::<CounterService>(&runtime, "Counter", ServiceKind::Stateful);

    let first = runtime.activate_stateful("Counter").unwrap();
    let second = runtime.activate_stateful("Counter").unwrap();
    first
        .service()
        .run(CancellationToken::new())
        .await
        .unwrap();
    second
        .service()
        .run(CancellationToken::new())
        .await
        .unwrap();
    first.service().close().await.unwrap();

    let entries = ledger.snapshot();
    // Each activation saw its own seeded context, and both scoped
    // resolutions within one activation shared the same instance.
    assert_eq!(entries[0], "run:Counter:0:shared=true");
    assert_eq!(entries[1], "run:Counter:1:shared=true");
    assert_eq!(entries[2], "close:0");

    // Without a seeded scope the service still resolves, standalone.
    let standalone = container.resolve::<CounterService>().unwrap();
    assert_eq!(standalone.context.service_type_name.as_ref(), "standalone");
}

#[test]
fn test_duplicate_type_name_fails_build() {
    let runtime = Arc::new(ServiceRuntime::new());
    let mut builder = ContainerBuilder::new();
    register_fabric_support(&mut builder, runtime);
    builder
        .register_stateless_service::<HeartbeatService>("Dup")
        .unwrap();
    builder
        .register_stateful_service::<CounterService>("Dup")
        .unwrap();

    let err = builder.build().unwrap_err();
    match err {
        DiError::BuildCallback { source } => {
            assert!(source.to_string().contains("already registered"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_returned_builder_allows_further_configuration() {
    let runtime = Arc::new(ServiceRuntime::new());
    let mut builder = ContainerBuilder::new();
    register_fabric_support(&mut builder, runtime);
    builder
        .register_stateless_service::<HeartbeatService>("Foo")
        .unwrap()
        .with_metadata("placement=any");

    let container = builder.build().unwrap();
    testing::assert_registered_per_scope::<HeartbeatService>(&container);
    let descriptor = testing::registration_of::<HeartbeatService>(&container).unwrap();
    assert!(descriptor.has_metadata);
    let metadata = container
        .metadata_of::<HeartbeatService, &'static str>()
        .unwrap();
    assert_eq!(*metadata, "placement=any");
}
