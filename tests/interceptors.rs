use std::sync::Arc;

use async_trait::async_trait;
use lattice_di::{
    BindingRegistry, DiError, DiResult, Interceptor, MethodHandler, Next, ParamSpec, Provide,
    Symbol,
};
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Tracer {
    name: &'static str,
    log: Log,
}

#[async_trait]
impl Interceptor for Tracer {
    async fn intercept(&self, _provide: Provide, mut next: Next<'_>) -> DiResult<()> {
        self.log.lock().push(self.name);
        let result = next.run().await;
        self.log.lock().push(self.name);
        result
    }
}

struct ShortCircuit;

#[async_trait]
impl Interceptor for ShortCircuit {
    async fn intercept(&self, _provide: Provide, _next: Next<'_>) -> DiResult<()> {
        Ok(())
    }
}

struct DoubleResume;

#[async_trait]
impl Interceptor for DoubleResume {
    async fn intercept(&self, _provide: Provide, mut next: Next<'_>) -> DiResult<()> {
        next.run().await?;
        next.run().await
    }
}

struct Suppress;

#[async_trait]
impl Interceptor for Suppress {
    async fn intercept(&self, _provide: Provide, mut next: Next<'_>) -> DiResult<()> {
        let _ = next.run().await;
        Ok(())
    }
}

struct ProvideRequestId {
    id: Symbol,
}

#[async_trait]
impl Interceptor for ProvideRequestId {
    async fn intercept(&self, provide: Provide, mut next: Next<'_>) -> DiResult<()> {
        provide.set(self.id, 42u64);
        next.run().await
    }
}

fn logging_handler(log: Log) -> MethodHandler<&'static str> {
    MethodHandler::new("target", 0, move |_| {
        log.lock().push("target");
        Ok("done")
    })
}

#[tokio::test]
async fn interceptors_run_outer_in_then_inner_out() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let handler = logging_handler(log.clone())
        .intercept(Arc::new(Tracer {
            name: "outer",
            log: log.clone(),
        }))
        .intercept(Arc::new(Tracer {
            name: "inner",
            log: log.clone(),
        }));

    let session = BindingRegistry::new().build().session();
    let result = session.invoke_async(&handler).await.unwrap();

    assert_eq!(result, Some("done"));
    assert_eq!(*log.lock(), vec!["outer", "inner", "target", "inner", "outer"]);
}

#[tokio::test]
async fn short_circuit_skips_inner_frames_and_the_target() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let handler = logging_handler(log.clone())
        .intercept(Arc::new(Tracer {
            name: "outer",
            log: log.clone(),
        }))
        .intercept(Arc::new(ShortCircuit))
        .intercept(Arc::new(Tracer {
            name: "inner",
            log: log.clone(),
        }));

    let session = BindingRegistry::new().build().session();
    let result = session.invoke_async(&handler).await.unwrap();

    assert_eq!(result, None);
    assert_eq!(*log.lock(), vec!["outer", "outer"]);
}

#[tokio::test]
async fn resuming_a_continuation_twice_fails() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let handler = logging_handler(log.clone()).intercept(Arc::new(DoubleResume));

    let session = BindingRegistry::new().build().session();
    let err = session.invoke_async(&handler).await.unwrap_err();

    assert_eq!(err, DiError::ContinuationConsumed);
    // The target still ran exactly once.
    assert_eq!(*log.lock(), vec!["target"]);
}

#[tokio::test]
async fn provided_values_resolve_as_session_temporaries() {
    let request_id = Symbol::new("request.id");

    let handler = MethodHandler::new("report", 1, |args| Ok(*args.get::<u64>(0)?))
        .param(ParamSpec::new(0, request_id))
        .intercept(Arc::new(ProvideRequestId { id: request_id }));

    let session = BindingRegistry::new().build().session();
    let value = session.invoke_async(&handler).await.unwrap();
    assert_eq!(value, Some(42));
}

#[tokio::test]
async fn provided_values_shadow_registry_bindings() {
    let mut registry = BindingRegistry::new();
    registry.add_constant("tenant", String::from("default")).unwrap();

    struct ProvideTenant;

    #[async_trait]
    impl Interceptor for ProvideTenant {
        async fn intercept(&self, provide: Provide, mut next: Next<'_>) -> DiResult<()> {
            provide.set("tenant", String::from("acme"));
            next.run().await
        }
    }

    let handler = MethodHandler::new("whoami", 1, |args| Ok(args.get::<String>(0)?.to_string()))
        .param(ParamSpec::new(0, "tenant"))
        .intercept(Arc::new(ProvideTenant));

    let session = registry.build().session();
    let tenant = session.invoke_async(&handler).await.unwrap();
    assert_eq!(tenant.as_deref(), Some("acme"));
}

#[tokio::test]
async fn target_errors_surface_through_the_chain() {
    let handler = MethodHandler::<u8>::new("broken", 0, |_| Err(DiError::Internal("boom")))
        .intercept(Arc::new(Tracer {
            name: "outer",
            log: Arc::new(Mutex::new(Vec::new())),
        }));

    let session = BindingRegistry::new().build().session();
    let err = session.invoke_async(&handler).await.unwrap_err();
    assert_eq!(err, DiError::Internal("boom"));
}

#[tokio::test]
async fn an_outer_interceptor_may_suppress_an_inner_error() {
    let handler = MethodHandler::<u8>::new("broken", 0, |_| Err(DiError::Internal("boom")))
        .intercept(Arc::new(Suppress));

    let session = BindingRegistry::new().build().session();
    let result = session.invoke_async(&handler).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn interceptors_are_skipped_until_resolution_succeeds() {
    // A failing parameter resolution surfaces from next.run, before dispatch.
    let handler = MethodHandler::<u64>::new("needs_dep", 1, |args| Ok(*args.get::<u64>(0)?))
        .param(ParamSpec::new(0, "missing"))
        .intercept(Arc::new(Suppress));

    let session = BindingRegistry::new().build().session();
    let result = session.invoke_async(&handler).await.unwrap();
    assert_eq!(result, None);
}

#[test]
fn sync_invoke_ignores_the_interceptor_chain() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let handler = logging_handler(log.clone()).intercept(Arc::new(Tracer {
        name: "outer",
        log: log.clone(),
    }));

    let session = BindingRegistry::new().build().session();
    let result = session.invoke(&handler).unwrap();

    assert_eq!(result, "done");
    assert_eq!(*log.lock(), vec!["target"]);
}
