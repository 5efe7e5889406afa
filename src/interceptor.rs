//! Async interceptors wrapped around method invocation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::key::ServiceId;
use crate::metadata::{AnyArc, BoxFuture};

pub(crate) type TemporaryTable = Arc<Mutex<HashMap<ServiceId, AnyArc>>>;

/// Wraps an invocation with code that runs before and after the inner chain.
///
/// Interceptors compose outer to inner in declaration order. Each one decides
/// whether to continue by driving [`Next::run`]; returning without doing so
/// short-circuits the rest of the chain and the target.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{service_id_of, DiResult, Interceptor, Next, Provide};
/// use async_trait::async_trait;
///
/// struct StampRequestId;
///
/// #[async_trait]
/// impl Interceptor for StampRequestId {
///     async fn intercept(&self, provide: Provide, mut next: Next<'_>) -> DiResult<()> {
///         provide.set("request_id", 42u64);
///         next.run().await
///     }
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, provide: Provide, next: Next<'_>) -> DiResult<()>;
}

/// Write handle into the running session's temporary bindings.
///
/// Values set here resolve like session-local constants for the rest of the
/// invocation, shadowing the registry for every id except parameters of a
/// singleton build.
#[derive(Clone)]
pub struct Provide {
    temporaries: TemporaryTable,
}

impl Provide {
    pub(crate) fn new(temporaries: TemporaryTable) -> Self {
        Self { temporaries }
    }

    /// Binds `id` to `value` for the remainder of the session.
    pub fn set<T: Send + Sync + 'static>(&self, id: impl Into<ServiceId>, value: T) {
        self.temporaries.lock().insert(id.into(), Arc::new(value));
    }
}

/// One-shot continuation to the inner chain.
///
/// The first [`Next::run`] drives every inner interceptor and the target to
/// completion and returns their combined status. A second call fails with
/// [`DiError::ContinuationConsumed`]; the inner chain never runs twice.
pub struct Next<'a> {
    inner: Option<BoxFuture<'a, DiResult<()>>>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(inner: BoxFuture<'a, DiResult<()>>) -> Self {
        Self { inner: Some(inner) }
    }

    /// Runs the inner chain, once.
    pub async fn run(&mut self) -> DiResult<()> {
        match self.inner.take() {
            Some(inner) => inner.await,
            None => Err(DiError::ContinuationConsumed),
        }
    }
}
