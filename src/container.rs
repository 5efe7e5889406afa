//! Immutable container produced by a sealed registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::binding::Binding;
use crate::error::{DiError, DiResult};
use crate::instruction::Instruction;
use crate::key::ServiceId;
use crate::metadata::AnyArc;
use crate::session::ResolveSession;

/// Sealed, thread-safe view of the binding graph plus the process-wide
/// singleton cache.
///
/// Cloning a container is cheap and every clone shares the same singletons.
/// Per-request state lives in a [`ResolveSession`] created through
/// [`Container::session`].
///
/// # Examples
///
/// ```rust
/// use lattice_di::{BindingRegistry, Scope};
/// use std::sync::Arc;
///
/// let mut registry = BindingRegistry::new();
/// registry.add_factory("id", Scope::Singleton, vec![], |_| Ok(7u32)).unwrap();
/// let container = registry.build();
///
/// let a = container.session().resolve::<u32, _>("id").unwrap();
/// let b = container.clone().session().resolve::<u32, _>("id").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    bindings: HashMap<ServiceId, Binding>,
    programs: HashMap<ServiceId, Arc<[Instruction]>>,
    singletons: Mutex<HashMap<ServiceId, AnyArc>>,
}

impl Container {
    pub(crate) fn new(
        bindings: HashMap<ServiceId, Binding>,
        programs: HashMap<ServiceId, Arc<[Instruction]>>,
    ) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                bindings,
                programs,
                singletons: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Starts a resolution session with its own request cache and temporary
    /// bindings table.
    pub fn session(&self) -> ResolveSession {
        ResolveSession::new(self.clone())
    }

    /// Resolves `id` through a throwaway session. Request-scoped values are
    /// not shared across calls; use [`Container::session`] when they should
    /// be.
    pub fn resolve<T, I>(&self, id: I) -> DiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        I: Into<ServiceId>,
    {
        self.session().resolve(id)
    }

    /// Async counterpart of [`Container::resolve`].
    pub async fn resolve_async<T, I>(&self, id: I) -> DiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        I: Into<ServiceId>,
    {
        self.session().resolve_async(id).await
    }

    /// Whether `id` is bound.
    pub fn contains(&self, id: &ServiceId) -> bool {
        self.inner.bindings.contains_key(id)
    }

    pub(crate) fn binding(&self, id: &ServiceId) -> Option<&Binding> {
        self.inner.bindings.get(id)
    }

    pub(crate) fn program(&self, id: &ServiceId) -> Option<Arc<[Instruction]>> {
        self.inner.programs.get(id).cloned()
    }

    pub(crate) fn singleton(&self, id: &ServiceId) -> Option<AnyArc> {
        self.inner.singletons.lock().get(id).cloned()
    }

    /// Stores a freshly built singleton. An entry already being present means
    /// the engine built a cached id twice, which must never happen.
    pub(crate) fn store_singleton(&self, id: ServiceId, value: AnyArc) -> DiResult<()> {
        let mut singletons = self.inner.singletons.lock();
        if singletons.contains_key(&id) {
            return Err(DiError::Internal("singleton constructed twice"));
        }
        singletons.insert(id, value);
        Ok(())
    }
}
