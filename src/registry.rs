//! Mutable binding registry, the configuration phase of the container.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::binding::Binding;
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::instruction::{compile, Instruction};
use crate::key::{service_id_of, ServiceId};
use crate::metadata::{AnyArc, Args, Injectable, ParamSpec};
use crate::scope::Scope;

/// Collects bindings and compiles each registration into its resolution
/// program, then seals into an immutable [`Container`].
///
/// Registration is fail-fast: duplicate ids and malformed parameter lists
/// are rejected at `add_*` time, not at first resolution.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{BindingRegistry, Scope};
///
/// let mut registry = BindingRegistry::new();
/// registry.add_constant("greeting", "hello".to_string()).unwrap();
/// registry
///     .add_factory("shout", Scope::Transient, vec![lattice_di::ParamSpec::new(0, "greeting")], |args| {
///         Ok(args.get::<String>(0)?.to_uppercase())
///     })
///     .unwrap();
///
/// let container = registry.build();
/// let shout = container.session().resolve::<String, _>("shout").unwrap();
/// assert_eq!(*shout, "HELLO");
/// ```
#[derive(Default)]
pub struct BindingRegistry {
    bindings: HashMap<ServiceId, Binding>,
    programs: HashMap<ServiceId, Arc<[Instruction]>>,
}

impl BindingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether `id` is bound.
    pub fn contains(&self, id: &ServiceId) -> bool {
        self.bindings.contains_key(id)
    }

    fn add_binding(&mut self, id: ServiceId, binding: Binding) -> DiResult<()> {
        if self.bindings.contains_key(&id) {
            return Err(DiError::DuplicatedBinding { id });
        }
        if let Binding::AsyncFactory {
            scope: Scope::Singleton,
            ..
        } = &binding
        {
            return Err(DiError::UnsupportedScope { id });
        }
        if let Some(program) = compile(&id, &binding)? {
            self.programs.insert(id.clone(), program.into());
        }
        debug!(id = %id, kind = binding.kind_name(), "registered binding");
        self.bindings.insert(id, binding);
        Ok(())
    }

    /// Binds `id` to a pre-built value, shared untouched by every resolution.
    pub fn add_constant<T: Send + Sync + 'static>(
        &mut self,
        id: impl Into<ServiceId>,
        value: T,
    ) -> DiResult<()> {
        self.add_binding(
            id.into(),
            Binding::Constant {
                value: Arc::new(value),
            },
        )
    }

    /// Binds `id` to a factory closure over resolved arguments.
    pub fn add_factory<T, F>(
        &mut self,
        id: impl Into<ServiceId>,
        scope: Scope,
        params: Vec<ParamSpec>,
        factory: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Args) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_binding(
            id.into(),
            Binding::Factory {
                scope,
                params,
                construct: Arc::new(move |args| Ok(Arc::new(factory(args)?) as AnyArc)),
            },
        )
    }

    /// Binds `id` to a factory whose construction is awaited. Such a binding
    /// resolves only through the async entry points; the sync path reports
    /// [`DiError::AsyncUnsupported`].
    pub fn add_async_factory<T, F, Fut>(
        &mut self,
        id: impl Into<ServiceId>,
        scope: Scope,
        params: Vec<ParamSpec>,
        factory: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_binding(
            id.into(),
            Binding::AsyncFactory {
                scope,
                params,
                construct: Arc::new(move |args| {
                    let fut = factory(args);
                    Box::pin(async move { Ok(Arc::new(fut.await?) as AnyArc) })
                }),
            },
        )
    }

    /// Binds `id` as a redirect to `target`. The alias shares the target's
    /// cache entries, so both ids resolve to the same value.
    pub fn add_alias(
        &mut self,
        id: impl Into<ServiceId>,
        target: impl Into<ServiceId>,
    ) -> DiResult<()> {
        self.add_binding(
            id.into(),
            Binding::Alias {
                target: target.into(),
            },
        )
    }

    /// Registers an [`Injectable`] type under its type id, using its declared
    /// metadata.
    pub fn add<T: Injectable>(&mut self) -> DiResult<()> {
        let metadata = T::metadata();
        let construct = metadata.construct;
        self.add_binding(
            service_id_of::<T>(),
            Binding::Instance {
                scope: metadata.scope,
                params: metadata.params,
                construct: Arc::new(move |args| Ok(Arc::new(construct(args)?) as AnyArc)),
            },
        )
    }

    /// Checks the whole graph eagerly: every required dependency must be
    /// bound, and neither dependency edges nor alias chains may form a cycle.
    pub fn validate(&self) -> DiResult<()> {
        let mut checked = HashSet::new();
        for id in self.bindings.keys() {
            let mut visiting = HashSet::new();
            self.validate_id(id, &mut visiting, &mut checked)?;
        }
        Ok(())
    }

    fn validate_id(
        &self,
        id: &ServiceId,
        visiting: &mut HashSet<ServiceId>,
        checked: &mut HashSet<ServiceId>,
    ) -> DiResult<()> {
        let canonical = self.canonical(id)?;
        if checked.contains(&canonical) {
            return Ok(());
        }
        if !visiting.insert(canonical.clone()) {
            return Err(DiError::CircularDependency { id: canonical });
        }
        let binding = self
            .bindings
            .get(&canonical)
            .ok_or_else(|| DiError::BindingNotFound {
                id: canonical.clone(),
            })?;
        for param in binding.params() {
            match self.canonical(&param.id) {
                Ok(target) if self.bindings.contains_key(&target) => {
                    self.validate_id(&target, visiting, checked)?;
                }
                Ok(target) => {
                    if !param.optional {
                        return Err(DiError::BindingNotFound { id: target });
                    }
                }
                Err(err) => return Err(err),
            }
        }
        visiting.remove(&canonical);
        checked.insert(canonical);
        Ok(())
    }

    /// Follows alias redirects to the canonical id, rejecting alias loops.
    fn canonical(&self, id: &ServiceId) -> DiResult<ServiceId> {
        let mut seen = HashSet::new();
        let mut current = id.clone();
        while let Some(Binding::Alias { target }) = self.bindings.get(&current) {
            if !seen.insert(current.clone()) {
                return Err(DiError::CircularAlias { id: id.clone() });
            }
            current = target.clone();
        }
        Ok(current)
    }

    /// Seals the registry into an immutable, cloneable [`Container`].
    pub fn build(self) -> Container {
        Container::new(self.bindings, self.programs)
    }
}
