//! Per-invocation resolution state and the stack-machine executor.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::binding::Binding;
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::instruction::{compile, BuildKind, Instruction};
use crate::interceptor::TemporaryTable;
use crate::key::{service_id_of, ServiceId};
use crate::metadata::{AnyArc, Args, Injectable, Value};
use crate::scope::Scope;

/// One resolution session over a [`Container`].
///
/// A session owns the request-scoped cache and the temporary bindings table.
/// Everything resolved through the same session shares its request-scoped
/// values; a fresh session starts clean. Sessions are cheap, create one per
/// logical request.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{BindingRegistry, Scope};
/// use std::sync::Arc;
///
/// let mut registry = BindingRegistry::new();
/// registry
///     .add_factory("conn", Scope::Request, vec![], |_| Ok(String::from("db-1")))
///     .unwrap();
/// let container = registry.build();
///
/// let session = container.session();
/// let a = session.resolve::<String, _>("conn").unwrap();
/// let b = session.resolve::<String, _>("conn").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let c = container.session().resolve::<String, _>("conn").unwrap();
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
pub struct ResolveSession {
    container: Container,
    request_cache: Mutex<HashMap<ServiceId, AnyArc>>,
    temporaries: TemporaryTable,
}

/// Per-call interpreter state. The work stack executes back to front; the
/// value stack accumulates resolved parameters left to right.
struct Machine {
    work: Vec<Instruction>,
    values: Vec<Value>,
    pending: HashSet<ServiceId>,
}

impl Machine {
    fn start(mut work: Vec<Instruction>) -> Self {
        work.reverse();
        Self {
            work,
            values: Vec::new(),
            pending: HashSet::new(),
        }
    }
}

impl ResolveSession {
    pub(crate) fn new(container: Container) -> Self {
        trace!("resolve session created");
        Self {
            container,
            request_cache: Mutex::new(HashMap::new()),
            temporaries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn temporaries(&self) -> &TemporaryTable {
        &self.temporaries
    }

    /// Resolves `id` to a value of type `T`.
    ///
    /// The id parameter stays generic so both the target type and the id can
    /// be turbofished together, as in `resolve::<u16, _>("port")`.
    pub fn resolve<T, I>(&self, id: I) -> DiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        I: Into<ServiceId>,
    {
        downcast::<T>(self.resolve_any(id)?)
    }

    /// Resolves a type registered under its own type id.
    pub fn resolve_type<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolve(service_id_of::<T>())
    }

    /// Resolves `id` without downcasting.
    pub fn resolve_any(&self, id: impl Into<ServiceId>) -> DiResult<AnyArc> {
        let values = self.execute_sync(vec![root_plan(id.into())])?;
        single_value(values)
    }

    /// Resolves `id`, awaiting any async factories on the path.
    pub async fn resolve_async<T, I>(&self, id: I) -> DiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        I: Into<ServiceId>,
    {
        downcast::<T>(self.resolve_any_async(id).await?)
    }

    /// Async counterpart of [`ResolveSession::resolve_type`].
    pub async fn resolve_type_async<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolve_async(service_id_of::<T>()).await
    }

    /// Async counterpart of [`ResolveSession::resolve_any`].
    pub async fn resolve_any_async(&self, id: impl Into<ServiceId>) -> DiResult<AnyArc> {
        let values = self.execute_async(vec![root_plan(id.into())]).await?;
        single_value(values)
    }

    /// Builds a `T` from its own declared metadata without requiring a
    /// registered binding. The result is always built fresh and never cached,
    /// whatever scope the metadata declares; dependencies still resolve
    /// through this session.
    pub fn construct<T: Injectable>(&self) -> DiResult<Arc<T>> {
        let metadata = T::metadata();
        let construct = metadata.construct;
        // The declared scope only matters for registered bindings; ad hoc
        // construction compiles as transient so nothing is cached and
        // session temporaries stay visible.
        let binding = Binding::Instance {
            scope: Scope::Transient,
            params: metadata.params,
            construct: Arc::new(move |args| Ok(Arc::new(construct(args)?) as AnyArc)),
        };
        let program = compile(&service_id_of::<T>(), &binding)?
            .ok_or(DiError::Internal("instance binding compiled to no program"))?;
        downcast::<T>(single_value(self.execute_sync(program)?)?)
    }

    /// Binds `id` to a constant for this session only. Later resolutions in
    /// this session see the temporary before consulting the registry, except
    /// while constructing a singleton, which never observes session state.
    pub fn add_temporary_constant_binding<T: Send + Sync + 'static>(
        &self,
        id: impl Into<ServiceId>,
        value: T,
    ) -> &Self {
        self.temporaries.lock().insert(id.into(), Arc::new(value));
        self
    }

    pub(crate) fn execute_sync(&self, work: Vec<Instruction>) -> DiResult<Vec<Value>> {
        let mut machine = Machine::start(work);
        while let Some(instruction) = machine.work.pop() {
            match instruction {
                Instruction::Plan {
                    id,
                    optional,
                    allow_temporary,
                } => self.step_plan(&mut machine, id, optional, allow_temporary)?,
                Instruction::Transform(transform) => step_transform(&mut machine, &transform)?,
                Instruction::Build {
                    id,
                    scope,
                    param_count,
                    kind,
                } => {
                    let args = take_args(&mut machine, param_count)?;
                    let value = match kind {
                        BuildKind::Sync(construct) => construct(&args)?,
                        BuildKind::Async(_) => {
                            return Err(DiError::AsyncUnsupported { id })
                        }
                    };
                    self.finish_build(&mut machine, id, scope, value)?;
                }
            }
        }
        Ok(machine.values)
    }

    pub(crate) async fn execute_async(&self, work: Vec<Instruction>) -> DiResult<Vec<Value>> {
        let mut machine = Machine::start(work);
        while let Some(instruction) = machine.work.pop() {
            match instruction {
                Instruction::Plan {
                    id,
                    optional,
                    allow_temporary,
                } => self.step_plan(&mut machine, id, optional, allow_temporary)?,
                Instruction::Transform(transform) => step_transform(&mut machine, &transform)?,
                Instruction::Build {
                    id,
                    scope,
                    param_count,
                    kind,
                } => {
                    let args = take_args(&mut machine, param_count)?;
                    let value = match kind {
                        BuildKind::Sync(construct) => construct(&args)?,
                        BuildKind::Async(construct) => construct(args).await?,
                    };
                    self.finish_build(&mut machine, id, scope, value)?;
                }
            }
        }
        Ok(machine.values)
    }

    /// Resolves one planned id: cache lookups, alias chasing, cycle check,
    /// and scheduling of the target's compiled program.
    fn step_plan(
        &self,
        machine: &mut Machine,
        id: ServiceId,
        optional: bool,
        allow_temporary: bool,
    ) -> DiResult<()> {
        let mut seen = HashSet::new();
        let mut current = id.clone();
        loop {
            if allow_temporary {
                if let Some(value) = self.temporaries.lock().get(&current) {
                    trace!(id = %current, "temporary binding hit");
                    machine.values.push(Value::Present(value.clone()));
                    return Ok(());
                }
            }
            match self.container.binding(&current) {
                Some(Binding::Alias { target }) => {
                    if !seen.insert(current) {
                        return Err(DiError::CircularAlias { id });
                    }
                    current = target.clone();
                }
                _ => break,
            }
        }

        if machine.pending.contains(&current) {
            return Err(DiError::CircularDependency { id: current });
        }
        if let Some(value) = self.request_cache.lock().get(&current) {
            trace!(id = %current, "request cache hit");
            machine.values.push(Value::Present(value.clone()));
            return Ok(());
        }
        if let Some(value) = self.container.singleton(&current) {
            trace!(id = %current, "singleton cache hit");
            machine.values.push(Value::Present(value));
            return Ok(());
        }

        match self.container.binding(&current) {
            None => {
                if optional {
                    machine.values.push(Value::Absent);
                    Ok(())
                } else {
                    Err(DiError::BindingNotFound { id: current })
                }
            }
            Some(Binding::Constant { value }) => {
                machine.values.push(Value::Present(value.clone()));
                Ok(())
            }
            Some(_) => {
                let program = self
                    .container
                    .program(&current)
                    .ok_or(DiError::Internal("constructive binding has no program"))?;
                machine.pending.insert(current);
                machine.work.extend(program.iter().rev().cloned());
                Ok(())
            }
        }
    }

    fn finish_build(
        &self,
        machine: &mut Machine,
        id: ServiceId,
        scope: Scope,
        value: AnyArc,
    ) -> DiResult<()> {
        trace!(id = %id, ?scope, "built service");
        machine.pending.remove(&id);
        match scope {
            Scope::Singleton => self.container.store_singleton(id, value.clone())?,
            Scope::Request => {
                self.request_cache.lock().insert(id, value.clone());
            }
            Scope::Transient => {}
        }
        machine.values.push(Value::Present(value));
        Ok(())
    }
}

fn root_plan(id: ServiceId) -> Instruction {
    Instruction::Plan {
        id,
        optional: false,
        allow_temporary: true,
    }
}

fn step_transform(machine: &mut Machine, transform: &crate::metadata::TransformFn) -> DiResult<()> {
    match machine.values.pop() {
        Some(Value::Present(value)) => {
            machine.values.push(Value::Present(transform(value)?));
            Ok(())
        }
        // A missing optional parameter carries no value to shape.
        Some(Value::Absent) => {
            machine.values.push(Value::Absent);
            Ok(())
        }
        None => Err(DiError::Internal("transform on an empty value stack")),
    }
}

fn take_args(machine: &mut Machine, param_count: usize) -> DiResult<Args> {
    let split = machine
        .values
        .len()
        .checked_sub(param_count)
        .ok_or(DiError::Internal("value stack underflow"))?;
    Ok(Args::new(machine.values.split_off(split)))
}

fn single_value(mut values: Vec<Value>) -> DiResult<AnyArc> {
    match values.pop() {
        Some(Value::Present(value)) if values.is_empty() => Ok(value),
        _ => Err(DiError::Internal("resolution left an inconsistent value stack")),
    }
}

fn downcast<T: Send + Sync + 'static>(value: AnyArc) -> DiResult<Arc<T>> {
    value.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        expected: std::any::type_name::<T>(),
    })
}
