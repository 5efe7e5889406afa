//! Invoking plain functions with container-resolved arguments.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::instruction::Instruction;
use crate::interceptor::{Interceptor, Next, Provide};
use crate::metadata::{Args, BoxFuture, ParamSpec};
use crate::session::ResolveSession;

/// A function or method exposed to the container as a synthetic constructor.
///
/// The handler declares its arity, one [`ParamSpec`] per parameter, the
/// callable itself, and an optional interceptor chain. Parameters resolve
/// exactly as a binding's constructor parameters would, in declared order.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{BindingRegistry, MethodHandler, ParamSpec, Scope};
///
/// let mut registry = BindingRegistry::new();
/// registry.add_constant("name", String::from("lattice")).unwrap();
/// let container = registry.build();
///
/// let greet = MethodHandler::new("greet", 1, |args| {
///     Ok(format!("hello, {}", args.get::<String>(0)?))
/// })
/// .param(ParamSpec::new(0, "name"));
///
/// let greeting = container.session().invoke(&greet).unwrap();
/// assert_eq!(greeting, "hello, lattice");
/// ```
pub struct MethodHandler<R> {
    name: &'static str,
    arity: usize,
    params: Vec<ParamSpec>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    call: Arc<dyn Fn(&Args) -> DiResult<R> + Send + Sync>,
}

impl<R> MethodHandler<R> {
    /// Wraps `call`, a callable of `arity` parameters, under a diagnostic
    /// name.
    pub fn new<F>(name: &'static str, arity: usize, call: F) -> Self
    where
        F: Fn(&Args) -> DiResult<R> + Send + Sync + 'static,
    {
        Self {
            name,
            arity,
            params: Vec::new(),
            interceptors: Vec::new(),
            call: Arc::new(call),
        }
    }

    /// Declares injection metadata for one parameter slot.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Appends an interceptor. Declaration order is outer to inner.
    pub fn intercept(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Diagnostic name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Checks that every parameter slot carries metadata: the number of
    /// declared `ParamSpec`s must equal the arity and each index in
    /// `0..arity` must be covered.
    fn check_wiring(&self) -> DiResult<()> {
        if self.params.len() != self.arity {
            return Err(DiError::ArityMismatch {
                target: self.name,
                arity: self.arity,
                received: self.params.len(),
            });
        }
        let mut sorted: Vec<&ParamSpec> = self.params.iter().collect();
        sorted.sort_by_key(|p| p.index);
        for (position, param) in sorted.iter().enumerate() {
            if param.index != position {
                return Err(DiError::MissingParamMetadata {
                    target: self.name,
                    index: position,
                });
            }
        }
        Ok(())
    }

    /// Compiles the parameter plans, in declared order, without a build tail.
    /// Executing them leaves the arguments on the value stack.
    fn plan_work(&self) -> Vec<Instruction> {
        let mut sorted: Vec<&ParamSpec> = self.params.iter().collect();
        sorted.sort_by_key(|p| p.index);
        let mut work = Vec::with_capacity(sorted.len() * 2);
        for param in sorted {
            work.push(Instruction::Plan {
                id: param.id.clone(),
                optional: param.optional,
                allow_temporary: true,
            });
            if let Some(transform) = &param.transform {
                work.push(Instruction::Transform(transform.clone()));
            }
        }
        work
    }
}

impl ResolveSession {
    /// Resolves the handler's parameters and calls it. Interceptors do not
    /// run on the sync path; use [`ResolveSession::invoke_async`] for chains.
    pub fn invoke<R>(&self, handler: &MethodHandler<R>) -> DiResult<R> {
        handler.check_wiring()?;
        let values = self.execute_sync(handler.plan_work())?;
        (handler.call)(&Args::new(values))
    }

    /// Resolves the handler's parameters and calls it inside its interceptor
    /// chain. Returns `Ok(None)` when an interceptor short-circuited, so the
    /// target never ran (or its error was suppressed by an outer frame).
    pub async fn invoke_async<R: Send>(&self, handler: &MethodHandler<R>) -> DiResult<Option<R>> {
        handler.check_wiring()?;

        let slot: Arc<Mutex<Option<R>>> = Arc::new(Mutex::new(None));
        let work = handler.plan_work();
        let call = handler.call.clone();
        let target_slot = slot.clone();
        let target: TargetFn<'_> = Box::new(move || {
            Box::pin(async move {
                let values = self.execute_async(work).await?;
                let result = call(&Args::new(values))?;
                *target_slot.lock() = Some(result);
                Ok(())
            })
        });
        self.chain(&handler.interceptors, target).await?;

        let result = slot.lock().take();
        Ok(result)
    }

    fn chain<'a>(
        &'a self,
        interceptors: &'a [Arc<dyn Interceptor>],
        target: TargetFn<'a>,
    ) -> BoxFuture<'a, DiResult<()>> {
        match interceptors.split_first() {
            None => target(),
            Some((outer, rest)) => {
                let provide = Provide::new(self.temporaries().clone());
                Box::pin(async move {
                    let inner = self.chain(rest, target);
                    outer.intercept(provide, Next::new(inner)).await
                })
            }
        }
    }
}

type TargetFn<'a> = Box<dyn FnOnce() -> BoxFuture<'a, DiResult<()>> + Send + 'a>;
