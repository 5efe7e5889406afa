//! Per-parameter injection metadata and the resolved-argument view handed to
//! factories and constructors.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::ServiceId;
use crate::scope::Scope;

/// Type-erased shared value, the currency of the resolution engine.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Boxed `Send` future, used for async factories and interceptor frames.
pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub(crate) type TransformFn = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type ConstructFn = Arc<dyn Fn(&Args) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type AsyncConstructFn =
    Arc<dyn Fn(Args) -> BoxFuture<'static, DiResult<AnyArc>> + Send + Sync>;

/// One slot on the resolution value stack.
///
/// `Absent` stands in for an optional parameter whose id had no binding.
#[derive(Clone)]
pub(crate) enum Value {
    Present(AnyArc),
    Absent,
}

/// Resolved arguments for one constructor, factory, or method call, in
/// declaration order.
///
/// Accessors downcast to the requested type; asking for the wrong type fails
/// with [`DiError::TypeMismatch`].
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub(crate) fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the call takes no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes the required argument at `index`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        match self.values.get(index) {
            Some(Value::Present(value)) => value.clone().downcast::<T>().map_err(|_| {
                DiError::TypeMismatch {
                    expected: std::any::type_name::<T>(),
                }
            }),
            Some(Value::Absent) => Err(DiError::Internal(
                "required accessor used on an absent optional argument",
            )),
            None => Err(DiError::Internal("argument index out of range")),
        }
    }

    /// Takes the optional argument at `index`; `None` when the parameter's id
    /// had no binding.
    pub fn get_optional<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Option<Arc<T>>> {
        match self.values.get(index) {
            Some(Value::Present(value)) => value
                .clone()
                .downcast::<T>()
                .map(Some)
                .map_err(|_| DiError::TypeMismatch {
                    expected: std::any::type_name::<T>(),
                }),
            Some(Value::Absent) => Ok(None),
            None => Err(DiError::Internal("argument index out of range")),
        }
    }
}

/// Injection metadata for one parameter of a constructor, factory, or method.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{ParamSpec, service_id_of};
///
/// struct Database;
///
/// let plain = ParamSpec::new(0, service_id_of::<Database>());
/// let optional = ParamSpec::new(1, "feature_flag").optional();
/// let shaped = ParamSpec::new(2, "port").transform(|port: &u16| u32::from(*port) + 1);
/// # let _ = (plain, optional, shaped);
/// ```
#[derive(Clone)]
pub struct ParamSpec {
    pub(crate) index: usize,
    pub(crate) id: ServiceId,
    pub(crate) optional: bool,
    pub(crate) transform: Option<TransformFn>,
}

impl ParamSpec {
    /// Declares the parameter at `index` as injected from `id`.
    pub fn new(index: usize, id: impl Into<ServiceId>) -> Self {
        Self {
            index,
            id: id.into(),
            optional: false,
            transform: None,
        }
    }

    /// Marks the parameter optional: a missing binding yields `None` instead
    /// of failing the resolution.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Shapes the resolved value before it reaches the consuming call.
    ///
    /// The transform runs exactly once per resolution of this parameter. It
    /// is skipped when an optional parameter resolved to nothing.
    pub fn transform<A, B, F>(mut self, f: F) -> Self
    where
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(move |value: AnyArc| {
            let input = value.downcast::<A>().map_err(|_| DiError::TypeMismatch {
                expected: std::any::type_name::<A>(),
            })?;
            Ok(Arc::new(f(&input)) as AnyArc)
        }));
        self
    }
}

/// Declared construction recipe for an injectable type: its scope, parameter
/// specs, and constructing closure.
///
/// Built once inside [`Injectable::metadata`] and read whenever the type is
/// registered or constructed ad hoc.
pub struct InjectMetadata<T> {
    pub(crate) scope: Scope,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) construct: Arc<dyn Fn(&Args) -> DiResult<T> + Send + Sync>,
}

impl<T: Send + Sync + 'static> InjectMetadata<T> {
    /// Starts declaring construction metadata with the given scope.
    pub fn builder(scope: Scope) -> InjectMetadataBuilder<T> {
        InjectMetadataBuilder {
            scope,
            params: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }
}

/// Fluent builder for [`InjectMetadata`].
pub struct InjectMetadataBuilder<T> {
    scope: Scope,
    params: Vec<ParamSpec>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> InjectMetadataBuilder<T> {
    /// Declares the next parameter, injected from `id`.
    pub fn param(mut self, id: impl Into<ServiceId>) -> Self {
        let index = self.params.len();
        self.params.push(ParamSpec::new(index, id));
        self
    }

    /// Declares the next parameter as optional.
    pub fn optional_param(mut self, id: impl Into<ServiceId>) -> Self {
        let index = self.params.len();
        self.params.push(ParamSpec::new(index, id).optional());
        self
    }

    /// Declares a parameter from a fully-specified [`ParamSpec`], explicit
    /// index included.
    pub fn param_spec(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Finishes the declaration with the constructing closure.
    pub fn construct<F>(self, f: F) -> InjectMetadata<T>
    where
        F: Fn(&Args) -> DiResult<T> + Send + Sync + 'static,
    {
        InjectMetadata {
            scope: self.scope,
            params: self.params,
            construct: Arc::new(f),
        }
    }
}

/// A type that declares how the container should construct it.
///
/// This is the explicit, typed replacement for attribute-style injection
/// metadata: each injectable type states its scope, parameters, and
/// constructor in one place, and both [`BindingRegistry::add`] and
/// [`ResolveSession::construct`] read it.
///
/// [`BindingRegistry::add`]: crate::BindingRegistry::add
/// [`ResolveSession::construct`]: crate::ResolveSession::construct
///
/// # Examples
///
/// ```rust
/// use lattice_di::{BindingRegistry, InjectMetadata, Injectable, Scope};
/// use std::sync::Arc;
///
/// struct Database { url: String }
///
/// struct UserService { db: Arc<Database> }
///
/// impl Injectable for UserService {
///     fn metadata() -> InjectMetadata<Self> {
///         InjectMetadata::builder(Scope::Transient)
///             .param(lattice_di::service_id_of::<Database>())
///             .construct(|args| Ok(UserService { db: args.get::<Database>(0)? }))
///     }
/// }
///
/// let mut registry = BindingRegistry::new();
/// registry.add_constant(
///     lattice_di::service_id_of::<Database>(),
///     Database { url: "postgres://localhost".to_string() },
/// ).unwrap();
/// registry.add::<UserService>().unwrap();
///
/// let container = registry.build();
/// let svc = container.session().resolve_type::<UserService>().unwrap();
/// assert_eq!(svc.db.url, "postgres://localhost");
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The construction recipe for this type.
    fn metadata() -> InjectMetadata<Self>;
}
