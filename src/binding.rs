//! Binding kinds held by the registry and container.

use crate::key::ServiceId;
use crate::metadata::{AnyArc, AsyncConstructFn, ConstructFn, ParamSpec};
use crate::scope::Scope;

/// How a service id is produced when resolved.
pub(crate) enum Binding {
    /// A pre-built value shared as-is, never cached per scope.
    Constant { value: AnyArc },
    /// A typed construction recipe registered through [`Injectable`]
    /// metadata.
    ///
    /// [`Injectable`]: crate::Injectable
    Instance {
        scope: Scope,
        params: Vec<ParamSpec>,
        construct: ConstructFn,
    },
    /// An untyped factory closure over resolved arguments.
    Factory {
        scope: Scope,
        params: Vec<ParamSpec>,
        construct: ConstructFn,
    },
    /// A factory whose construction is awaited; only reachable through the
    /// async resolution entry points.
    AsyncFactory {
        scope: Scope,
        params: Vec<ParamSpec>,
        construct: AsyncConstructFn,
    },
    /// A redirect to another id.
    Alias { target: ServiceId },
}

impl Binding {
    pub(crate) fn params(&self) -> &[ParamSpec] {
        match self {
            Binding::Instance { params, .. }
            | Binding::Factory { params, .. }
            | Binding::AsyncFactory { params, .. } => params,
            Binding::Constant { .. } | Binding::Alias { .. } => &[],
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Binding::Constant { .. } => "constant",
            Binding::Instance { .. } => "instance",
            Binding::Factory { .. } => "factory",
            Binding::AsyncFactory { .. } => "async factory",
            Binding::Alias { .. } => "alias",
        }
    }
}
