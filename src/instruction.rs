//! Compiled resolution programs.
//!
//! Every constructive binding is compiled, at registration time, into a flat
//! instruction sequence the resolution engine executes with an explicit work
//! stack. A program interleaves one `Plan` (and optional `Transform`) per
//! declared parameter with a trailing `Build`:
//!
//! ```text
//! [Plan p0, Transform p0?, Plan p1, Transform p1?, ..., Build]
//! ```

use crate::binding::Binding;
use crate::error::{DiError, DiResult};
use crate::key::ServiceId;
use crate::metadata::{AsyncConstructFn, ConstructFn, ParamSpec, TransformFn};
use crate::scope::Scope;

/// The constructing closure a `Build` frame runs.
#[derive(Clone)]
pub(crate) enum BuildKind {
    Sync(ConstructFn),
    Async(AsyncConstructFn),
}

/// One step of a compiled resolution program.
#[derive(Clone)]
pub(crate) enum Instruction {
    /// Resolve `id` and push the result onto the value stack.
    Plan {
        id: ServiceId,
        optional: bool,
        /// Whether session-temporary bindings may satisfy this plan.
        /// Parameters of singleton builds refuse them so a cached singleton
        /// can never capture session-local state.
        allow_temporary: bool,
    },
    /// Rewrite the top of the value stack through the parameter's transform.
    Transform(TransformFn),
    /// Pop `param_count` values, run the constructor, push the result, and
    /// cache it according to `scope`.
    Build {
        id: ServiceId,
        scope: Scope,
        param_count: usize,
        kind: BuildKind,
    },
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Plan {
                id,
                optional,
                allow_temporary,
            } => f
                .debug_struct("Plan")
                .field("id", id)
                .field("optional", optional)
                .field("allow_temporary", allow_temporary)
                .finish(),
            Instruction::Transform(_) => f.write_str("Transform(..)"),
            Instruction::Build {
                id,
                scope,
                param_count,
                ..
            } => f
                .debug_struct("Build")
                .field("id", id)
                .field("scope", scope)
                .field("param_count", param_count)
                .finish_non_exhaustive(),
        }
    }
}

/// Compiles a constructive binding into its program.
///
/// Parameter specs are sorted by declared index and must form a contiguous
/// run from zero. Returns `None` for constants and aliases, which resolve
/// without a program.
pub(crate) fn compile(id: &ServiceId, binding: &Binding) -> DiResult<Option<Vec<Instruction>>> {
    let (scope, kind) = match binding {
        Binding::Instance { scope, construct, .. } | Binding::Factory { scope, construct, .. } => {
            (*scope, BuildKind::Sync(construct.clone()))
        }
        Binding::AsyncFactory { scope, construct, .. } => {
            (*scope, BuildKind::Async(construct.clone()))
        }
        Binding::Constant { .. } | Binding::Alias { .. } => return Ok(None),
    };

    let mut params: Vec<&ParamSpec> = binding.params().iter().collect();
    params.sort_by_key(|p| p.index);
    for (position, param) in params.iter().enumerate() {
        if param.index != position {
            return Err(DiError::InvalidParamBinding {
                received: params.iter().map(|p| p.index).collect(),
                invalid_index: position,
            });
        }
    }

    let allow_temporary = scope != Scope::Singleton;

    // Assembled back-to-front so each parameter's transform lands right
    // after its plan once reversed.
    let mut program = Vec::with_capacity(params.len() * 2 + 1);
    program.push(Instruction::Build {
        id: id.clone(),
        scope,
        param_count: params.len(),
        kind,
    });
    for param in params.iter().rev() {
        if let Some(transform) = &param.transform {
            program.push(Instruction::Transform(transform.clone()));
        }
        program.push(Instruction::Plan {
            id: param.id.clone(),
            optional: param.optional,
            allow_temporary,
        });
    }
    program.reverse();
    Ok(Some(program))
}
