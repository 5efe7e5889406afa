//! Error types for the dependency injection container.

use thiserror::Error;

use crate::key::ServiceId;

/// Dependency injection errors.
///
/// Consumers are expected to match on the variant, never on the rendered
/// message. Configuration mistakes (`DuplicatedBinding`, `InvalidParamBinding`,
/// `CircularAlias`, `UnsupportedScope`, `MissingParamMetadata`,
/// `ArityMismatch`) surface at registration or compile time and should be
/// treated as fatal to startup. Resolution-time errors (`BindingNotFound`,
/// `CircularDependency`, `AsyncUnsupported`, `TypeMismatch`) propagate to the
/// caller of the resolving operation; the engine never retries or recovers.
/// `Internal` signals corrupted resolver state, not a user-correctable
/// condition.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{BindingRegistry, DiError};
///
/// let mut registry = BindingRegistry::new();
/// registry.add_constant("port", 8080u16).unwrap();
/// let err = registry.add_constant("port", 9090u16).unwrap_err();
/// assert!(matches!(err, DiError::DuplicatedBinding { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiError {
    /// No binding is registered under the requested id.
    #[error("no binding found for {id}")]
    BindingNotFound {
        /// The id that could not be resolved.
        id: ServiceId,
    },

    /// The id is already being planned on the current resolution path.
    #[error("circular dependency while resolving {id}")]
    CircularDependency {
        /// The id that closed the cycle.
        id: ServiceId,
    },

    /// An alias chain revisited an id.
    #[error("circular alias chain at {id}")]
    CircularAlias {
        /// The id that closed the alias cycle.
        id: ServiceId,
    },

    /// A second binding was registered under an already-bound id.
    #[error("duplicated binding for {id}")]
    DuplicatedBinding {
        /// The id that was bound twice.
        id: ServiceId,
    },

    /// Recorded parameter indices do not form a contiguous `0..N` range.
    #[error("invalid parameter metadata: no parameter at index {invalid_index} (received indices {received:?})")]
    InvalidParamBinding {
        /// All indices that were recorded, sorted ascending.
        received: Vec<usize>,
        /// The first index expected but not found.
        invalid_index: usize,
    },

    /// A graph containing an async factory was resolved synchronously.
    #[error("binding {id} requires asynchronous resolution")]
    AsyncUnsupported {
        /// The async-only id that was reached.
        id: ServiceId,
    },

    /// A resolved value could not be downcast to the requested type.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch {
        /// The Rust type the caller asked for.
        expected: &'static str,
    },

    /// An async factory was declared with a scope it does not support.
    #[error("async factory for {id} cannot be singleton scoped")]
    UnsupportedScope {
        /// The offending binding's id.
        id: ServiceId,
    },

    /// A method parameter carries no injection metadata.
    ///
    /// This is a static wiring mistake in the method declaration, distinct
    /// from a missing runtime binding.
    #[error("parameter {index} of {target} has no injection metadata")]
    MissingParamMetadata {
        /// The method whose wiring is incomplete.
        target: &'static str,
        /// The undeclared parameter index.
        index: usize,
    },

    /// A method declared more or fewer parameter specs than its arity.
    #[error("{target} declares arity {arity} but {received} parameter specs were recorded")]
    ArityMismatch {
        /// The method whose wiring is inconsistent.
        target: &'static str,
        /// The declared parameter count.
        arity: usize,
        /// The number of specs recorded.
        received: usize,
    },

    /// An interceptor resumed its continuation more than once.
    #[error("interceptor continuation already consumed")]
    ContinuationConsumed,

    /// Resolver state is corrupted; indicates a defect, not a usage error.
    #[error("internal resolver state corrupted: {0}")]
    Internal(&'static str),
}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
