//! Value caching lifetimes.

/// Caching lifetime of a resolved value.
///
/// Controls where (and whether) the resolution engine caches the value a
/// binding produces.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{BindingRegistry, Scope, service_id_of};
/// use std::sync::Arc;
///
/// struct Config { port: u16 }
/// struct Handler;
///
/// let mut registry = BindingRegistry::new();
///
/// // Singleton: one instance for the container's whole lifetime.
/// registry.add_factory(
///     service_id_of::<Config>(),
///     Scope::Singleton,
///     vec![],
///     |_| Ok(Config { port: 8080 }),
/// ).unwrap();
///
/// // Transient: a fresh instance at every point of use.
/// registry.add_factory(
///     service_id_of::<Handler>(),
///     Scope::Transient,
///     vec![],
///     |_| Ok(Handler),
/// ).unwrap();
///
/// let container = registry.build();
/// let a = container.session().resolve_type::<Config>().unwrap();
/// let b = container.session().resolve_type::<Config>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Single instance per container, cached forever.
    ///
    /// Constructed lazily on first resolution and shared by every session
    /// afterward. The engine treats a second construction attempt for an
    /// already-cached singleton as corrupted resolver state.
    Singleton,
    /// Single instance per resolve session.
    ///
    /// Every part of one session's dependency graph sees the same instance;
    /// a new session starts with an empty cache. The natural fit for
    /// per-request or per-message values.
    Request,
    /// New instance per appearance in a graph, never cached.
    Transient,
}
