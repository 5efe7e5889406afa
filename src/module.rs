//! Grouping related bindings into reusable modules.

use crate::error::DiResult;
use crate::registry::BindingRegistry;

/// A cohesive group of bindings registered as one unit.
///
/// Modules keep feature areas self-contained: each module owns the bindings
/// for its slice of the application and the composition root just lists the
/// modules it wants.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{BindingModule, BindingRegistry, BindingRegistryExt, DiResult, Scope};
///
/// struct ConfigModule;
///
/// impl BindingModule for ConfigModule {
///     fn register(&self, registry: &mut BindingRegistry) -> DiResult<()> {
///         registry.add_constant("app_name", "lattice".to_string())?;
///         registry.add_factory("banner", Scope::Singleton, vec![lattice_di::ParamSpec::new(0, "app_name")], |args| {
///             Ok(format!("== {} ==", args.get::<String>(0)?))
///         })
///     }
///
///     fn name(&self) -> &str {
///         "config"
///     }
/// }
///
/// let mut registry = BindingRegistry::new();
/// registry.add_module(ConfigModule).unwrap();
/// let banner = registry.build().session().resolve::<String, _>("banner").unwrap();
/// assert_eq!(*banner, "== lattice ==");
/// ```
pub trait BindingModule {
    /// Registers this module's bindings.
    fn register(&self, registry: &mut BindingRegistry) -> DiResult<()>;

    /// Module name used in registration logs.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Extension methods for applying modules to a registry.
pub trait BindingRegistryExt {
    /// Applies one module.
    fn add_module<M: BindingModule>(&mut self, module: M) -> DiResult<()>;

    /// Applies several modules in order, stopping at the first failure.
    fn add_modules<M: BindingModule>(&mut self, modules: Vec<M>) -> DiResult<()>;
}

impl BindingRegistryExt for BindingRegistry {
    fn add_module<M: BindingModule>(&mut self, module: M) -> DiResult<()> {
        tracing::debug!(module = module.name(), "registering module");
        module.register(self)
    }

    fn add_modules<M: BindingModule>(&mut self, modules: Vec<M>) -> DiResult<()> {
        for module in modules {
            self.add_module(module)?;
        }
        Ok(())
    }
}
