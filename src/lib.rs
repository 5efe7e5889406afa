//! # lattice-di
//!
//! Declarative dependency injection with compiled, stack-based resolution
//! programs.
//!
//! Bindings are declared up front in a [`BindingRegistry`], compiled once
//! into flat instruction programs, and sealed into an immutable
//! [`Container`]. Resolution runs a small stack machine per request inside a
//! [`ResolveSession`]: no recursion, explicit scope caches, and cycle
//! detection on the live path.
//!
//! ## Features
//!
//! - **Five binding kinds** - constants, typed instances, factories, async
//!   factories, and aliases, all keyed by a [`ServiceId`] (type, string, or
//!   [`Symbol`])
//! - **Three scopes** - [`Scope::Singleton`] (container-wide),
//!   [`Scope::Request`] (per session), [`Scope::Transient`] (never cached)
//! - **Eager failure** - duplicate ids, parameter-index gaps, unbound
//!   dependencies, and cycles are caught at registration or
//!   [`BindingRegistry::validate`] time
//! - **Injection metadata** - optional parameters, per-parameter value
//!   transforms, typed [`Injectable`] construction recipes
//! - **Async interceptors** - one-shot [`Next`] continuations around method
//!   invocation, with a [`Provide`] handle for session-temporary bindings
//!
//! ## Quick start
//!
//! ```rust
//! use lattice_di::{BindingRegistry, ParamSpec, Scope};
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//! struct Repo { config: Arc<Config> }
//!
//! let mut registry = BindingRegistry::new();
//! registry
//!     .add_factory("config", Scope::Singleton, vec![], |_| {
//!         Ok(Config { url: "postgres://localhost".into() })
//!     })
//!     .unwrap();
//! registry
//!     .add_factory(
//!         "repo",
//!         Scope::Request,
//!         vec![ParamSpec::new(0, "config")],
//!         |args| Ok(Repo { config: args.get::<Config>(0)? }),
//!     )
//!     .unwrap();
//!
//! let container = registry.build();
//! let session = container.session();
//!
//! let repo = session.resolve::<Repo, _>("repo").unwrap();
//! assert_eq!(repo.config.url, "postgres://localhost");
//!
//! // Request scope: same session, same instance.
//! let again = session.resolve::<Repo, _>("repo").unwrap();
//! assert!(Arc::ptr_eq(&repo, &again));
//! ```
//!
//! ## Thread safety
//!
//! [`Container`] is `Send + Sync` and cheap to clone; all clones share one
//! singleton cache. A [`ResolveSession`] is owned by one logical caller and
//! carries the request cache and temporary bindings. Async resolution returns
//! plain `Send` futures and does not depend on any particular runtime.

mod binding;
mod container;
mod error;
mod instruction;
mod interceptor;
mod invoke;
mod key;
mod metadata;
mod module;
mod registry;
mod scope;
mod session;

pub use container::Container;
pub use error::{DiError, DiResult};
pub use interceptor::{Interceptor, Next, Provide};
pub use invoke::MethodHandler;
pub use key::{service_id_of, ServiceId, Symbol};
pub use metadata::{AnyArc, Args, InjectMetadata, InjectMetadataBuilder, Injectable, ParamSpec};
pub use module::{BindingModule, BindingRegistryExt};
pub use registry::BindingRegistry;
pub use scope::Scope;
pub use session::ResolveSession;
