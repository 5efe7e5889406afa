//! Service identifier types for the dependency injection container.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// An opaque identity token usable as a [`ServiceId`].
///
/// Every call to [`Symbol::new`] mints a distinct token, even when the
/// description matches an existing one. Use [`Symbol::named`] for tokens that
/// should be shared by description across the whole process.
///
/// # Examples
///
/// ```rust
/// use lattice_di::Symbol;
///
/// let a = Symbol::new("request.id");
/// let b = Symbol::new("request.id");
/// assert_ne!(a, b); // identity semantics
///
/// let c = Symbol::named("request.id");
/// let d = Symbol::named("request.id");
/// assert_eq!(c, d); // interned by description
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Symbol {
    id: u64,
    description: &'static str,
}

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

static INTERNED_SYMBOLS: Lazy<Mutex<HashMap<&'static str, Symbol>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl Symbol {
    /// Mints a fresh, globally unique symbol.
    pub fn new(description: &'static str) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    /// Returns the process-wide symbol interned under `description`,
    /// creating it on first use.
    pub fn named(description: &'static str) -> Self {
        *INTERNED_SYMBOLS
            .lock()
            .entry(description)
            .or_insert_with(|| Symbol::new(description))
    }

    /// The human-readable description this symbol was created with.
    pub fn description(&self) -> &'static str {
        self.description
    }
}

// Equality and hashing ignore the description: two symbols are equal only
// when they are the same minted token.
impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// Key for binding storage and lookup.
///
/// A service identifier is either a Rust type, a string name, or an opaque
/// [`Symbol`]. Types are compared by `TypeId` identity, names by value, and
/// symbols by token identity.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{service_id_of, ServiceId, Symbol};
///
/// struct Database;
///
/// let by_type = service_id_of::<Database>();
/// let by_name = ServiceId::from("database_url");
/// let by_symbol = ServiceId::from(Symbol::named("request.id"));
///
/// assert_ne!(by_type, by_name);
/// assert_ne!(by_name, by_symbol);
/// ```
#[derive(Debug, Clone)]
pub enum ServiceId {
    /// A concrete Rust type. The name rides along for diagnostics only.
    Type(TypeId, &'static str),
    /// A string identifier, compared by value.
    Name(Cow<'static, str>),
    /// An opaque token, compared by identity.
    Symbol(Symbol),
}

impl ServiceId {
    /// Human-readable form for diagnostics and error messages.
    pub fn display_name(&self) -> &str {
        match self {
            ServiceId::Type(_, name) => name,
            ServiceId::Name(name) => name,
            ServiceId::Symbol(sym) => sym.description(),
        }
    }
}

impl PartialEq for ServiceId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Hot path: TypeId comparison only, the name is diagnostic.
            (ServiceId::Type(a, _), ServiceId::Type(b, _)) => a == b,
            (ServiceId::Name(a), ServiceId::Name(b)) => a == b,
            (ServiceId::Symbol(a), ServiceId::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ServiceId {}

impl std::hash::Hash for ServiceId {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ServiceId::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            ServiceId::Name(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            ServiceId::Symbol(sym) => {
                2u8.hash(state);
                sym.hash(state);
            }
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceId::Type(_, name) => write!(f, "{}", name),
            ServiceId::Name(name) => write!(f, "\"{}\"", name),
            ServiceId::Symbol(sym) => write!(f, "{}", sym),
        }
    }
}

impl From<&'static str> for ServiceId {
    fn from(name: &'static str) -> Self {
        ServiceId::Name(Cow::Borrowed(name))
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        ServiceId::Name(Cow::Owned(name))
    }
}

impl From<Symbol> for ServiceId {
    fn from(sym: Symbol) -> Self {
        ServiceId::Symbol(sym)
    }
}

impl From<&ServiceId> for ServiceId {
    fn from(id: &ServiceId) -> Self {
        id.clone()
    }
}

/// Helper for the common case of keying a binding by its Rust type.
#[inline]
pub fn service_id_of<T: 'static>() -> ServiceId {
    ServiceId::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}
