use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lattice_di::{
    service_id_of, BindingModule, BindingRegistry, BindingRegistryExt, DiError, DiResult,
    InjectMetadata, Injectable, ParamSpec, Scope, ServiceId, Symbol,
};

struct Database {
    url: String,
}

#[test]
fn resolves_a_constant() {
    let mut registry = BindingRegistry::new();
    registry.add_constant("port", 8080u16).unwrap();
    let container = registry.build();

    let port = container.session().resolve::<u16, _>("port").unwrap();
    assert_eq!(*port, 8080);
}

#[test]
fn constants_share_one_value_across_sessions() {
    let mut registry = BindingRegistry::new();
    registry
        .add_constant(
            service_id_of::<Database>(),
            Database {
                url: "postgres://localhost".into(),
            },
        )
        .unwrap();
    let container = registry.build();

    let a = container.session().resolve_type::<Database>().unwrap();
    let b = container.session().resolve_type::<Database>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.url, "postgres://localhost");
}

#[test]
fn factory_receives_resolved_arguments_in_declared_order() {
    let mut registry = BindingRegistry::new();
    registry.add_constant("host", String::from("localhost")).unwrap();
    registry.add_constant("port", 5432u16).unwrap();
    registry
        .add_factory(
            "url",
            Scope::Transient,
            vec![ParamSpec::new(0, "host"), ParamSpec::new(1, "port")],
            |args| {
                Ok(format!(
                    "postgres://{}:{}",
                    args.get::<String>(0)?,
                    args.get::<u16>(1)?
                ))
            },
        )
        .unwrap();

    let url = registry.build().session().resolve::<String, _>("url").unwrap();
    assert_eq!(*url, "postgres://localhost:5432");
}

#[test]
fn missing_binding_is_reported_with_its_id() {
    let registry = BindingRegistry::new();
    let err = registry.build().session().resolve::<u16, _>("port").unwrap_err();
    assert_eq!(
        err,
        DiError::BindingNotFound {
            id: ServiceId::from("port")
        }
    );
}

#[test]
fn duplicate_binding_is_rejected() {
    let mut registry = BindingRegistry::new();
    registry.add_constant("port", 8080u16).unwrap();
    let err = registry.add_constant("port", 9090u16).unwrap_err();
    assert_eq!(
        err,
        DiError::DuplicatedBinding {
            id: ServiceId::from("port")
        }
    );
}

#[test]
fn alias_resolves_to_the_target_value() {
    let mut registry = BindingRegistry::new();
    registry
        .add_factory("canonical", Scope::Singleton, vec![], |_| {
            Ok(String::from("one"))
        })
        .unwrap();
    registry.add_alias("nickname", "canonical").unwrap();
    let container = registry.build();

    let direct = container.session().resolve::<String, _>("canonical").unwrap();
    let aliased = container.session().resolve::<String, _>("nickname").unwrap();
    assert!(Arc::ptr_eq(&direct, &aliased));
}

#[test]
fn optional_parameter_without_binding_resolves_to_none() {
    let mut registry = BindingRegistry::new();
    registry
        .add_factory(
            "greeting",
            Scope::Transient,
            vec![ParamSpec::new(0, "name").optional()],
            |args| {
                Ok(match args.get_optional::<String>(0)? {
                    Some(name) => format!("hello, {name}"),
                    None => String::from("hello"),
                })
            },
        )
        .unwrap();

    let greeting = registry
        .build()
        .session()
        .resolve::<String, _>("greeting")
        .unwrap();
    assert_eq!(*greeting, "hello");
}

#[test]
fn transform_shapes_the_value_and_runs_once_per_resolution() {
    let applied = Arc::new(AtomicUsize::new(0));
    let seen = applied.clone();

    let mut registry = BindingRegistry::new();
    registry.add_constant("port", 5432u16).unwrap();
    registry
        .add_factory(
            "display_port",
            Scope::Transient,
            vec![ParamSpec::new(0, "port").transform(move |port: &u16| {
                seen.fetch_add(1, Ordering::SeqCst);
                port.to_string()
            })],
            |args| Ok(args.get::<String>(0)?.to_string()),
        )
        .unwrap();
    let container = registry.build();
    let session = container.session();

    let first = session.resolve::<String, _>("display_port").unwrap();
    assert_eq!(*first, "5432");
    assert_eq!(applied.load(Ordering::SeqCst), 1);

    session.resolve::<String, _>("display_port").unwrap();
    assert_eq!(applied.load(Ordering::SeqCst), 2);
}

#[test]
fn transform_is_skipped_for_a_missing_optional() {
    let mut registry = BindingRegistry::new();
    registry
        .add_factory(
            "label",
            Scope::Transient,
            vec![ParamSpec::new(0, "count")
                .optional()
                .transform(|count: &u32| count.to_string())],
            |args| {
                Ok(args
                    .get_optional::<String>(0)?
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| String::from("none")))
            },
        )
        .unwrap();

    let label = registry.build().session().resolve::<String, _>("label").unwrap();
    assert_eq!(*label, "none");
}

#[test]
fn parameter_index_gap_fails_at_registration() {
    let mut registry = BindingRegistry::new();
    let err = registry
        .add_factory(
            "svc",
            Scope::Transient,
            vec![ParamSpec::new(0, "a"), ParamSpec::new(2, "c")],
            |_| Ok(0u8),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DiError::InvalidParamBinding {
            received: vec![0, 2],
            invalid_index: 1,
        }
    );
}

#[test]
fn type_mismatch_is_reported_on_downcast() {
    let mut registry = BindingRegistry::new();
    registry.add_constant("port", 8080u16).unwrap();
    let err = registry
        .build()
        .session()
        .resolve::<String, _>("port")
        .unwrap_err();
    assert!(matches!(err, DiError::TypeMismatch { .. }));
}

#[test]
fn symbols_key_independent_bindings() {
    let token_a = Symbol::new("token");
    let token_b = Symbol::new("token");

    let mut registry = BindingRegistry::new();
    registry.add_constant(token_a, 1u32).unwrap();
    registry.add_constant(token_b, 2u32).unwrap();
    let session = registry.build().session();

    assert_eq!(*session.resolve::<u32, _>(token_a).unwrap(), 1);
    assert_eq!(*session.resolve::<u32, _>(token_b).unwrap(), 2);
}

struct Repo {
    answer: Arc<i32>,
}

impl Injectable for Repo {
    fn metadata() -> InjectMetadata<Self> {
        InjectMetadata::builder(Scope::Singleton)
            .param("answer")
            .construct(|args| {
                Ok(Repo {
                    answer: args.get::<i32>(0)?,
                })
            })
    }
}

#[test]
fn constant_and_instance_bindings_compose() {
    let mut registry = BindingRegistry::new();
    registry.add_constant("answer", 1i32).unwrap();
    registry.add::<Repo>().unwrap();
    let container = registry.build();

    let first = container.session().resolve_type::<Repo>().unwrap();
    let second = container.session().resolve_type::<Repo>().unwrap();
    assert_eq!(*first.answer, 1);
    assert!(Arc::ptr_eq(&first, &second));
}

struct StorageModule;

impl BindingModule for StorageModule {
    fn register(&self, registry: &mut BindingRegistry) -> DiResult<()> {
        registry.add_constant("dsn", String::from("postgres://localhost"))?;
        registry.add_factory(
            "pool_size",
            Scope::Singleton,
            vec![ParamSpec::new(0, "dsn")],
            |args| Ok(args.get::<String>(0)?.len()),
        )
    }

    fn name(&self) -> &str {
        "storage"
    }
}

#[test]
fn modules_register_their_bindings_as_a_unit() {
    let mut registry = BindingRegistry::new();
    registry.add_module(StorageModule).unwrap();
    assert_eq!(registry.len(), 2);

    let size = registry.build().session().resolve::<usize, _>("pool_size").unwrap();
    assert_eq!(*size, "postgres://localhost".len());
}
