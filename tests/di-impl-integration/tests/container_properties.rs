//! 容器解析行为的集中测试

use di_composition::ContainerBuilder;
use di_impl::Container;
use infrastructure_common::{
    conventions, AdHocFactory, Annotation, Bean, MethodMetadata, ParamMetadata, TypeMetadata,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// 按 `RUST_LOG` 输出容器日志
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug)]
struct Shared {
    label: String,
}

#[derive(Debug)]
struct Left {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Right {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Top {
    left: Arc<Left>,
    right: Arc<Right>,
}

fn id_of<T: ?Sized + 'static>() -> &'static str {
    std::any::type_name::<T>()
}

fn shared_metadata(counter: Arc<AtomicUsize>) -> TypeMetadata {
    TypeMetadata::class::<Shared>().with_constructor(Vec::new(), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Bean::object(Shared {
            label: "shared".to_string(),
        }))
    })
}

fn diamond(counter: Arc<AtomicUsize>) -> Arc<Container> {
    init_tracing();
    let container = Container::new();
    container.set_type(id_of::<Shared>(), shared_metadata(counter));
    container.set_type(
        id_of::<Left>(),
        TypeMetadata::class::<Left>().with_constructor(
            vec![ParamMetadata::typed::<Shared>("shared")],
            |args| {
                Ok(Bean::object(Left {
                    shared: args.object(0)?,
                }))
            },
        ),
    );
    container.set_type(
        id_of::<Right>(),
        TypeMetadata::class::<Right>().with_constructor(
            vec![ParamMetadata::typed::<Shared>("shared")],
            |args| {
                Ok(Bean::object(Right {
                    shared: args.object(0)?,
                }))
            },
        ),
    );
    container.set_type(
        id_of::<Top>(),
        TypeMetadata::class::<Top>().with_constructor(
            vec![
                ParamMetadata::typed::<Left>("left"),
                ParamMetadata::typed::<Right>("right"),
            ],
            |args| {
                Ok(Bean::object(Top {
                    left: args.object(0)?,
                    right: args.object(1)?,
                }))
            },
        ),
    );
    container
}

#[test]
fn test_set_makes_identifier_resolvable() {
    let container = Container::new();
    assert!(!container.has("answer"));

    container.set_value("answer", 42);
    container.set_factory("lazy", AdHocFactory::new(|_| Ok(Bean::value("later"))));

    assert!(container.has("answer"));
    assert!(container.has("lazy"));
    assert_eq!(
        container.get("answer").expect("answer").to_value::<i64>(),
        Some(42)
    );
}

#[test]
fn test_repeated_get_returns_one_instance_and_runs_factory_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container.set_type(id_of::<Shared>(), shared_metadata(calls.clone()));

    let first = container.resolve::<Shared>().expect("first");
    let second = container.resolve::<Shared>().expect("second");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_diamond_shares_single_dependency() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = diamond(calls.clone());

    let top = container.resolve::<Top>().expect("top");
    let shared = container.resolve::<Shared>().expect("shared");

    assert!(Arc::ptr_eq(&top.left.shared, &top.right.shared));
    assert!(Arc::ptr_eq(&top.left.shared, &shared));
    assert_eq!(shared.label, "shared");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_override_beats_type_beats_name() {
    let container = Container::new();
    container.set_instance(
        id_of::<Shared>(),
        Bean::object(Shared {
            label: "by type".to_string(),
        }),
    );
    container.set_instance(
        "shared",
        Bean::object(Shared {
            label: "by name".to_string(),
        }),
    );
    container.set_instance(
        "special",
        Bean::object(Shared {
            label: "by override".to_string(),
        }),
    );

    let left = |param: ParamMetadata| {
        TypeMetadata::class::<Left>().with_constructor(vec![param], |args| {
            Ok(Bean::object(Left {
                shared: args.object(0)?,
            }))
        })
    };
    container.set_type(
        "overridden",
        left(ParamMetadata::typed::<Shared>("shared").with_override("special")),
    );
    container.set_type("typed", left(ParamMetadata::typed::<Shared>("shared")));
    container.set_type("named", left(ParamMetadata::new("shared")));

    let label = |id: &str| {
        container
            .get_object::<Left>(id)
            .map(|left| left.shared.label.clone())
            .expect(id)
    };
    assert_eq!(label("overridden"), "by override");
    assert_eq!(label("typed"), "by type");
    assert_eq!(label("named"), "by name");
}

#[test]
fn test_two_cycle_reports_circular_reference() {
    init_tracing();
    let container = Container::new();
    container.set_type(
        "x",
        TypeMetadata::new("app::X", infrastructure_common::TypeKind::Class)
            .with_constructor(vec![ParamMetadata::new("y")], |args| Ok(args.bean(0)?)),
    );
    container.set_type(
        "y",
        TypeMetadata::new("app::Y", infrastructure_common::TypeKind::Class)
            .with_constructor(vec![ParamMetadata::new("x")], |args| Ok(args.bean(0)?)),
    );

    let error = container.get("x").unwrap_err();
    assert!(error.is_circular(), "{error}");

    // 失败后状态复位，再次获取仍然报告循环引用
    assert!(container.get("x").unwrap_err().is_circular());
}

#[test]
fn test_ad_hoc_factory_receives_dependency() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container.set_type(id_of::<Shared>(), shared_metadata(calls));
    container.set_factory(
        "f",
        AdHocFactory::new(|args| {
            Ok(Bean::object(Right {
                shared: args.object(0)?,
            }))
        })
        .with_param(ParamMetadata::typed::<Shared>("c")),
    );

    let built = container.get_object::<Right>("f").expect("f");
    let shared = container.resolve::<Shared>().expect("shared");
    assert!(Arc::ptr_eq(&built.shared, &shared));
}

#[derive(Debug)]
struct FooComponent;

#[derive(Debug)]
struct BarComponent {
    foo: Arc<FooComponent>,
}

#[derive(Debug)]
struct Endpoint {
    url: String,
}

#[derive(Debug)]
struct EndpointConfiguration;

fn foo_component() -> TypeMetadata {
    TypeMetadata::class::<FooComponent>()
        .annotated(conventions::COMPONENT)
        .with_constructor(Vec::new(), |_| Ok(Bean::object(FooComponent)))
}

fn bar_component() -> TypeMetadata {
    TypeMetadata::class::<BarComponent>()
        .annotated(conventions::COMPONENT)
        .with_constructor(vec![ParamMetadata::typed::<FooComponent>("foo")], |args| {
            Ok(Bean::object(BarComponent {
                foo: args.object(0)?,
            }))
        })
}

fn endpoint_configuration() -> TypeMetadata {
    TypeMetadata::class::<EndpointConfiguration>()
        .annotated(conventions::CONFIGURATION)
        .with_constructor(Vec::new(), |_| Ok(Bean::object(EndpointConfiguration)))
        .with_method(
            MethodMetadata::new("", "endpoint")
                .with_annotation(
                    Annotation::new(conventions::BEAN)
                        .with_attribute(conventions::NAME_ATTRIBUTE, "someBean"),
                )
                .with_param(ParamMetadata::new("endpoint.url"))
                .returns_type::<Endpoint>()
                .with_invoker(|_, args| {
                    Ok(Bean::object(Endpoint {
                        url: args.value(0)?,
                    }))
                }),
        )
}

#[tokio::test]
async fn test_components_are_wired_by_type() -> anyhow::Result<()> {
    init_tracing();
    let container = ContainerBuilder::new()
        .with_components([Arc::new(foo_component()), Arc::new(bar_component())])
        .build()
        .await?;

    let bar = container.resolve::<BarComponent>()?;
    let foo = container.resolve::<FooComponent>()?;
    assert!(Arc::ptr_eq(&bar.foo, &foo));
    Ok(())
}

#[tokio::test]
async fn test_configuration_factory_is_reachable_by_bean_name() -> anyhow::Result<()> {
    let container = ContainerBuilder::new()
        .with_component(endpoint_configuration())
        .with_bean("endpoint.url", Bean::value("http://localhost:8080"))
        .build()
        .await?;

    let endpoint = container.get_object::<Endpoint>("someBean")?;
    assert_eq!(endpoint.url, "http://localhost:8080");
    assert!(!container.has("endpoint"));
    Ok(())
}
