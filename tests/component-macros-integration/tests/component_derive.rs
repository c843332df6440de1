//! `#[derive(Component)]` 与容器的集成测试

use component_macros::Component;
use di_composition::ContainerBuilder;
use di_impl::ManifestMetadataSource;
use infrastructure_common::{
    conventions, global_component_manifest, Annotation, Bean, BeanContainer, ContainerAware,
    Injectable, InjectionSlot, MethodMetadata, TypeMetadata,
};
use std::sync::{Arc, Weak};

mod garage {
    use super::*;

    #[derive(Debug, Component)]
    #[component(register)]
    pub struct Engine {
        #[value("engine.power")]
        pub power: u32,
    }

    #[derive(Debug, Component)]
    #[component(register, name = "car")]
    pub struct Car {
        pub engine: Arc<Engine>,
        #[inject("car.model")]
        pub model: String,
        pub spare: Option<Arc<Wheel>>,
        pub color: Option<String>,
    }

    #[derive(Debug)]
    pub struct Wheel;
}

mod dashboard {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Component)]
    #[component(register)]
    pub struct Gauge;

    #[derive(Debug, Component)]
    #[component(register)]
    pub struct Dashboard {
        #[autowired]
        pub gauge: InjectionSlot<Arc<Gauge>>,
        #[value("dashboard.theme")]
        pub theme: InjectionSlot<String>,
        #[default]
        pub refreshes: AtomicUsize,
    }
}

mod speakers {
    use super::*;

    pub trait Speaker: Send + Sync {
        fn speak(&self) -> String;
    }

    #[derive(Debug, Component)]
    #[component(register, stereotype = "Device", implements(Speaker))]
    pub struct Parrot {
        #[value("parrot.word")]
        pub word: String,
    }

    impl Speaker for Parrot {
        fn speak(&self) -> String {
            format!("{}!", self.word)
        }
    }

    #[derive(Component)]
    #[component(register, stereotype = "Device")]
    pub struct Stage {
        pub speaker: Arc<dyn Speaker>,
    }
}

mod settings {
    use super::*;

    #[derive(Debug)]
    pub struct Greeting {
        pub text: String,
    }

    /// 不登记到清单，只能通过导入发现
    #[derive(Debug, Component)]
    #[component(configuration, extend = greeting_factory)]
    pub struct GreetingSettings {
        #[value("greeting.text")]
        pub text: InjectionSlot<String>,
    }

    fn greeting_factory(metadata: TypeMetadata) -> TypeMetadata {
        metadata.with_method(
            MethodMetadata::new("", "greeting")
                .with_annotation(
                    Annotation::new(conventions::BEAN)
                        .with_attribute(conventions::NAME_ATTRIBUTE, "someBean"),
                )
                .returns_type::<Greeting>()
                .with_invoker(|owner, _| {
                    let settings = owner
                        .downcast::<GreetingSettings>()
                        .ok_or("不是 GreetingSettings")?;
                    Ok(Bean::object(Greeting {
                        text: settings.text.get().unwrap_or_default(),
                    }))
                }),
        )
    }

    #[derive(Debug, Component)]
    #[component(register, imports(GreetingSettings))]
    pub struct Greeter;
}

mod aware {
    use super::*;

    #[derive(Component)]
    #[component(register, aware)]
    pub struct Locator {
        #[default]
        pub container: InjectionSlot<Weak<dyn BeanContainer>>,
    }

    impl ContainerAware for Locator {
        fn set_container(&self, container: Weak<dyn BeanContainer>) {
            self.container.set(container);
        }
    }
}

fn namespace(module: &str) -> String {
    format!("{}::{}", module_path!(), module)
}

#[test]
fn test_register_adds_components_to_global_manifest() {
    let manifest = global_component_manifest();
    for name in [
        std::any::type_name::<garage::Engine>(),
        std::any::type_name::<garage::Car>(),
        std::any::type_name::<aware::Locator>(),
    ] {
        assert!(manifest.iter().any(|entry| entry.type_name == name), "{name}");
    }
    assert!(manifest
        .iter()
        .all(|entry| entry.type_name != std::any::type_name::<settings::GreetingSettings>()));
}

#[test]
fn test_derived_metadata_describes_fields() {
    let metadata = garage::Car::type_metadata();
    let params = metadata.get_constructor_params();
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();

    assert_eq!(names, ["engine", "model", "spare", "color"]);
    assert!(metadata.has_annotation(conventions::COMPONENT));
    assert_eq!(
        params[0].declared_type.as_deref(),
        Some(std::any::type_name::<garage::Engine>())
    );
    assert_eq!(params[1].override_id.as_deref(), Some("car.model"));
    assert!(params[2].optional);
    assert!(params[3].optional);

    let dashboard = dashboard::Dashboard::type_metadata();
    assert!(dashboard.get_constructor_params().is_empty());
    assert_eq!(dashboard.get_annotated_properties(conventions::AUTOWIRED).len(), 1);
    assert_eq!(dashboard.get_annotated_properties(conventions::VALUE).len(), 1);
}

#[tokio::test]
async fn test_constructor_injection_through_builder() {
    let container = ContainerBuilder::new()
        .with_namespaces([namespace("garage")])
        .with_bean("engine.power", Bean::value(150))
        .with_bean("car.model", Bean::value("roadster"))
        .build()
        .await
        .expect("build");

    let car = container.get_object::<garage::Car>("car").expect("car");
    let engine = container.resolve::<garage::Engine>().expect("engine");

    assert!(Arc::ptr_eq(&car.engine, &engine));
    assert_eq!(engine.power, 150);
    assert_eq!(car.model, "roadster");
    assert!(car.spare.is_none());
    assert!(car.color.is_none());
}

#[tokio::test]
async fn test_slots_are_filled_after_registration() {
    let container = ContainerBuilder::new()
        .with_namespaces([namespace("dashboard")])
        .with_bean("dashboard.theme", Bean::value("dark"))
        .build()
        .await
        .expect("build");

    let dashboard = container.resolve::<dashboard::Dashboard>().expect("dashboard");
    let gauge = container.resolve::<dashboard::Gauge>().expect("gauge");

    assert!(Arc::ptr_eq(&dashboard.gauge.get().expect("gauge slot"), &gauge));
    assert_eq!(dashboard.theme.get().as_deref(), Some("dark"));
}

#[tokio::test]
async fn test_custom_stereotype_and_interface_injection() {
    let container = ContainerBuilder::new()
        .with_namespaces([namespace("speakers")])
        .with_stereotypes(["Device"])
        .with_bean("parrot.word", Bean::value("hello"))
        .build()
        .await
        .expect("build");

    let stage = container.resolve::<speakers::Stage>().expect("stage");
    assert_eq!(stage.speaker.speak(), "hello!");

    let speaker = container
        .resolve_interface::<dyn speakers::Speaker>()
        .expect("speaker");
    assert_eq!(speaker.speak(), "hello!");
}

#[tokio::test]
async fn test_imported_configuration_registers_factory_bean() {
    let source = ManifestMetadataSource::new([settings::GreetingSettings::metadata()]);
    let container = ContainerBuilder::new()
        .with_namespaces([namespace("settings")])
        .with_metadata_source(Arc::new(source))
        .with_bean("greeting.text", Bean::value("good morning"))
        .build()
        .await
        .expect("build");

    let greeting = container
        .get_object::<settings::Greeting>("someBean")
        .expect("someBean");
    assert_eq!(greeting.text, "good morning");

    let configuration = container
        .get_metadata(std::any::type_name::<settings::GreetingSettings>())
        .expect("configuration metadata");
    assert!(configuration.has_annotation(conventions::CONFIGURATION));
}

#[tokio::test]
async fn test_aware_component_receives_container() {
    let container = ContainerBuilder::new()
        .with_namespaces([namespace("aware")])
        .build()
        .await
        .expect("build");

    let locator = container.resolve::<aware::Locator>().expect("locator");
    let handle = locator
        .container
        .get()
        .and_then(|weak| weak.upgrade())
        .expect("container handle");
    assert!(handle.has(std::any::type_name::<aware::Locator>()));
}
