//! 依赖注入实现的集成测试

use di_abstractions::{ComponentScanner, ContainerConfig};
use di_impl::{
    Container, EventDispatcher, ManifestComponentScanner, ManifestMetadataSource, MemoryBeanCache,
};
use infrastructure_common::{
    conventions, Bean, ContainerError, Injectable, ParamMetadata, TypeMetadata,
};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug)]
struct Clock {
    zone: String,
}

impl Injectable for Clock {
    fn type_metadata() -> TypeMetadata {
        TypeMetadata::class::<Clock>()
            .annotated(conventions::COMPONENT)
            .with_constructor(vec![ParamMetadata::new("clock.zone")], |args| {
                Ok(Bean::object(Clock {
                    zone: args.value(0)?,
                }))
            })
    }
}

#[derive(Debug)]
struct Scheduler {
    clock: Arc<Clock>,
    backup: Option<Arc<Clock>>,
}

impl Injectable for Scheduler {
    fn type_metadata() -> TypeMetadata {
        TypeMetadata::class::<Scheduler>()
            .annotated(conventions::COMPONENT)
            .with_constructor(
                vec![
                    ParamMetadata::typed::<Clock>("clock"),
                    ParamMetadata::new("backupClock").optional(),
                ],
                |args| {
                    Ok(Bean::object(Scheduler {
                        clock: args.object::<Clock>(0)?,
                        backup: args.optional_object::<Clock>(1)?,
                    }))
                },
            )
    }
}

async fn register_scanned(container: &Container, scanner: &ManifestComponentScanner) {
    let found = scanner
        .scan_for_marker(conventions::COMPONENT, &[])
        .await
        .expect("scan");
    for metadata in found {
        container.set_type(metadata.name.clone(), metadata);
    }
}

#[tokio::test]
async fn test_scanned_components_are_wired() {
    let scanner = ManifestComponentScanner::from_metadata(vec![Clock::metadata(), Scheduler::metadata()]);
    let container = Container::new();
    container.set_value("clock.zone", "UTC");
    register_scanned(&container, &scanner).await;

    let scheduler = container.resolve::<Scheduler>().expect("scheduler");
    assert_eq!(scheduler.clock.zone, "UTC");
    assert!(scheduler.backup.is_none());
    assert!(Arc::ptr_eq(&scheduler.clock, &container.resolve::<Clock>().expect("clock")));
}

#[tokio::test]
async fn test_missing_scalar_reports_outer_component() {
    let scanner = ManifestComponentScanner::from_metadata(vec![Clock::metadata()]);
    let container = Container::new();
    register_scanned(&container, &scanner).await;

    let error = container.resolve::<Clock>().unwrap_err();
    assert!(matches!(error, ContainerError::Construction { .. }));
    assert!(error.root_cause().is_not_found());
}

#[tokio::test]
async fn test_override_wins_over_declared_type() {
    let container = Container::new();
    container.set_value("clock.zone", "UTC");
    container.set_type(std::any::type_name::<Clock>(), Clock::metadata());
    container.set_factory(
        "localClock",
        infrastructure_common::AdHocFactory::new(|_| {
            Ok(Bean::object(Clock {
                zone: "Asia/Shanghai".to_string(),
            }))
        }),
    );
    container.set_type(
        "scheduler",
        TypeMetadata::class::<Scheduler>().with_constructor(
            vec![ParamMetadata::typed::<Clock>("clock").with_override("localClock")],
            |args| {
                Ok(Bean::object(Scheduler {
                    clock: args.object::<Clock>(0)?,
                    backup: None,
                }))
            },
        ),
    );

    let scheduler = container.get_object::<Scheduler>("scheduler").expect("scheduler");
    assert_eq!(scheduler.clock.zone, "Asia/Shanghai");
}

#[tokio::test]
async fn test_debug_cache_follows_fingerprint_ledger() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = dir.path().join("fingerprints.json");
    let cache = Arc::new(MemoryBeanCache::new());

    let source = Arc::new(
        ManifestMetadataSource::new(vec![Clock::metadata()])
            .with_ledger(&ledger)
            .expect("ledger"),
    );
    source.record_all();
    source.save().expect("save");

    let first = Container::create(
        ContainerConfig::default().with_debug(true),
        Arc::new(EventDispatcher::new()),
        cache.clone(),
        source.clone(),
    );
    first.set_value("clock.zone", "UTC");
    first.set_type(std::any::type_name::<Clock>(), Clock::metadata());
    let clock = first.resolve::<Clock>().expect("clock");

    let second = Container::create(
        ContainerConfig::default().with_debug(true),
        Arc::new(EventDispatcher::new()),
        cache,
        source,
    );
    second.set_type(std::any::type_name::<Clock>(), Clock::metadata());
    assert!(second.is_fresh(std::any::type_name::<Clock>()));

    // 缓存命中时不再需要 clock.zone
    let cached = second.resolve::<Clock>().expect("cached clock");
    assert!(Arc::ptr_eq(&clock, &cached));
}

#[tokio::test]
async fn test_parallel_tasks_share_one_instance() {
    let container = Container::new();
    container.set_value("clock.zone", "UTC");
    container.set_type(std::any::type_name::<Clock>(), Clock::metadata());
    container.set_type(std::any::type_name::<Scheduler>(), Scheduler::metadata());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let container = container.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            container.resolve::<Scheduler>().expect("scheduler")
        }));
    }

    let mut schedulers = Vec::new();
    for handle in handles {
        schedulers.push(handle.await.expect("join"));
    }
    assert!(schedulers
        .windows(2)
        .all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}
