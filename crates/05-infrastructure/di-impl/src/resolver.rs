//! 依赖解析器

use di_abstractions::DependencySource;
use infrastructure_common::{Arguments, ContainerError, ContainerResult, ParamMetadata};
use tracing::debug;

/// 依赖解析器
///
/// 按参数列表依次确定依赖标识并向依赖来源获取实例。
/// 每个参数的匹配顺序：显式标识、声明类型、参数名称，均未命中时可选参数被跳过。
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyResolver;

impl DependencyResolver {
    /// 创建解析器
    pub fn new() -> Self {
        Self
    }

    /// 确定参数对应的依赖标识，未命中返回 `None`
    pub fn resolve_id<S>(&self, source: &S, param: &ParamMetadata) -> Option<String>
    where
        S: DependencySource + ?Sized,
    {
        let candidates = [
            param.override_id.as_deref(),
            param.declared_type.as_deref(),
            Some(param.name.as_str()),
        ];

        candidates
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty() && source.contains(id))
            .map(str::to_string)
    }

    /// 解析整个参数列表
    ///
    /// `depender` 为正在创建的 Bean 标识，用于循环依赖报错
    pub fn resolve<S>(
        &self,
        source: &S,
        params: &[ParamMetadata],
        depender: &str,
    ) -> ContainerResult<Arguments>
    where
        S: DependencySource + ?Sized,
    {
        let mut values = Vec::with_capacity(params.len());

        for param in params {
            match self.resolve_id(source, param) {
                Some(id) => {
                    if !source.is_scalar(&id) && source.status(&id).is_in_progress() {
                        return Err(ContainerError::circular(id, depender));
                    }
                    debug!("解析依赖: {} -> {} (参数 {})", depender, id, param.name);
                    values.push(Some(source.supply(&id)?));
                }
                None if param.optional => {
                    debug!("跳过可选参数: {} (参数 {})", depender, param.name);
                    values.push(None);
                }
                None => {
                    return Err(ContainerError::dependency_not_found(
                        param.name.clone(),
                        param.declared_type.clone(),
                    ));
                }
            }
        }

        Ok(Arguments::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::{Bean, ConstructionStatus};
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Source {}

        impl DependencySource for Source {
            fn contains(&self, id: &str) -> bool;
            fn status(&self, id: &str) -> ConstructionStatus;
            fn is_scalar(&self, id: &str) -> bool;
            fn supply(&self, id: &str) -> ContainerResult<Bean>;
        }
    }

    fn source_with(ids: &'static [&'static str]) -> MockSource {
        let mut source = MockSource::new();
        source
            .expect_contains()
            .returning(move |id| ids.iter().any(|known| *known == id));
        source.expect_is_scalar().returning(|_| false);
        source
            .expect_status()
            .returning(|_| ConstructionStatus::NotStarted);
        source
            .expect_supply()
            .returning(|id| Ok(Bean::value(id.to_string())));
        source
    }

    #[test]
    fn test_override_beats_type_beats_name() {
        let source = source_with(&["special", "app::Db", "db"]);
        let resolver = DependencyResolver::new();

        let full = ParamMetadata::new("db")
            .with_type("app::Db")
            .with_override("special");
        let typed = ParamMetadata::new("db").with_type("app::Db");
        let named = ParamMetadata::new("db");

        assert_eq!(resolver.resolve_id(&source, &full).as_deref(), Some("special"));
        assert_eq!(resolver.resolve_id(&source, &typed).as_deref(), Some("app::Db"));
        assert_eq!(resolver.resolve_id(&source, &named).as_deref(), Some("db"));
    }

    #[test]
    fn test_unknown_override_falls_back_to_type() {
        let source = source_with(&["app::Db"]);
        let param = ParamMetadata::new("db")
            .with_type("app::Db")
            .with_override("missing");

        assert_eq!(
            DependencyResolver::new().resolve_id(&source, &param).as_deref(),
            Some("app::Db")
        );
    }

    #[test]
    fn test_optional_parameter_is_skipped() {
        let source = source_with(&["app::Db"]);
        let params = vec![
            ParamMetadata::new("db").with_type("app::Db"),
            ParamMetadata::new("cache").with_type("app::Cache").optional(),
        ];

        let args = DependencyResolver::new()
            .resolve(&source, &params, "app::Service")
            .expect("resolve");

        assert_eq!(args.len(), 2);
        assert_eq!(args.value::<String>(0).expect("db"), "app::Db");
        assert!(args.get(1).is_none());
    }

    #[test]
    fn test_missing_required_parameter() {
        let source = source_with(&[]);
        let params = vec![ParamMetadata::new("db").with_type("app::Db")];

        let error = DependencyResolver::new()
            .resolve(&source, &params, "app::Service")
            .unwrap_err();

        match error {
            ContainerError::NotFound { id, declared_type } => {
                assert_eq!(id, "db");
                assert_eq!(declared_type.as_deref(), Some("app::Db"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_in_progress_dependency_is_circular() {
        let mut source = MockSource::new();
        source.expect_contains().returning(|_| true);
        source.expect_is_scalar().returning(|_| false);
        source
            .expect_status()
            .with(eq("app::X"))
            .returning(|_| ConstructionStatus::InProgress);
        source.expect_supply().never();

        let params = vec![ParamMetadata::new("x").with_type("app::X")];
        let error = DependencyResolver::new()
            .resolve(&source, &params, "app::Y")
            .unwrap_err();

        match error {
            ContainerError::CircularReference { dependency, depender } => {
                assert_eq!(dependency, "app::X");
                assert_eq!(depender, "app::Y");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_completed_scalar_bypasses_cycle_check() {
        let mut source = MockSource::new();
        source.expect_contains().returning(|_| true);
        source.expect_is_scalar().returning(|_| true);
        source.expect_status().never();
        source
            .expect_supply()
            .times(1)
            .returning(|_| Ok(Bean::value(5)));

        let params = vec![ParamMetadata::new("retries")];
        let args = DependencyResolver::new()
            .resolve(&source, &params, "app::Client")
            .expect("resolve");

        assert_eq!(args.value::<i64>(0).expect("retries"), 5);
    }
}
