//! 依赖解析抽象接口

use infrastructure_common::{Bean, ConstructionStatus, ContainerResult};

/// 依赖来源 trait
///
/// 依赖解析器通过它查询和获取依赖，容器实现此 trait
pub trait DependencySource {
    /// 是否存在标识对应的条目
    fn contains(&self, id: &str) -> bool;

    /// 标识的创建状态
    fn status(&self, id: &str) -> ConstructionStatus;

    /// 标识是否为已创建的标量值
    fn is_scalar(&self, id: &str) -> bool;

    /// 获取依赖，必要时创建
    fn supply(&self, id: &str) -> ContainerResult<Bean>;
}
