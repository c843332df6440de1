//! Bean 创建状态

/// 创建状态
///
/// 由容器按标识持有，用于循环依赖检测
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConstructionStatus {
    /// 尚未创建
    #[default]
    NotStarted,
    /// 正在创建
    InProgress,
    /// 已创建
    Completed,
}

impl ConstructionStatus {
    /// 是否正在创建
    pub fn is_in_progress(self) -> bool {
        self == Self::InProgress
    }

    /// 是否已创建
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}
