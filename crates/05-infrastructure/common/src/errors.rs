//! 错误类型定义

use thiserror::Error;

/// 容器错误类型
///
/// 覆盖 Bean 查找、依赖解析和实例化过程中的全部失败情况
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Bean 未注册: {id}, 声明类型: {declared_type:?}")]
    NotFound {
        id: String,
        declared_type: Option<String>,
    },

    #[error("检测到循环依赖: {dependency} 被 {depender} 依赖时仍在创建中")]
    CircularReference { dependency: String, depender: String },

    #[error("创建 Bean 失败: {id}, 原因: {source}")]
    Construction {
        id: String,
        source: Box<ContainerError>,
    },

    #[error("实例化 Bean 失败: {id}, 原因: {message}")]
    Instantiation { id: String, message: String },

    #[error("参数无效: 第 {index} 个参数, 原因: {message}")]
    Argument { index: usize, message: String },

    #[error("Bean 条目无效: {id}, 原因: {message}")]
    InvalidEntry { id: String, message: String },
}

impl ContainerError {
    /// 创建未注册错误
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            id: id.into(),
            declared_type: None,
        }
    }

    /// 创建带声明类型的未注册错误
    pub fn dependency_not_found(name: impl Into<String>, declared_type: Option<String>) -> Self {
        Self::NotFound {
            id: name.into(),
            declared_type,
        }
    }

    /// 创建循环依赖错误
    pub fn circular(dependency: impl Into<String>, depender: impl Into<String>) -> Self {
        Self::CircularReference {
            dependency: dependency.into(),
            depender: depender.into(),
        }
    }

    /// 用外层 Bean 的标识包装错误
    pub fn construction(id: impl Into<String>, source: ContainerError) -> Self {
        Self::Construction {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// 创建实例化错误
    pub fn instantiation(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instantiation {
            id: id.into(),
            message: message.into(),
        }
    }

    /// 创建参数错误
    pub fn argument(index: usize, message: impl Into<String>) -> Self {
        Self::Argument {
            index,
            message: message.into(),
        }
    }

    /// 创建条目无效错误
    pub fn invalid_entry(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEntry {
            id: id.into(),
            message: message.into(),
        }
    }

    /// 剥离所有包装层，返回最内层的错误
    pub fn root_cause(&self) -> &ContainerError {
        match self {
            Self::Construction { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// 是否为循环依赖错误（包括被包装的情况）
    pub fn is_circular(&self) -> bool {
        matches!(self.root_cause(), Self::CircularReference { .. })
    }

    /// 是否为未注册错误（包括被包装的情况）
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::NotFound { .. })
    }
}

/// 组件错误类型
///
/// 注册阶段的致命错误，出现时整个注册流程中止
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("组件扫描失败: {message}")]
    ScanError { message: String },

    #[error("组件发现失败: {message}")]
    DiscoveryError { message: String },

    #[error("组件注册失败: {type_name}, 原因: {message}")]
    RegistrationError { type_name: String, message: String },

    #[error("组件元数据无效: {message}")]
    InvalidMetadata { message: String },

    #[error("接口实现生成失败: {interface}, 原因: {message}")]
    GenerationError { interface: String, message: String },

    #[error("注册配置器执行失败: {name}, 原因: {message}")]
    ConfiguratorError { name: String, message: String },

    #[error("容器错误: {source}")]
    Container {
        #[from]
        source: ContainerError,
    },
}

impl ComponentError {
    /// 创建扫描错误
    pub fn scan_error(message: impl Into<String>) -> Self {
        Self::ScanError {
            message: message.into(),
        }
    }

    /// 创建发现错误
    pub fn discovery_error(message: impl Into<String>) -> Self {
        Self::DiscoveryError {
            message: message.into(),
        }
    }

    /// 创建接口实现生成错误
    pub fn generation_error(interface: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationError {
            interface: interface.into(),
            message: message.into(),
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },
}

/// 缓存错误类型
///
/// 缓存适配器的失败只会被记录，不会向调用者传播
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("缓存操作失败: {key}, 原因: {message}")]
    OperationFailed { key: String, message: String },

    #[error("缓存值不可存储: {key}")]
    Unstorable { key: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("容器错误: {source}")]
    ContainerError {
        #[from]
        source: ContainerError,
    },

    #[error("组件错误: {source}")]
    ComponentError {
        #[from]
        source: ComponentError,
    },

    #[error("容器启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ContainerResult<T> = Result<T, ContainerError>;
pub type ComponentResult<T> = Result<T, ComponentError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type CacheResult<T> = Result<T, CacheError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

/// 工厂和构造函数返回的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
