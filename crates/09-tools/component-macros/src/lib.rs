//! # Component Macros
//!
//! 这个 crate 提供在编译时生成类型元数据的派生宏。
//!
//! ## 核心宏
//!
//! - [`Component`] - 生成 `Injectable` 实现，可选地在启动时登记到全局组件清单
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::Component;
//! use infrastructure_common::InjectionSlot;
//! use std::sync::Arc;
//!
//! #[derive(Component)]
//! #[component(name = "userService", register, implements(UserLookup))]
//! pub struct UserService {
//!     repository: Arc<UserRepository>,
//!     #[value("users.page_size")]
//!     page_size: u32,
//!     #[autowired]
//!     audit: InjectionSlot<Arc<AuditLog>>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod component;
mod utils;

/// 组件派生宏
///
/// 为结构体实现 `Injectable`，构造参数和属性由字段推导。
///
/// # 类型参数
///
/// - `name = "alias"` - 别名，写入构造型注解的 `name` 属性
/// - `stereotype = "Marker"` - 自定义构造型，默认为 `Component`
/// - `configuration` - 标记为配置类
/// - `implements(path::Trait, ...)` - 声明实现的 trait，按 `dyn Trait` 注册视图
/// - `imports(path::Type, ...)` - 导入配置类型
/// - `extend = path::to::fn` - 以 `fn(TypeMetadata) -> TypeMetadata` 追加元数据，例如工厂方法
/// - `aware` - 创建后接收容器，类型需实现 `ContainerAware`
/// - `register` - 启动时登记到全局组件清单，使用方需依赖 `ctor`
///
/// # 字段
///
/// - `Arc<T>` / `Arc<dyn Trait>` - 按类型注入
/// - `Option<Arc<T>>` - 可选依赖
/// - `#[inject("id")]` - 按标识注入
/// - `#[value("id")]` - 配置值；用在 `InjectionSlot<T>` 上时改为属性注入
/// - `#[autowired]` / `#[autowired("id")]` - `InjectionSlot<Arc<T>>` 属性的自动装配
/// - `#[default]` - 使用 `Default::default()`
/// - 其他字段按参数名解析配置值
#[proc_macro_derive(Component, attributes(component, inject, value, autowired, default))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::derive_component_impl(input)
}
