//! 元数据定义
//!
//! 描述类型的结构：构造参数、注解、方法和属性。
//! 所有查询都是结构性的，查询失败一律视为不匹配。

use crate::bean::{Arguments, Bean};
use crate::errors::BoxError;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// 构造函数
pub type Constructor = Arc<dyn Fn(Arguments) -> Result<Bean, BoxError> + Send + Sync>;

/// 方法调用器，第一个参数为方法所属的 Bean
pub type MethodInvoker = Arc<dyn Fn(&Bean, Arguments) -> Result<Bean, BoxError> + Send + Sync>;

/// 属性设置器
pub type PropertySetter = Arc<dyn Fn(&Bean, Bean) -> Result<(), BoxError> + Send + Sync>;

/// 接口视图转换，无法转换时返回 `None`
pub type Upcast = Arc<dyn Fn(&Bean) -> Option<Bean> + Send + Sync>;

/// 接口代理，把方法分发表包装成接口视图
pub type InterfaceProxy = Arc<dyn Fn(Arc<dyn MethodDispatcher>) -> Bean + Send + Sync>;

/// 方法分发 trait
///
/// 接口的生成实现通过它按方法名分发调用
pub trait MethodDispatcher: Send + Sync {
    /// 调用指定方法
    fn dispatch(&self, method: &str, args: Arguments) -> Result<Bean, BoxError>;

    /// 是否实现了指定方法
    fn handles(&self, method: &str) -> bool;
}

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 可实例化的具体类型
    Class,
    /// 接口，只能作为实现的绑定目标
    Interface,
}

/// 注解
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// 注解名称（标记）
    pub name: String,
    /// 注解属性
    pub attributes: BTreeMap<String, Value>,
}

impl Annotation {
    /// 创建注解
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// 添加属性
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// 获取属性
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// 获取非空字符串属性
    pub fn string_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// 获取字符串列表属性，单个字符串视为只有一个元素的列表
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.attribute(key) {
            Some(Value::String(value)) if !value.is_empty() => vec![value.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// 参数描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMetadata {
    /// 参数名称
    pub name: String,
    /// 声明类型
    pub declared_type: Option<String>,
    /// 是否可选
    pub optional: bool,
    /// 显式指定的依赖标识
    pub override_id: Option<String>,
}

impl ParamMetadata {
    /// 创建参数描述
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            optional: false,
            override_id: None,
        }
    }

    /// 以类型 `T` 作为声明类型创建参数描述
    pub fn typed<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name).with_type(std::any::type_name::<T>())
    }

    /// 设置声明类型
    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    /// 标记为可选
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// 设置显式依赖标识
    pub fn with_override(mut self, id: impl Into<String>) -> Self {
        self.override_id = Some(id.into());
        self
    }

    fn signature(&self) -> String {
        format!(
            "{}{}:{}{}",
            self.name,
            if self.optional { "?" } else { "" },
            self.declared_type.as_deref().unwrap_or("_"),
            self.override_id
                .as_deref()
                .map(|id| format!("@{id}"))
                .unwrap_or_default()
        )
    }
}

/// 方法描述
#[derive(Clone)]
pub struct MethodMetadata {
    /// 所属类型
    pub owner: String,
    /// 方法名称
    pub name: String,
    /// 参数列表
    pub params: Vec<ParamMetadata>,
    /// 声明的返回类型
    pub return_type: Option<String>,
    /// 方法注解
    pub annotations: Vec<Annotation>,
    /// 是否为抽象方法
    pub is_abstract: bool,
    /// 调用器
    pub invoker: Option<MethodInvoker>,
}

impl MethodMetadata {
    /// 创建方法描述
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            annotations: Vec::new(),
            is_abstract: false,
            invoker: None,
        }
    }

    /// 创建抽象方法描述
    pub fn abstract_method(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let mut method = Self::new(owner, name);
        method.is_abstract = true;
        method
    }

    /// 添加参数
    pub fn with_param(mut self, param: ParamMetadata) -> Self {
        self.params.push(param);
        self
    }

    /// 设置返回类型
    pub fn returns(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    /// 以类型 `T` 作为返回类型
    pub fn returns_type<T: ?Sized + 'static>(self) -> Self {
        self.returns(std::any::type_name::<T>())
    }

    /// 添加注解
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// 设置调用器
    pub fn with_invoker<F>(mut self, invoker: F) -> Self
    where
        F: Fn(&Bean, Arguments) -> Result<Bean, BoxError> + Send + Sync + 'static,
    {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    /// 是否带有指定注解
    pub fn has_annotation(&self, marker: &str) -> bool {
        self.get_annotation(marker).is_some()
    }

    /// 获取指定注解
    pub fn get_annotation(&self, marker: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == marker)
    }

    /// 在目标 Bean 上调用方法
    pub fn invoke(&self, target: &Bean, args: Arguments) -> Result<Bean, BoxError> {
        match &self.invoker {
            Some(invoker) => invoker(target, args),
            None => Err(format!("方法没有调用器: {}::{}", self.owner, self.name).into()),
        }
    }

    fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ParamMetadata::signature).collect();
        format!(
            "{}fn {}({}) -> {} {}",
            if self.is_abstract { "abstract " } else { "" },
            self.name,
            params.join(", "),
            self.return_type.as_deref().unwrap_or("_"),
            annotations_signature(&self.annotations)
        )
    }
}

impl fmt::Debug for MethodMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodMetadata")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("annotations", &self.annotations)
            .field("is_abstract", &self.is_abstract)
            .finish_non_exhaustive()
    }
}

/// 属性描述
#[derive(Clone)]
pub struct PropertyMetadata {
    /// 属性名称
    pub name: String,
    /// 声明类型
    pub declared_type: Option<String>,
    /// 属性注解
    pub annotations: Vec<Annotation>,
    /// 设置器
    pub setter: Option<PropertySetter>,
}

impl PropertyMetadata {
    /// 创建属性描述
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            annotations: Vec::new(),
            setter: None,
        }
    }

    /// 设置声明类型
    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    /// 添加注解
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// 设置设置器
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Bean, Bean) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// 是否带有指定注解
    pub fn has_annotation(&self, marker: &str) -> bool {
        self.get_annotation(marker).is_some()
    }

    /// 获取指定注解
    pub fn get_annotation(&self, marker: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == marker)
    }

    /// 在目标 Bean 上赋值
    pub fn assign(&self, target: &Bean, value: Bean) -> Result<(), BoxError> {
        match &self.setter {
            Some(setter) => setter(target, value),
            None => Err(format!("属性没有设置器: {}", self.name).into()),
        }
    }
}

impl fmt::Debug for PropertyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

/// 实现的接口
#[derive(Clone)]
pub struct InterfaceBinding {
    /// 接口标识
    pub name: String,
    /// 转换为接口视图
    pub upcast: Option<Upcast>,
}

/// 类型元数据
#[derive(Clone)]
pub struct TypeMetadata {
    /// 类型名称
    pub name: String,
    /// 类型种类
    pub kind: TypeKind,
    /// 祖先类型
    pub parents: Vec<String>,
    /// 实现的接口
    pub interfaces: Vec<InterfaceBinding>,
    /// 类型注解
    pub annotations: Vec<Annotation>,
    /// 构造参数
    pub constructor_params: Vec<ParamMetadata>,
    /// 构造函数
    pub constructor: Option<Constructor>,
    /// 方法
    pub methods: Vec<MethodMetadata>,
    /// 属性
    pub properties: Vec<PropertyMetadata>,
    /// 接口代理
    pub proxy: Option<InterfaceProxy>,
}

impl TypeMetadata {
    /// 创建类型元数据
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parents: Vec::new(),
            interfaces: Vec::new(),
            annotations: Vec::new(),
            constructor_params: Vec::new(),
            constructor: None,
            methods: Vec::new(),
            properties: Vec::new(),
            proxy: None,
        }
    }

    /// 以 `T` 的类型名称创建具体类型元数据
    pub fn class<T: ?Sized + 'static>() -> Self {
        Self::new(std::any::type_name::<T>(), TypeKind::Class)
    }

    /// 以 `I` 的类型名称创建接口元数据
    pub fn interface<I: ?Sized + 'static>() -> Self {
        Self::new(std::any::type_name::<I>(), TypeKind::Interface)
    }

    /// 添加祖先类型
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// 声明实现的接口（无视图转换）
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(InterfaceBinding {
            name: name.into(),
            upcast: None,
        });
        self
    }

    /// 声明实现接口 `I`，并提供从 `T` 到 `I` 的视图转换
    pub fn implements<I, T, F>(mut self, upcast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        self.interfaces.push(InterfaceBinding {
            name: std::any::type_name::<I>().to_string(),
            upcast: Some(Arc::new(move |bean: &Bean| {
                bean.downcast::<T>()
                    .map(|instance| Bean::interface::<I>(upcast(instance)))
            })),
        });
        self
    }

    /// 添加注解
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// 添加无属性注解
    pub fn annotated(self, marker: impl Into<String>) -> Self {
        self.with_annotation(Annotation::new(marker))
    }

    /// 设置构造参数和构造函数
    pub fn with_constructor<F>(mut self, params: Vec<ParamMetadata>, constructor: F) -> Self
    where
        F: Fn(Arguments) -> Result<Bean, BoxError> + Send + Sync + 'static,
    {
        self.constructor_params = params;
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// 添加方法
    pub fn with_method(mut self, mut method: MethodMetadata) -> Self {
        if method.owner.is_empty() {
            method.owner = self.name.clone();
        }
        self.methods.push(method);
        self
    }

    /// 添加属性
    pub fn with_property(mut self, property: PropertyMetadata) -> Self {
        self.properties.push(property);
        self
    }

    /// 设置接口代理
    pub fn with_proxy<F>(mut self, proxy: F) -> Self
    where
        F: Fn(Arc<dyn MethodDispatcher>) -> Bean + Send + Sync + 'static,
    {
        self.proxy = Some(Arc::new(proxy));
        self
    }

    /// 是否为接口
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// 获取构造参数
    pub fn get_constructor_params(&self) -> &[ParamMetadata] {
        &self.constructor_params
    }

    /// 获取带有指定注解的方法
    pub fn get_annotated_methods(&self, marker: &str) -> Vec<&MethodMetadata> {
        self.methods
            .iter()
            .filter(|method| method.has_annotation(marker))
            .collect()
    }

    /// 获取带有指定注解的属性
    pub fn get_annotated_properties(&self, marker: &str) -> Vec<&PropertyMetadata> {
        self.properties
            .iter()
            .filter(|property| property.has_annotation(marker))
            .collect()
    }

    /// 获取抽象方法
    pub fn abstract_methods(&self) -> Vec<&MethodMetadata> {
        self.methods.iter().filter(|m| m.is_abstract).collect()
    }

    /// 是否带有指定注解
    pub fn has_annotation(&self, marker: &str) -> bool {
        self.get_annotation(marker).is_some()
    }

    /// 获取指定注解
    pub fn get_annotation(&self, marker: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == marker)
    }

    /// 是否为指定类型或接口的实例
    ///
    /// 同时检查自身名称、祖先类型和实现的接口，空名称视为不匹配。
    pub fn is_instance_of(&self, type_or_interface: &str) -> bool {
        if type_or_interface.is_empty() {
            return false;
        }
        self.name == type_or_interface
            || self.parents.iter().any(|p| p == type_or_interface)
            || self.implements_interface(type_or_interface)
    }

    /// 是否实现了指定接口
    pub fn implements_interface(&self, name: &str) -> bool {
        !name.is_empty() && self.interfaces.iter().any(|i| i.name == name)
    }

    /// 实现的接口名称
    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(|i| i.name.as_str())
    }

    /// 把实例转换为标识 `id` 对应的接口视图
    ///
    /// `id` 不是带视图转换的接口时返回 `None`
    pub fn view_as(&self, id: &str, bean: &Bean) -> Option<Bean> {
        self.interfaces
            .iter()
            .find(|binding| binding.name == id)
            .and_then(|binding| binding.upcast.as_ref())
            .and_then(|upcast| upcast(bean))
    }

    /// 把实例转换为接口 `I`
    pub fn cast<I: ?Sized + Send + Sync + 'static>(&self, bean: &Bean) -> Option<Arc<I>> {
        bean.as_interface::<I>().or_else(|| {
            self.view_as(std::any::type_name::<I>(), bean)
                .and_then(|view| view.as_interface::<I>())
        })
    }

    /// 调用构造函数
    pub fn instantiate(&self, args: Arguments) -> Result<Bean, BoxError> {
        match &self.constructor {
            Some(constructor) => constructor(args),
            None => Err(format!("类型没有构造函数: {}", self.name).into()),
        }
    }

    /// 结构签名
    pub fn signature(&self) -> String {
        let mut lines = vec![format!(
            "{} {}",
            match self.kind {
                TypeKind::Class => "class",
                TypeKind::Interface => "interface",
            },
            self.name
        )];
        lines.push(format!("parents: {}", self.parents.join(", ")));
        lines.push(format!(
            "interfaces: {}",
            self.interface_names().collect::<Vec<_>>().join(", ")
        ));
        lines.push(format!(
            "annotations: {}",
            annotations_signature(&self.annotations)
        ));
        lines.push(format!(
            "constructor({})",
            self.constructor_params
                .iter()
                .map(ParamMetadata::signature)
                .collect::<Vec<_>>()
                .join(", ")
        ));
        lines.extend(self.methods.iter().map(MethodMetadata::signature));
        lines.extend(self.properties.iter().map(|p| {
            format!(
                "property {}: {} {}",
                p.name,
                p.declared_type.as_deref().unwrap_or("_"),
                annotations_signature(&p.annotations)
            )
        }));
        lines.join("\n")
    }

    /// 结构签名的 SHA-256 指纹
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.signature().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Debug for TypeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parents", &self.parents)
            .field("interfaces", &self.interface_names().collect::<Vec<_>>())
            .field("annotations", &self.annotations)
            .field("constructor_params", &self.constructor_params)
            .field("methods", &self.methods)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

fn annotations_signature(annotations: &[Annotation]) -> String {
    annotations
        .iter()
        .map(|a| {
            // BTreeMap 保证属性顺序稳定
            let attributes = serde_json::to_string(&a.attributes).unwrap_or_default();
            format!("#{}{}", a.name, attributes)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 可注入类型
///
/// 由 `#[derive(Component)]` 生成或手工实现
pub trait Injectable {
    /// 类型元数据
    fn type_metadata() -> TypeMetadata;

    /// 共享的类型元数据
    fn metadata() -> Arc<TypeMetadata> {
        Arc::new(Self::type_metadata())
    }
}
