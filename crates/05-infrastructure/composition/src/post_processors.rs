//! 内置后置处理器：自动装配和配置值注入

use crate::processor::PostBeanProcessor;
use di_impl::Container;
use infrastructure_common::{
    conventions, Bean, ComponentResult, ContainerError, Injectable, PropertyMetadata,
    TypeMetadata,
};
use std::sync::Arc;
use tracing::debug;

/// 拥有指定注解属性的 Bean，每份元数据只返回一次
///
/// 类型自身标识可解析时优先使用，接口标识下的视图无法设置属性
fn beans_with_annotated_properties(
    container: &Container,
    marker: &str,
) -> Vec<(String, Arc<TypeMetadata>)> {
    let mut found: Vec<(String, Arc<TypeMetadata>)> = Vec::new();
    for id in container.ids() {
        let Some(metadata) = container.get_metadata(&id) else {
            continue;
        };
        if metadata.is_interface() || metadata.get_annotated_properties(marker).is_empty() {
            continue;
        }
        if found.iter().any(|(_, m)| Arc::ptr_eq(m, &metadata)) {
            continue;
        }
        let target = if container.has_metadata(&metadata.name) {
            metadata.name.clone()
        } else {
            id
        };
        found.push((target, metadata));
    }
    found
}

/// 把配置值注入属性，只接受标量
pub(crate) fn inject_value(
    container: &Container,
    property: &PropertyMetadata,
    bean: &Bean,
) -> Result<(), String> {
    let value_id = property
        .get_annotation(conventions::VALUE)
        .and_then(|a| a.string_attribute(conventions::BEAN_ID_ATTRIBUTE))
        .ok_or_else(|| format!("属性 {} 没有配置值标识", property.name))?;

    let value = container.get(value_id).map_err(|e| e.to_string())?;
    if !value.is_scalar() {
        return Err(format!("{value_id} 不是标量值, 不能用于配置值注入"));
    }
    property.assign(bean, value).map_err(|e| e.to_string())
}

/// 自动装配后置处理器
///
/// 按 `Autowired` 注解的 `bean_id`，缺省时按属性声明类型注入依赖
#[derive(Debug, Default)]
pub struct AutowirePostBeanProcessor;

impl Injectable for AutowirePostBeanProcessor {
    fn type_metadata() -> TypeMetadata {
        TypeMetadata::class::<Self>()
            .implements::<dyn PostBeanProcessor, Self, _>(|processor| processor)
            .with_constructor(Vec::new(), |_| Ok(Bean::object(AutowirePostBeanProcessor)))
    }
}

impl PostBeanProcessor for AutowirePostBeanProcessor {
    fn process(&self, container: &Container) -> ComponentResult<()> {
        for (id, metadata) in beans_with_annotated_properties(container, conventions::AUTOWIRED) {
            let bean = container.get(&id)?;
            for property in metadata.get_annotated_properties(conventions::AUTOWIRED) {
                let dependency = property
                    .get_annotation(conventions::AUTOWIRED)
                    .and_then(|a| a.string_attribute(conventions::BEAN_ID_ATTRIBUTE))
                    .or(property.declared_type.as_deref())
                    .ok_or_else(|| {
                        ContainerError::invalid_entry(
                            &id,
                            format!("自动装配属性 {} 必须声明类型或 bean_id", property.name),
                        )
                    })?;

                debug!("自动装配: {}.{} <- {}", id, property.name, dependency);
                let value = container.get(dependency)?;
                property.assign(&bean, value).map_err(|e| {
                    ContainerError::instantiation(
                        &id,
                        format!("设置属性 {} 失败: {}", property.name, e),
                    )
                })?;
            }
        }
        Ok(())
    }
}

/// 配置值后置处理器
///
/// 注入失败只记录日志
#[derive(Debug, Default)]
pub struct ValuePostBeanProcessor;

impl Injectable for ValuePostBeanProcessor {
    fn type_metadata() -> TypeMetadata {
        TypeMetadata::class::<Self>()
            .implements::<dyn PostBeanProcessor, Self, _>(|processor| processor)
            .with_constructor(Vec::new(), |_| Ok(Bean::object(ValuePostBeanProcessor)))
    }
}

impl PostBeanProcessor for ValuePostBeanProcessor {
    fn process(&self, container: &Container) -> ComponentResult<()> {
        for (id, metadata) in beans_with_annotated_properties(container, conventions::VALUE) {
            let bean = match container.get(&id) {
                Ok(bean) => bean,
                Err(e) => {
                    debug!("无法处理配置值 {}: {}", id, e);
                    continue;
                }
            };
            for property in metadata.get_annotated_properties(conventions::VALUE) {
                if let Err(message) = inject_value(container, property, &bean) {
                    debug!("无法处理配置值 {}.{}: {}", id, property.name, message);
                }
            }
        }
        Ok(())
    }
}
