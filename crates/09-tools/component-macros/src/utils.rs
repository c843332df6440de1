//! 宏工具函数

use syn::{GenericArgument, PathArguments, Type};

/// 字段类型的形状
#[derive(Clone, Copy)]
pub enum FieldShape<'a> {
    /// `Arc<T>`
    Object(&'a Type),
    /// `Arc<dyn Trait>`
    Interface(&'a Type),
    /// `Option<Arc<T>>`
    OptionalObject(&'a Type),
    /// `Option<Arc<dyn Trait>>`
    OptionalInterface(&'a Type),
    /// `Option<T>`，T 不是 `Arc`
    OptionalValue(&'a Type),
    /// `InjectionSlot<T>`
    Slot(&'a Type),
    /// 其他类型，作为配置值
    Value(&'a Type),
}

/// 从 `Wrapper<T>` 中提取 T
pub fn wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}

/// 是否为 trait 对象
pub fn is_trait_object(ty: &Type) -> bool {
    match ty {
        Type::TraitObject(_) => true,
        Type::Paren(paren) => is_trait_object(&paren.elem),
        _ => false,
    }
}

/// 分析字段类型
pub fn field_shape(ty: &Type) -> FieldShape<'_> {
    if let Some(inner) = wrapped_type(ty, "Arc") {
        return if is_trait_object(inner) {
            FieldShape::Interface(inner)
        } else {
            FieldShape::Object(inner)
        };
    }
    if let Some(inner) = wrapped_type(ty, "Option") {
        return match wrapped_type(inner, "Arc") {
            Some(target) if is_trait_object(target) => FieldShape::OptionalInterface(target),
            Some(target) => FieldShape::OptionalObject(target),
            None => FieldShape::OptionalValue(inner),
        };
    }
    if let Some(inner) = wrapped_type(ty, "InjectionSlot") {
        return FieldShape::Slot(inner);
    }
    FieldShape::Value(ty)
}

/// 生成的注册函数名称
pub fn registration_fn_name(struct_name: &str) -> String {
    let mut snake = String::new();
    for (i, c) in struct_name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    format!("__register_component_{snake}")
}
