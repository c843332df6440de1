//! 组件派生宏实现

use crate::utils::{field_shape, is_trait_object, registration_fn_name, wrapped_type, FieldShape};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Field, Fields, Ident, LitStr, Meta, Path, Result};

/// 组件配置参数
#[derive(Default)]
pub struct ComponentArgs {
    /// 别名，写入构造型注解的 `name` 属性
    pub name: Option<String>,
    /// 自定义构造型标记
    pub stereotype: Option<String>,
    /// 是否为配置类
    pub configuration: bool,
    /// 是否在启动时登记到全局组件清单
    pub register: bool,
    /// 是否需要接收容器
    pub aware: bool,
    /// 实现的 trait
    pub implements: Vec<Path>,
    /// 导入的配置类型
    pub imports: Vec<Path>,
    /// 追加元数据的函数
    pub extend: Option<Path>,
}

impl ComponentArgs {
    /// 从 `#[component(...)]` 属性解析
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut args = ComponentArgs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("component")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    args.name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("stereotype") {
                    args.stereotype = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("configuration") {
                    args.configuration = true;
                } else if meta.path.is_ident("register") {
                    args.register = true;
                } else if meta.path.is_ident("aware") {
                    args.aware = true;
                } else if meta.path.is_ident("implements") {
                    meta.parse_nested_meta(|inner| {
                        args.implements.push(inner.path);
                        Ok(())
                    })?;
                } else if meta.path.is_ident("imports") {
                    meta.parse_nested_meta(|inner| {
                        args.imports.push(inner.path);
                        Ok(())
                    })?;
                } else if meta.path.is_ident("extend") {
                    args.extend = Some(meta.value()?.parse::<Path>()?);
                } else {
                    return Err(meta.error("未知的 component 参数"));
                }
                Ok(())
            })?;
        }
        if args.configuration && args.stereotype.is_some() {
            return Err(syn::Error::new(
                Span::call_site(),
                "configuration 与 stereotype 不能同时使用",
            ));
        }
        Ok(args)
    }
}

/// 字段注入方式
enum FieldAttr {
    None,
    Inject(LitStr),
    Value(LitStr),
    Autowired(Option<LitStr>),
    Default,
}

impl FieldAttr {
    fn from_field(field: &Field) -> Result<Self> {
        let mut found = FieldAttr::None;
        for attr in &field.attrs {
            let parsed = if attr.path().is_ident("inject") {
                FieldAttr::Inject(attr.parse_args()?)
            } else if attr.path().is_ident("value") {
                FieldAttr::Value(attr.parse_args()?)
            } else if attr.path().is_ident("autowired") {
                match &attr.meta {
                    Meta::Path(_) => FieldAttr::Autowired(None),
                    _ => FieldAttr::Autowired(Some(attr.parse_args()?)),
                }
            } else if attr.path().is_ident("default") {
                FieldAttr::Default
            } else {
                continue;
            };
            if !matches!(found, FieldAttr::None) {
                return Err(syn::Error::new_spanned(attr, "字段只能有一个注入属性"));
            }
            found = parsed;
        }
        Ok(found)
    }
}

/// 构造参数、字段初始化和属性描述
#[derive(Default)]
struct Members {
    params: Vec<TokenStream2>,
    inits: Vec<TokenStream2>,
    properties: Vec<TokenStream2>,
}

/// 实现 #[derive(Component)] 宏
pub fn derive_component_impl(input: DeriveInput) -> TokenStream {
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    let struct_name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&input.generics, "组件不支持泛型参数"));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(struct_name, "组件只支持具名字段"));
            }
        },
        _ => return Err(syn::Error::new_spanned(struct_name, "组件只能是结构体")),
    };

    let args = ComponentArgs::from_attrs(&input.attrs)?;
    let members = collect_members(&fields)?;
    let annotations = annotations(&args);
    let implements = args.implements.iter().map(|path| {
        quote! {
            .implements::<dyn #path, Self, _>(|component| component)
        }
    });

    let Members {
        params,
        inits,
        properties,
    } = members;
    let instance = if args.aware {
        quote! { ::infrastructure_common::Bean::aware(::std::sync::Arc::new(Self { #(#inits),* })) }
    } else {
        quote! { ::infrastructure_common::Bean::object(Self { #(#inits),* }) }
    };
    let finish = match &args.extend {
        Some(extend) => quote! { #extend(metadata) },
        None => quote! { metadata },
    };

    let injectable = quote! {
        impl ::infrastructure_common::Injectable for #struct_name {
            fn type_metadata() -> ::infrastructure_common::TypeMetadata {
                let metadata = ::infrastructure_common::TypeMetadata::class::<Self>()
                    #annotations
                    #(#implements)*
                    #(.with_property(#properties))*
                    .with_constructor(
                        vec![#(#params),*],
                        |_args: ::infrastructure_common::Arguments| -> ::core::result::Result<
                            ::infrastructure_common::Bean,
                            ::infrastructure_common::BoxError,
                        > {
                            Ok(#instance)
                        },
                    );
                #finish
            }
        }
    };

    let registration = if args.register {
        generate_registration_code(struct_name)
    } else {
        TokenStream2::new()
    };

    Ok(quote! {
        #injectable

        #registration
    })
}

fn annotations(args: &ComponentArgs) -> TokenStream2 {
    let stereotype = match (&args.stereotype, args.configuration) {
        (_, true) => quote! { ::infrastructure_common::conventions::CONFIGURATION },
        (Some(custom), false) => quote! { #custom },
        (None, false) => quote! { ::infrastructure_common::conventions::COMPONENT },
    };
    let mut annotation = quote! { ::infrastructure_common::Annotation::new(#stereotype) };
    if let Some(name) = &args.name {
        annotation = quote! {
            #annotation.with_attribute(::infrastructure_common::conventions::NAME_ATTRIBUTE, #name)
        };
    }

    let mut tokens = quote! { .with_annotation(#annotation) };
    if !args.imports.is_empty() {
        let imports = &args.imports;
        tokens.extend(quote! {
            .with_annotation(
                ::infrastructure_common::Annotation::new(::infrastructure_common::conventions::IMPORTS)
                    .with_attribute(
                        ::infrastructure_common::conventions::CONFIGURATIONS_ATTRIBUTE,
                        vec![#(::std::any::type_name::<#imports>()),*],
                    ),
            )
        });
    }
    tokens
}

fn collect_members(fields: &[&Field]) -> Result<Members> {
    let mut members = Members::default();
    let mut index = 0usize;

    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let name = ident.to_string();
        let shape = field_shape(&field.ty);

        match (FieldAttr::from_field(field)?, shape) {
            (FieldAttr::Default, _) | (FieldAttr::None, FieldShape::Slot(_)) => {
                members.inits.push(default_init(ident));
            }
            (FieldAttr::Value(id), FieldShape::Slot(_)) => {
                members.properties.push(value_property(ident, &id));
                members.inits.push(default_init(ident));
            }
            (FieldAttr::Autowired(id), FieldShape::Slot(inner)) => {
                let target = wrapped_type(inner, "Arc").ok_or_else(|| {
                    syn::Error::new_spanned(
                        &field.ty,
                        "#[autowired] 字段必须是 InjectionSlot<Arc<T>>",
                    )
                })?;
                members
                    .properties
                    .push(autowired_property(ident, target, id.as_ref()));
                members.inits.push(default_init(ident));
            }
            (FieldAttr::Inject(_), FieldShape::Slot(_)) => {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "InjectionSlot 字段使用 #[autowired] 或 #[value]",
                ));
            }
            (FieldAttr::Autowired(_), _) => {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "#[autowired] 字段必须是 InjectionSlot<Arc<T>>",
                ));
            }
            (
                FieldAttr::Value(_),
                FieldShape::Object(_)
                | FieldShape::Interface(_)
                | FieldShape::OptionalObject(_)
                | FieldShape::OptionalInterface(_),
            ) => {
                return Err(syn::Error::new_spanned(&field.ty, "#[value] 只能用于配置值字段"));
            }
            (attr, shape) => {
                let override_id = match attr {
                    FieldAttr::Inject(id) | FieldAttr::Value(id) => Some(id),
                    _ => None,
                };
                let (param, value) = constructor_param(&name, shape, index);
                let param = match override_id {
                    Some(id) => quote! { #param.with_override(#id) },
                    None => param,
                };
                members.params.push(param);
                members.inits.push(quote! { #ident: #value });
                index += 1;
            }
        }
    }
    Ok(members)
}

fn default_init(ident: &Ident) -> TokenStream2 {
    quote! { #ident: ::core::default::Default::default() }
}

/// 构造参数描述和从参数列表取值的表达式
fn constructor_param(
    name: &str,
    shape: FieldShape<'_>,
    index: usize,
) -> (TokenStream2, TokenStream2) {
    match shape {
        FieldShape::Object(ty) => (
            quote! { ::infrastructure_common::ParamMetadata::typed::<#ty>(#name) },
            quote! { _args.object::<#ty>(#index)? },
        ),
        FieldShape::Interface(ty) => (
            quote! { ::infrastructure_common::ParamMetadata::typed::<#ty>(#name) },
            quote! { _args.interface::<#ty>(#index)? },
        ),
        FieldShape::OptionalObject(ty) => (
            quote! { ::infrastructure_common::ParamMetadata::typed::<#ty>(#name).optional() },
            quote! { _args.optional_object::<#ty>(#index)? },
        ),
        FieldShape::OptionalInterface(ty) => (
            quote! { ::infrastructure_common::ParamMetadata::typed::<#ty>(#name).optional() },
            quote! { _args.optional_interface::<#ty>(#index)? },
        ),
        FieldShape::OptionalValue(_) => (
            quote! { ::infrastructure_common::ParamMetadata::new(#name).optional() },
            quote! { _args.optional_value(#index)? },
        ),
        FieldShape::Value(_) | FieldShape::Slot(_) => (
            quote! { ::infrastructure_common::ParamMetadata::new(#name) },
            quote! { _args.value(#index)? },
        ),
    }
}

fn value_property(ident: &Ident, id: &LitStr) -> TokenStream2 {
    let name = ident.to_string();
    quote! {
        ::infrastructure_common::PropertyMetadata::new(#name)
            .with_annotation(
                ::infrastructure_common::Annotation::new(::infrastructure_common::conventions::VALUE)
                    .with_attribute(::infrastructure_common::conventions::BEAN_ID_ATTRIBUTE, #id),
            )
            .with_setter(|target, value| {
                let this = target.downcast::<Self>().ok_or_else(|| {
                    format!("目标不是 {}", ::std::any::type_name::<Self>())
                })?;
                this.#ident.set(value.to_value().ok_or_else(|| {
                    format!("配置值类型不匹配: {}", #name)
                })?);
                Ok(())
            })
    }
}

fn autowired_property(ident: &Ident, target: &syn::Type, id: Option<&LitStr>) -> TokenStream2 {
    let name = ident.to_string();
    let mut annotation = quote! {
        ::infrastructure_common::Annotation::new(::infrastructure_common::conventions::AUTOWIRED)
    };
    if let Some(id) = id {
        annotation = quote! {
            #annotation.with_attribute(::infrastructure_common::conventions::BEAN_ID_ATTRIBUTE, #id)
        };
    }
    let view = if is_trait_object(target) {
        quote! { value.as_interface::<#target>() }
    } else {
        quote! { value.downcast::<#target>() }
    };
    quote! {
        ::infrastructure_common::PropertyMetadata::new(#name)
            .with_type(::std::any::type_name::<#target>())
            .with_annotation(#annotation)
            .with_setter(|target, value| {
                let this = target.downcast::<Self>().ok_or_else(|| {
                    format!("目标不是 {}", ::std::any::type_name::<Self>())
                })?;
                this.#ident.set(#view.ok_or_else(|| {
                    format!("依赖类型不匹配: {}", #name)
                })?);
                Ok(())
            })
    }
}

/// 生成启动时登记到全局组件清单的代码
fn generate_registration_code(struct_name: &Ident) -> TokenStream2 {
    let registration_fn_name = Ident::new(
        &registration_fn_name(&struct_name.to_string()),
        Span::call_site(),
    );

    quote! {
        // 使用 ctor 在程序启动时登记组件
        #[ctor::ctor]
        fn #registration_fn_name() {
            ::infrastructure_common::register_component_metadata(
                ::infrastructure_common::ManifestEntry {
                    type_name: ::std::any::type_name::<#struct_name>(),
                    metadata: <#struct_name as ::infrastructure_common::Injectable>::type_metadata,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_component_args_parsing() {
        let input: DeriveInput = parse_quote! {
            #[component(name = "users", register, implements(app::Repository, Lookup))]
            struct UserRepository;
        };
        let args = ComponentArgs::from_attrs(&input.attrs).expect("args");

        assert_eq!(args.name.as_deref(), Some("users"));
        assert!(args.register);
        assert!(!args.configuration);
        assert_eq!(args.implements.len(), 2);
    }

    #[test]
    fn test_configuration_conflicts_with_stereotype() {
        let input: DeriveInput = parse_quote! {
            #[component(configuration, stereotype = "Repository")]
            struct Settings;
        };
        assert!(ComponentArgs::from_attrs(&input.attrs).is_err());
    }

    #[test]
    fn test_constructor_params_skip_slots_and_defaults() {
        let input: DeriveInput = parse_quote! {
            struct Service {
                foo: Arc<Foo>,
                #[value("app.port")]
                port: u16,
                #[autowired]
                engine: InjectionSlot<Arc<Engine>>,
                #[default]
                hits: AtomicUsize,
            }
        };
        let Data::Struct(data) = &input.data else {
            panic!("struct");
        };
        let fields: Vec<&Field> = data.fields.iter().collect();
        let members = collect_members(&fields).expect("members");

        assert_eq!(members.params.len(), 2);
        assert_eq!(members.inits.len(), 4);
        assert_eq!(members.properties.len(), 1);
    }

    #[test]
    fn test_autowired_requires_slot() {
        let input: DeriveInput = parse_quote! {
            struct Service {
                #[autowired]
                engine: Arc<Engine>,
            }
        };
        assert!(expand(&input).is_err());
    }
}
