//! # 示例应用程序
//!
//! 演示如何用配置文件、命令行条目和 `#[derive(Component)]` 组件组装容器

use anyhow::Context;
use clap::Parser;
use component_macros::Component;
use di_composition::{ContainerBuilder, LoggingConfig};
use infrastructure_common::{Bean, InjectionSlot};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn Beans 示例应用")]
struct Args {
    /// 配置文件路径，支持 toml / yaml / json
    #[arg(short, long)]
    config: Option<String>,

    /// 显式条目，格式为 `id=value`，value 按 JSON 解析，失败时作为字符串
    #[arg(short, long = "bean", value_name = "ID=VALUE")]
    beans: Vec<String>,

    /// 环境变量前缀
    #[arg(long, default_value = "BEANS")]
    env_prefix: String,

    /// 调试模式
    #[arg(long)]
    debug: bool,

    /// 要获取并打印的标识
    #[arg(long)]
    show: Vec<String>,
}

/// 问候能力
pub trait Greeter: Send + Sync {
    /// 生成问候语
    fn greet(&self, name: &str) -> String;
}

/// 时钟，时区来自配置
#[derive(Debug, Component)]
#[component(register, name = "clock")]
pub struct SystemClock {
    #[value("app.timezone")]
    zone: Option<String>,
}

impl SystemClock {
    fn zone(&self) -> &str {
        self.zone.as_deref().unwrap_or("UTC")
    }
}

/// 问候服务
#[derive(Debug, Component)]
#[component(register, implements(Greeter))]
pub struct GreetingService {
    clock: Arc<SystemClock>,
    #[value("app.greeting")]
    template: Option<String>,
}

impl Greeter for GreetingService {
    fn greet(&self, name: &str) -> String {
        let template = self.template.as_deref().unwrap_or("你好, {name}");
        format!("{} ({})", template.replace("{name}", name), self.clock.zone())
    }
}

/// 应用入口组件
#[derive(Component)]
#[component(register, name = "app")]
pub struct App {
    greeter: Arc<dyn Greeter>,
    #[value("app.user")]
    user: Option<String>,
    #[autowired]
    clock: InjectionSlot<Arc<SystemClock>>,
}

impl App {
    fn run(&self) {
        let user = self.user.as_deref().unwrap_or("world");
        info!("{}", self.greeter.greet(user));
        if let Some(clock) = self.clock.get() {
            info!("自动装配的时钟时区: {}", clock.zone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = if args.debug {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    };
    let mut builder = ContainerBuilder::new()
        .with_logging(logging)
        .with_debug(args.debug)
        .with_namespaces([module_path!()]);

    if let Some(config) = &args.config {
        builder = add_config_file(builder, config)?;
    }
    builder = builder.add_config_env_vars(args.env_prefix.as_str());

    for bean in &args.beans {
        let (id, value) = parse_bean(bean)?;
        builder = builder.with_bean(id, Bean::value(value));
    }

    let container = builder.build().await.context("容器构建失败")?;
    info!("已注册 {} 个标识", container.ids().len());

    let app = container.get_object::<App>("app").context("获取 app 失败")?;
    app.run();

    for id in &args.show {
        let bean = container
            .get(id)
            .with_context(|| format!("获取 {id} 失败"))?;
        match bean.as_value() {
            Some(value) => info!("{} = {}", id, value),
            None => info!("{} = {:?}", id, bean),
        }
    }

    Ok(())
}

/// 按扩展名添加配置文件
fn add_config_file(builder: ContainerBuilder, path: &str) -> anyhow::Result<ContainerBuilder> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let builder = match extension {
        "toml" => builder.add_config_toml(path)?,
        "yaml" | "yml" => builder.add_config_yaml(path)?,
        "json" => builder.add_config_json(path)?,
        other => anyhow::bail!("不支持的配置文件格式: {other}"),
    };
    Ok(builder)
}

/// 解析 `id=value`
fn parse_bean(raw: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (id, value) = raw
        .split_once('=')
        .with_context(|| format!("条目格式应为 id=value: {raw}"))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((id.trim().to_string(), value))
}
