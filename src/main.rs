use alive_agent::config::HostConfig;
use alive_agent::error::Result;
use alive_agent::llm::HttpLlmClient;
use alive_agent::tools::{Selector, ToolRequest};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// 检查宿主配置中的工具登记和 agent 工具可见性
#[derive(Parser, Debug)]
#[command(name = "alive", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 打印某个 agent（或一组选择器）可见的工具
    Resolve(ResolveArgs),
    /// 打印登记表中的所有工具及其标签
    Overview {
        /// 宿主 YAML 配置
        #[arg(env = "ALIVE_HOST_CONFIG")]
        config: String,
    },
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// 宿主 YAML 配置
    #[arg(env = "ALIVE_HOST_CONFIG")]
    config: String,
    /// 按配置中 agent 的 include / exclude 解析
    #[arg(long, conflicts_with_all = ["include", "exclude", "caller"])]
    agent: Option<String>,
    /// `*`、`#tag`、`tag:name` 或工具名，可重复
    #[arg(long)]
    include: Vec<String>,
    #[arg(long)]
    exclude: Vec<String>,
    #[arg(long)]
    caller: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve(args) => resolve(args),
        Command::Overview { config } => overview(&config),
    }
}

fn resolve(args: ResolveArgs) -> Result<()> {
    let config = HostConfig::load(&args.config)?;
    let host = config.build(Arc::new(HttpLlmClient::default()))?;

    let request = match &args.agent {
        Some(name) => host
            .agent(name)
            .ok_or_else(|| alive_agent::error::AgentError::NotFound(name.clone()))?
            .tool_request(),
        None => {
            let mut request = ToolRequest::new()
                .include_all(Selector::parse_all(&args.include)?)
                .exclude_all(Selector::parse_all(&args.exclude)?);
            if let Some(caller) = args.caller {
                request = request.caller(caller);
            }
            request
        }
    };

    for name in host.resolve_names(&request)? {
        println!("{name}");
    }
    Ok(())
}

fn overview(path: &str) -> Result<()> {
    let config = HostConfig::load(path)?;
    let host = config.build(Arc::new(HttpLlmClient::default()))?;

    for entry in host.registry_snapshot().entries() {
        let tags: Vec<String> = entry.tags().iter().map(|t| format!("#{t}")).collect();
        println!("{:<28} {:<24} {}", entry.name(), tags.join(" "), entry.description());
    }
    Ok(())
}
