//! AI Runner CLI - route tasks to expert agents and inspect tool sets

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

use airunner_core::agents::{AgentRegistry, AgentRouter, TaskContext};
use airunner_core::config::RunnerConfig;
use airunner_core::tools::{
    ActionType, CustomToolStore, InMemoryCustomToolStore, Tool, ToolEnvironment, ToolManager,
    ToolSpec,
};

#[derive(Parser)]
#[command(name = "airunner")]
#[command(about = "AI Runner agent routing and tool orchestration", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to airunner.toml and AIRUNNER_* variables)
    #[arg(short, long, env = "AIRUNNER_CONFIG_PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a task to the best matching agents
    Route {
        /// Task description
        task: String,

        /// Maximum number of agents to invoke
        #[arg(long)]
        max_agents: Option<usize>,

        /// Minimum relevance score for selection
        #[arg(long)]
        min_score: Option<f64>,

        /// Task context as a JSON object
        #[arg(long)]
        context: Option<String>,
    },
    /// Run agents one after another on the same task
    Collaborate {
        /// Task description
        task: String,

        /// Agents in execution order
        #[arg(long, value_delimiter = ',', required = true)]
        agents: Vec<String>,

        /// Task context as a JSON object
        #[arg(long)]
        context: Option<String>,
    },
    /// List registered agents
    Agents,
    /// List tools, optionally narrowed to an action
    Tools {
        /// Action type, e.g. chat or generate_image
        #[arg(long)]
        action: Option<ActionType>,

        /// JSON file of custom tool records
        #[arg(long)]
        custom_tools: Option<PathBuf>,
    },
    /// Version information
    Version,
}

fn load_config(path: Option<&PathBuf>) -> Result<RunnerConfig> {
    let config = match path {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::load()?,
    };
    Ok(config)
}

fn parse_context(raw: Option<&str>) -> Result<Option<TaskContext>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw).context("--context is not valid JSON")?;
    if !value.is_object() {
        bail!("--context must be a JSON object");
    }
    Ok(Some(TaskContext::from_value(value)))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Route {
            task,
            max_agents,
            min_score,
            context,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let context = parse_context(context.as_deref())?;
            let min_score = min_score.unwrap_or(config.routing.min_score);
            let max_agents = max_agents.unwrap_or(config.routing.max_agents);

            let router = AgentRouter::with_config(
                Arc::new(AgentRegistry::with_default_experts()),
                config.routing,
            );
            let result = router.route_task(&task, context, min_score, max_agents).await;
            print_json(&result)?;
        }
        Commands::Collaborate {
            task,
            agents,
            context,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let context = parse_context(context.as_deref())?;

            let router = AgentRouter::with_config(
                Arc::new(AgentRegistry::with_default_experts()),
                config.routing,
            );
            let result = router.collaborate(&task, agents.as_slice(), context).await;
            print_json(&result)?;
        }
        Commands::Agents => {
            print_json(&AgentRegistry::with_default_experts().summaries())?;
        }
        Commands::Tools {
            action,
            custom_tools,
        } => {
            let config = load_config(cli.config.as_ref())?;

            let store: Option<Arc<dyn CustomToolStore>> = match custom_tools {
                Some(path) => Some(Arc::new(
                    InMemoryCustomToolStore::from_json_file(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?,
                )),
                None => None,
            };

            // The receiver is kept so forwarding tools report as connected.
            let (env, _host_commands) = ToolEnvironment::from_config(&config.tools);
            let manager = ToolManager::load(config.tools, Arc::new(env), store).await?;

            let tools = match action {
                Some(action) => manager.get_tools_for_action(action),
                None => manager.get_all_tools(),
            };
            let listing: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    let spec = ToolSpec::from(tool.as_ref());
                    json!({
                        "name": spec.name,
                        "category": tool.category(),
                        "description": spec.description,
                        "input_schema": spec.input_schema,
                    })
                })
                .collect();
            print_json(&listing)?;
        }
        Commands::Version => {
            println!("airunner {}", env!("CARGO_PKG_VERSION"));
            println!("airunner-core {}", airunner_core::VERSION);
        }
    }

    Ok(())
}
