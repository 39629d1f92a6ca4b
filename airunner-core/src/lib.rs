//! # AI Runner agent core
//!
//! Task routing and tool orchestration for the AI Runner conversation engine:
//! - Expert agents with keyword capabilities and relevance scoring
//! - Routing of a task to the best agent(s), with concurrent fan-out and
//!   result aggregation
//! - Sequential multi-agent collaboration threading earlier results forward
//! - Tool sets narrowed per action, with built-in and sandboxed custom tools
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use airunner_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = RunnerConfig::load()?;
//!
//!     let registry = Arc::new(AgentRegistry::with_default_experts());
//!     let router = AgentRouter::with_config(registry, config.routing.clone());
//!     let routed = router.route("find the latest news on fusion power", None).await;
//!     println!("{}", serde_json::to_string_pretty(&routed)?);
//!
//!     let (env, _host_commands) = ToolEnvironment::from_config(&config.tools);
//!     let tools = ToolManager::load(config.tools, Arc::new(env), None).await?;
//!     let specs = tools.tool_specs_for_action(ActionType::SearchWeb);
//!     println!("{} tools for web search", specs.len());
//!
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod tools;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agents::{
        AgentRegistry, AgentResponse, AgentRouter, BoxedAgent, CapabilityRegistry,
        CollaborationResult, ExpertAgent, FnAgent, RoutingResult, TaskContext,
    };
    pub use crate::config::{ConfigBuilder, RoutingConfig, RunnerConfig, ToolsConfig};
    pub use crate::error::{Result, RunnerError};
    pub use crate::tools::{
        ActionType, BoxedTool, CustomToolStore, HostCommand, InMemoryCustomToolStore, Tool,
        ToolCategory, ToolEnvironment, ToolError, ToolManager,
    };
}
