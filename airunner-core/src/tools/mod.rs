//! Tool system for the conversation engine
//!
//! This module provides the tools an LLM turn can call and narrows them per
//! action. Key pieces:
//! - Built-in tools grouped by [`ToolCategory`]
//! - User-authored tools compiled in a sandboxed Lua VM, with usage tracking
//! - A [`ToolManager`] mapping each [`ActionType`] to a tool subset
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use airunner_core::config::ToolsConfig;
//! use airunner_core::tools::{ActionType, ToolEnvironment, ToolManager};
//!
//! # async fn example() -> airunner_core::error::Result<()> {
//! let config = ToolsConfig::default();
//! let (env, _host_commands) = ToolEnvironment::from_config(&config);
//! let manager = ToolManager::load(config, Arc::new(env), None).await?;
//!
//! let specs = manager.tool_specs_for_action(ActionType::Chat);
//! # Ok(())
//! # }
//! ```

mod builtin;
mod category;
mod custom;
mod error;
mod manager;
mod registry;
mod tool;

pub use builtin::{COMMON_TOOLS, HostCommand, Mood, ToolEnvironment, builtin_tools, tools_for_category};
pub use category::{ActionType, ToolCategory};
pub use custom::{
    CompiledCustomTool, CustomToolRecord, CustomToolStore, InMemoryCustomToolStore,
    ScriptLimits, UsageTrackedTool, load_custom_tools,
};
pub use error::{ToolError, ToolErrorKind, ValidationError};
pub use manager::ToolManager;
pub use registry::{RegistryError, ToolRegistry};
pub use tool::{BoxedTool, FnTool, Tool, ToolMetadata, ToolSchema, ToolSpec};
