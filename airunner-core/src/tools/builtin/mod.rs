//! Built-in tools
//!
//! Conversation state (user data, mood) and workspace files are handled in
//! process. Everything else is described as a [`HostCommand`] and forwarded
//! to the host application over the environment's channel.

mod conversation;
mod environment;
mod files;
mod host;

pub use environment::{HostCommand, Mood, ToolEnvironment};

use serde_json::{Value, json};
use std::sync::Arc;

use super::category::ToolCategory;
use super::error::ToolError;
use super::tool::{BoxedTool, FnTool, ToolMetadata, ToolSchema};

/// Tools offered for every action, in this order
pub const COMMON_TOOLS: [&str; 3] = ["get_user_data", "store_user_data", "update_mood"];

/// Every built-in tool, grouped by category in declaration order
pub fn builtin_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    ToolCategory::ALL
        .into_iter()
        .flat_map(|category| tools_for_category(category, env))
        .collect()
}

/// Built-in tools of one category, in their fixed order
pub fn tools_for_category(category: ToolCategory, env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    match category {
        ToolCategory::Rag => host::rag_tools(env),
        ToolCategory::Image => host::image_tools(env),
        ToolCategory::File => files::file_tools(env),
        ToolCategory::Web => host::web_tools(env),
        ToolCategory::Code => host::code_tools(env),
        ToolCategory::System => host::system_tools(env),
        ToolCategory::Conversation => conversation::conversation_tools(env),
        ToolCategory::Autonomous => host::autonomous_tools(env),
    }
}

/// Tool whose handler receives the shared environment
fn env_tool<F, Fut>(
    env: &Arc<ToolEnvironment>,
    metadata: ToolMetadata,
    schema: ToolSchema,
    handler: F,
) -> BoxedTool
where
    F: Fn(Arc<ToolEnvironment>, Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    let env = Arc::clone(env);
    Arc::new(FnTool::new(metadata, schema, move |args| {
        handler(Arc::clone(&env), args)
    }))
}

/// Tool that turns its arguments into a host command and forwards it
fn forwarding_tool(
    env: &Arc<ToolEnvironment>,
    metadata: ToolMetadata,
    schema: ToolSchema,
    command: fn(&Value) -> Result<HostCommand, ToolError>,
) -> BoxedTool {
    env_tool(env, metadata, schema, move |env, args| async move {
        let command = command(&args)?;
        let name = command.name();
        env.send(command).await?;
        Ok(json!({ "status": "forwarded", "command": name }))
    })
}

fn required_str(args: &Value, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::invalid_argument(key, "expected a string"))
}

fn optional_str(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn optional_u64(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

fn optional_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}
