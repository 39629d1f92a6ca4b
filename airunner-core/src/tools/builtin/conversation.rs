//! Conversation tools: stored user data and assistant mood

use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolEnvironment, env_tool, host, optional_str, required_str};
use crate::tools::{BoxedTool, ToolCategory, ToolError, ToolMetadata, ToolSchema};

pub(super) fn conversation_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    vec![
        env_tool(
            env,
            ToolMetadata::new(
                "get_user_data",
                "Recall information stored about the user",
                ToolCategory::Conversation,
            ),
            ToolSchema::empty().with_property(
                "key",
                "string",
                "Entry to read; omitted returns everything",
                false,
            ),
            |env, args| async move {
                match optional_str(&args, "key") {
                    Some(key) => {
                        let value = env.user_value(&key).await.unwrap_or(Value::Null);
                        Ok(json!({ "key": key, "value": value }))
                    }
                    None => Ok(Value::Object(env.user_data().await)),
                }
            },
        ),
        env_tool(
            env,
            ToolMetadata::new(
                "store_user_data",
                "Remember a piece of information about the user",
                ToolCategory::Conversation,
            ),
            ToolSchema::empty()
                .with_property("key", "string", "Entry name", true)
                .with_untyped_property("value", "Value to store", true),
            |env, args| async move {
                let key = required_str(&args, "key")?;
                if key.trim().is_empty() {
                    return Err(ToolError::invalid_argument("key", "must not be blank"));
                }
                let value = args.get("value").cloned().unwrap_or(Value::Null);
                let replaced = env.store_user_value(key.clone(), value).await.is_some();
                Ok(json!({ "stored": key, "replaced": replaced }))
            },
        ),
        env_tool(
            env,
            ToolMetadata::new(
                "update_mood",
                "Update the assistant's mood",
                ToolCategory::Conversation,
            ),
            ToolSchema::empty()
                .with_property("mood", "string", "New mood, e.g. cheerful", true)
                .with_property("emoji", "string", "Emoji matching the mood", false),
            |env, args| async move {
                let mood = required_str(&args, "mood")?;
                let mood = env.set_mood(mood, optional_str(&args, "emoji")).await;
                serde_json::to_value(mood).map_err(|e| ToolError::internal(e.to_string()))
            },
        ),
        host::clear_conversation(env),
    ]
}
