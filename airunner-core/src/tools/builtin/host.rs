//! Built-in tools that forward work to the host application

use serde_json::Value;
use std::sync::Arc;

use super::{
    HostCommand, ToolEnvironment, forwarding_tool, optional_bool, optional_str, optional_u64,
    required_str,
};
use crate::tools::{BoxedTool, ToolCategory, ToolError, ToolMetadata, ToolSchema};

pub(super) fn rag_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    vec![
        forwarding_tool(
            env,
            ToolMetadata::new(
                "rag_search",
                "Search the documents loaded for this conversation",
                ToolCategory::Rag,
            ),
            ToolSchema::empty()
                .with_property("query", "string", "What to look for", true)
                .with_property("top_k", "integer", "Number of passages to return", false),
            |args| {
                Ok(HostCommand::RagSearch {
                    query: required_str(args, "query")?,
                    top_k: optional_u64(args, "top_k"),
                    collection: None,
                })
            },
        ),
        forwarding_tool(
            env,
            ToolMetadata::new(
                "search_knowledge_base",
                "Search the long-term knowledge base",
                ToolCategory::Rag,
            ),
            ToolSchema::empty()
                .with_property("query", "string", "What to look for", true)
                .with_property("collection", "string", "Restrict to one collection", false),
            |args| {
                Ok(HostCommand::RagSearch {
                    query: required_str(args, "query")?,
                    top_k: None,
                    collection: optional_str(args, "collection"),
                })
            },
        ),
    ]
}

pub(super) fn image_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    vec![
        forwarding_tool(
            env,
            ToolMetadata::new(
                "generate_image",
                "Generate an image from a text prompt",
                ToolCategory::Image,
            ),
            ToolSchema::empty()
                .with_property("prompt", "string", "Description of the image", true)
                .with_property("negative_prompt", "string", "What to avoid", false)
                .with_property("width", "integer", "Width in pixels", false)
                .with_property("height", "integer", "Height in pixels", false),
            |args| {
                Ok(HostCommand::GenerateImage {
                    prompt: required_str(args, "prompt")?,
                    negative_prompt: optional_str(args, "negative_prompt"),
                    width: optional_u64(args, "width"),
                    height: optional_u64(args, "height"),
                })
            },
        ),
        forwarding_tool(
            env,
            ToolMetadata::new("clear_canvas", "Clear the image canvas", ToolCategory::Image),
            ToolSchema::empty(),
            |_| Ok(HostCommand::ClearCanvas),
        ),
    ]
}

pub(super) fn web_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    vec![
        forwarding_tool(
            env,
            ToolMetadata::new("search_web", "Search the internet", ToolCategory::Web),
            ToolSchema::empty()
                .with_property("query", "string", "Search query", true)
                .with_property("max_results", "integer", "Maximum number of results", false),
            |args| {
                Ok(HostCommand::WebSearch {
                    query: required_str(args, "query")?,
                    max_results: optional_u64(args, "max_results"),
                })
            },
        ),
        forwarding_tool(
            env,
            ToolMetadata::new(
                "scrape_website",
                "Fetch and extract the text of a web page",
                ToolCategory::Web,
            ),
            ToolSchema::empty().with_property("url", "string", "Page address", true),
            |args| {
                let url = required_str(args, "url")?;
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ToolError::invalid_argument("url", "must be an http(s) URL"));
                }
                Ok(HostCommand::ScrapeWebsite { url })
            },
        ),
    ]
}

pub(super) fn code_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    vec![forwarding_tool(
        env,
        ToolMetadata::new(
            "execute_code",
            "Run a code snippet in the host's sandbox",
            ToolCategory::Code,
        ),
        ToolSchema::empty()
            .with_property("code", "string", "Source to run", true)
            .with_property("language", "string", "Language of the snippet (default python)", false),
        |args| {
            Ok(HostCommand::ExecuteCode {
                language: optional_str(args, "language").unwrap_or_else(|| "python".to_string()),
                code: required_str(args, "code")?,
            })
        },
    )]
}

pub(super) fn system_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    vec![
        forwarding_tool(
            env,
            ToolMetadata::new(
                "quit_application",
                "Close the application",
                ToolCategory::System,
            ),
            ToolSchema::empty(),
            |_| Ok(HostCommand::QuitApplication),
        ),
        forwarding_tool(
            env,
            ToolMetadata::new(
                "toggle_tts",
                "Turn text-to-speech on or off",
                ToolCategory::System,
            ),
            ToolSchema::empty().with_property(
                "enabled",
                "boolean",
                "Desired state; omitted toggles",
                false,
            ),
            |args| {
                Ok(HostCommand::ToggleTts {
                    enabled: optional_bool(args, "enabled"),
                })
            },
        ),
    ]
}

pub(super) fn autonomous_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    vec![
        forwarding_tool(
            env,
            ToolMetadata::new(
                "set_autonomous_mode",
                "Enable or disable autonomous operation",
                ToolCategory::Autonomous,
            ),
            ToolSchema::empty().with_property("enabled", "boolean", "Desired state", true),
            |args| {
                let enabled = optional_bool(args, "enabled")
                    .ok_or_else(|| ToolError::invalid_argument("enabled", "expected a boolean"))?;
                Ok(HostCommand::SetAutonomousMode { enabled })
            },
        ),
        forwarding_tool(
            env,
            ToolMetadata::new(
                "request_user_approval",
                "Ask the user to approve an action before it is taken",
                ToolCategory::Autonomous,
            ),
            ToolSchema::empty()
                .with_property("action", "string", "Action needing approval", true)
                .with_property("reason", "string", "Why the action is needed", false),
            |args| {
                Ok(HostCommand::RequestApproval {
                    action: required_str(args, "action")?,
                    reason: optional_str(args, "reason"),
                })
            },
        ),
    ]
}

/// `clear_conversation` lives with the conversation tools but is host-side
pub(super) fn clear_conversation(env: &Arc<ToolEnvironment>) -> BoxedTool {
    forwarding_tool(
        env,
        ToolMetadata::new(
            "clear_conversation",
            "Start a fresh conversation",
            ToolCategory::Conversation,
        ),
        ToolSchema::empty(),
        |_: &Value| Ok(HostCommand::ClearConversation),
    )
}
