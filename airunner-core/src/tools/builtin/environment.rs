//! Shared state and host link for built-in tools

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::{RwLock, mpsc};

use crate::config::ToolsConfig;
use crate::tools::ToolError;

/// Request forwarded to the host application
///
/// The host (UI, model runtime, TTS engine) owns the side effect; the tool
/// only describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    RagSearch {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        top_k: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        collection: Option<String>,
    },
    GenerateImage {
        prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        negative_prompt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u64>,
    },
    ClearCanvas,
    WebSearch {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_results: Option<u64>,
    },
    ScrapeWebsite {
        url: String,
    },
    ExecuteCode {
        language: String,
        code: String,
    },
    QuitApplication,
    ToggleTts {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
    },
    ClearConversation,
    SetAutonomousMode {
        enabled: bool,
    },
    RequestApproval {
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl HostCommand {
    /// Command name as serialized in the `command` tag
    pub fn name(&self) -> &'static str {
        match self {
            HostCommand::RagSearch { .. } => "rag_search",
            HostCommand::GenerateImage { .. } => "generate_image",
            HostCommand::ClearCanvas => "clear_canvas",
            HostCommand::WebSearch { .. } => "web_search",
            HostCommand::ScrapeWebsite { .. } => "scrape_website",
            HostCommand::ExecuteCode { .. } => "execute_code",
            HostCommand::QuitApplication => "quit_application",
            HostCommand::ToggleTts { .. } => "toggle_tts",
            HostCommand::ClearConversation => "clear_conversation",
            HostCommand::SetAutonomousMode { .. } => "set_autonomous_mode",
            HostCommand::RequestApproval { .. } => "request_approval",
        }
    }
}

/// The assistant's current mood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub mood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// State shared by the built-in tools of one tool manager
pub struct ToolEnvironment {
    workspace_root: PathBuf,
    user_data: RwLock<Map<String, Value>>,
    mood: RwLock<Option<Mood>>,
    host: Option<mpsc::Sender<HostCommand>>,
}

impl std::fmt::Debug for ToolEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEnvironment")
            .field("workspace_root", &self.workspace_root)
            .field("host_attached", &self.host.is_some())
            .finish()
    }
}

impl ToolEnvironment {
    /// Environment without a host application
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            user_data: RwLock::new(Map::new()),
            mood: RwLock::new(None),
            host: None,
        }
    }

    /// Environment plus the receiving end of its host command channel
    pub fn from_config(config: &ToolsConfig) -> (Self, mpsc::Receiver<HostCommand>) {
        let (sender, receiver) = mpsc::channel(config.command_buffer.max(1));
        (
            Self::new(config.workspace_root.clone()).with_host(sender),
            receiver,
        )
    }

    /// Attach a host command sender
    pub fn with_host(mut self, host: mpsc::Sender<HostCommand>) -> Self {
        self.host = Some(host);
        self
    }

    /// Seed stored user data
    pub fn with_user_data(mut self, data: Map<String, Value>) -> Self {
        self.user_data = RwLock::new(data);
        self
    }

    /// Directory the file tools are confined to
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn has_host(&self) -> bool {
        self.host.as_ref().is_some_and(|h| !h.is_closed())
    }

    /// Snapshot of stored user data
    pub async fn user_data(&self) -> Map<String, Value> {
        self.user_data.read().await.clone()
    }

    pub async fn user_value(&self, key: &str) -> Option<Value> {
        self.user_data.read().await.get(key).cloned()
    }

    /// Store a value, returning the previous one
    pub async fn store_user_value(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.user_data.write().await.insert(key.into(), value)
    }

    pub async fn mood(&self) -> Option<Mood> {
        self.mood.read().await.clone()
    }

    pub async fn set_mood(&self, mood: impl Into<String>, emoji: Option<String>) -> Mood {
        let mood = Mood {
            mood: mood.into(),
            emoji,
            updated_at: Utc::now(),
        };
        *self.mood.write().await = Some(mood.clone());
        mood
    }

    /// Forward a command to the host application
    pub async fn send(&self, command: HostCommand) -> Result<(), ToolError> {
        let Some(host) = &self.host else {
            return Err(ToolError::unavailable(format!(
                "No host application attached to handle '{}'",
                command.name()
            )));
        };

        let name = command.name();
        host.send(command).await.map_err(|_| {
            ToolError::unavailable(format!(
                "Host application stopped receiving commands ('{}' dropped)",
                name
            ))
        })?;
        tracing::debug!(command = name, "Forwarded host command");
        Ok(())
    }
}
