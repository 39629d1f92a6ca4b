//! Error types for AI Runner agent operations

use std::time::Duration;

use crate::tools::ToolError;

/// Result type for AI Runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Error types for the agent and tool core
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// An agent failed while executing a task
    #[error("Agent '{agent}' failed: {message}")]
    Agent { agent: String, message: String },

    /// An agent with the same name is already registered
    #[error("Agent '{0}' is already registered")]
    DuplicateAgent(String),

    /// An agent did not finish within the configured timeout
    #[error("Agent '{agent}' timed out after {timeout:?}")]
    AgentTimeout { agent: String, timeout: Duration },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Tool error
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl RunnerError {
    /// Build an agent failure for `agent`
    pub fn agent(agent: impl Into<String>, message: impl Into<String>) -> Self {
        RunnerError::Agent {
            agent: agent.into(),
            message: message.into(),
        }
    }
}

impl From<String> for RunnerError {
    fn from(s: String) -> Self {
        RunnerError::Other(s)
    }
}

impl From<&str> for RunnerError {
    fn from(s: &str) -> Self {
        RunnerError::Other(s.to_string())
    }
}

impl From<figment::Error> for RunnerError {
    fn from(err: figment::Error) -> Self {
        RunnerError::Configuration(err.to_string())
    }
}
