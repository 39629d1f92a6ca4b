//! Expert agent contract
//!
//! An expert agent declares capabilities and executes tasks. The router only
//! depends on this trait; concrete experts live in `experts`.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::capability::CapabilityRegistry;
use super::context::TaskContext;
use crate::error::Result;

/// What an agent returns for a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Whether the agent considers the task handled
    pub success: bool,

    /// The agent's output
    pub result: Value,

    /// Free-form details about how the result was produced
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AgentResponse {
    /// A successful response
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            result,
            metadata: Map::new(),
        }
    }

    /// An unsuccessful response; the agent ran but could not complete the task
    pub fn failure(result: Value) -> Self {
        Self {
            success: false,
            result,
            metadata: Map::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Contract for agents the router can select and invoke
#[async_trait]
pub trait ExpertAgent: Send + Sync {
    /// Unique agent name
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Declared capabilities
    fn capabilities(&self) -> &CapabilityRegistry;

    /// Relevance of `task` for this agent, in `[0, 1]`
    fn relevance(&self, task: &str, _context: Option<&TaskContext>) -> f64 {
        self.capabilities().score(task)
    }

    /// Execute a task
    ///
    /// Returning `Err` marks the invocation as failed; the router records the
    /// error for this agent and carries on with the others.
    async fn execute_task(&self, task: &str, context: &TaskContext) -> Result<AgentResponse>;
}

/// Type alias for shared agents
pub type BoxedAgent = Arc<dyn ExpertAgent>;

type AgentHandler =
    Arc<dyn Fn(String, TaskContext) -> BoxFuture<'static, Result<AgentResponse>> + Send + Sync>;

/// Agent backed by an async closure
///
/// Useful for embedding application-specific behaviour without writing a
/// dedicated type.
pub struct FnAgent {
    name: String,
    description: String,
    capabilities: CapabilityRegistry,
    handler: AgentHandler,
}

impl FnAgent {
    /// Create a closure-backed agent
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(String, TaskContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<AgentResponse>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            capabilities: CapabilityRegistry::new(),
            handler: Arc::new(move |task, ctx| Box::pin(handler(task, ctx))),
        }
    }

    /// Declare a capability
    pub fn with_capability(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        keywords: impl IntoIterator<Item = impl AsRef<str>>,
        priority: u8,
    ) -> Self {
        self.capabilities
            .register_capability(name, description, keywords, priority);
        self
    }
}

impl std::fmt::Debug for FnAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAgent")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities.len())
            .finish()
    }
}

#[async_trait]
impl ExpertAgent for FnAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    async fn execute_task(&self, task: &str, context: &TaskContext) -> Result<AgentResponse> {
        (self.handler)(task.to_string(), context.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_agent_executes_handler() {
        let agent = FnAgent::new("echo", "Echoes the task", |task, _ctx| async move {
            Ok(AgentResponse::success(json!(task)))
        })
        .with_capability("echo", "Repeat things", ["echo", "repeat"], 5);

        let response = agent
            .execute_task("repeat this", &TaskContext::new())
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.result, json!("repeat this"));
        assert!(agent.relevance("please repeat", None) > 0.0);
    }

    #[tokio::test]
    async fn test_fn_agent_propagates_errors() {
        let agent = FnAgent::new("broken", "Always fails", |_, _| async move {
            Err(RunnerError::agent("broken", "boom"))
        });

        let err = agent
            .execute_task("anything", &TaskContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_response_builders() {
        let response = AgentResponse::failure(json!("nope")).with_metadata("reason", json!("x"));
        assert!(!response.success);
        assert_eq!(response.metadata["reason"], "x");
    }
}
