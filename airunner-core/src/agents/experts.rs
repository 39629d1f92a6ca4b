//! Built-in expert agents
//!
//! Each expert turns a task into a structured work plan: the capability that
//! matched, the steps to follow and the tool categories the conversation
//! layer should expose while carrying it out. Plans produced earlier in a
//! collaboration chain are referenced through `builds_on`.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::agent::{AgentResponse, ExpertAgent};
use super::capability::CapabilityRegistry;
use super::context::TaskContext;
use crate::error::Result;
use crate::tools::ToolCategory;

/// Shared description of an expert: identity, capabilities and tool affinity
#[derive(Debug, Clone)]
struct ExpertProfile {
    name: &'static str,
    description: &'static str,
    capabilities: CapabilityRegistry,
    tool_categories: Vec<ToolCategory>,
}

impl ExpertProfile {
    /// Build the plan response for `task`; `steps_for` maps a capability name to its steps
    fn respond(
        &self,
        task: &str,
        context: &TaskContext,
        steps_for: fn(&str) -> &'static [&'static str],
    ) -> AgentResponse {
        let builds_on: Vec<&str> = context
            .previous_results()
            .iter()
            .map(|p| p.agent.as_str())
            .collect();

        let Some((capability, score)) = self.capabilities.best_match(task) else {
            return AgentResponse::failure(json!({
                "agent": self.name,
                "task": task,
                "reason": format!("'{}' has no capability matching this task", self.name),
            }))
            .with_metadata("agent", json!(self.name))
            .with_metadata("builds_on", json!(builds_on));
        };

        let result = json!({
            "agent": self.name,
            "task": task,
            "capability": capability.name,
            "matched_keywords": capability.matched_keywords(task),
            "steps": steps_for(&capability.name),
            "suggested_tools": self.tool_categories,
            "builds_on": builds_on,
        });

        AgentResponse::success(result)
            .with_metadata("agent", json!(self.name))
            .with_metadata("capability", json!(capability.name))
            .with_metadata("score", json!(score))
            .with_metadata("context_keys", Value::from(context.values().keys().cloned().collect::<Vec<_>>()))
    }
}

macro_rules! expert_agent {
    ($ty:ident) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("name", &self.profile.name)
                    .field("capabilities", &self.profile.capabilities.len())
                    .finish()
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        #[async_trait]
        impl ExpertAgent for $ty {
            fn name(&self) -> &str {
                self.profile.name
            }

            fn description(&self) -> &str {
                self.profile.description
            }

            fn capabilities(&self) -> &CapabilityRegistry {
                &self.profile.capabilities
            }

            async fn execute_task(&self, task: &str, context: &TaskContext) -> Result<AgentResponse> {
                Ok(self.profile.respond(task, context, Self::steps_for))
            }
        }
    };
}

/// Creative writing, ideation and image prompting
pub struct CreativeAgent {
    profile: ExpertProfile,
}

impl CreativeAgent {
    pub fn new() -> Self {
        let mut capabilities = CapabilityRegistry::new();
        capabilities
            .register_capability(
                "creative_writing",
                "Stories, poems and other creative text",
                ["story", "write", "poem", "narrative", "character", "fiction"],
                9,
            )
            .register_capability(
                "brainstorming",
                "Generating and developing ideas",
                ["brainstorm", "idea", "imagine", "invent"],
                8,
            )
            .register_capability(
                "image_prompting",
                "Turning a description into an image prompt",
                ["image", "picture", "draw", "illustrat", "art"],
                7,
            );

        Self {
            profile: ExpertProfile {
                name: "creative",
                description: "Writes stories and poems, brainstorms ideas and crafts image prompts",
                capabilities,
                tool_categories: vec![ToolCategory::Image, ToolCategory::Conversation],
            },
        }
    }

    fn steps_for(capability: &str) -> &'static [&'static str] {
        match capability {
            "creative_writing" => &["outline", "draft", "revise"],
            "brainstorming" => &["diverge", "cluster", "select"],
            "image_prompting" => &["describe subject", "choose style", "compose prompt"],
            _ => &[],
        }
    }
}

expert_agent!(CreativeAgent);

/// Information retrieval and fact finding
pub struct ResearchAgent {
    profile: ExpertProfile,
}

impl ResearchAgent {
    pub fn new() -> Self {
        let mut capabilities = CapabilityRegistry::new();
        capabilities
            .register_capability(
                "web_research",
                "Searching the web for current information",
                ["search", "find", "look up", "latest", "news"],
                9,
            )
            .register_capability(
                "document_research",
                "Answering questions from indexed documents",
                ["document", "knowledge base", "source", "cite"],
                8,
            )
            .register_capability(
                "fact_checking",
                "Verifying claims against sources",
                ["fact", "verify", "supporting", "evidence"],
                8,
            );

        Self {
            profile: ExpertProfile {
                name: "research",
                description: "Finds, verifies and summarizes information from the web and documents",
                capabilities,
                tool_categories: vec![ToolCategory::Web, ToolCategory::Rag],
            },
        }
    }

    fn steps_for(capability: &str) -> &'static [&'static str] {
        match capability {
            "web_research" => &["formulate queries", "search", "summarize findings"],
            "document_research" => &["query index", "rank passages", "answer with citations"],
            "fact_checking" => &["extract claims", "gather evidence", "report verdicts"],
            _ => &[],
        }
    }
}

expert_agent!(ResearchAgent);

/// Programming help
pub struct CodeAgent {
    profile: ExpertProfile,
}

impl CodeAgent {
    pub fn new() -> Self {
        let mut capabilities = CapabilityRegistry::new();
        capabilities
            .register_capability(
                "code_generation",
                "Writing new code",
                ["code", "function", "script", "implement", "program"],
                9,
            )
            .register_capability(
                "debugging",
                "Finding and fixing defects",
                ["bug", "debug", "error", "fix", "traceback"],
                9,
            );

        Self {
            profile: ExpertProfile {
                name: "code",
                description: "Writes, explains and debugs code",
                capabilities,
                tool_categories: vec![ToolCategory::Code, ToolCategory::File],
            },
        }
    }

    fn steps_for(capability: &str) -> &'static [&'static str] {
        match capability {
            "code_generation" => &["clarify requirements", "write code", "test"],
            "debugging" => &["reproduce", "isolate cause", "patch", "verify"],
            _ => &[],
        }
    }
}

expert_agent!(CodeAgent);

/// Scheduling and reminders
pub struct CalendarAgent {
    profile: ExpertProfile,
}

impl CalendarAgent {
    pub fn new() -> Self {
        let mut capabilities = CapabilityRegistry::new();
        capabilities
            .register_capability(
                "scheduling",
                "Planning events and meetings",
                ["schedule", "meeting", "calendar", "appointment", "event"],
                8,
            )
            .register_capability(
                "reminders",
                "Setting reminders",
                ["remind", "reminder", "deadline"],
                7,
            );

        Self {
            profile: ExpertProfile {
                name: "calendar",
                description: "Plans events, meetings and reminders",
                capabilities,
                tool_categories: vec![ToolCategory::Conversation, ToolCategory::System],
            },
        }
    }

    fn steps_for(capability: &str) -> &'static [&'static str] {
        match capability {
            "scheduling" => &["collect constraints", "propose slots", "confirm"],
            "reminders" => &["parse time", "store reminder"],
            _ => &[],
        }
    }
}

expert_agent!(CalendarAgent);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::context::PreviousResult;

    #[tokio::test]
    async fn test_creative_plans_story() {
        let agent = CreativeAgent::new();
        let response = agent
            .execute_task("Write a short story about owls", &TaskContext::new())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.result["capability"], "creative_writing");
        assert_eq!(response.result["steps"][0], "outline");
        assert_eq!(response.result["suggested_tools"][0], "image");
        assert_eq!(response.metadata["agent"], "creative");
    }

    #[tokio::test]
    async fn test_unmatched_task_fails_softly() {
        let agent = CalendarAgent::new();
        let response = agent
            .execute_task("write a poem", &TaskContext::new())
            .await
            .unwrap();

        assert!(!response.success);
        assert!(response.result["reason"].as_str().unwrap().contains("calendar"));
    }

    #[tokio::test]
    async fn test_research_builds_on_previous_results() {
        let agent = ResearchAgent::new();
        let ctx = TaskContext::new()
            .with_previous_result(PreviousResult::new("creative", json!({"draft": "..."})));

        let response = agent
            .execute_task("find supporting facts", &ctx)
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.result["builds_on"], json!(["creative"]));
    }

    #[test]
    fn test_relevance_uses_capabilities() {
        let code = CodeAgent::new();
        assert!(code.relevance("fix this bug in my function", None) > 0.3);
        assert_eq!(code.relevance("paint a sunset", None), 0.0);
    }
}
