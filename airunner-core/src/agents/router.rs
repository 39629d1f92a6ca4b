//! Agent router: task routing, result aggregation and collaboration
//!
//! `route_task` ranks agents through the registry and invokes the best ones,
//! fanning out concurrently when several are selected. `collaborate` runs a
//! caller-chosen chain of agents where each one sees the results of those
//! before it.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::agent::{AgentResponse, BoxedAgent};
use super::aggregate::{AgentOutcome, AggregatedResult, aggregate_results};
use super::context::{PreviousResult, TaskContext};
use super::registry::{AgentRegistry, AgentScore};
use crate::config::RoutingConfig;
use crate::error::RunnerError;

/// Error reported when no agent clears the relevance threshold
pub const NO_SUITABLE_AGENTS: &str = "No suitable agents found";

/// Error reported when none of the requested collaborators is registered
pub const NO_COLLABORATORS: &str = "No requested agents were available";

/// Output of a routed task
///
/// Serialized without a tag. When reading a `RoutingResult` back, the
/// variant is chosen by the number of agents used, not by the value's shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoutedOutput {
    /// Several agents ran; their outcomes are combined
    Aggregated(AggregatedResult),
    /// A single agent ran; this is its raw `result`
    Single(Value),
}

/// Result of `AgentRouter::route_task`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRoutingResult")]
pub struct RoutingResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RoutedOutput>,

    /// Metadata of the agent, when exactly one ran successfully
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// Agents invoked, in selection order
    pub agents_used: Vec<String>,

    /// Scores of the invoked agents, in selection order
    pub scores: Vec<AgentScore>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Wire form of `RoutingResult` before the output variant is known
#[derive(Deserialize)]
struct RawRoutingResult {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    agents_used: Vec<String>,
    scores: Vec<AgentScore>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawRoutingResult> for RoutingResult {
    type Error = serde_json::Error;

    fn try_from(raw: RawRoutingResult) -> Result<Self, Self::Error> {
        let result = match raw.result {
            Some(value) if raw.agents_used.len() > 1 => {
                Some(RoutedOutput::Aggregated(serde_json::from_value(value)?))
            }
            Some(value) => Some(RoutedOutput::Single(value)),
            None => None,
        };

        Ok(Self {
            success: raw.success,
            result,
            metadata: raw.metadata,
            agents_used: raw.agents_used,
            scores: raw.scores,
            error: raw.error,
        })
    }
}

impl RoutingResult {
    fn no_candidates() -> Self {
        Self {
            success: false,
            result: None,
            metadata: None,
            agents_used: Vec::new(),
            scores: Vec::new(),
            error: Some(NO_SUITABLE_AGENTS.to_string()),
        }
    }

    /// The single agent's raw result, if exactly one agent ran
    pub fn value(&self) -> Option<&Value> {
        match &self.result {
            Some(RoutedOutput::Single(value)) => Some(value),
            _ => None,
        }
    }

    /// The aggregated result, if several agents ran
    pub fn aggregated(&self) -> Option<&AggregatedResult> {
        match &self.result {
            Some(RoutedOutput::Aggregated(aggregated)) => Some(aggregated),
            _ => None,
        }
    }

    /// Score of an invoked agent
    pub fn score_for(&self, agent: &str) -> Option<f64> {
        self.scores.iter().find(|s| s.name == agent).map(|s| s.score)
    }
}

/// Result of `AgentRouter::collaborate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationResult {
    pub success: bool,

    /// Always `true`; distinguishes collaboration output from routing output
    pub collaboration: bool,

    pub result: AggregatedResult,

    /// Agents invoked, in chain order (unknown names are skipped)
    pub agents_used: Vec<String>,

    /// Results handed along the chain
    pub previous_results: Vec<PreviousResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Routes tasks to expert agents
pub struct AgentRouter {
    registry: Arc<AgentRegistry>,
    config: RoutingConfig,
}

impl std::fmt::Debug for AgentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRouter")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

impl AgentRouter {
    /// Create a router with the default routing configuration
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self::with_config(registry, RoutingConfig::default())
    }

    /// Create a router with a specific configuration
    pub fn with_config(registry: Arc<AgentRegistry>, config: RoutingConfig) -> Self {
        Self { registry, config }
    }

    /// The agent registry
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// The routing configuration
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Route a task using the configured threshold and agent count
    pub async fn route(&self, task: &str, context: Option<TaskContext>) -> RoutingResult {
        self.route_task(task, context, self.config.min_score, self.config.max_agents)
            .await
    }

    /// Route a task to the best `max_agents` agents scoring at least `min_score`.
    ///
    /// A single selected agent's result is passed through unchanged; several
    /// results are aggregated. Agent failures never abort the call.
    pub async fn route_task(
        &self,
        task: &str,
        context: Option<TaskContext>,
        min_score: f64,
        max_agents: usize,
    ) -> RoutingResult {
        let request_id = Uuid::new_v4();
        let context = context.unwrap_or_default();

        let candidates = self
            .registry
            .find_agents_for_task(task, Some(&context), min_score);
        if candidates.is_empty() {
            tracing::info!(%request_id, min_score, "No agent cleared the relevance threshold");
            return RoutingResult::no_candidates();
        }

        let selected: Vec<(BoxedAgent, AgentScore)> = candidates
            .into_iter()
            .take(max_agents.max(1))
            .filter_map(|candidate| {
                self.registry
                    .get(&candidate.name)
                    .map(|agent| (agent, candidate))
            })
            .collect();

        tracing::info!(
            %request_id,
            agents = ?selected.iter().map(|(_, c)| c.name.as_str()).collect::<Vec<_>>(),
            "Routing task"
        );

        let outcomes: Vec<AgentOutcome> = if self.config.concurrent && selected.len() > 1 {
            join_all(
                selected
                    .iter()
                    .map(|(agent, candidate)| self.run_candidate(agent, candidate, task, &context)),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(selected.len());
            for (agent, candidate) in &selected {
                outcomes.push(self.run_candidate(agent, candidate, task, &context).await);
            }
            outcomes
        };

        let agents_used = outcomes.iter().map(|o| o.agent.clone()).collect();
        let scores = selected.into_iter().map(|(_, candidate)| candidate).collect();

        if let [outcome] = outcomes.as_slice() {
            return match &outcome.outcome {
                Ok(response) => RoutingResult {
                    success: response.success,
                    result: Some(RoutedOutput::Single(response.result.clone())),
                    metadata: Some(response.metadata.clone()),
                    agents_used,
                    scores,
                    error: None,
                },
                Err(error) => RoutingResult {
                    success: false,
                    result: None,
                    metadata: None,
                    agents_used,
                    scores,
                    error: Some(error.clone()),
                },
            };
        }

        let aggregated = aggregate_results(&outcomes);
        let success = aggregated.any_success();
        tracing::info!(%request_id, success, "Aggregated routed results");

        RoutingResult {
            success,
            result: Some(RoutedOutput::Aggregated(aggregated)),
            metadata: None,
            agents_used,
            scores,
            error: (!success).then(|| "No selected agent completed the task".to_string()),
        }
    }

    /// Run a fixed chain of agents, each seeing the results of the ones before it.
    ///
    /// Unknown agent names are skipped with a warning. Execution is strictly
    /// sequential.
    pub async fn collaborate<S: AsRef<str>>(
        &self,
        task: &str,
        required_agents: &[S],
        context: Option<TaskContext>,
    ) -> CollaborationResult {
        let request_id = Uuid::new_v4();
        let mut context = context.unwrap_or_default();
        let mut outcomes = Vec::with_capacity(required_agents.len());

        for name in required_agents {
            let name = name.as_ref();
            let Some(agent) = self.registry.get(name) else {
                tracing::warn!(%request_id, agent = name, "Skipping unknown agent in collaboration");
                continue;
            };

            tracing::debug!(
                %request_id,
                agent = name,
                previous = context.previous_results().len(),
                "Collaboration step"
            );

            match self.invoke(&agent, task, &context).await {
                Ok(response) => {
                    context = context
                        .with_previous_result(PreviousResult::new(name, response.result.clone()));
                    outcomes.push(AgentOutcome::completed(name, response));
                }
                Err(error) => outcomes.push(AgentOutcome::failed(name, error)),
            }
        }

        let agents_used: Vec<String> = outcomes.iter().map(|o| o.agent.clone()).collect();
        let aggregated = aggregate_results(&outcomes);
        let success = aggregated.any_success();

        let error = if agents_used.is_empty() {
            Some(NO_COLLABORATORS.to_string())
        } else if !success {
            Some("No collaborating agent completed the task".to_string())
        } else {
            None
        };

        tracing::info!(%request_id, agents = ?agents_used, success, "Collaboration finished");

        CollaborationResult {
            success,
            collaboration: true,
            result: aggregated,
            agents_used,
            previous_results: context.previous_results().to_vec(),
            error,
        }
    }

    async fn run_candidate(
        &self,
        agent: &BoxedAgent,
        candidate: &AgentScore,
        task: &str,
        context: &TaskContext,
    ) -> AgentOutcome {
        let outcome = match self.invoke(agent, task, context).await {
            Ok(response) => AgentOutcome::completed(&candidate.name, response),
            Err(error) => AgentOutcome::failed(&candidate.name, error),
        };
        outcome.with_score(candidate.score)
    }

    /// Invoke one agent, converting errors and timeouts into a message
    async fn invoke(
        &self,
        agent: &BoxedAgent,
        task: &str,
        context: &TaskContext,
    ) -> std::result::Result<AgentResponse, String> {
        let execution = agent.execute_task(task, context);

        let outcome = match self.config.agent_timeout {
            Some(limit) => match tokio::time::timeout(limit, execution).await {
                Ok(result) => result,
                Err(_) => Err(RunnerError::AgentTimeout {
                    agent: agent.name().to_string(),
                    timeout: limit,
                }),
            },
            None => execution.await,
        };

        outcome.map_err(|e| {
            tracing::warn!(agent = agent.name(), error = %e, "Agent execution failed");
            e.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::FnAgent;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    fn echo(name: &'static str, keywords: &[&str]) -> BoxedAgent {
        Arc::new(
            FnAgent::new(name, "", move |task, _ctx| async move {
                Ok(AgentResponse::success(json!({ "by": name, "task": task }))
                    .with_metadata("agent", json!(name)))
            })
            .with_capability(name, "", keywords.iter().copied(), 9),
        )
    }

    fn failing(name: &'static str, keywords: &[&str]) -> BoxedAgent {
        Arc::new(
            FnAgent::new(name, "", move |_, _| async move {
                Err(RunnerError::agent(name, "exploded"))
            })
            .with_capability(name, "", keywords.iter().copied(), 9),
        )
    }

    /// Records the context each invocation received
    fn recording(name: &'static str, seen: Arc<Mutex<Vec<(String, TaskContext)>>>) -> BoxedAgent {
        Arc::new(
            FnAgent::new(name, "", move |_, ctx| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push((name.to_string(), ctx));
                    Ok(AgentResponse::success(json!(format!("output of {}", name))))
                }
            })
            .with_capability(name, "", [name], 5),
        )
    }

    fn router(agents: Vec<BoxedAgent>) -> AgentRouter {
        let mut registry = AgentRegistry::new();
        for agent in agents {
            registry.register(agent).unwrap();
        }
        AgentRouter::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_no_suitable_agents() {
        let router = router(vec![echo("creative", &["story", "write"])]);
        let result = router.route_task("check the weather", None, 0.3, 1).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(NO_SUITABLE_AGENTS));
        assert!(result.agents_used.is_empty());
        assert!(result.result.is_none());
    }

    #[tokio::test]
    async fn test_single_agent_passthrough() {
        let router = router(vec![
            echo("creative", &["story", "write"]),
            echo("research", &["search", "find"]),
        ]);
        let result = router
            .route_task("please write a short story", None, 0.3, 1)
            .await;

        assert!(result.success);
        assert_eq!(result.agents_used, vec!["creative"]);
        assert_eq!(
            result.value(),
            Some(&json!({ "by": "creative", "task": "please write a short story" }))
        );
        assert_eq!(result.metadata.unwrap()["agent"], "creative");
        assert!(result.scores[0].score > 0.3);
    }

    #[tokio::test]
    async fn test_single_agent_success_flag_mirrors_agent() {
        let agent: BoxedAgent = Arc::new(
            FnAgent::new("shy", "", |_, _| async move {
                Ok(AgentResponse::failure(json!("declined")))
            })
            .with_capability("shy", "", ["help"], 9),
        );
        let router = router(vec![agent]);
        let result = router.route_task("help me", None, 0.3, 1).await;

        assert!(!result.success);
        assert_eq!(result.value(), Some(&json!("declined")));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_single_agent_error() {
        let router = router(vec![failing("creative", &["story"])]);
        let result = router.route_task("a story", None, 0.3, 1).await;

        assert!(!result.success);
        assert_eq!(result.agents_used, vec!["creative"]);
        assert!(result.error.unwrap().contains("exploded"));
    }

    #[tokio::test]
    async fn test_two_agents_are_aggregated() {
        let router = router(vec![
            echo("creative", &["story", "write"]),
            echo("research", &["search", "find"]),
        ]);
        let result = router
            .route_task("write a story and then find supporting facts", None, 0.3, 2)
            .await;

        assert!(result.success);
        assert_eq!(result.agents_used, vec!["creative", "research"]);
        let aggregated = result.aggregated().unwrap();
        assert_eq!(aggregated.individual_results.len(), 2);
        assert_eq!(aggregated.primary_result.as_ref().unwrap()["by"], "creative");

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["result"]["individual_results"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_routing_result_reads_back_by_agent_count() {
        let lookalike: BoxedAgent = Arc::new(
            FnAgent::new("mimic", "", |_, _| async move {
                Ok(AgentResponse::success(json!({ "individual_results": [] })))
            })
            .with_capability("mimic", "", ["mimic"], 9),
        );
        let router = router(vec![lookalike, echo("writer", &["write"])]);

        let single = router.route("mimic this", None).await;
        let json = serde_json::to_string(&single).unwrap();
        let back: RoutingResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, single);
        assert_eq!(back.value(), Some(&json!({ "individual_results": [] })));

        let combined = router.route_task("mimic and write", None, 0.0, 2).await;
        let json = serde_json::to_string(&combined).unwrap();
        let back: RoutingResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, combined);
        assert_eq!(back.aggregated().unwrap().individual_results.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let router = router(vec![
            echo("a", &["job"]),
            failing("b", &["job"]),
            echo("c", &["job"]),
        ]);
        let result = router.route_task("a job", None, 0.3, 3).await;

        assert!(result.success);
        let entries = &result.aggregated().unwrap().individual_results;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.iter().filter(|e| e.success).count(), 2);
        assert!(entries[1].error.as_ref().unwrap().contains("exploded"));
    }

    #[tokio::test]
    async fn test_all_failures() {
        let router = router(vec![failing("a", &["job"]), failing("b", &["job"])]);
        let result = router.route_task("a job", None, 0.3, 2).await;

        assert!(!result.success);
        let aggregated = result.aggregated().unwrap();
        assert_eq!(aggregated.individual_results.len(), 2);
        assert!(aggregated.primary_result.is_none());
    }

    #[tokio::test]
    async fn test_zero_max_agents_selects_one() {
        let router = router(vec![echo("a", &["job"]), echo("b", &["job"])]);
        let result = router.route_task("a job", None, 0.3, 0).await;
        assert_eq!(result.agents_used, vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_fan_out_keeps_score_order() {
        let finished = Arc::new(Mutex::new(Vec::new()));

        let slow_finished = Arc::clone(&finished);
        let slow: BoxedAgent = Arc::new(
            FnAgent::new("slow", "", move |_, _| {
                let finished = Arc::clone(&slow_finished);
                async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    finished.lock().unwrap().push("slow");
                    Ok(AgentResponse::success(json!("slow")))
                }
            })
            .with_capability("slow", "", ["render", "scene"], 10),
        );

        let fast_finished = Arc::clone(&finished);
        let fast: BoxedAgent = Arc::new(
            FnAgent::new("fast", "", move |_, _| {
                let finished = Arc::clone(&fast_finished);
                async move {
                    finished.lock().unwrap().push("fast");
                    Ok(AgentResponse::success(json!("fast")))
                }
            })
            .with_capability("fast", "", ["render"], 5),
        );

        let router = router(vec![fast, slow]);
        let result = router.route_task("render the scene", None, 0.3, 2).await;

        assert_eq!(*finished.lock().unwrap(), vec!["fast", "slow"]);
        assert_eq!(result.agents_used, vec!["slow", "fast"]);
        assert_eq!(result.scores[0].name, "slow");
        assert_eq!(
            result.aggregated().unwrap().primary_result,
            Some(json!("slow"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_recorded_per_agent() {
        let stuck: BoxedAgent = Arc::new(
            FnAgent::new("stuck", "", |_, _| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(AgentResponse::success(json!("late")))
            })
            .with_capability("stuck", "", ["job"], 9),
        );

        let mut registry = AgentRegistry::new();
        registry.register(stuck).unwrap();
        registry.register(echo("quick", &["job"])).unwrap();

        let config = RoutingConfig {
            agent_timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let router = AgentRouter::with_config(Arc::new(registry), config);
        let result = router.route_task("a job", None, 0.3, 2).await;

        assert!(result.success);
        let entries = &result.aggregated().unwrap().individual_results;
        assert!(entries[0].error.as_ref().unwrap().contains("timed out"));
        assert!(entries[1].success);
    }

    #[tokio::test]
    async fn test_sequential_routing_when_not_concurrent() {
        let mut registry = AgentRegistry::new();
        registry.register(echo("a", &["job"])).unwrap();
        registry.register(echo("b", &["job"])).unwrap();

        let config = RoutingConfig {
            concurrent: false,
            max_agents: 2,
            ..Default::default()
        };
        let router = AgentRouter::with_config(Arc::new(registry), config);
        let result = router.route("a job", None).await;

        assert_eq!(result.agents_used, vec!["a", "b"]);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_collaboration_threads_previous_results() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = router(vec![
            recording("A", Arc::clone(&seen)),
            recording("B", Arc::clone(&seen)),
        ]);

        let result = router
            .collaborate("joint task", &["A", "B"], Some(TaskContext::new().with_value("k", json!(1))))
            .await;

        assert!(result.success);
        assert!(result.collaboration);
        assert_eq!(result.agents_used, vec!["A", "B"]);

        let seen = seen.lock().unwrap();
        assert!(seen[0].1.previous_results().is_empty());
        assert_eq!(seen[1].0, "B");
        assert_eq!(seen[1].1.previous_results().len(), 1);
        assert_eq!(seen[1].1.previous_results()[0].agent, "A");
        assert_eq!(seen[1].1.previous_results()[0].result, json!("output of A"));
        assert_eq!(seen[1].1.get("k"), Some(&json!(1)));

        assert_eq!(result.previous_results.len(), 2);
        assert_eq!(result.result.primary_result, Some(json!("output of A")));
    }

    #[tokio::test]
    async fn test_collaboration_order_is_caller_defined() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = router(vec![
            recording("A", Arc::clone(&seen)),
            recording("B", Arc::clone(&seen)),
        ]);

        router.collaborate("joint task", &["B", "A"], None).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "B");
        assert_eq!(seen[1].0, "A");
        assert_eq!(seen[1].1.previous_results()[0].agent, "B");
    }

    #[tokio::test]
    async fn test_collaboration_skips_unknown_agents() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = router(vec![
            recording("A", Arc::clone(&seen)),
            recording("B", Arc::clone(&seen)),
        ]);

        let result = router
            .collaborate("joint task", &["A", "nonexistent", "B"], None)
            .await;

        assert!(result.success);
        assert_eq!(result.agents_used, vec!["A", "B"]);
        assert_eq!(result.result.individual_results.len(), 2);
    }

    #[tokio::test]
    async fn test_collaboration_continues_after_failure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = router(vec![
            failing("A", &["a"]),
            recording("B", Arc::clone(&seen)),
        ]);

        let result = router.collaborate("joint task", &["A", "B"], None).await;

        assert!(result.success);
        assert_eq!(result.agents_used, vec!["A", "B"]);
        assert!(result.result.individual_results[0].error.is_some());
        assert!(seen.lock().unwrap()[0].1.previous_results().is_empty());
        assert_eq!(result.result.primary_result, Some(json!("output of B")));
    }

    #[tokio::test]
    async fn test_collaboration_with_no_known_agents() {
        let router = router(vec![echo("A", &["a"])]);
        let result = router.collaborate("task", &["X", "Y"], None).await;

        assert!(!result.success);
        assert!(result.agents_used.is_empty());
        assert_eq!(result.error.as_deref(), Some(NO_COLLABORATORS));
    }
}
