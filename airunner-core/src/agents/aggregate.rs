//! Result aggregation for multi-agent routing and collaboration
//!
//! Outcomes are kept in the order they were produced for (score order when
//! routing, chain order when collaborating). The primary result is the first
//! successful one in that order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::agent::AgentResponse;

/// Outcome of invoking one agent
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Agent name
    pub agent: String,
    /// Relevance score, when the agent was selected by ranking
    pub score: Option<f64>,
    /// Agent response or error message
    pub outcome: Result<AgentResponse, String>,
}

impl AgentOutcome {
    pub fn completed(agent: impl Into<String>, response: AgentResponse) -> Self {
        Self {
            agent: agent.into(),
            score: None,
            outcome: Ok(response),
        }
    }

    pub fn failed(agent: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            score: None,
            outcome: Err(error.into()),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Whether the agent ran and reported success
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, Ok(response) if response.success)
    }
}

/// Per-agent entry of an aggregated result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualResult {
    pub agent: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl From<&AgentOutcome> for IndividualResult {
    fn from(outcome: &AgentOutcome) -> Self {
        match &outcome.outcome {
            Ok(response) => Self {
                agent: outcome.agent.clone(),
                success: response.success,
                result: Some(response.result.clone()),
                metadata: Some(response.metadata.clone()),
                error: None,
                score: outcome.score,
            },
            Err(error) => Self {
                agent: outcome.agent.clone(),
                success: false,
                result: None,
                metadata: None,
                error: Some(error.clone()),
                score: outcome.score,
            },
        }
    }
}

/// Combined result of several agents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// One entry per invoked agent, in invocation order
    pub individual_results: Vec<IndividualResult>,

    /// `result` of the first successful entry; absent when none succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_result: Option<Value>,
}

impl AggregatedResult {
    /// Whether any agent succeeded
    pub fn any_success(&self) -> bool {
        self.individual_results.iter().any(|r| r.success)
    }
}

/// Aggregate outcomes, keeping their order
pub fn aggregate_results(outcomes: &[AgentOutcome]) -> AggregatedResult {
    let individual_results: Vec<IndividualResult> =
        outcomes.iter().map(IndividualResult::from).collect();

    let primary_result = individual_results
        .iter()
        .find(|r| r.success)
        .and_then(|r| r.result.clone());

    AggregatedResult {
        individual_results,
        primary_result,
    }
}
