//! Agent registry: registration, lookup and task ranking
//!
//! The registry keeps agents in registration order so that ranking ties are
//! resolved deterministically.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::agent::{BoxedAgent, ExpertAgent};
use super::context::TaskContext;
use super::experts::{CalendarAgent, CodeAgent, CreativeAgent, ResearchAgent};
use crate::error::{Result, RunnerError};

/// Default relevance threshold for agent selection
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

/// A ranked candidate for a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentScore {
    /// Agent name
    pub name: String,
    /// Relevance score in `[0, 1]`
    pub score: f64,
}

/// Summary of a registered agent for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// Registry of expert agents
#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<BoxedAgent>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.names())
            .finish()
    }
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in experts
    pub fn with_default_experts() -> Self {
        let mut registry = Self::new();
        let experts: [BoxedAgent; 4] = [
            Arc::new(CreativeAgent::new()),
            Arc::new(ResearchAgent::new()),
            Arc::new(CodeAgent::new()),
            Arc::new(CalendarAgent::new()),
        ];
        for expert in experts {
            if let Err(e) = registry.register(expert) {
                tracing::warn!(error = %e, "Failed to register built-in expert");
            }
        }
        registry
    }

    /// Register an agent
    ///
    /// Returns an error if an agent with the same name is already registered;
    /// the existing agent is kept.
    pub fn register(&mut self, agent: BoxedAgent) -> Result<()> {
        let name = agent.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RunnerError::DuplicateAgent(name));
        }
        if agent.capabilities().is_empty() {
            tracing::warn!(agent = %name, "Registering agent without capabilities; it will never be selected");
        }
        tracing::debug!(agent = %name, "Registered agent");
        self.index.insert(name, self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    /// Remove an agent by name
    pub fn unregister(&mut self, name: &str) -> Option<BoxedAgent> {
        let position = self.index.remove(name)?;
        let agent = self.agents.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(agent)
    }

    /// Get an agent by name
    pub fn get(&self, name: &str) -> Option<BoxedAgent> {
        self.index.get(name).map(|&i| Arc::clone(&self.agents[i]))
    }

    /// Check if an agent is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Agent names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Summaries of all agents in registration order
    pub fn summaries(&self) -> Vec<AgentSummary> {
        self.agents
            .iter()
            .map(|agent| AgentSummary {
                name: agent.name().to_string(),
                description: agent.description().to_string(),
                capabilities: agent
                    .capabilities()
                    .capabilities()
                    .iter()
                    .map(|c| c.name.clone())
                    .collect(),
            })
            .collect()
    }

    /// Rank agents for a task.
    ///
    /// Returns agents scoring at least `min_score` (and above zero), sorted by
    /// descending score. Equal scores keep registration order.
    pub fn find_agents_for_task(
        &self,
        task: &str,
        context: Option<&TaskContext>,
        min_score: f64,
    ) -> Vec<AgentScore> {
        let mut candidates: Vec<AgentScore> = self
            .agents
            .iter()
            .filter_map(|agent| {
                // Overridden `relevance` is clamped to [0, 1].
                let score = agent.relevance(task, context);
                let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
                tracing::debug!(agent = agent.name(), score, "Scored agent");
                (score > 0.0 && score >= min_score).then(|| AgentScore {
                    name: agent.name().to_string(),
                    score,
                })
            })
            .collect();

        // `sort_by` is stable, ties stay in registration order.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }
}
