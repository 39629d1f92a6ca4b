//! Expert agents and task routing
//!
//! Agents declare keyword capabilities; the registry ranks them for a task and
//! the router invokes the best matches, aggregating their results. A fixed
//! chain of agents can also collaborate on one task, each seeing the output of
//! those before it.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use airunner_core::agents::{AgentRegistry, AgentRouter};
//!
//! # async fn example() {
//! let router = AgentRouter::new(Arc::new(AgentRegistry::with_default_experts()));
//! let routed = router.route("write a short story about owls", None).await;
//! assert_eq!(routed.agents_used, vec!["creative"]);
//! # }
//! ```

mod agent;
mod aggregate;
mod capability;
mod context;
mod experts;
mod registry;
mod router;

pub use agent::{AgentResponse, BoxedAgent, ExpertAgent, FnAgent};
pub use aggregate::{AgentOutcome, AggregatedResult, IndividualResult, aggregate_results};
pub use capability::{
    Capability, CapabilityRegistry, DEFAULT_PRIORITY, MAX_PRIORITY, score_capability,
};
pub use context::{PreviousResult, TaskContext};
pub use experts::{CalendarAgent, CodeAgent, CreativeAgent, ResearchAgent};
pub use registry::{AgentRegistry, AgentScore, AgentSummary, DEFAULT_MIN_SCORE};
pub use router::{
    AgentRouter, CollaborationResult, NO_COLLABORATORS, NO_SUITABLE_AGENTS, RoutedOutput,
    RoutingResult,
};
