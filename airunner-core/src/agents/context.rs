//! Task context handed to expert agents
//!
//! A `TaskContext` is an owned value: caller-supplied key/value pairs plus the
//! collaboration trace of results produced earlier in the same chain. It is
//! extended by value between collaboration steps and never shared mutably.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output of an agent that ran earlier in a collaboration chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousResult {
    /// Agent that produced the result
    pub agent: String,
    /// The agent's `result` value
    pub result: Value,
}

impl PreviousResult {
    pub fn new(agent: impl Into<String>, result: Value) -> Self {
        Self {
            agent: agent.into(),
            result,
        }
    }
}

/// Context for a routed or collaborative task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    #[serde(flatten)]
    values: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    previous_results: Vec<PreviousResult>,
}

impl TaskContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object.
    ///
    /// A `previous_results` key, if present, is parsed into the trace.
    /// Non-object values produce an empty context.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Add a value
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Caller-supplied values
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Results of agents that ran earlier in the chain, oldest first
    pub fn previous_results(&self) -> &[PreviousResult] {
        &self.previous_results
    }

    /// Return a new context with `result` appended to the trace
    pub fn with_previous_result(mut self, result: PreviousResult) -> Self {
        self.previous_results.push(result);
        self
    }

    /// Serialize to a JSON object
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
