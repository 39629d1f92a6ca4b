//! Capability declarations and task relevance scoring
//!
//! Every expert agent declares the skills it has as a list of capabilities.
//! A capability carries matching keywords and a priority weight; the score
//! of a task against an agent is the score of its best matching capability.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Highest capability priority; priorities are weighted as `priority / MAX_PRIORITY`
pub const MAX_PRIORITY: u8 = 10;

/// Priority used when an agent does not specify one
pub const DEFAULT_PRIORITY: u8 = 5;

/// A named skill an agent declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Capability name
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Lowercase keywords matched against task text
    pub keywords: BTreeSet<String>,

    /// Priority weight, `0..=MAX_PRIORITY`
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl Capability {
    /// Create a capability, normalizing keywords and clamping the priority
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        keywords: impl IntoIterator<Item = impl AsRef<str>>,
        priority: u8,
    ) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            name: name.into(),
            description: description.into(),
            keywords,
            priority: priority.min(MAX_PRIORITY),
        }
    }

    /// Priority as a weight in `[0, 1]`
    pub fn weight(&self) -> f64 {
        f64::from(self.priority) / f64::from(MAX_PRIORITY)
    }

    /// Keywords of this capability found in `task`
    pub fn matched_keywords<'a>(&'a self, task: &str) -> Vec<&'a str> {
        let task = task.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| task.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect()
    }
}

/// Score how well `task` matches a single capability, in `[0, 1]`.
///
/// The score is the fraction of the capability's keywords that appear in the
/// lowercased task, weighted by the capability priority.
pub fn score_capability(task: &str, capability: &Capability) -> f64 {
    if capability.keywords.is_empty() || task.trim().is_empty() {
        return 0.0;
    }

    let task = task.to_lowercase();
    let matched = capability
        .keywords
        .iter()
        .filter(|k| task.contains(k.as_str()))
        .count();

    if matched == 0 {
        return 0.0;
    }

    let fraction = matched as f64 / capability.keywords.len() as f64;
    (fraction * capability.weight()).clamp(0.0, 1.0)
}

/// The ordered capabilities of one agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityRegistry {
    capabilities: Vec<Capability>,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a capability
    pub fn register_capability(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        keywords: impl IntoIterator<Item = impl AsRef<str>>,
        priority: u8,
    ) -> &mut Self {
        self.capabilities
            .push(Capability::new(name, description, keywords, priority));
        self
    }

    /// Declare a capability (builder form)
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// All capabilities in declaration order
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Look up a capability by name
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.name == name)
    }

    /// Relevance of `task` for the agent owning these capabilities.
    ///
    /// This is the best single capability score, so one specific match is
    /// not diluted by unrelated capabilities.
    pub fn score(&self, task: &str) -> f64 {
        self.best_match(task).map(|(_, s)| s).unwrap_or(0.0)
    }

    /// Best matching capability and its score; earlier capabilities win ties
    pub fn best_match(&self, task: &str) -> Option<(&Capability, f64)> {
        let mut best: Option<(&Capability, f64)> = None;
        for capability in &self.capabilities {
            let score = score_capability(task, capability);
            if score <= 0.0 {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((capability, score)),
            }
        }
        best
    }

    /// Number of capabilities
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if no capability is declared
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod capability_tests {
    use super::*;

    fn story() -> Capability {
        Capability::new("storytelling", "Write stories", ["story", "write"], 9)
    }

    #[test]
    fn test_keywords_are_normalized() {
        let cap = Capability::new("x", "", [" Story ", "WRITE", "", "  "], 5);
        let keywords: Vec<&str> = cap.keywords.iter().map(|k| k.as_str()).collect();
        assert_eq!(keywords, vec!["story", "write"]);
    }

    #[test]
    fn test_priority_is_clamped() {
        let cap = Capability::new("x", "", ["a"], 42);
        assert_eq!(cap.priority, MAX_PRIORITY);
        assert_eq!(cap.weight(), 1.0);
    }

    #[test]
    fn test_full_match_is_weighted_by_priority() {
        let score = score_capability("Please WRITE a short story", &story());
        assert!((score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_partial_match() {
        let score = score_capability("write me a poem", &story());
        assert!((score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_no_match_scores_zero() {
        assert_eq!(score_capability("find the weather", &story()), 0.0);
    }

    #[test]
    fn test_empty_task_scores_zero() {
        assert_eq!(score_capability("", &story()), 0.0);
        assert_eq!(score_capability("   ", &story()), 0.0);
    }

    #[test]
    fn test_empty_keywords_never_match() {
        let cap = Capability::new("nothing", "", Vec::<String>::new(), 10);
        assert_eq!(score_capability("anything at all", &cap), 0.0);
    }

    #[test]
    fn test_best_capability_wins() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_capability("broad", "", ["a1", "a2", "a3", "a4"], 10)
            .register_capability("specific", "", ["poem"], 8);

        let (cap, score) = registry.best_match("write a poem about a1").unwrap();
        assert_eq!(cap.name, "specific");
        assert!((score - 0.8).abs() < 1e-9);
        assert!((registry.score("write a poem about a1") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_first_capability() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_capability("first", "", ["plan"], 6)
            .register_capability("second", "", ["plan"], 6);

        let (cap, _) = registry.best_match("plan my week").unwrap();
        assert_eq!(cap.name, "first");
    }

    #[test]
    fn test_empty_registry_scores_zero() {
        let registry = CapabilityRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.score("write a story"), 0.0);
        assert!(registry.best_match("write a story").is_none());
    }

    #[test]
    fn test_matched_keywords() {
        let cap = story();
        assert_eq!(cap.matched_keywords("Write something"), vec!["write"]);
    }

    #[test]
    fn test_priority_defaults_when_omitted() {
        let cap: Capability =
            serde_json::from_str(r#"{ "name": "notes", "keywords": ["note"] }"#).unwrap();
        assert_eq!(cap.priority, DEFAULT_PRIORITY);
        assert!(cap.description.is_empty());
        assert_eq!(score_capability("take a note", &cap), 0.5);
    }
}
