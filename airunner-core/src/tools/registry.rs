//! Tool registry for registration, lookup and category filtering
//!
//! Tools are kept in registration order; listings and category filters
//! return them in that order.

use std::collections::HashMap;
use std::sync::Arc;

use super::category::ToolCategory;
use super::tool::BoxedTool;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Tool with this name already exists
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),
}

/// Registry of callable tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<BoxedTool>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// Returns an error if a tool with the same name is already registered.
    pub fn register(&mut self, tool: BoxedTool) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Register multiple tools at once
    ///
    /// Stops at the first duplicate name.
    pub fn register_all(
        &mut self,
        tools: impl IntoIterator<Item = BoxedTool>,
    ) -> Result<(), RegistryError> {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(())
    }

    /// Unregister a tool by name
    pub fn unregister(&mut self, name: &str) -> Option<BoxedTool> {
        let position = self.index.remove(name)?;
        let tool = self.tools.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(tool)
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&BoxedTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All tools in registration order
    pub fn all(&self) -> &[BoxedTool] {
        &self.tools
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Tools of one category, in registration order
    pub fn by_category(&self, category: ToolCategory) -> Vec<&BoxedTool> {
        self.tools
            .iter()
            .filter(|t| t.category() == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Shared handle to a registered tool
    pub fn get_shared(&self, name: &str) -> Option<BoxedTool> {
        self.get(name).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{FnTool, ToolMetadata, ToolSchema};
    use serde_json::json;

    fn tool(name: &str, category: ToolCategory) -> BoxedTool {
        Arc::new(FnTool::new(
            ToolMetadata::new(name, format!("{} tool", name), category),
            ToolSchema::empty().with_property("query", "string", "Query", true),
            |_| async move { Ok(json!(null)) },
        ))
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("search", ToolCategory::Web)).unwrap();

        assert!(registry.contains("search"));
        assert!(registry.get("search").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("search", ToolCategory::Web)).unwrap();

        let err = registry
            .register(tool("search", ToolCategory::Rag))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("search".to_string()));
        assert_eq!(registry.get("search").unwrap().category(), ToolCategory::Web);
    }

    #[test]
    fn test_order_and_category_filter() {
        let mut registry = ToolRegistry::new();
        registry
            .register_all([
                tool("c", ToolCategory::Web),
                tool("a", ToolCategory::Rag),
                tool("b", ToolCategory::Web),
            ])
            .unwrap();

        assert_eq!(registry.names(), vec!["c", "a", "b"]);
        let web: Vec<&str> = registry
            .by_category(ToolCategory::Web)
            .iter()
            .map(|t| t.name())
            .collect();
        assert_eq!(web, vec!["c", "b"]);
    }

    #[test]
    fn test_unregister_keeps_index_consistent() {
        let mut registry = ToolRegistry::new();
        registry
            .register_all([
                tool("a", ToolCategory::Web),
                tool("b", ToolCategory::Web),
                tool("c", ToolCategory::Web),
            ])
            .unwrap();

        assert!(registry.unregister("a").is_some());
        assert_eq!(registry.get("c").unwrap().name(), "c");
        assert_eq!(registry.names(), vec!["b", "c"]);
    }
}
