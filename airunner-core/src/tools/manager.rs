//! Tool manager: assembles the callable tool set and narrows it per action
//!
//! Built-in tools are registered once at construction. Custom tools are
//! compiled from the store at construction and on `reload_custom_tools`;
//! they are only exposed for `ActionType::ApplicationCommand`.

use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use super::builtin::{COMMON_TOOLS, ToolEnvironment, builtin_tools};
use super::category::ActionType;
use super::custom::{CustomToolStore, ScriptLimits, load_custom_tools};
use super::error::ToolError;
use super::registry::ToolRegistry;
use super::tool::{BoxedTool, ToolSpec};
use crate::config::ToolsConfig;
use crate::error::Result;

/// Owns the built-in and custom tools of one conversation engine
pub struct ToolManager {
    config: ToolsConfig,
    env: Arc<ToolEnvironment>,
    builtins: ToolRegistry,
    custom: RwLock<Vec<BoxedTool>>,
    store: Option<Arc<dyn CustomToolStore>>,
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("builtins", &self.builtins)
            .field("custom", &self.custom_tool_names())
            .field("env", &self.env)
            .finish()
    }
}

impl ToolManager {
    /// Build the tool set: built-ins, then every enabled custom tool that compiles
    ///
    /// # Errors
    ///
    /// Returns an error if two built-in tools share a name.
    pub async fn load(
        config: ToolsConfig,
        env: Arc<ToolEnvironment>,
        store: Option<Arc<dyn CustomToolStore>>,
    ) -> Result<Self> {
        let mut builtins = ToolRegistry::new();
        builtins
            .register_all(builtin_tools(&env))
            .map_err(|e| ToolError::internal(e.to_string()))?;

        let manager = Self {
            config,
            env,
            builtins,
            custom: RwLock::new(Vec::new()),
            store,
        };
        let custom = manager.reload_custom_tools().await;

        tracing::info!(
            builtin = manager.builtins.len(),
            custom,
            "Assembled tool set"
        );
        Ok(manager)
    }

    /// Shared built-in tool state
    pub fn environment(&self) -> &Arc<ToolEnvironment> {
        &self.env
    }

    /// Recompile custom tools from the store, returning how many loaded
    ///
    /// Tools whose names collide with a built-in or an earlier custom tool
    /// are skipped.
    pub async fn reload_custom_tools(&self) -> usize {
        let compiled = match (&self.store, self.config.custom_tools_enabled) {
            (Some(store), true) => {
                load_custom_tools(store, ScriptLimits::from_config(&self.config)).await
            }
            _ => Vec::new(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted = Vec::with_capacity(compiled.len());
        for tool in compiled {
            let name = tool.name().to_string();
            if self.builtins.contains(&name) || !seen.insert(name.clone()) {
                tracing::warn!(tool = %name, "Skipping custom tool with a name already in use");
                continue;
            }
            accepted.push(tool);
        }

        let count = accepted.len();
        *self.custom.write().unwrap_or_else(|e| e.into_inner()) = accepted;
        tracing::debug!(count, "Reloaded custom tools");
        count
    }

    fn custom_tools(&self) -> Vec<BoxedTool> {
        self.custom
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Names of the loaded custom tools
    pub fn custom_tool_names(&self) -> Vec<String> {
        self.custom_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Built-in tools by category, then custom tools in store order
    pub fn get_all_tools(&self) -> Vec<BoxedTool> {
        let mut tools: Vec<BoxedTool> = self.builtins.all().to_vec();
        tools.extend(self.custom_tools());
        tools
    }

    /// Tools exposed for `action`
    ///
    /// `ApplicationCommand` gets every tool. Other actions get the common
    /// tools followed by the built-ins of their categories.
    pub fn get_tools_for_action(&self, action: ActionType) -> Vec<BoxedTool> {
        if action.exposes_all_tools() {
            return self.get_all_tools();
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut tools = Vec::new();

        let common = COMMON_TOOLS.iter().filter_map(|name| self.builtins.get(name));
        let categorized = action
            .categories()
            .iter()
            .flat_map(|category| self.builtins.by_category(*category));

        for tool in common.chain(categorized) {
            if seen.insert(tool.name()) {
                tools.push(Arc::clone(tool));
            }
        }
        tools
    }

    /// Listings of the tools exposed for `action`
    pub fn tool_specs_for_action(&self, action: ActionType) -> Vec<ToolSpec> {
        self.get_tools_for_action(action)
            .iter()
            .map(|t| ToolSpec::from(t.as_ref()))
            .collect()
    }

    /// Look up a built-in or custom tool
    pub fn get(&self, name: &str) -> Option<BoxedTool> {
        self.builtins
            .get_shared(name)
            .or_else(|| self.custom_tools().into_iter().find(|t| t.name() == name))
    }

    /// Validate `args` and call the named tool
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown names, `Validation` for bad arguments, and
    /// whatever the tool itself returns.
    pub async fn invoke(&self, name: &str, args: Value) -> std::result::Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::not_found(name))?;
        let args = if args.is_null() { json!({}) } else { args };

        tool.validate(&args).map_err(ToolError::validation)?;

        tracing::debug!(tool = name, "Invoking tool");
        let result = tool.call(args).await;
        if let Err(e) = &result {
            tracing::debug!(tool = name, error = %e, "Tool call failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::custom::{CustomToolRecord, InMemoryCustomToolStore};
    use crate::tools::{HostCommand, ToolErrorKind};

    fn names(tools: &[BoxedTool]) -> Vec<&str> {
        tools.iter().map(|t| t.name()).collect()
    }

    fn store(records: Vec<CustomToolRecord>) -> Arc<InMemoryCustomToolStore> {
        Arc::new(InMemoryCustomToolStore::new(records))
    }

    fn echo_record(name: &str) -> CustomToolRecord {
        CustomToolRecord::new(
            name,
            "tool { run = function(args) return args end }",
        )
    }

    async fn manager(store: Option<Arc<dyn CustomToolStore>>) -> ToolManager {
        ToolManager::load(
            ToolsConfig::default(),
            Arc::new(ToolEnvironment::new(".")),
            store,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_chat_tools() {
        let manager = manager(None).await;
        let tools = manager.get_tools_for_action(ActionType::Chat);
        assert_eq!(
            names(&tools),
            vec!["get_user_data", "store_user_data", "update_mood", "clear_conversation"]
        );
    }

    #[tokio::test]
    async fn test_common_tools_lead_every_action() {
        let manager = manager(None).await;
        for action in ActionType::ALL {
            let tools = manager.get_tools_for_action(action);
            let names = names(&tools);
            assert!(!names.is_empty());
            for common in COMMON_TOOLS {
                assert_eq!(names.iter().filter(|n| **n == common).count(), 1, "{}", action);
            }
            if !action.exposes_all_tools() {
                assert_eq!(&names[..3], &COMMON_TOOLS);
            }
        }
    }

    #[tokio::test]
    async fn test_image_action() {
        let manager = manager(None).await;
        let tools = manager.get_tools_for_action(ActionType::GenerateImage);
        assert_eq!(
            names(&tools),
            vec!["get_user_data", "store_user_data", "update_mood", "generate_image", "clear_canvas"]
        );
    }

    #[tokio::test]
    async fn test_custom_tools_only_for_application_command() {
        let store: Arc<dyn CustomToolStore> = store(vec![echo_record("echo_args")]);
        let manager = manager(Some(store)).await;

        let all = manager.get_tools_for_action(ActionType::ApplicationCommand);
        assert_eq!(all.last().unwrap().name(), "echo_args");
        assert_eq!(all.len(), manager.get_all_tools().len());

        for action in ActionType::ALL.into_iter().filter(|a| !a.exposes_all_tools()) {
            let tools = manager.get_tools_for_action(action);
            assert!(!names(&tools).contains(&"echo_args"));
        }
    }

    #[tokio::test]
    async fn test_custom_tool_colliding_with_builtin_is_skipped() {
        let store: Arc<dyn CustomToolStore> = store(vec![
            echo_record("read_file"),
            echo_record("mine"),
            echo_record("mine"),
        ]);
        let manager = manager(Some(store)).await;

        assert_eq!(manager.custom_tool_names(), vec!["mine"]);
    }

    #[tokio::test]
    async fn test_custom_tools_disabled_by_config() {
        let store: Arc<dyn CustomToolStore> = store(vec![echo_record("echo_args")]);
        let config = ToolsConfig {
            custom_tools_enabled: false,
            ..Default::default()
        };
        let manager = ToolManager::load(config, Arc::new(ToolEnvironment::new(".")), Some(store))
            .await
            .unwrap();

        assert!(manager.custom_tool_names().is_empty());
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_records() {
        let memory = store(vec![]);
        let manager = manager(Some(memory.clone() as Arc<dyn CustomToolStore>)).await;
        assert!(manager.get("echo_args").is_none());

        memory.upsert(echo_record("echo_args")).await;
        assert_eq!(manager.reload_custom_tools().await, 1);
        assert!(manager.get("echo_args").is_some());
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let manager = manager(None).await;
        let err = manager.invoke("teleport", json!({})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invoke_validates_arguments() {
        let manager = manager(None).await;
        let err = manager.invoke("store_user_data", json!({})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Validation);

        let ok = manager
            .invoke("store_user_data", json!({ "key": "k", "value": 1 }))
            .await
            .unwrap();
        assert_eq!(ok["stored"], "k");
    }

    #[tokio::test]
    async fn test_invoke_forwarding_tool() {
        let (env, mut host) = ToolEnvironment::from_config(&ToolsConfig::default());
        let manager = ToolManager::load(ToolsConfig::default(), Arc::new(env), None)
            .await
            .unwrap();

        manager.invoke("clear_canvas", Value::Null).await.unwrap();
        assert_eq!(host.recv().await, Some(HostCommand::ClearCanvas));
    }

    #[tokio::test]
    async fn test_specs_for_action() {
        let manager = manager(None).await;
        let specs = manager.tool_specs_for_action(ActionType::SearchWeb);
        let search = specs.iter().find(|s| s.name == "search_web").unwrap();
        assert_eq!(search.input_schema["required"], json!(["query"]));
    }
}
