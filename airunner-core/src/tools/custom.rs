//! User-authored tools running in a sandboxed Lua VM
//!
//! Each stored record holds Lua source that must declare exactly one tool:
//!
//! ```lua
//! tool {
//!     name = "shout",
//!     description = "Upper-case a message",
//!     parameters = {
//!         type = "object",
//!         properties = { message = { type = "string" } },
//!         required = { "message" },
//!     },
//!     run = function(args)
//!         return string.upper(args.message)
//!     end,
//! }
//! ```
//!
//! The VM only loads the `string`, `table`, `math` and `utf8` libraries, so
//! scripts have no file, process or network access. `pcall` and `xpcall` are
//! removed as well: a script cannot catch the error raised when it runs out
//! of memory or time. Every compiled tool is wrapped so its invocations are
//! counted in the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mlua::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::category::ToolCategory;
use super::error::{ToolError, ToolErrorKind};
use super::tool::{BoxedTool, Tool, ToolMetadata, ToolSchema};
use crate::config::ToolsConfig;
use crate::error::{Result, RunnerError};

/// Registry slot the `tool { ... }` declaration is stored in
const DECLARATION_KEY: &str = "airunner.tool_declaration";

/// Category assumed when a script does not declare one
const DEFAULT_CATEGORY: ToolCategory = ToolCategory::System;

/// Instructions executed between two deadline checks
const DEADLINE_CHECK_INTERVAL: u32 = 1_000;

/// Resource ceilings for one script VM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
    /// Bytes the VM may allocate
    pub memory: usize,
    /// Wall-clock budget for loading the script, and again for each call
    pub timeout: Duration,
}

impl ScriptLimits {
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            memory: config.script_memory_limit,
            timeout: config.script_timeout,
        }
    }
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default())
    }
}

/// Abort the VM's current execution once `timeout` has elapsed.
///
/// The returned flag is set if the deadline fired.
fn arm_deadline(lua: &Lua, timeout: Duration) -> Arc<AtomicBool> {
    let expired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&expired);
    let deadline = Instant::now() + timeout;

    lua.set_hook(
        mlua::HookTriggers::new().every_nth_instruction(DEADLINE_CHECK_INTERVAL),
        move |_, _| {
            if Instant::now() >= deadline {
                flag.store(true, Ordering::Relaxed);
                return Err(LuaError::runtime(format!(
                    "script exceeded its {:?} time limit",
                    timeout
                )));
            }
            Ok(mlua::VmState::Continue)
        },
    );
    expired
}

fn timed_out(timeout: Duration) -> String {
    format!("script did not finish within {:?}", timeout)
}

/// Persisted custom tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomToolRecord {
    pub name: String,

    /// Lua source
    pub code: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub usage_count: u64,

    #[serde(default)]
    pub success_count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

impl CustomToolRecord {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            enabled: true,
            usage_count: 0,
            success_count: 0,
            last_error: None,
            last_used_at: None,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Persistence for custom tools
#[async_trait]
pub trait CustomToolStore: Send + Sync {
    /// Enabled records, in retrieval order
    async fn enabled_tools(&self) -> Result<Vec<CustomToolRecord>>;

    /// Record one invocation of `name`
    async fn increment_usage(&self, name: &str, success: bool, error: Option<&str>) -> Result<()>;
}

/// Store keeping records in memory
#[derive(Debug, Default)]
pub struct InMemoryCustomToolStore {
    records: RwLock<Vec<CustomToolRecord>>,
}

impl InMemoryCustomToolStore {
    pub fn new(records: Vec<CustomToolRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Parse a JSON array of records
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load a JSON array of records from a file
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Insert a record, replacing any record with the same name
    pub async fn upsert(&self, record: CustomToolRecord) {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub async fn get(&self, name: &str) -> Option<CustomToolRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.name == name)
            .cloned()
    }

    /// All records, enabled or not
    pub async fn records(&self) -> Vec<CustomToolRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl CustomToolStore for InMemoryCustomToolStore {
    async fn enabled_tools(&self) -> Result<Vec<CustomToolRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .collect())
    }

    async fn increment_usage(&self, name: &str, success: bool, error: Option<&str>) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| RunnerError::Tool(ToolError::not_found(name)))?;

        record.usage_count += 1;
        if success {
            record.success_count += 1;
        } else {
            record.last_error = error.map(str::to_string);
        }
        record.last_used_at = Some(Utc::now());
        Ok(())
    }
}

/// VM owning one compiled script
struct ScriptVm {
    lua: Lua,
    run: LuaRegistryKey,
    timeout: Duration,
}

impl ScriptVm {
    fn run(&self, args: &Value) -> std::result::Result<Value, ToolError> {
        let expired = arm_deadline(&self.lua, self.timeout);
        let result = self.call_run(args);
        self.lua.remove_hook();

        if expired.load(Ordering::Relaxed) {
            return Err(ToolError::new(ToolErrorKind::Timeout, timed_out(self.timeout)));
        }
        result
    }

    fn call_run(&self, args: &Value) -> std::result::Result<Value, ToolError> {
        let run: LuaFunction = self.lua.registry_value(&self.run).map_err(script_error)?;
        let input = self.lua.to_value(args).map_err(script_error)?;
        let output: LuaValue = run.call(input).map_err(script_error)?;
        self.lua.from_value(output).map_err(script_error)
    }
}

fn compile_error(err: LuaError) -> ToolError {
    ToolError::compilation(err.to_string())
}

fn script_error(err: LuaError) -> ToolError {
    ToolError::script(err.to_string())
}

/// A custom tool compiled from its record
pub struct CompiledCustomTool {
    metadata: ToolMetadata,
    schema: ToolSchema,
    vm: Arc<Mutex<ScriptVm>>,
}

impl std::fmt::Debug for CompiledCustomTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledCustomTool")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl CompiledCustomTool {
    /// Compile a record's source in a fresh sandboxed VM
    ///
    /// # Errors
    ///
    /// Returns a `Compilation` error if the source fails to load or runs
    /// past the time limit, never declares a tool, declares more than one,
    /// omits `run`, or declares a name other than the record's.
    pub fn compile(
        record: &CustomToolRecord,
        limits: ScriptLimits,
    ) -> std::result::Result<Self, ToolError> {
        let lua = Lua::new_with(
            LuaStdLib::STRING | LuaStdLib::TABLE | LuaStdLib::MATH | LuaStdLib::UTF8,
            LuaOptions::new(),
        )
        .map_err(compile_error)?;
        lua.set_memory_limit(limits.memory).map_err(compile_error)?;

        let globals = lua.globals();
        for unsafe_global in ["dofile", "loadfile", "pcall", "xpcall"] {
            globals.set(unsafe_global, LuaValue::Nil).map_err(compile_error)?;
        }

        let declare = lua
            .create_function(|lua, declaration: LuaTable| {
                let existing: LuaValue = lua.named_registry_value(DECLARATION_KEY)?;
                if !existing.is_nil() {
                    return Err(LuaError::external("tool { ... } may only be declared once"));
                }
                lua.set_named_registry_value(DECLARATION_KEY, declaration)
            })
            .map_err(compile_error)?;
        globals.set("tool", declare).map_err(compile_error)?;

        let expired = arm_deadline(&lua, limits.timeout);
        let loaded = lua
            .load(record.code.as_str())
            .set_name(record.name.clone())
            .exec();
        lua.remove_hook();
        if expired.load(Ordering::Relaxed) {
            return Err(ToolError::compilation(timed_out(limits.timeout)));
        }
        loaded.map_err(compile_error)?;

        let declaration: Option<LuaTable> = lua
            .named_registry_value(DECLARATION_KEY)
            .map_err(compile_error)?;
        let declaration = declaration
            .ok_or_else(|| ToolError::compilation("script does not declare a tool"))?;

        let name: Option<String> = declaration.get("name").map_err(compile_error)?;
        if let Some(declared) = &name {
            if declared != &record.name {
                return Err(ToolError::compilation(format!(
                    "script declares '{}' but is stored as '{}'",
                    declared, record.name
                )));
            }
        }

        let description: Option<String> = declaration.get("description").map_err(compile_error)?;
        let category: Option<String> = declaration.get("category").map_err(compile_error)?;
        let category = match category {
            Some(category) => category.parse().map_err(ToolError::compilation)?,
            None => DEFAULT_CATEGORY,
        };

        let parameters: LuaValue = declaration.get("parameters").map_err(compile_error)?;
        let schema = if parameters.is_nil() {
            ToolSchema::empty()
        } else {
            let parameters: Value = lua.from_value(parameters).map_err(compile_error)?;
            if !parameters.is_object() {
                return Err(ToolError::compilation("parameters must be a table"));
            }
            ToolSchema::new(parameters)
        };

        let run: Option<LuaFunction> = declaration.get("run").map_err(compile_error)?;
        let run = run.ok_or_else(|| ToolError::compilation("declaration has no run function"))?;
        let run = lua.create_registry_value(run).map_err(compile_error)?;

        // Scripts cannot declare further tools once loaded.
        globals.set("tool", LuaValue::Nil).map_err(compile_error)?;
        drop(globals);

        let metadata = ToolMetadata::new(
            record.name.clone(),
            description.unwrap_or_else(|| format!("Custom tool {}", record.name)),
            category,
        );

        Ok(Self {
            metadata,
            schema,
            vm: Arc::new(Mutex::new(ScriptVm {
                lua,
                run,
                timeout: limits.timeout,
            })),
        })
    }
}

#[async_trait]
impl Tool for CompiledCustomTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn call(&self, args: Value) -> std::result::Result<Value, ToolError> {
        let vm = Arc::clone(&self.vm);
        let name = self.metadata.name.clone();

        tokio::task::spawn_blocking(move || {
            let vm = vm
                .lock()
                .map_err(|_| ToolError::internal(format!("script VM of '{}' is poisoned", name)))?;
            vm.run(&args)
        })
        .await
        .map_err(|e| ToolError::internal(format!("script task failed: {}", e)))?
    }
}

/// Wraps a tool so every call is recorded in the custom tool store
pub struct UsageTrackedTool {
    inner: BoxedTool,
    store: Arc<dyn CustomToolStore>,
}

impl UsageTrackedTool {
    pub fn new(inner: BoxedTool, store: Arc<dyn CustomToolStore>) -> Self {
        Self { inner, store }
    }
}

impl std::fmt::Debug for UsageTrackedTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTrackedTool")
            .field("tool", &self.inner.name())
            .finish()
    }
}

#[async_trait]
impl Tool for UsageTrackedTool {
    fn metadata(&self) -> &ToolMetadata {
        self.inner.metadata()
    }

    fn schema(&self) -> ToolSchema {
        self.inner.schema()
    }

    fn validate(&self, args: &Value) -> std::result::Result<(), Vec<super::ValidationError>> {
        self.inner.validate(args)
    }

    async fn call(&self, args: Value) -> std::result::Result<Value, ToolError> {
        let result = self.inner.call(args).await;

        let error = result.as_ref().err().map(|e| e.to_string());
        if let Err(e) = self
            .store
            .increment_usage(self.name(), result.is_ok(), error.as_deref())
            .await
        {
            tracing::warn!(tool = self.name(), error = %e, "Failed to record custom tool usage");
        }

        result
    }
}

/// Compile every enabled record in the store
///
/// Records that fail to compile are logged and skipped. Compilation runs on
/// the blocking pool.
pub async fn load_custom_tools(
    store: &Arc<dyn CustomToolStore>,
    limits: ScriptLimits,
) -> Vec<BoxedTool> {
    let records = match store.enabled_tools().await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read custom tools");
            return Vec::new();
        }
    };

    let mut tools: Vec<BoxedTool> = Vec::with_capacity(records.len());
    for record in records {
        let name = record.name.clone();
        let compiled =
            tokio::task::spawn_blocking(move || CompiledCustomTool::compile(&record, limits))
                .await
                .map_err(|e| ToolError::internal(format!("compile task failed: {}", e)))
                .and_then(|compiled| compiled);

        match compiled {
            Ok(compiled) => {
                tracing::debug!(tool = %name, "Compiled custom tool");
                tools.push(Arc::new(UsageTrackedTool::new(
                    Arc::new(compiled),
                    Arc::clone(store),
                )));
            }
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Skipping custom tool");
            }
        }
    }
    tools
}
