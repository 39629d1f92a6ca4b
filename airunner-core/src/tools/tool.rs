//! Tool trait and metadata definitions
//!
//! Tools are what the conversation model can call. Each tool declares its
//! name, category and parameter schema alongside its execution logic.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::category::ToolCategory;
use super::error::{ToolError, ValidationError};

/// Tool metadata for discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// Tool name (unique identifier)
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Functional group
    pub category: ToolCategory,
}

impl ToolMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: ToolCategory,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
        }
    }
}

/// JSON Schema for tool parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// JSON Schema for input parameters
    pub parameters: Value,
}

impl ToolSchema {
    /// Create a schema from a JSON Schema value
    pub fn new(parameters: Value) -> Self {
        Self { parameters }
    }

    /// Create an empty schema (tool takes no parameters)
    pub fn empty() -> Self {
        Self::new(json!({
            "type": "object",
            "properties": {},
            "required": []
        }))
    }

    /// Add a typed property
    pub fn with_property(
        self,
        name: &str,
        kind: &str,
        description: &str,
        required: bool,
    ) -> Self {
        self.with_property_schema(name, json!({ "type": kind, "description": description }), required)
    }

    /// Add a property that accepts any JSON value
    pub fn with_untyped_property(self, name: &str, description: &str, required: bool) -> Self {
        self.with_property_schema(name, json!({ "description": description }), required)
    }

    fn with_property_schema(mut self, name: &str, schema: Value, required: bool) -> Self {
        if let Value::Object(root) = &mut self.parameters {
            if let Value::Object(properties) = root.entry("properties").or_insert_with(|| json!({})) {
                properties.insert(name.to_string(), schema);
            }
            if required {
                if let Value::Array(list) = root.entry("required").or_insert_with(|| json!([])) {
                    list.push(json!(name));
                }
            }
        }
        self
    }

    /// Names of required parameters
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Check `args` against required parameters and declared property types
    pub fn validate(&self, args: &Value) -> Result<(), Vec<ValidationError>> {
        let required = self.required();
        let empty = Map::new();
        let object = match args {
            Value::Object(object) => object,
            Value::Null => &empty,
            _ => {
                return Err(vec![ValidationError::new(
                    "arguments",
                    "must be a JSON object",
                )]);
            }
        };

        let mut errors: Vec<ValidationError> = required
            .iter()
            .filter(|name| object.get(**name).is_none_or(Value::is_null))
            .map(|name| ValidationError::new(*name, "is required"))
            .collect();

        if let Some(properties) = self.parameters.get("properties").and_then(Value::as_object) {
            for (key, value) in object {
                let expected = properties
                    .get(key)
                    .and_then(|p| p.get("type"))
                    .and_then(Value::as_str);
                if let Some(expected) = expected {
                    if !value.is_null() && !type_matches(expected, value) {
                        errors.push(ValidationError::new(
                            key.as_str(),
                            format!("expected {}", expected),
                        ));
                    }
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

/// Tool listing handed to a language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl From<&dyn Tool> for ToolSpec {
    fn from(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.schema().parameters,
        }
    }
}

/// Core tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool metadata
    fn metadata(&self) -> &ToolMetadata;

    /// Get tool name (convenience method)
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Get tool description (convenience method)
    fn description(&self) -> &str {
        &self.metadata().description
    }

    fn category(&self) -> ToolCategory {
        self.metadata().category
    }

    /// Get the JSON schema for this tool's parameters
    fn schema(&self) -> ToolSchema;

    /// Validate input arguments before execution
    ///
    /// Default implementation checks the schema's required parameters and
    /// property types.
    fn validate(&self, args: &Value) -> Result<(), Vec<ValidationError>> {
        self.schema().validate(args)
    }

    /// Execute the tool with given arguments
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

/// Type alias for boxed tools
pub type BoxedTool = Arc<dyn Tool>;

type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

/// Tool backed by an async closure
pub struct FnTool {
    metadata: ToolMetadata,
    schema: ToolSchema,
    handler: ToolHandler,
}

impl FnTool {
    pub fn new<F, Fut>(metadata: ToolMetadata, schema: ToolSchema, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self {
            metadata,
            schema,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.metadata.name)
            .field("category", &self.metadata.category)
            .finish()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        (self.handler)(args).await
    }
}
