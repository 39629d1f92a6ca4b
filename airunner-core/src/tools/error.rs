//! Tool error model
//!
//! Every tool failure is a `ToolError` with a kind from a small fixed
//! taxonomy, so callers can tell bad arguments from a missing host or a
//! broken script without parsing messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured tool error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error kind
    pub kind: ToolErrorKind,

    /// Human-readable error message
    pub message: String,

    /// Additional detail, e.g. per-field validation errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ToolError {
    /// Create a new tool error
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Add context
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Create a validation error from field errors
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self {
            kind: ToolErrorKind::Validation,
            message: format!(
                "Validation failed: {}",
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
            context: serde_json::to_value(&errors).ok(),
        }
    }

    /// Create a validation error for a single field
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation(vec![ValidationError::new(field, message)])
    }

    /// Unknown tool
    pub fn not_found(name: &str) -> Self {
        Self::new(ToolErrorKind::NotFound, format!("Tool '{}' not found", name))
    }

    /// The tool depends on something that is not there (e.g. no host attached)
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Unavailable, message)
    }

    /// A custom tool failed to load
    pub fn compilation(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Compilation, message)
    }

    /// A custom tool failed while running
    pub fn script(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Script, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, message)
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ToolErrorKind::NotFound,
            std::io::ErrorKind::TimedOut => ToolErrorKind::Timeout,
            _ => ToolErrorKind::Io,
        };
        Self::new(kind, err.to_string())
    }
}

/// Error kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Arguments did not match the tool's schema
    Validation,

    /// Unknown tool or missing resource
    NotFound,

    /// A required collaborator (host application) is not reachable
    Unavailable,

    /// A custom tool could not be compiled or declared
    Compilation,

    /// A custom tool raised an error while running
    Script,

    /// Filesystem failure
    Io,

    /// Execution timed out
    Timeout,

    /// Bug or unexpected state
    Internal,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::Validation => "validation",
            ToolErrorKind::NotFound => "not_found",
            ToolErrorKind::Unavailable => "unavailable",
            ToolErrorKind::Compilation => "compilation",
            ToolErrorKind::Script => "script",
            ToolErrorKind::Io => "io",
            ToolErrorKind::Timeout => "timeout",
            ToolErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation error for a specific field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field path (e.g. "path")
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
