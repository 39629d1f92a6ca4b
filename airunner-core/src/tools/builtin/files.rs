//! File tools confined to the workspace root

use serde_json::{Value, json};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use super::{ToolEnvironment, env_tool, optional_bool, optional_str, required_str};
use crate::tools::{BoxedTool, ToolCategory, ToolError, ToolErrorKind, ToolMetadata, ToolSchema};

/// Largest file `read_file` returns
const MAX_READ_BYTES: u64 = 1024 * 1024;

pub(super) fn file_tools(env: &Arc<ToolEnvironment>) -> Vec<BoxedTool> {
    vec![
        env_tool(
            env,
            ToolMetadata::new(
                "list_files",
                "List the files in a workspace directory",
                ToolCategory::File,
            ),
            ToolSchema::empty().with_property(
                "path",
                "string",
                "Directory relative to the workspace (default: root)",
                false,
            ),
            |env, args| async move {
                let requested = optional_str(&args, "path").unwrap_or_else(|| ".".to_string());
                let dir = resolve(env.workspace_root(), &requested).await?;

                let mut entries = Vec::new();
                let mut reader = tokio::fs::read_dir(&dir).await?;
                while let Some(entry) = reader.next_entry().await? {
                    let metadata = entry.metadata().await?;
                    entries.push(json!({
                        "name": entry.file_name().to_string_lossy(),
                        "is_dir": metadata.is_dir(),
                        "size": metadata.len(),
                    }));
                }
                entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

                Ok(json!({ "path": requested, "entries": entries }))
            },
        ),
        env_tool(
            env,
            ToolMetadata::new(
                "read_file",
                "Read a text file from the workspace",
                ToolCategory::File,
            ),
            ToolSchema::empty().with_property("path", "string", "File relative to the workspace", true),
            |env, args| async move {
                let requested = required_str(&args, "path")?;
                let file = resolve(env.workspace_root(), &requested).await?;

                let size = tokio::fs::metadata(&file).await?.len();
                if size > MAX_READ_BYTES {
                    return Err(ToolError::new(
                        ToolErrorKind::Io,
                        format!("'{}' is {} bytes, above the {} byte limit", requested, size, MAX_READ_BYTES),
                    ));
                }

                let content = tokio::fs::read_to_string(&file).await?;
                Ok(json!({ "path": requested, "content": content }))
            },
        ),
        env_tool(
            env,
            ToolMetadata::new(
                "write_file",
                "Write a text file in the workspace",
                ToolCategory::File,
            ),
            ToolSchema::empty()
                .with_property("path", "string", "File relative to the workspace", true)
                .with_property("content", "string", "Text to write", true)
                .with_property("append", "boolean", "Append instead of replacing", false),
            |env, args| async move {
                let requested = required_str(&args, "path")?;
                let content = required_str(&args, "content")?;
                let append = optional_bool(&args, "append").unwrap_or(false);

                tokio::fs::create_dir_all(env.workspace_root()).await?;
                let file = resolve(env.workspace_root(), &requested).await?;
                if let Some(parent) = file.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }

                let mut handle = tokio::fs::OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(append)
                    .truncate(!append)
                    .open(&file)
                    .await?;
                handle.write_all(content.as_bytes()).await?;
                handle.flush().await?;

                tracing::debug!(path = %file.display(), bytes = content.len(), "Wrote workspace file");
                Ok(json!({ "path": requested, "bytes_written": content.len() }))
            },
        ),
    ]
}

/// Resolve `requested` against `root`, refusing anything that leaves it
///
/// Only plain relative components are accepted. Existing components are
/// walked one at a time; a symlink must resolve to a real path inside the
/// root, so dangling links are refused too.
async fn resolve(root: &Path, requested: &str) -> Result<PathBuf, ToolError> {
    let relative = Path::new(requested);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !plain {
        return Err(outside(requested));
    }

    let root = tokio::fs::canonicalize(root).await?;
    let mut resolved = root.clone();
    let mut components = relative.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part),
        _ => None,
    });

    while let Some(part) = components.next() {
        let next = resolved.join(part);
        let metadata = match tokio::fs::symlink_metadata(&next).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Nothing below a missing entry exists yet.
                resolved = next;
                resolved.extend(components);
                return Ok(resolved);
            }
            Err(e) => return Err(e.into()),
        };

        resolved = if metadata.file_type().is_symlink() {
            let target = tokio::fs::canonicalize(&next)
                .await
                .map_err(|_| outside(requested))?;
            if !target.starts_with(&root) {
                return Err(outside(requested));
            }
            target
        } else {
            next
        };
    }

    Ok(resolved)
}

fn outside(requested: &str) -> ToolError {
    ToolError::invalid_argument("path", format!("'{}' is outside the workspace", requested))
        .with_context(Value::String(requested.to_string()))
}
