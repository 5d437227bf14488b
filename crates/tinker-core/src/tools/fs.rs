//! Filesystem Tools
//!
//! create_folder, create_file, write_file, read_file, and list_files.
//! Every I/O failure is caught here and returned as a descriptive error
//! payload; nothing filesystem-related ever aborts the orchestration loop.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::tool::{ParameterSpec, Tool, ToolCall, ToolOutput, ToolSchema};

/// Create a folder (and missing parents) at the given path
pub struct CreateFolderTool;

#[async_trait]
impl Tool for CreateFolderTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_folder".into(),
            description: "Create a new folder at the specified path.".into(),
            parameters: vec![ParameterSpec::required(
                "path",
                "The path where the folder should be created",
            )],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let path = call.str_arg("path").unwrap_or_default();
        // create_dir_all succeeds when the directory already exists.
        Ok(match fs::create_dir_all(path) {
            Ok(()) => ToolOutput::success(&call.id, format!("Folder created: {}", path)),
            Err(e) => ToolOutput::failure(&call.id, format!("Error creating folder: {}", e)),
        })
    }
}

/// Create a file with optional initial content
pub struct CreateFileTool;

#[async_trait]
impl Tool for CreateFileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_file".into(),
            description: "Create a new file at the specified path with optional content.".into(),
            parameters: vec![
                ParameterSpec::required("path", "The path where the file should be created"),
                ParameterSpec::optional("content", "The initial content of the file"),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let path = call.str_arg("path").unwrap_or_default();
        let content = call.str_arg("content").unwrap_or_default();
        Ok(match fs::write(path, content) {
            Ok(()) => ToolOutput::success(&call.id, format!("File created: {}", path)),
            Err(e) => ToolOutput::failure(&call.id, format!("Error creating file: {}", e)),
        })
    }
}

/// Write content to a file, overwriting or appending
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_file".into(),
            description: "Write content to a file at the specified path.".into(),
            parameters: vec![
                ParameterSpec::required("path", "The path of the file to write to"),
                ParameterSpec::required("content", "The content to write to the file"),
                ParameterSpec::optional("mode", "Write mode: 'overwrite' (default) or 'append'"),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let path = call.str_arg("path").unwrap_or_default();
        let content = call.str_arg("content").unwrap_or_default();
        let mode = call.str_arg("mode").unwrap_or("overwrite");

        let written = match mode {
            "overwrite" => fs::write(path, content)
                .map(|()| format!("Content written to file: {}", path)),
            "append" => fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(content.as_bytes()))
                .map(|()| format!("Content appended to file: {}", path)),
            other => {
                return Ok(ToolOutput::failure(
                    &call.id,
                    format!("Error writing to file: unknown mode '{}'", other),
                ));
            }
        };

        Ok(match written {
            Ok(message) => ToolOutput::success(&call.id, message),
            Err(e) => ToolOutput::failure(&call.id, format!("Error writing to file: {}", e)),
        })
    }
}

/// Read the contents of a file
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "read_file".into(),
            description: "Read the contents of a file at the specified path.".into(),
            parameters: vec![ParameterSpec::required("path", "The path of the file to read")],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let path = call.str_arg("path").unwrap_or_default();
        // Fall back to lossy decoding for files that are not valid UTF-8.
        Ok(match fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => ToolOutput::success(&call.id, content),
                Err(e) => ToolOutput::success(
                    &call.id,
                    String::from_utf8_lossy(e.as_bytes()).into_owned(),
                ),
            },
            Err(e) => ToolOutput::failure(&call.id, format!("Error reading file: {}", e)),
        })
    }
}

/// List entries of a directory, defaulting to the current working directory
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_files".into(),
            description: "List all files and directories in the specified path.".into(),
            parameters: vec![ParameterSpec::optional(
                "path",
                "The path of the folder to list (default: current directory)",
            )],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let path = call.str_arg("path").unwrap_or(".");
        Ok(match list_entries(Path::new(path)) {
            Ok(listing) => ToolOutput::success(&call.id, listing),
            Err(e) => ToolOutput::failure(&call.id, format!("Error listing files: {}", e)),
        })
    }
}

/// Sorted newline-joined entry names, so repeated calls over an unchanged
/// directory are identical.
fn list_entries(path: &Path) -> std::io::Result<String> {
    let mut names: Vec<String> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolRegistry;
    use std::path::PathBuf;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(CreateFolderTool);
        registry.register(CreateFileTool);
        registry.register(WriteFileTool);
        registry.register(ReadFileTool);
        registry.register(ListFilesTool);
        registry
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tinker-fs-{}-{}", tag, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall::new("toolu_test", name, arguments)
    }

    #[tokio::test]
    async fn test_create_then_read_round_trips_content() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("note.txt");
        let registry = registry();

        let created = registry
            .dispatch(&call(
                "create_file",
                serde_json::json!({"path": path, "content": "line one\nline two"}),
            ))
            .await
            .unwrap();
        assert!(created.success);

        let read = registry
            .dispatch(&call("read_file", serde_json::json!({"path": path})))
            .await
            .unwrap();
        assert_eq!(read.output, "line one\nline two");
    }

    #[tokio::test]
    async fn test_create_folder_is_idempotent() {
        let dir = scratch_dir("folder");
        let demo = dir.join("demo");
        let registry = registry();
        let args = serde_json::json!({"path": demo});

        let first = registry
            .dispatch(&call("create_folder", args.clone()))
            .await
            .unwrap();
        assert!(first.success);
        assert!(first.output.contains("demo"));

        let second = registry
            .dispatch(&call("create_folder", args))
            .await
            .unwrap();
        assert!(second.success);
    }

    #[tokio::test]
    async fn test_missing_path_rejected_before_any_side_effect() {
        let registry = registry();

        let err = registry
            .dispatch(&call("create_file", serde_json::json!({"content": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::CoreError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn test_list_files_is_idempotent_and_sorted() {
        let dir = scratch_dir("list");
        fs::write(dir.join("b.txt"), "").unwrap();
        fs::write(dir.join("a.txt"), "").unwrap();
        let registry = registry();
        let args = serde_json::json!({"path": dir});

        let first = registry
            .dispatch(&call("list_files", args.clone()))
            .await
            .unwrap();
        let second = registry
            .dispatch(&call("list_files", args))
            .await
            .unwrap();

        assert_eq!(first.output, second.output);
        assert_eq!(first.output, "a.txt\nb.txt");
    }

    #[tokio::test]
    async fn test_write_file_append_mode() {
        let dir = scratch_dir("append");
        let path = dir.join("log.txt");
        let registry = registry();

        registry
            .dispatch(&call(
                "write_file",
                serde_json::json!({"path": path, "content": "one"}),
            ))
            .await
            .unwrap();
        registry
            .dispatch(&call(
                "write_file",
                serde_json::json!({"path": path, "content": "two", "mode": "append"}),
            ))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "onetwo");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_error_payload_not_crash() {
        let registry = registry();
        let outcome = registry
            .dispatch(&call(
                "read_file",
                serde_json::json!({"path": "/nonexistent/tinker/nope.txt"}),
            ))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.output.contains("Error reading file"));
    }
}
