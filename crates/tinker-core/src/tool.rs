//! Tool System
//!
//! Extensible tool framework for agent capabilities. Tools are registered
//! once at startup and dispatched by the orchestration loop when the model
//! requests them. Required parameters are validated before any side effect.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CoreError, Result};

/// Tool invocation requested by the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque invocation ID assigned by the gateway
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Look up a string argument
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Result from tool execution
///
/// Created by dispatch, consumed exactly once when appended to the
/// conversation, never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Invocation ID this result answers
    pub id: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success message or error description)
    pub output: String,
}

impl ToolOutput {
    pub fn success(id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            output: error.into(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    pub param_type: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Whether this parameter is required
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Tool definition schema, immutable and defined once at startup
///
/// Doubles as the protocol schema sent to the model and the local
/// validation guard before dispatch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSchema {
    /// Render the JSON-schema object sent to the gateway
    ///
    /// serde_json maps serialize with sorted keys, so the rendering is
    /// deterministic and the wire schema stays byte-stable across requests
    /// within one session.
    pub fn input_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type,
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(serde_json::Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    ///
    /// Local I/O failures are caught inside the implementation and returned
    /// as descriptive error payloads, never raised to the loop.
    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput>;

    /// Validate arguments before execution; runs before any side effect
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && call.arguments.get(&param.name).is_none() {
                return Err(CoreError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name, Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Dispatch a tool call: resolve, validate, then execute
    pub async fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| CoreError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;

        tool.execute(call).await
    }

    /// All tool schemas, sorted by name for a stable wire order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<_> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Registered tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Probe tool that counts executions
    struct ProbeTool {
        executions: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for ProbeTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "probe".into(),
                description: "Counts how many times it ran".into(),
                parameters: vec![ParameterSpec::required("path", "Target path")],
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::success(&call.id, "ran"))
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("t1", "nope", serde_json::json!({}));

        let err = registry.dispatch(&call).await.unwrap_err();
        assert!(matches!(err, CoreError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_required_parameter_blocks_execution() {
        let executions = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(ProbeTool {
            executions: executions.clone(),
        });

        let call = ToolCall::new("t1", "probe", serde_json::json!({}));
        let err = registry.dispatch(&call).await.unwrap_err();

        assert!(matches!(err, CoreError::ToolValidation(_)));
        // Validation happens before any side effect.
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_runs_valid_call() {
        let executions = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(ProbeTool {
            executions: executions.clone(),
        });

        let call = ToolCall::new("t1", "probe", serde_json::json!({"path": "x"}));
        let outcome = registry.dispatch(&call).await.unwrap();

        assert!(outcome.success);
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_input_schema_is_byte_stable() {
        let schema = ToolSchema {
            name: "write_file".into(),
            description: "Write content to a file".into(),
            parameters: vec![
                ParameterSpec::required("path", "The file path"),
                ParameterSpec::required("content", "The content"),
                ParameterSpec::optional("mode", "overwrite or append"),
            ],
        };

        let first = serde_json::to_string(&schema.input_schema()).unwrap();
        let second = serde_json::to_string(&schema.input_schema()).unwrap();
        assert_eq!(first, second);

        let rendered: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_schemas_sorted_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(ProbeTool {
            executions: Arc::new(AtomicUsize::new(0)),
        });
        let names: Vec<_> = registry.schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["probe"]);
    }
}
