//! Chat Gateway Strategy Pattern
//!
//! Defines the opaque boundary to the hosted inference service. The
//! orchestration loop works exclusively through [`ChatGateway`], so
//! backends can be swapped without changing loop logic. Failures are never
//! retried here; the caller abandons the current turn and surfaces the
//! error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::message::{ContentBlock, Message};
use crate::tool::ToolSchema;

/// Fixed enumeration of model tiers exposed on the CLI
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    Haiku,
    Sonnet,
    Opus,
}

impl Model {
    /// Pinned API identifier sent on the wire
    pub fn api_id(&self) -> &'static str {
        match self {
            Model::Haiku => "claude-3-5-haiku-20241022",
            Model::Sonnet => "claude-sonnet-4-20250514",
            Model::Opus => "claude-opus-4-20250514",
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Sonnet
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Haiku => write!(f, "haiku"),
            Model::Sonnet => write!(f, "sonnet"),
            Model::Opus => write!(f, "opus"),
        }
    }
}

impl FromStr for Model {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "haiku" => Ok(Model::Haiku),
            "sonnet" => Ok(Model::Sonnet),
            "opus" => Ok(Model::Opus),
            other => Err(CoreError::Config(format!(
                "unknown model tier '{}' (expected haiku, sonnet, or opus)",
                other
            ))),
        }
    }
}

/// Tool-selection policy for one request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolChoice {
    /// The model decides whether to call a tool
    Auto,
    /// The model must call some tool
    Any,
    /// The model must call this specific tool
    Tool(String),
}

impl Default for ToolChoice {
    fn default() -> Self {
        ToolChoice::Auto
    }
}

impl FromStr for ToolChoice {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(ToolChoice::Auto),
            "any" => Ok(ToolChoice::Any),
            name if !name.is_empty() => Ok(ToolChoice::Tool(name.to_string())),
            _ => Err(CoreError::Config("empty tool choice".into())),
        }
    }
}

/// One outbound request to the inference service
#[derive(Clone, Debug)]
pub struct ChatRequest {
    /// Model tier
    pub model: Model,

    /// System prompt, passed out-of-band from the history
    pub system: String,

    /// Snapshot of the conversation (non-empty turns only)
    pub messages: Vec<Message>,

    /// Tool schemas; byte-stable across requests within one session
    pub tools: Vec<ToolSchema>,

    /// Tool-selection policy
    pub tool_choice: ToolChoice,

    /// Generation cap
    pub max_tokens: u32,
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Reason the model stopped generating
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ToolUse,
    StopSequence,
}

/// Structured response from the inference service
///
/// Content arrives as ordered segments; ordering is significant and must be
/// preserved when replaying text to the display.
#[derive(Clone, Debug)]
pub struct ModelResponse {
    /// Ordered content segments (text and tool invocations)
    pub content: Vec<ContentBlock>,

    /// Why generation stopped, when reported
    pub stop_reason: Option<StopReason>,

    /// Token usage, when reported
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    /// True when the response contains a pending tool invocation
    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

/// Strategy trait for inference backends
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send one request and return the structured response
    ///
    /// Transport/auth/rate-limit failures map to the error taxonomy and are
    /// not retried.
    async fn send(&self, request: &ChatRequest) -> Result<ModelResponse>;

    /// Backend name for diagnostics
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_round_trip() {
        for tier in ["haiku", "sonnet", "opus"] {
            let model: Model = tier.parse().unwrap();
            assert_eq!(model.to_string(), tier);
        }
        assert!("gpt-4".parse::<Model>().is_err());
    }

    #[test]
    fn test_tool_choice_parsing() {
        assert_eq!("auto".parse::<ToolChoice>().unwrap(), ToolChoice::Auto);
        assert_eq!("any".parse::<ToolChoice>().unwrap(), ToolChoice::Any);
        assert_eq!(
            "web_search".parse::<ToolChoice>().unwrap(),
            ToolChoice::Tool("web_search".into())
        );
    }

    #[test]
    fn test_has_tool_use() {
        let response = ModelResponse {
            content: vec![
                ContentBlock::text("Checking."),
                ContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "list_files".into(),
                    input: serde_json::json!({}),
                },
            ],
            stop_reason: Some(StopReason::ToolUse),
            usage: None,
        };
        assert!(response.has_tool_use());
    }
}
