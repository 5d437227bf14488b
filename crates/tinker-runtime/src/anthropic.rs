//! Anthropic Messages Gateway
//!
//! Implementation of `ChatGateway` over the hosted Messages API. The
//! gateway is a pass-through boundary: it converts core messages to the
//! wire format, sends one request, and converts the response back. No
//! retries; failures map to the error taxonomy and abort the caller's turn.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use async_trait::async_trait;
use tinker_core::{
    error::{CoreError, Result},
    gateway::{ChatGateway, ChatRequest, ModelResponse, StopReason, TokenUsage},
    message::{ContentBlock, Message, Role},
    ToolChoice,
};

const API_VERSION: &str = "2023-06-01";

/// Gateway configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    /// API base URL
    pub base_url: String,

    /// API key forwarded as `x-api-key`
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            api_key: api_key.into(),
            timeout_secs: 120,
        }
    }

    /// Read configuration from the environment
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| CoreError::Config("ANTHROPIC_API_KEY is not set".into()))?;
        let base_url = std::env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".into());

        Ok(Self {
            base_url,
            ..Self::new(api_key)
        })
    }
}

/// Messages API gateway
pub struct AnthropicGateway {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicGateway {
    /// Create from configuration
    pub fn from_config(config: AnthropicConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(AnthropicConfig::from_env()?))
    }

    /// Convert core messages to the wire format
    ///
    /// System messages are excluded (the system prompt travels out-of-band)
    /// and tool-result turns are folded into user-role messages, as the
    /// wire contract requires.
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                };
                WireMessage {
                    role: role.into(),
                    content: convert_content(m),
                }
            })
            .collect()
    }

    fn convert_tool_choice(choice: &ToolChoice) -> serde_json::Value {
        match choice {
            ToolChoice::Auto => serde_json::json!({"type": "auto"}),
            ToolChoice::Any => serde_json::json!({"type": "any"}),
            ToolChoice::Tool(name) => serde_json::json!({"type": "tool", "name": name}),
        }
    }

    /// Convert a wire response to the core shape, preserving segment order
    fn convert_response(wire: WireResponse) -> ModelResponse {
        let content = wire
            .content
            .into_iter()
            .filter_map(|block| match block.kind.as_str() {
                "text" => Some(ContentBlock::Text {
                    text: block.text.unwrap_or_default(),
                }),
                "tool_use" => Some(ContentBlock::ToolUse {
                    id: block.id.unwrap_or_default(),
                    name: block.name.unwrap_or_default(),
                    input: block.input.unwrap_or_else(|| serde_json::json!({})),
                }),
                other => {
                    tracing::debug!(kind = other, "skipping unrecognized content block");
                    None
                }
            })
            .collect();

        let stop_reason = wire.stop_reason.as_deref().and_then(|r| match r {
            "end_turn" => Some(StopReason::EndTurn),
            "max_tokens" => Some(StopReason::MaxTokens),
            "tool_use" => Some(StopReason::ToolUse),
            "stop_sequence" => Some(StopReason::StopSequence),
            _ => None,
        });

        ModelResponse {
            content,
            stop_reason,
            usage: wire.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }

    fn map_status(status: StatusCode, body: String) -> CoreError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CoreError::Auth(body),
            StatusCode::TOO_MANY_REQUESTS => CoreError::RateLimited(body),
            _ => CoreError::Gateway(format!("{}: {}", status, body)),
        }
    }
}

#[async_trait]
impl ChatGateway for AnthropicGateway {
    async fn send(&self, request: &ChatRequest) -> Result<ModelResponse> {
        let tools: Vec<WireTool> = request
            .tools
            .iter()
            .map(|schema| WireTool {
                name: schema.name.clone(),
                description: schema.description.clone(),
                input_schema: schema.input_schema(),
            })
            .collect();

        let body = WireRequest {
            model: request.model.api_id(),
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: Self::convert_messages(&request.messages),
            tool_choice: (!tools.is_empty())
                .then(|| Self::convert_tool_choice(&request.tool_choice)),
            tools,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Gateway(format!("malformed response: {}", e)))?;

        Ok(Self::convert_response(wire))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

fn convert_content(message: &Message) -> serde_json::Value {
    match &message.content {
        tinker_core::MessageContent::Text(text) => serde_json::Value::String(text.clone()),
        tinker_core::MessageContent::Blocks(blocks) => {
            serde_json::Value::Array(blocks.iter().map(convert_block).collect())
        }
    }
}

fn convert_block(block: &ContentBlock) -> serde_json::Value {
    match block {
        ContentBlock::Text { text } => serde_json::json!({"type": "text", "text": text}),
        ContentBlock::Image { media_type, data } => serde_json::json!({
            "type": "image",
            "source": {"type": "base64", "media_type": media_type, "data": data},
        }),
        ContentBlock::ToolUse { id, name, input } => serde_json::json!({
            "type": "tool_use", "id": id, "name": name, "input": input,
        }),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
        } => serde_json::json!({
            "type": "tool_result", "tool_use_id": tool_use_id, "content": content,
        }),
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(Serialize)]
struct WireTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    content: Vec<WireBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_turn_folds_into_user_role() {
        let messages = vec![
            Message::user("list the files"),
            Message::assistant_blocks(vec![ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: "list_files".into(),
                input: serde_json::json!({}),
            }]),
            Message::tool_result("toolu_1", "a.txt\nb.txt"),
        ];

        let wire = AnthropicGateway::convert_messages(&messages);
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0].role, "user");
        assert_eq!(wire[1].role, "assistant");
        assert_eq!(wire[2].role, "user");

        let result_block = &wire[2].content[0];
        assert_eq!(result_block["type"], "tool_result");
        assert_eq!(result_block["tool_use_id"], "toolu_1");
    }

    #[test]
    fn test_image_block_wire_shape() {
        let message = Message::user_blocks(vec![
            ContentBlock::Image {
                media_type: "image/jpeg".into(),
                data: "aGVsbG8=".into(),
            },
            ContentBlock::text("What is this?"),
        ]);

        let wire = AnthropicGateway::convert_messages(&[message]);
        let blocks = wire[0].content.as_array().unwrap();
        assert_eq!(blocks[0]["type"], "image");
        assert_eq!(blocks[0]["source"]["media_type"], "image/jpeg");
        assert_eq!(blocks[1]["type"], "text");
    }

    #[test]
    fn test_tool_choice_wire_shapes() {
        assert_eq!(
            AnthropicGateway::convert_tool_choice(&ToolChoice::Auto),
            serde_json::json!({"type": "auto"})
        );
        assert_eq!(
            AnthropicGateway::convert_tool_choice(&ToolChoice::Any),
            serde_json::json!({"type": "any"})
        );
        assert_eq!(
            AnthropicGateway::convert_tool_choice(&ToolChoice::Tool("web_search".into())),
            serde_json::json!({"type": "tool", "name": "web_search"})
        );
    }

    #[test]
    fn test_response_parsing_preserves_segment_order() {
        let raw = serde_json::json!({
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_9", "name": "read_file",
                 "input": {"path": "notes.txt"}},
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 34},
        });
        let wire: WireResponse = serde_json::from_value(raw).unwrap();

        let response = AnthropicGateway::convert_response(wire);
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(response.content.len(), 2);
        assert!(matches!(response.content[0], ContentBlock::Text { .. }));
        match &response.content[1] {
            ContentBlock::ToolUse { id, name, input } => {
                assert_eq!(id, "toolu_9");
                assert_eq!(name, "read_file");
                assert_eq!(input["path"], "notes.txt");
            }
            other => panic!("unexpected block: {:?}", other),
        }
        assert_eq!(response.usage.unwrap().output_tokens, 34);
    }

    #[test]
    fn test_unrecognized_blocks_are_skipped() {
        let raw = serde_json::json!({
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Answer."},
            ],
            "stop_reason": "end_turn",
        });
        let wire: WireResponse = serde_json::from_value(raw).unwrap();

        let response = AnthropicGateway::convert_response(wire);
        assert_eq!(response.content.len(), 1);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            AnthropicGateway::map_status(StatusCode::UNAUTHORIZED, String::new()),
            CoreError::Auth(_)
        ));
        assert!(matches!(
            AnthropicGateway::map_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            CoreError::RateLimited(_)
        ));
        assert!(matches!(
            AnthropicGateway::map_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            CoreError::Gateway(_)
        ));
    }
}
