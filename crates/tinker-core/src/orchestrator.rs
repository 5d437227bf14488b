//! Orchestration Loop
//!
//! Drives one user turn to completion: send the conversation snapshot,
//! walk the response's content segments in arrival order, dispatch tool
//! invocations, feed results back, and re-request until an iteration
//! yields only text. This is the only place where network round-trips and
//! the mutable conversation interact.

use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::gateway::{ChatGateway, ChatRequest, Model, ModelResponse, ToolChoice};
use crate::message::{ContentBlock, Message};
use crate::session::Session;
use crate::tool::{ToolCall, ToolOutput, ToolRegistry};

/// Orchestrator configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// System prompt sent out-of-band with every request
    pub system_prompt: String,

    /// Model tier
    pub model: Model,

    /// Generation cap per request
    pub max_tokens: u32,

    /// Tool-selection policy
    pub tool_choice: ToolChoice,

    /// Cap on follow-up tool rounds within one user turn
    pub max_tool_rounds: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            model: Model::default(),
            max_tokens: 4096,
            tool_choice: ToolChoice::Auto,
            max_tool_rounds: 8,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an exceptional software developer with vast knowledge across \
multiple programming languages, frameworks, and best practices. You can \
create project structures, write clean and well-documented code, read and \
analyze existing files, list directory contents, and perform web searches \
for up-to-date information.

When asked to create a project, start with a root folder, then create the \
necessary subdirectories and files inside it. When asked to edit, read the \
file first, then write the updated content. Use the provided tools whenever \
they help accomplish the user's goal, and before calling a tool make sure \
every required parameter is present or can be reasonably inferred; if a \
required value is missing, ask the user for it instead of guessing. When an \
image is provided, analyze its contents carefully and incorporate your \
observations into the response.";

/// Input for one user turn
#[derive(Clone, Debug)]
pub struct TurnInput {
    /// The user's text
    pub text: String,

    /// Optional image block, sent ahead of the text in one user turn
    pub image: Option<ContentBlock>,
}

impl TurnInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, image: ContentBlock) -> Self {
        Self {
            text: text.into(),
            image: Some(image),
        }
    }
}

/// Observer notified as a turn unfolds
///
/// Display is eager: text segments are reported the moment they arrive,
/// not deferred to end-of-turn.
pub trait TurnObserver: Send + Sync {
    fn on_text(&self, _text: &str) {}
    fn on_tool_use(&self, _call: &ToolCall) {}
    fn on_tool_result(&self, _output: &ToolOutput) {}
}

/// Observer that ignores everything
pub struct NullObserver;

impl TurnObserver for NullObserver {}

/// The orchestration loop
///
/// Holds no per-turn state; all conversation state lives in the
/// caller-owned [`Session`].
pub struct Orchestrator {
    gateway: Arc<dyn ChatGateway>,
    tools: Arc<ToolRegistry>,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        tools: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(gateway: Arc<dyn ChatGateway>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(gateway, tools, OrchestratorConfig::default())
    }

    /// Get configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn request(&self, session: &Session) -> ChatRequest {
        ChatRequest {
            model: self.config.model,
            system: self.config.system_prompt.clone(),
            messages: session.conversation.sendable(),
            tools: self.tools.schemas(),
            tool_choice: self.config.tool_choice.clone(),
            max_tokens: self.config.max_tokens,
        }
    }

    /// Drive one user turn to completion
    ///
    /// On gateway failure the turn is abandoned and the error returned;
    /// history appended up to that point is retained (no rollback).
    pub async fn run_turn(
        &self,
        session: &mut Session,
        input: TurnInput,
        observer: &dyn TurnObserver,
    ) -> Result<String> {
        match input.image {
            Some(image) => {
                session.conversation.push(Message::user_blocks(vec![
                    image,
                    ContentBlock::text(input.text),
                ]));
            }
            None => session.conversation.push(Message::user(input.text)),
        }
        session.touch();

        let response = self.gateway.send(&self.request(session)).await?;

        let mut reply = String::new();
        self.process_response(session, response, observer, &mut reply, 0)
            .await?;

        if !reply.is_empty() {
            // One consolidated assistant turn for the whole user turn.
            session.conversation.push(Message::assistant(reply.clone()));
            session.touch();
        }

        Ok(reply)
    }

    /// Walk one response's segments in arrival order
    ///
    /// Each tool invocation appends the assistant tool-use turn and its
    /// result turn, then triggers exactly one follow-up request whose
    /// response is processed under the same rules. Termination: an
    /// iteration that yields only text segments, or the round cap.
    async fn process_response(
        &self,
        session: &mut Session,
        response: ModelResponse,
        observer: &dyn TurnObserver,
        reply: &mut String,
        depth: usize,
    ) -> Result<()> {
        for block in response.content {
            match block {
                ContentBlock::Text { ref text } => {
                    reply.push_str(text);
                    observer.on_text(text);
                }
                ContentBlock::ToolUse {
                    ref id,
                    ref name,
                    ref input,
                } => {
                    let call = ToolCall::new(id.clone(), name.clone(), input.clone());
                    observer.on_tool_use(&call);
                    tracing::debug!(tool = %call.name, round = depth, "dispatching tool");

                    let outcome = self.dispatch(&call).await;
                    observer.on_tool_result(&outcome);

                    session
                        .conversation
                        .push(Message::assistant_blocks(vec![block.clone()]));
                    session
                        .conversation
                        .push(Message::tool_result(&outcome.id, &outcome.output));
                    session.touch();

                    if depth + 1 > self.config.max_tool_rounds {
                        return Err(CoreError::MaxToolRounds(self.config.max_tool_rounds));
                    }

                    // One follow-up request per invocation, not batched.
                    let follow_up = self.gateway.send(&self.request(session)).await?;
                    Box::pin(self.process_response(
                        session,
                        follow_up,
                        observer,
                        reply,
                        depth + 1,
                    ))
                    .await?;
                }
                other => {
                    tracing::warn!(?other, "unexpected block in model response");
                }
            }
        }

        Ok(())
    }

    /// Dispatch a tool call; validation and lookup failures become failure
    /// payloads rather than loop errors, so the session continues.
    async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        match self.tools.dispatch(call).await {
            Ok(outcome) => outcome,
            Err(e) => ToolOutput::failure(&call.id, e.to_string()),
        }
    }
}

/// Builder for Orchestrator configuration
pub struct OrchestratorBuilder {
    gateway: Option<Arc<dyn ChatGateway>>,
    tools: ToolRegistry,
    config: OrchestratorConfig,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            gateway: None,
            tools: ToolRegistry::new(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn gateway(mut self, gateway: Arc<dyn ChatGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: Model) -> Self {
        self.config.model = model;
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.config.tool_choice = choice;
        self
    }

    pub fn max_tool_rounds(mut self, max: usize) -> Self {
        self.config.max_tool_rounds = max;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let gateway = self
            .gateway
            .ok_or_else(|| CoreError::Config("Gateway is required".into()))?;

        Ok(Orchestrator::new(gateway, Arc::new(self.tools), self.config))
    }
}
