//! # tinker-core
//!
//! Core chat-agent logic: conversation model, extensible tool system, and
//! the tool-call orchestration loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Orchestrator                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │    Turn     │  │    Tool     │  │   ChatGateway       │  │
//! │  │    Loop     │──│   Registry  │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ChatGateway` trait keeps the inference service an opaque
//! request/response boundary, so backends can be swapped without touching
//! the loop. All conversation state lives in a caller-owned [`Session`].

pub mod error;
pub mod gateway;
pub mod message;
pub mod orchestrator;
pub mod session;
pub mod tool;
pub mod tools;

pub use error::{CoreError, Result};
pub use gateway::{ChatGateway, ChatRequest, Model, ModelResponse, StopReason, ToolChoice};
pub use message::{ContentBlock, Conversation, Message, MessageContent, Role};
pub use orchestrator::{
    NullObserver, Orchestrator, OrchestratorBuilder, OrchestratorConfig, TurnInput, TurnObserver,
};
pub use session::Session;
pub use tool::{ParameterSpec, Tool, ToolCall, ToolOutput, ToolRegistry, ToolSchema};
