//! # tinker-runtime
//!
//! Runtime integrations for tinker.
//!
//! ## Modules
//!
//! - **anthropic**: `ChatGateway` implementation over the hosted Messages API
//! - **search**: `SearchClient` seam, the Tavily implementation, and the
//!   `web_search` tool
//! - **image**: image attachment encoding (downscale, JPEG, base64)

pub mod anthropic;
pub mod image;
pub mod search;

pub use anthropic::{AnthropicConfig, AnthropicGateway};
pub use image::encode_image;
pub use search::{SearchClient, TavilyClient, TavilyConfig, WebSearchTool};

// Re-export core types for convenience
pub use tinker_core::{
    ChatGateway, CoreError, Model, Orchestrator, Result, Session, Tool, ToolRegistry,
};
