//! Error Types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or invalid configuration (e.g. credentials); fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model gateway transport/API failure; aborts the current turn only
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Authentication rejected by the gateway
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limited by the gateway
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Tool not found in registry
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// Tool validation failed before dispatch
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Maximum tool rounds reached within one user turn
    #[error("Maximum tool rounds ({0}) reached")]
    MaxToolRounds(usize),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Config(msg) => format!("Configuration problem: {}", msg),
            CoreError::Gateway(_) => {
                "I'm sorry, there was an error communicating with the AI. Please try again.".into()
            }
            CoreError::Auth(_) => "Authentication failed. Please check your API keys.".into(),
            CoreError::RateLimited(_) => {
                "The AI service is rate limiting requests. Please wait a moment.".into()
            }
            CoreError::ToolNotFound(name) => format!("The tool '{}' is not available.", name),
            CoreError::ToolValidation(msg) => format!("Invalid tool input: {}", msg),
            CoreError::ToolExecution(msg) => format!("Tool error: {}", msg),
            CoreError::MaxToolRounds(_) => {
                "The request required too many tool rounds. Please try a simpler query.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Other(err.to_string())
    }
}
