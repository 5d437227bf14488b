//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

use tinker_core::{Model, ToolChoice};

/// tinker - chat with an AI pair-engineer from the command line
#[derive(Parser, Debug)]
#[command(name = "tinker", version, about)]
pub struct Cli {
    /// Send a single query and exit
    #[arg(long)]
    pub query: Option<String>,

    /// Path to an image file to attach (requires --query)
    #[arg(long, requires = "query")]
    pub image: Option<PathBuf>,

    /// Model tier: haiku, sonnet, or opus
    #[arg(long, default_value = "sonnet")]
    pub model: Model,

    /// Tool-selection policy: auto, any, or a specific tool name
    #[arg(long = "tool_choice", default_value = "auto")]
    pub tool_choice: ToolChoice,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["tinker"]);
        assert!(cli.query.is_none());
        assert_eq!(cli.model, Model::Sonnet);
        assert_eq!(cli.tool_choice, ToolChoice::Auto);
    }

    #[test]
    fn test_single_shot_flags() {
        let cli = Cli::parse_from([
            "tinker",
            "--query",
            "list my files",
            "--model",
            "haiku",
            "--tool_choice",
            "list_files",
        ]);
        assert_eq!(cli.query.as_deref(), Some("list my files"));
        assert_eq!(cli.model, Model::Haiku);
        assert_eq!(cli.tool_choice, ToolChoice::Tool("list_files".into()));
    }

    #[test]
    fn test_image_requires_query() {
        let result = Cli::try_parse_from(["tinker", "--image", "photo.png"]);
        assert!(result.is_err());
    }
}
