//! tinker CLI entrypoint
//!
//! Wires the gateway, the search client, and the tool registry into the
//! orchestrator, then dispatches to single-shot or interactive mode.

mod cli;
mod config;
mod render;
mod repl;

use std::sync::Arc;

use anyhow::bail;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use tinker_core::orchestrator::OrchestratorBuilder;
use tinker_core::tools::{
    CreateFileTool, CreateFolderTool, ListFilesTool, ReadFileTool, WriteFileTool,
};
use tinker_core::{Session, ToolRegistry, TurnInput};
use tinker_runtime::{AnthropicGateway, TavilyClient, WebSearchTool, encode_image};

use crate::cli::Cli;
use crate::render::ConsoleObserver;
use crate::repl::Repl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match args.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Credentials are checked eagerly, before any network call.
    let missing = config::missing_credentials();
    if !missing.is_empty() {
        eprintln!("The following required environment variables are not set:");
        for name in missing {
            eprintln!("  - {}", name);
        }
        eprintln!("Please set them or add them to your .env file.");
        std::process::exit(1);
    }

    let gateway = Arc::new(AnthropicGateway::from_env()?);
    let search = Arc::new(TavilyClient::from_env()?);

    let mut tools = ToolRegistry::new();
    tools.register(CreateFolderTool);
    tools.register(CreateFileTool);
    tools.register(WriteFileTool);
    tools.register(ReadFileTool);
    tools.register(ListFilesTool);
    tools.register(WebSearchTool::new(search));

    tracing::info!("Registered {} tools", tools.len());
    for name in tools.names() {
        tracing::debug!("  tool: {}", name);
    }

    let orchestrator = OrchestratorBuilder::new()
        .gateway(gateway)
        .tools(tools)
        .model(args.model)
        .tool_choice(args.tool_choice.clone())
        .build()?;

    // An interrupt at any point ends the session immediately.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            println!("{}", "Exiting tinker. Goodbye!".blue());
            std::process::exit(0);
        }
    });

    match args.query {
        Some(query) => {
            let input = match args.image {
                Some(path) => {
                    if !path.is_file() {
                        bail!("Image file not found: {}", path.display());
                    }
                    TurnInput::with_image(query, encode_image(&path)?)
                }
                None => TurnInput::text(query),
            };

            let mut session = Session::new();
            if let Err(e) = orchestrator
                .run_turn(&mut session, input, &ConsoleObserver)
                .await
            {
                eprintln!("{}", e.user_message().red());
                std::process::exit(1);
            }
            println!();
        }
        None => Repl::new(orchestrator).run().await?,
    }

    Ok(())
}
