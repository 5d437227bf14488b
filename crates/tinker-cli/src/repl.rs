//! Interactive REPL
//!
//! Reads lines from standard input and drives one turn at a time; one turn
//! is fully processed (including all tool round-trips) before the next
//! input is accepted. Gateway failures abort the turn only; the session
//! survives.

use std::path::PathBuf;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use tinker_core::{Orchestrator, Session, ToolCall, TurnInput};
use tinker_runtime::encode_image;

use crate::render::ConsoleObserver;

const FAREWELL: &str = "Thank you for chatting. Goodbye!";

/// Interactive chat session
pub struct Repl {
    orchestrator: Orchestrator,
    session: Session,
}

impl Repl {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            session: Session::new(),
        }
    }

    /// Run until `exit`, interrupt, or end-of-input
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        self.print_welcome();

        loop {
            match rl.readline(&format!("{} ", "You:".bold())) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(&line);

                    if line == "exit" {
                        println!("{}", FAREWELL.blue());
                        break;
                    }
                    if line == "image" {
                        self.image_turn(&mut rl).await;
                        continue;
                    }
                    if let Some(rest) = line.strip_prefix("/tool") {
                        self.direct_tool(rest.trim()).await;
                        continue;
                    }

                    self.turn(TurnInput::text(line)).await;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!("{}", FAREWELL.blue());
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Welcome to tinker, your terminal pair-engineer.".blue());
        println!(
            "{}",
            "Type 'exit' or press Ctrl-C to end the conversation.".blue()
        );
        println!(
            "{}",
            "To include an image, type 'image' and follow the prompts.".blue()
        );
        println!(
            "{}",
            "To invoke a tool directly, type '/tool <name> <json-args>'.".dimmed()
        );
        println!();
    }

    async fn turn(&mut self, input: TurnInput) {
        println!();
        match self
            .orchestrator
            .run_turn(&mut self.session, input, &ConsoleObserver)
            .await
        {
            Ok(_) => println!(),
            Err(e) => {
                // The turn is abandoned; appended history stays recorded.
                println!("{}", e.user_message().red());
            }
        }
    }

    async fn image_turn(&mut self, rl: &mut DefaultEditor) {
        let path = match rl.readline("Enter the path to your image file: ") {
            Ok(path) => PathBuf::from(path.trim()),
            Err(_) => return,
        };
        if !path.is_file() {
            println!("{}", "Invalid image path. Please try again.".yellow());
            return;
        }

        let image = match encode_image(&path) {
            Ok(block) => block,
            Err(e) => {
                println!("{}", e.to_string().red());
                return;
            }
        };

        let caption = match rl.readline(&format!("{} ", "You (prompt for image):".bold())) {
            Ok(caption) => caption,
            Err(_) => return,
        };

        self.turn(TurnInput::with_image(caption, image)).await;
    }

    /// Dispatch a tool straight through the registry, bypassing the model
    async fn direct_tool(&self, rest: &str) {
        let (name, args) = match rest.split_once(' ') {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        if name.is_empty() {
            println!("{}", "Usage: /tool <name> <json-args>".yellow());
            return;
        }

        let arguments = if args.is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(args) {
                Ok(value) => value,
                Err(e) => {
                    println!("{}", format!("Invalid tool arguments: {}", e).yellow());
                    return;
                }
            }
        };

        let call = ToolCall::new("direct", name, arguments);
        match self.orchestrator.tools().dispatch(&call).await {
            Ok(outcome) if outcome.success => {
                println!("{}", format!("Tool Result: {}", outcome.output).green());
            }
            Ok(outcome) => {
                println!("{}", format!("Tool Result: {}", outcome.output).red());
            }
            Err(e) => println!("{}", e.to_string().red()),
        }
    }
}
