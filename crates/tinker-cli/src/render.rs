//! Console Rendering
//!
//! A lazy scanner that splits assistant text into plain and fenced-code
//! segments, syntax highlighting for the code segments, and the console
//! observer that paints a turn as it unfolds. All of this is display-only
//! and independent of the orchestration loop.

use std::io::Write as _;

use colored::Colorize;
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

use tinker_core::{ToolCall, ToolOutput, TurnObserver};

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";

/// One display segment of assistant text
#[derive(Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Code { language: &'a str, body: &'a str },
}

/// Lazy scanner over ``` fences
pub struct Segments<'a> {
    rest: &'a str,
    in_code: bool,
}

impl<'a> Segments<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: text,
            in_code: false,
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            match self.rest.find("```") {
                Some(idx) => {
                    let chunk = &self.rest[..idx];
                    self.rest = &self.rest[idx + 3..];
                    let was_code = self.in_code;
                    self.in_code = !was_code;
                    if was_code {
                        return Some(split_code(chunk));
                    }
                    if !chunk.is_empty() {
                        return Some(Segment::Plain(chunk));
                    }
                    // Fence opens at the very start; keep scanning.
                }
                None => {
                    let chunk = self.rest;
                    self.rest = "";
                    return Some(if self.in_code {
                        // Unterminated fence: treat the remainder as code.
                        split_code(chunk)
                    } else {
                        Segment::Plain(chunk)
                    });
                }
            }
        }
    }
}

/// First line is the language tag, the rest is the body
fn split_code(chunk: &str) -> Segment<'_> {
    match chunk.split_once('\n') {
        Some((language, body)) => Segment::Code {
            language: language.trim(),
            body,
        },
        None => Segment::Code {
            language: chunk.trim(),
            body: "",
        },
    }
}

/// Highlight a code body for the terminal; None when the language is not
/// recognized (caller falls back to plain text)
pub fn highlight_code(code: &str, language: &str) -> Option<String> {
    let syntax = SYNTAXES.find_syntax_by_token(language)?;
    let mut highlighter = HighlightLines::new(syntax, &THEMES.themes[THEME]);

    let mut out = String::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, &SYNTAXES).ok()?;
        out.push_str(&as_24_bit_terminal_escaped(&ranges, false));
    }
    out.push_str("\x1b[0m");
    Some(out)
}

/// Paint one piece of assistant text, highlighting fenced code
pub fn print_assistant_text(text: &str) {
    for segment in Segments::new(text) {
        match segment {
            Segment::Plain(plain) => print!("{}", plain.blue()),
            Segment::Code { language, body } => {
                match highlight_code(body, language) {
                    Some(highlighted) => print!("{}", highlighted),
                    None => print!("{}", body.cyan()),
                }
            }
        }
    }
    let _ = std::io::stdout().flush();
}

/// Console observer: paints segments the moment they arrive
pub struct ConsoleObserver;

impl TurnObserver for ConsoleObserver {
    fn on_text(&self, text: &str) {
        print_assistant_text(text);
    }

    fn on_tool_use(&self, call: &ToolCall) {
        println!();
        println!("{}", format!("Tool Used: {}", call.name).yellow());
        println!("{}", format!("Tool Input: {}", call.arguments).yellow());
    }

    fn on_tool_result(&self, output: &ToolOutput) {
        if output.success {
            println!("{}", format!("Tool Result: {}", output.output).green());
        } else {
            println!("{}", format!("Tool Result: {}", output.output).red());
        }
    }
}
