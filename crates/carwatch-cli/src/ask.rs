//! # Ask Subcommand
//!
//! One question to the help assistant.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use carwatch_portal::Assistant;

/// Arguments for the `carwatch ask` subcommand.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question. With no words, only the greeting is printed.
    #[arg(trailing_var_arg = true)]
    pub message: Vec<String>,

    /// Page the question is asked from, e.g. `/search`.
    #[arg(long)]
    pub page: Option<String>,
}

/// Execute the ask subcommand.
pub fn run_ask(args: &AskArgs, out: &mut impl Write) -> Result<u8> {
    let assistant = Assistant::new();
    if let Some(greeting) = args.page.as_deref().and_then(|p| assistant.context_greeting(p)) {
        writeln!(out, "{greeting}")?;
    }

    let message = args.message.join(" ");
    match assistant.respond(&message) {
        Some(reply) => {
            writeln!(out, "{}", reply.text)?;
            if let Some(path) = reply.navigate_to {
                writeln!(out, "open: {path}")?;
            }
        }
        None => writeln!(out, "{}", assistant.welcome())?,
    }
    Ok(0)
}
