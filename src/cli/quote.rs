//! `quote` subcommands.

use super::{AppContext, CommandOutput};
use crate::format::{format_quote, format_quotes_markdown};
use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum QuoteCommand {
    /// Add a quote
    Add { text: String },

    /// List all quotes, oldest first
    List,

    /// Show one quote at random
    Random,

    /// Delete a quote
    Rm { id: String },
}

impl QuoteCommand {
    pub async fn run(self, ctx: &AppContext) -> Result<CommandOutput> {
        let db = &ctx.db;
        match self {
            QuoteCommand::Add { text } => {
                let quote = db.add_quote(&text)?;
                CommandOutput::new(format!("Added quote `{}`", quote.id), &quote)
            }

            QuoteCommand::List => {
                let quotes = db.list_quotes()?;
                CommandOutput::new(format_quotes_markdown(&quotes), &quotes)
            }

            QuoteCommand::Random => {
                let quote = db.random_quote()?;
                let text = quote
                    .as_ref()
                    .map(format_quote)
                    .unwrap_or_else(|| "No quotes yet.".to_string());
                CommandOutput::new(text, &quote)
            }

            QuoteCommand::Rm { id } => {
                db.delete_quote(&id)?;
                CommandOutput::new(format!("Deleted quote `{}`", id), &json!({ "deleted": id }))
            }
        }
    }
}
