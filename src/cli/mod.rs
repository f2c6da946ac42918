//! CLI command definitions for taskdeck
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod group;
pub mod quote;
pub mod subtask;
pub mod tag;
pub mod task;

use crate::db::Database;
use crate::format::OutputFormat;
use crate::manager::OrderedCollectionManager;
use anyhow::Result;
use clap::{Parser, Subcommand};
use group::GroupCommand;
use quote::QuoteCommand;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use subtask::SubtaskCommand;
use tag::TagCommand;
use task::TaskCommand;

/// Personal task manager with ordered subtasks and subtask groups
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, list, edit and complete tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage a task's subtasks and their order
    #[command(subcommand)]
    Subtask(SubtaskCommand),

    /// Manage a task's subtask groups and their order
    #[command(subcommand)]
    Group(GroupCommand),

    /// Manage tags and attach them to tasks
    #[command(subcommand)]
    Tag(TagCommand),

    /// Manage the quotes shown under the task list
    #[command(subcommand)]
    Quote(QuoteCommand),
}

/// Shared handles for command execution.
pub struct AppContext {
    pub db: Database,
    pub manager: OrderedCollectionManager<Database>,
}

impl AppContext {
    pub fn new(db: Database) -> Self {
        let manager = OrderedCollectionManager::new(db.clone());
        Self { db, manager }
    }
}

/// Result of a command, renderable as text or JSON.
#[derive(Debug)]
pub struct CommandOutput {
    pub text: String,
    pub json: Value,
}

impl CommandOutput {
    pub fn new<T: Serialize>(text: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self {
            text: text.into(),
            json: serde_json::to_value(value)?,
        })
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Text => self.text.clone(),
            OutputFormat::Json => serde_json::to_string_pretty(&self.json)?,
        })
    }
}

impl Command {
    pub async fn run(self, ctx: &AppContext) -> Result<CommandOutput> {
        match self {
            Command::Task(cmd) => cmd.run(ctx).await,
            Command::Subtask(cmd) => cmd.run(ctx).await,
            Command::Group(cmd) => cmd.run(ctx).await,
            Command::Tag(cmd) => cmd.run(ctx).await,
            Command::Quote(cmd) => cmd.run(ctx).await,
        }
    }
}

/// Parse an optional `YYYY-MM-DD` argument.
pub(crate) fn parse_due(raw: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    raw.map(crate::db::parse_date_arg).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "taskdeck", "task", "list", "--format", "json", "--database", "x.db",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.database, Some(PathBuf::from("x.db")));
        assert!(matches!(cli.command, Command::Task(TaskCommand::List { .. })));
    }

    #[test]
    fn render_json_and_text() {
        let out = CommandOutput::new("hello", &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(out.render(OutputFormat::Text).unwrap(), "hello");
        assert!(out.render(OutputFormat::Json).unwrap().contains("\"a\": 1"));
    }
}
