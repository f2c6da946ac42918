//! `task` subcommands.

use super::{AppContext, CommandOutput, parse_due};
use crate::error::ErrorReport;
use crate::format::{
    format_quote, format_task_detail_markdown, format_task_line, format_tasks_markdown,
};
use crate::types::{StatusFilter, TaskInput, TaskQuery};
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task
    Add {
        name: String,
        #[arg(long)]
        content: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks, newest first
    List {
        /// Substring to match in name or content
        #[arg(long)]
        search: Option<String>,
        /// all, active or completed
        #[arg(long, default_value = "all")]
        status: String,
        /// Only tasks carrying any of these tags (name or id); repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show a task with its groups and subtasks
    Show { id: String },

    /// Edit a task's fields; omitted fields keep their value
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_content")]
        content: Option<String>,
        /// Remove the content
        #[arg(long)]
        clear_content: bool,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Delete a task and everything under it
    Rm { id: String },

    /// Toggle a task's completion
    Done { id: String },

    /// Duplicate a task with its groups and subtasks
    Copy { id: String },
}

impl TaskCommand {
    pub async fn run(self, ctx: &AppContext) -> Result<CommandOutput> {
        let db = &ctx.db;
        match self {
            TaskCommand::Add { name, content, due } => {
                let task = db.create_task(TaskInput {
                    name,
                    content,
                    due_date: parse_due(due.as_deref())?,
                })?;
                CommandOutput::new(format!("Created {}", format_task_line(&task)), &task)
            }

            TaskCommand::List {
                search,
                status,
                tags,
            } => {
                let status = StatusFilter::from_str(&status).ok_or_else(|| {
                    ErrorReport::invalid_value("status", "expected all, active or completed")
                })?;
                let tag_ids = tags
                    .iter()
                    .map(|t| super::tag::resolve_tag(db, t).map(|tag| tag.id))
                    .collect::<Result<Vec<_>>>()?;
                let tasks = db.list_tasks(&TaskQuery {
                    search,
                    status,
                    tag_ids,
                })?;
                let mut text = format_tasks_markdown(&tasks);
                if let Some(quote) = db.random_quote()? {
                    text.push('\n');
                    text.push_str(&format_quote(&quote));
                    text.push('\n');
                }
                CommandOutput::new(text, &tasks)
            }

            TaskCommand::Show { id } => {
                let detail = db.get_task_detail(&id)?;
                CommandOutput::new(format_task_detail_markdown(&detail), &detail)
            }

            TaskCommand::Edit {
                id,
                name,
                content,
                clear_content,
                due,
                clear_due,
            } => {
                let current = db.require_task(&id)?;
                let due_date = if clear_due {
                    None
                } else {
                    parse_due(due.as_deref())?.or(current.due_date)
                };
                let content = if clear_content {
                    None
                } else {
                    content.or(current.content)
                };
                let task = db.update_task(
                    &id,
                    TaskInput {
                        name: name.unwrap_or(current.name),
                        content,
                        due_date,
                    },
                )?;
                CommandOutput::new(format!("Updated {}", format_task_line(&task)), &task)
            }

            TaskCommand::Rm { id } => {
                db.delete_task(&id)?;
                CommandOutput::new(format!("Deleted task `{}`", id), &serde_json::json!({ "deleted": id }))
            }

            TaskCommand::Done { id } => {
                let task = db.toggle_task_complete(&id)?;
                CommandOutput::new(format_task_line(&task), &task)
            }

            TaskCommand::Copy { id } => {
                let task = db.copy_task(&id)?;
                CommandOutput::new(format!("Copied to {}", format_task_line(&task)), &task)
            }
        }
    }
}
