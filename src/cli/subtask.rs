//! `subtask` subcommands. Ordering changes go through the manager.

use super::{AppContext, CommandOutput, parse_due};
use crate::format::{format_order_markdown, format_subtask_markdown};
use crate::types::{SubtaskInput, SubtaskUpdate};
use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum SubtaskCommand {
    /// Append a subtask to a task (or one of its groups)
    Add {
        task_id: String,
        name: String,
        /// Group to add into; ungrouped when omitted
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// Edit a subtask's fields; omitted fields keep their value
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

    /// Delete a subtask and close the gap in its list
    Rm { id: String },

    /// Toggle a subtask's completion
    Done { id: String },

    /// Toggle whether a subtask is skipped
    Skip { id: String },

    /// Move a subtask to a position, optionally into another group
    Move {
        id: String,
        /// Zero-based target position (clamped to the list length)
        #[arg(long)]
        index: usize,
        /// Destination group
        #[arg(long, conflicts_with = "ungrouped")]
        group: Option<String>,
        /// Move out of any group
        #[arg(long)]
        ungrouped: bool,
    },

    /// Set the full order of one list of subtasks
    Reorder {
        task_id: String,
        /// Group whose subtasks are listed; ungrouped when omitted
        #[arg(long)]
        group: Option<String>,
        /// Every subtask id of the list, in the new order
        ids: Vec<String>,
    },
}

impl SubtaskCommand {
    pub async fn run(self, ctx: &AppContext) -> Result<CommandOutput> {
        let db = &ctx.db;
        let manager = &ctx.manager;
        match self {
            SubtaskCommand::Add {
                task_id,
                name,
                group,
                content,
                due,
            } => {
                let due_date = parse_due(due.as_deref())?;
                db.require_task(&task_id)?;
                let index = manager.append_item(&task_id, group.as_deref()).await?;
                let subtask = db.create_subtask(
                    SubtaskInput {
                        task_id,
                        group_id: group,
                        name,
                        content,
                        due_date,
                    },
                    index,
                )?;
                CommandOutput::new(
                    format!("Added {}", format_subtask_markdown(&subtask)),
                    &subtask,
                )
            }

            SubtaskCommand::Edit {
                id,
                name,
                content,
                clear_content,
                due,
                clear_due,
            } => {
                let due_date = if clear_due {
                    Some(None)
                } else {
                    parse_due(due.as_deref())?.map(Some)
                };
                let content = if clear_content {
                    Some(None)
                } else {
                    content.map(Some)
                };
                let subtask = db.update_subtask(
                    &id,
                    SubtaskUpdate {
                        name,
                        content,
                        due_date,
                    },
                )?;
                CommandOutput::new(
                    format!("Updated {}", format_subtask_markdown(&subtask)),
                    &subtask,
                )
            }

            SubtaskCommand::Rm { id } => {
                let order = manager.remove_item(&id).await?;
                CommandOutput::new(
                    format!("Deleted subtask `{}`\n{}", id, format_order_markdown(&order)),
                    &json!({ "deleted": id, "order": order }),
                )
            }

            SubtaskCommand::Done { id } => {
                let subtask = db.toggle_subtask_complete(&id)?;
                CommandOutput::new(format_subtask_markdown(&subtask), &subtask)
            }

            SubtaskCommand::Skip { id } => {
                let subtask = db.toggle_subtask_skip(&id)?;
                CommandOutput::new(format_subtask_markdown(&subtask), &subtask)
            }

            SubtaskCommand::Move {
                id,
                index,
                group,
                ungrouped,
            } => {
                let current = db.require_subtask(&id)?;
                let to = match (group, ungrouped) {
                    (Some(group), _) => Some(group),
                    (None, true) => None,
                    (None, false) => current.group_id.clone(),
                };
                let outcome = manager
                    .move_item(&id, current.group_id.as_deref(), to.as_deref(), index)
                    .await?;
                let subtask = db.require_subtask(&id)?;
                CommandOutput::new(
                    format!("Moved {}", format_subtask_markdown(&subtask)),
                    &json!({ "subtask": subtask, "index": outcome.index, "written": outcome.written }),
                )
            }

            SubtaskCommand::Reorder {
                task_id,
                group,
                ids,
            } => {
                let order = manager
                    .reorder_within_partition(&task_id, group.as_deref(), &ids)
                    .await?;
                CommandOutput::new(format_order_markdown(&order), &order)
            }
        }
    }
}
