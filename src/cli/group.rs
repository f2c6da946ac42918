//! `group` subcommands.

use super::{AppContext, CommandOutput};
use crate::format::{format_group_markdown, format_order_markdown};
use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Append a subtask group to a task
    Add { task_id: String, name: String },

    /// Rename a subtask group
    Rename { id: String, name: String },

    /// Delete a group together with its subtasks
    Rm { id: String },

    /// Set the full order of a task's groups
    Reorder {
        task_id: String,
        /// Every group id of the task, in the new order
        ids: Vec<String>,
    },
}

impl GroupCommand {
    pub async fn run(self, ctx: &AppContext) -> Result<CommandOutput> {
        let db = &ctx.db;
        let manager = &ctx.manager;
        match self {
            GroupCommand::Add { task_id, name } => {
                db.require_task(&task_id)?;
                let index = manager.append_partition(&task_id).await?;
                let group = db.create_group(&task_id, &name, index)?;
                CommandOutput::new(format!("Added {}", format_group_markdown(&group)), &group)
            }

            GroupCommand::Rename { id, name } => {
                let group = db.rename_group(&id, &name)?;
                CommandOutput::new(format_group_markdown(&group), &group)
            }

            GroupCommand::Rm { id } => {
                let order = manager.remove_partition(&id).await?;
                CommandOutput::new(
                    format!("Deleted group `{}`\n{}", id, format_order_markdown(&order)),
                    &json!({ "deleted": id, "order": order }),
                )
            }

            GroupCommand::Reorder { task_id, ids } => {
                let order = manager.reorder_partitions(&task_id, &ids).await?;
                CommandOutput::new(format_order_markdown(&order), &order)
            }
        }
    }
}
