//! `tag` subcommands.

use super::{AppContext, CommandOutput};
use crate::db::Database;
use crate::error::ErrorReport;
use crate::format::format_tags_markdown;
use crate::types::Tag;
use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Create a tag
    Add {
        name: String,
        /// Display color, e.g. #ff8800
        #[arg(long)]
        color: Option<String>,
    },

    /// List all tags
    List,

    /// Rename or recolor a tag
    Edit {
        /// Tag name or id
        tag: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a tag and detach it from every task
    Rm {
        /// Tag name or id
        tag: String,
    },

    /// Attach tags to a task
    Attach {
        task_id: String,
        /// Tag names or ids
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Detach tags from a task (all tags when none are listed)
    Detach {
        task_id: String,
        /// Tag names or ids
        tags: Vec<String>,
    },

    /// Replace a task's tags with exactly the listed ones
    Set {
        task_id: String,
        /// Tag names or ids
        tags: Vec<String>,
    },
}

/// Look a tag up by exact name first, then by id.
pub(crate) fn resolve_tag(db: &Database, name_or_id: &str) -> Result<Tag> {
    if let Some(tag) = db.find_tag_by_name(name_or_id)? {
        return Ok(tag);
    }
    db.get_tag(name_or_id)?
        .ok_or_else(|| ErrorReport::tag_not_found(name_or_id).into())
}

fn resolve_all(db: &Database, tags: &[String]) -> Result<Vec<String>> {
    tags.iter()
        .map(|t| resolve_tag(db, t).map(|tag| tag.id))
        .collect()
}

impl TagCommand {
    pub async fn run(self, ctx: &AppContext) -> Result<CommandOutput> {
        let db = &ctx.db;
        match self {
            TagCommand::Add { name, color } => {
                let tag = db.create_tag(&name, color)?;
                CommandOutput::new(format!("Created tag #{} `{}`", tag.name, tag.id), &tag)
            }

            TagCommand::List => {
                let tags = db.list_tags()?;
                CommandOutput::new(format_tags_markdown(&tags), &tags)
            }

            TagCommand::Edit { tag, name, color } => {
                let current = resolve_tag(db, &tag)?;
                let updated = db.update_tag(
                    &current.id,
                    name.as_deref().unwrap_or(&current.name),
                    color.or(current.color),
                )?;
                CommandOutput::new(format!("Updated tag #{}", updated.name), &updated)
            }

            TagCommand::Rm { tag } => {
                let current = resolve_tag(db, &tag)?;
                db.delete_tag(&current.id)?;
                CommandOutput::new(
                    format!("Deleted tag #{}", current.name),
                    &json!({ "deleted": current.id }),
                )
            }

            TagCommand::Attach { task_id, tags } => {
                let tag_ids = resolve_all(db, &tags)?;
                db.add_tags_to_task(&task_id, &tag_ids)?;
                let tags = db.tags_for_task(&task_id)?;
                CommandOutput::new(format_tags_markdown(&tags), &tags)
            }

            TagCommand::Detach { task_id, tags } => {
                db.require_task(&task_id)?;
                let tag_ids = resolve_all(db, &tags)?;
                db.remove_tags_from_task(&task_id, &tag_ids)?;
                let tags = db.tags_for_task(&task_id)?;
                CommandOutput::new(format_tags_markdown(&tags), &tags)
            }

            TagCommand::Set { task_id, tags } => {
                let tag_ids = resolve_all(db, &tags)?;
                db.set_task_tags(&task_id, &tag_ids)?;
                let tags = db.tags_for_task(&task_id)?;
                CommandOutput::new(format_tags_markdown(&tags), &tags)
            }
        }
    }
}
