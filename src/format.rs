//! Output formatting for the CLI: markdown-style text or JSON.

use crate::types::{OrderEntry, Quote, Subtask, SubtaskGroup, Tag, Task, TaskDetail};
use serde::{Deserialize, Serialize};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "markdown" | "md" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

fn checkbox(completed: bool) -> &'static str {
    if completed { "[x]" } else { "[ ]" }
}

/// One-line summary of a task.
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!("{} {} `{}`", checkbox(task.is_completed()), task.name, task.id);
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (due {})", due));
    }
    line
}

/// Format a list of tasks as markdown.
pub fn format_tasks_markdown(tasks: &[Task]) -> String {
    let mut md = format!("# Tasks ({})\n\n", tasks.len());
    for task in tasks {
        md.push_str("- ");
        md.push_str(&format_task_line(task));
        md.push('\n');
    }
    md
}

fn format_subtask_line(subtask: &Subtask) -> String {
    let mut line = format!(
        "{}. {} {}",
        subtask.order_index,
        checkbox(subtask.is_completed()),
        subtask.name
    );
    if subtask.skipped {
        line.push_str(" _(skipped)_");
    }
    if let Some(due) = subtask.due_date {
        line.push_str(&format!(" (due {})", due));
    }
    line.push_str(&format!(" `{}`", subtask.id));
    line
}

fn format_tag_list(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t.name))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a task with its subtasks as markdown.
pub fn format_task_detail_markdown(detail: &TaskDetail) -> String {
    let task = &detail.task;
    let mut md = String::new();

    md.push_str(&format!("## {} {}\n", checkbox(task.is_completed()), task.name));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    if let Some(due) = task.due_date {
        md.push_str(&format!("- **due**: {}\n", due));
    }
    if !detail.tags.is_empty() {
        md.push_str(&format!("- **tags**: {}\n", format_tag_list(&detail.tags)));
    }
    let progress = detail.progress();
    md.push_str(&format!(
        "- **progress**: {}/{}\n",
        progress.completed, progress.total
    ));

    if let Some(ref content) = task.content {
        md.push('\n');
        md.push_str(content);
        md.push('\n');
    }

    if !detail.ungrouped.is_empty() {
        md.push_str("\n### Subtasks\n");
        for subtask in &detail.ungrouped {
            md.push_str(&format_subtask_line(subtask));
            md.push('\n');
        }
    }

    for group in &detail.groups {
        md.push_str(&format!(
            "\n### {}. {} `{}`\n",
            group.group.order_index, group.group.name, group.group.id
        ));
        if group.subtasks.is_empty() {
            md.push_str("_(empty)_\n");
        }
        for subtask in &group.subtasks {
            md.push_str(&format_subtask_line(subtask));
            md.push('\n');
        }
    }

    md
}

pub fn format_subtask_markdown(subtask: &Subtask) -> String {
    format_subtask_line(subtask)
}

pub fn format_group_markdown(group: &SubtaskGroup) -> String {
    format!("{}. {} `{}`", group.order_index, group.name, group.id)
}

pub fn format_tags_markdown(tags: &[Tag]) -> String {
    let mut md = format!("# Tags ({})\n\n", tags.len());
    for tag in tags {
        md.push_str(&format!("- #{} `{}`", tag.name, tag.id));
        if let Some(ref color) = tag.color {
            md.push_str(&format!(" {}", color));
        }
        md.push('\n');
    }
    md
}

/// Format a rewritten order as `index. id` lines.
pub fn format_order_markdown(entries: &[OrderEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}. `{}`", e.order_index, e.id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A quote as a markdown blockquote.
pub fn format_quote(quote: &Quote) -> String {
    format!("> {}", quote.quote_text)
}

pub fn format_quotes_markdown(quotes: &[Quote]) -> String {
    let mut md = format!("# Quotes ({})\n\n", quotes.len());
    for quote in quotes {
        md.push_str(&format!("- {} `{}`\n", quote.quote_text, quote.id));
    }
    md
}
