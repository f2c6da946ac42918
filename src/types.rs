//! Core types for taskdeck.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A top-level task. Owns subtasks and subtask groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub content: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A subtask. `group_id = None` places it in the task's ungrouped partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub task_id: String,
    pub group_id: Option<String>,
    pub name: String,
    pub content: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<i64>,
    /// Independent of completion; display precedence is up to the caller.
    pub skipped: bool,
    pub order_index: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Subtask {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A named group of subtasks within a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskGroup {
    pub id: String,
    pub task_id: String,
    pub name: String,
    pub order_index: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A user-defined label that can be attached to tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A quote shown alongside the task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub quote_text: String,
    pub created_at: i64,
}

/// Input for creating or replacing a task's editable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    pub name: String,
    pub content: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Input for creating a subtask.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtaskInput {
    pub task_id: String,
    pub group_id: Option<String>,
    pub name: String,
    pub content: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Partial update for a subtask's editable fields.
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct SubtaskUpdate {
    pub name: Option<String>,
    pub content: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// Completion filter for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(StatusFilter::All),
            "active" | "open" => Some(StatusFilter::Active),
            "completed" | "done" => Some(StatusFilter::Completed),
            _ => None,
        }
    }
}

/// Query options for `list_tasks`.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Case-insensitive substring matched against name and content.
    pub search: Option<String>,
    pub status: StatusFilter,
    /// Task must carry at least one of the listed tag ids.
    pub tag_ids: Vec<String>,
}

/// A group together with its ordered subtasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: SubtaskGroup,
    pub subtasks: Vec<Subtask>,
}

/// A task with everything needed to render it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub tags: Vec<Tag>,
    /// Subtasks with no group, in order.
    pub ungrouped: Vec<Subtask>,
    /// Groups in order, each with its subtasks in order.
    pub groups: Vec<GroupDetail>,
}

/// Completed vs. counted subtasks. Skipped subtasks are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl TaskDetail {
    /// Iterate all subtasks, ungrouped first, then group by group.
    pub fn subtasks(&self) -> impl Iterator<Item = &Subtask> {
        self.ungrouped
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.subtasks.iter()))
    }

    pub fn progress(&self) -> Progress {
        let counted = self.subtasks().filter(|s| !s.skipped);
        let (completed, total) = counted.fold((0, 0), |(done, total), s| {
            (done + usize::from(s.is_completed()), total + 1)
        });
        Progress { completed, total }
    }
}

// =============================================================================
// Ordering records
// =============================================================================

/// An id and its position within a sibling sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: String,
    pub order_index: u32,
}

impl OrderEntry {
    pub fn new(id: impl Into<String>, order_index: u32) -> Self {
        Self {
            id: id.into(),
            order_index,
        }
    }
}

/// Full placement of an item: which partition it lives in and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub partition_id: Option<String>,
    pub order_index: u32,
}

/// Where an item currently lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLocation {
    pub id: String,
    pub owner_id: String,
    pub partition_id: Option<String>,
    pub order_index: u32,
}

/// Where a partition currently lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionLocation {
    pub id: String,
    pub owner_id: String,
    pub order_index: u32,
}

/// Human-readable label for a partition reference.
pub fn partition_label(partition_id: Option<&str>) -> String {
    match partition_id {
        Some(id) => format!("group {}", id),
        None => "ungrouped".to_string(),
    }
}
