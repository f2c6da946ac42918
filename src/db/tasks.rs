//! Task CRUD, filtering, copying and detail loading.

use super::groups::{group_rows, insert_group};
use super::subtasks::{insert_subtask, subtask_rows};
use super::{Database, format_date, new_id, now_ms, optional_text, parse_date, require_name};
use crate::error::ErrorReport;
use crate::ordering;
use crate::types::{
    GroupDetail, OrderEntry, StatusFilter, SubtaskInput, Task, TaskDetail, TaskInput, TaskQuery,
};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::HashMap;
use tracing::{debug, info};

const TASK_COLUMNS: &str = "id, name, content, due_date, completed_at, created_at, updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        due_date: parse_date(row.get("due_date")?),
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn task_row(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

fn insert_task(conn: &Connection, name: &str, content: Option<&str>, due: Option<String>) -> Result<Task> {
    let id = new_id();
    let now = now_ms();
    conn.execute(
        "INSERT INTO tasks (id, name, content, due_date, completed_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
        params![id, name, content, due, now],
    )?;
    task_row(conn, &id)?.ok_or_else(|| ErrorReport::task_not_found(&id).into())
}

/// Escape LIKE wildcards so user search text matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl Database {
    /// Create a new task.
    pub fn create_task(&self, input: TaskInput) -> Result<Task> {
        let name = require_name("name", &input.name)?;
        let content = optional_text(input.content);

        let task = self.with_conn(|conn| {
            insert_task(conn, &name, content.as_deref(), format_date(input.due_date))
        })?;

        info!(task_id = %task.id, name = %task.name, "Created task");
        Ok(task)
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| task_row(conn, task_id))
    }

    /// Get a task by id, failing with `TASK_NOT_FOUND` if absent.
    pub fn require_task(&self, task_id: &str) -> Result<Task> {
        self.get_task(task_id)?
            .ok_or_else(|| ErrorReport::task_not_found(task_id).into())
    }

    /// List tasks, newest first.
    pub fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            values.push(Value::Text(like_pattern(&search.to_lowercase())));
            let n = values.len();
            conditions.push(format!(
                "(LOWER(t.name) LIKE ?{n} ESCAPE '\\' OR LOWER(COALESCE(t.content, '')) LIKE ?{n} ESCAPE '\\')"
            ));
        }

        match query.status {
            StatusFilter::All => {}
            StatusFilter::Active => conditions.push("t.completed_at IS NULL".to_string()),
            StatusFilter::Completed => conditions.push("t.completed_at IS NOT NULL".to_string()),
        }

        if !query.tag_ids.is_empty() {
            let placeholders = query
                .tag_ids
                .iter()
                .map(|tag_id| {
                    values.push(Value::Text(tag_id.clone()));
                    format!("?{}", values.len())
                })
                .collect::<Vec<_>>()
                .join(", ");
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM task_tags tt WHERE tt.task_id = t.id AND tt.tag_id IN ({}))",
                placeholders
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT t.* FROM tasks t {} ORDER BY t.created_at DESC, t.id DESC",
            where_clause
        );
        debug!(%sql, "Listing tasks");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(values.iter()), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Replace a task's name, content and due date.
    pub fn update_task(&self, task_id: &str, input: TaskInput) -> Result<Task> {
        let name = require_name("name", &input.name)?;
        let content = optional_text(input.content);

        let task = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET name = ?1, content = ?2, due_date = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![name, content, format_date(input.due_date), now_ms(), task_id],
            )?;
            if changed == 0 {
                return Err(ErrorReport::task_not_found(task_id).into());
            }
            task_row(conn, task_id)?.ok_or_else(|| ErrorReport::task_not_found(task_id).into())
        })?;

        info!(task_id, "Updated task");
        Ok(task)
    }

    /// Delete a task together with its groups, subtasks and tag links.
    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            if changed == 0 {
                return Err(ErrorReport::task_not_found(task_id).into());
            }
            Ok(())
        })?;

        info!(task_id, "Deleted task");
        Ok(())
    }

    /// Flip a task between completed and open.
    pub fn toggle_task_complete(&self, task_id: &str) -> Result<Task> {
        let task = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current =
                task_row(&tx, task_id)?.ok_or_else(|| ErrorReport::task_not_found(task_id))?;
            let now = now_ms();
            let completed_at = if current.is_completed() { None } else { Some(now) };
            tx.execute(
                "UPDATE tasks SET completed_at = ?1, updated_at = ?2 WHERE id = ?3",
                params![completed_at, now, task_id],
            )?;
            let task =
                task_row(&tx, task_id)?.ok_or_else(|| ErrorReport::task_not_found(task_id))?;
            tx.commit()?;
            Ok(task)
        })?;

        info!(task_id, completed = task.is_completed(), "Toggled task completion");
        Ok(task)
    }

    /// Duplicate a task with its groups and subtasks.
    ///
    /// The copy is named "<name> (Copy)", is open, and all copied subtasks
    /// are open and not skipped. Group and subtask order is preserved and
    /// written densely. Tags are not copied.
    pub fn copy_task(&self, task_id: &str) -> Result<Task> {
        let task = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let original =
                task_row(&tx, task_id)?.ok_or_else(|| ErrorReport::task_not_found(task_id))?;
            let copy = insert_task(
                &tx,
                &format!("{} (Copy)", original.name),
                original.content.as_deref(),
                format_date(original.due_date),
            )?;

            let groups = group_rows(&tx, task_id)?;
            let group_order = ordering::current_sequence(
                groups
                    .iter()
                    .map(|g| OrderEntry::new(g.id.clone(), g.order_index))
                    .collect(),
            );
            let mut group_ids: HashMap<String, String> = HashMap::new();
            for (index, old_id) in group_order.iter().enumerate() {
                if let Some(group) = groups.iter().find(|g| &g.id == old_id) {
                    let new_group = insert_group(&tx, &copy.id, &group.name, index as u32)?;
                    group_ids.insert(group.id.clone(), new_group.id);
                }
            }

            let mut partitions: HashMap<Option<String>, Vec<_>> = HashMap::new();
            for subtask in subtask_rows(&tx, task_id)? {
                partitions.entry(subtask.group_id.clone()).or_default().push(subtask);
            }
            for (old_group, members) in partitions {
                let new_group = match old_group {
                    Some(ref gid) => Some(group_ids.get(gid).cloned().ok_or_else(|| {
                        ErrorReport::group_not_found(gid)
                    })?),
                    None => None,
                };
                let order = ordering::current_sequence(
                    members
                        .iter()
                        .map(|s| OrderEntry::new(s.id.clone(), s.order_index))
                        .collect(),
                );
                for (index, old_id) in order.iter().enumerate() {
                    if let Some(subtask) = members.iter().find(|s| &s.id == old_id) {
                        insert_subtask(
                            &tx,
                            &SubtaskInput {
                                task_id: copy.id.clone(),
                                group_id: new_group.clone(),
                                name: subtask.name.clone(),
                                content: subtask.content.clone(),
                                due_date: subtask.due_date,
                            },
                            index as u32,
                        )?;
                    }
                }
            }

            tx.commit()?;
            Ok(copy)
        })?;

        info!(source = task_id, task_id = %task.id, "Copied task");
        Ok(task)
    }

    /// Load a task with its tags, ungrouped subtasks and ordered groups.
    pub fn get_task_detail(&self, task_id: &str) -> Result<TaskDetail> {
        let (task, groups, subtasks) = self.with_conn(|conn| {
            let task =
                task_row(conn, task_id)?.ok_or_else(|| ErrorReport::task_not_found(task_id))?;
            Ok((task, group_rows(conn, task_id)?, subtask_rows(conn, task_id)?))
        })?;
        let tags = self.tags_for_task(task_id)?;

        let mut by_group: HashMap<Option<String>, Vec<_>> = HashMap::new();
        for subtask in subtasks {
            by_group.entry(subtask.group_id.clone()).or_default().push(subtask);
        }

        let groups = groups
            .into_iter()
            .map(|group| GroupDetail {
                subtasks: by_group.remove(&Some(group.id.clone())).unwrap_or_default(),
                group,
            })
            .collect();

        Ok(TaskDetail {
            task,
            tags,
            ungrouped: by_group.remove(&None).unwrap_or_default(),
            groups,
        })
    }
}
