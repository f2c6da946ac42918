//! Subtask CRUD and per-partition ordering rows.

use super::groups::group_row;
use super::tasks::task_row;
use super::{Database, format_date, new_id, now_ms, optional_text, parse_date, require_name};
use crate::error::ErrorReport;
use crate::types::{ItemLocation, OrderEntry, Placement, Subtask, SubtaskInput, SubtaskUpdate};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

const SUBTASK_COLUMNS: &str = "id, task_id, group_id, name, content, due_date, completed_at, \
                               skipped, order_index, created_at, updated_at";

pub fn parse_subtask_row(row: &Row) -> rusqlite::Result<Subtask> {
    Ok(Subtask {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        group_id: row.get("group_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        due_date: parse_date(row.get("due_date")?),
        completed_at: row.get("completed_at")?,
        skipped: row.get("skipped")?,
        order_index: row.get("order_index")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn subtask_row(conn: &Connection, subtask_id: &str) -> Result<Option<Subtask>> {
    let subtask = conn
        .query_row(
            &format!("SELECT {} FROM subtasks WHERE id = ?1", SUBTASK_COLUMNS),
            params![subtask_id],
            parse_subtask_row,
        )
        .optional()?;
    Ok(subtask)
}

/// All subtasks of a task, ordered by partition position.
pub(crate) fn subtask_rows(conn: &Connection, task_id: &str) -> Result<Vec<Subtask>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM subtasks WHERE task_id = ?1 ORDER BY order_index, id",
        SUBTASK_COLUMNS
    ))?;
    let subtasks = stmt
        .query_map(params![task_id], parse_subtask_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(subtasks)
}

/// Insert a subtask row at the given index. The caller picks the index.
pub(crate) fn insert_subtask(
    conn: &Connection,
    input: &SubtaskInput,
    order_index: u32,
) -> Result<Subtask> {
    let id = new_id();
    let now = now_ms();
    conn.execute(
        "INSERT INTO subtasks (id, task_id, group_id, name, content, due_date, completed_at,
                               skipped, order_index, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, 0, ?7, ?8, ?8)",
        params![
            id,
            input.task_id,
            input.group_id,
            input.name,
            input.content,
            format_date(input.due_date),
            order_index,
            now
        ],
    )?;
    subtask_row(conn, &id)?.ok_or_else(|| ErrorReport::subtask_not_found(&id).into())
}

impl Database {
    /// Create a subtask at `order_index` of its partition.
    ///
    /// The index normally comes from the manager's `append_item`.
    pub fn create_subtask(&self, input: SubtaskInput, order_index: u32) -> Result<Subtask> {
        let input = SubtaskInput {
            name: require_name("name", &input.name)?,
            content: optional_text(input.content),
            ..input
        };

        let subtask = self.with_conn(|conn| {
            if task_row(conn, &input.task_id)?.is_none() {
                return Err(ErrorReport::task_not_found(&input.task_id).into());
            }
            if let Some(ref group_id) = input.group_id {
                match group_row(conn, group_id)? {
                    Some(group) if group.task_id == input.task_id => {}
                    _ => return Err(ErrorReport::group_not_found(group_id).into()),
                }
            }
            insert_subtask(conn, &input, order_index)
        })?;

        info!(
            subtask_id = %subtask.id,
            task_id = %subtask.task_id,
            group_id = ?subtask.group_id,
            order_index,
            "Created subtask"
        );
        Ok(subtask)
    }

    pub fn get_subtask(&self, subtask_id: &str) -> Result<Option<Subtask>> {
        self.with_conn(|conn| subtask_row(conn, subtask_id))
    }

    /// Get a subtask by id, failing with `SUBTASK_NOT_FOUND` if absent.
    pub fn require_subtask(&self, subtask_id: &str) -> Result<Subtask> {
        self.get_subtask(subtask_id)?
            .ok_or_else(|| ErrorReport::subtask_not_found(subtask_id).into())
    }

    /// All subtasks of a task, ordered by position within their partition.
    pub fn list_subtasks(&self, task_id: &str) -> Result<Vec<Subtask>> {
        self.with_conn(|conn| subtask_rows(conn, task_id))
    }

    /// Apply a partial update to a subtask's editable fields.
    pub fn update_subtask(&self, subtask_id: &str, update: SubtaskUpdate) -> Result<Subtask> {
        let name = update
            .name
            .as_deref()
            .map(|n| require_name("name", n))
            .transpose()?;

        let subtask = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = subtask_row(&tx, subtask_id)?
                .ok_or_else(|| ErrorReport::subtask_not_found(subtask_id))?;

            let name = name.unwrap_or(current.name);
            let content = match update.content {
                Some(content) => optional_text(content),
                None => current.content,
            };
            let due_date = update.due_date.unwrap_or(current.due_date);

            tx.execute(
                "UPDATE subtasks SET name = ?1, content = ?2, due_date = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![name, content, format_date(due_date), now_ms(), subtask_id],
            )?;
            let subtask = subtask_row(&tx, subtask_id)?
                .ok_or_else(|| ErrorReport::subtask_not_found(subtask_id))?;
            tx.commit()?;
            Ok(subtask)
        })?;

        info!(subtask_id, "Updated subtask");
        Ok(subtask)
    }

    /// Flip a subtask between completed and open. Skip state is untouched.
    pub fn toggle_subtask_complete(&self, subtask_id: &str) -> Result<Subtask> {
        let subtask = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = subtask_row(&tx, subtask_id)?
                .ok_or_else(|| ErrorReport::subtask_not_found(subtask_id))?;
            let now = now_ms();
            let completed_at = if current.is_completed() { None } else { Some(now) };
            tx.execute(
                "UPDATE subtasks SET completed_at = ?1, updated_at = ?2 WHERE id = ?3",
                params![completed_at, now, subtask_id],
            )?;
            let subtask = subtask_row(&tx, subtask_id)?
                .ok_or_else(|| ErrorReport::subtask_not_found(subtask_id))?;
            tx.commit()?;
            Ok(subtask)
        })?;

        info!(subtask_id, completed = subtask.is_completed(), "Toggled subtask completion");
        Ok(subtask)
    }

    /// Flip a subtask's skipped flag. Completion is untouched.
    pub fn toggle_subtask_skip(&self, subtask_id: &str) -> Result<Subtask> {
        let subtask = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE subtasks SET skipped = NOT skipped, updated_at = ?1 WHERE id = ?2",
                params![now_ms(), subtask_id],
            )?;
            if changed == 0 {
                return Err(ErrorReport::subtask_not_found(subtask_id).into());
            }
            subtask_row(conn, subtask_id)?
                .ok_or_else(|| ErrorReport::subtask_not_found(subtask_id).into())
        })?;

        info!(subtask_id, skipped = subtask.skipped, "Toggled subtask skip");
        Ok(subtask)
    }

    // =========================================================================
    // Ordering rows
    // =========================================================================

    /// `(id, order_index)` of every subtask in one partition of a task.
    pub fn subtask_order(&self, task_id: &str, group_id: Option<&str>) -> Result<Vec<OrderEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, order_index FROM subtasks
                 WHERE task_id = ?1 AND group_id IS ?2
                 ORDER BY order_index, id",
            )?;
            let entries = stmt
                .query_map(params![task_id, group_id], |row| {
                    Ok(OrderEntry {
                        id: row.get(0)?,
                        order_index: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    /// Write a batch of subtask placements in one transaction.
    ///
    /// Fails without applying anything if any id is unknown.
    pub fn write_subtask_placements(&self, placements: &[Placement]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "UPDATE subtasks SET group_id = ?1, order_index = ?2, updated_at = ?3
                     WHERE id = ?4",
                )?;
                let now = now_ms();
                for placement in placements {
                    let changed = stmt.execute(params![
                        placement.partition_id,
                        placement.order_index,
                        now,
                        placement.id
                    ])?;
                    if changed == 0 {
                        return Err(ErrorReport::subtask_not_found(&placement.id).into());
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Where a subtask currently lives.
    pub fn subtask_location(&self, subtask_id: &str) -> Result<Option<ItemLocation>> {
        Ok(self.get_subtask(subtask_id)?.map(|s| ItemLocation {
            id: s.id,
            owner_id: s.task_id,
            partition_id: s.group_id,
            order_index: s.order_index,
        }))
    }

    /// Delete a subtask row. Siblings are not renumbered here.
    pub fn delete_subtask_row(&self, subtask_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM subtasks WHERE id = ?1", params![subtask_id])?;
            if changed == 0 {
                return Err(ErrorReport::subtask_not_found(subtask_id).into());
            }
            Ok(())
        })
    }
}
