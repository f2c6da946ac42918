//! Subtask group CRUD and per-task ordering rows.

use super::tasks::task_row;
use super::{Database, new_id, now_ms, require_name};
use crate::error::ErrorReport;
use crate::types::{OrderEntry, PartitionLocation, SubtaskGroup};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

const GROUP_COLUMNS: &str = "id, task_id, name, order_index, created_at, updated_at";

pub fn parse_group_row(row: &Row) -> rusqlite::Result<SubtaskGroup> {
    Ok(SubtaskGroup {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        name: row.get("name")?,
        order_index: row.get("order_index")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn group_row(conn: &Connection, group_id: &str) -> Result<Option<SubtaskGroup>> {
    let group = conn
        .query_row(
            &format!("SELECT {} FROM subtask_groups WHERE id = ?1", GROUP_COLUMNS),
            params![group_id],
            parse_group_row,
        )
        .optional()?;
    Ok(group)
}

/// Groups of a task in display order.
pub(crate) fn group_rows(conn: &Connection, task_id: &str) -> Result<Vec<SubtaskGroup>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM subtask_groups WHERE task_id = ?1 ORDER BY order_index, id",
        GROUP_COLUMNS
    ))?;
    let groups = stmt
        .query_map(params![task_id], parse_group_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(groups)
}

pub(crate) fn insert_group(
    conn: &Connection,
    task_id: &str,
    name: &str,
    order_index: u32,
) -> Result<SubtaskGroup> {
    let id = new_id();
    let now = now_ms();
    conn.execute(
        "INSERT INTO subtask_groups (id, task_id, name, order_index, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![id, task_id, name, order_index, now],
    )?;
    group_row(conn, &id)?.ok_or_else(|| ErrorReport::group_not_found(&id).into())
}

impl Database {
    /// Create a group at `order_index` within its task.
    ///
    /// The index normally comes from the manager's `append_partition`.
    pub fn create_group(&self, task_id: &str, name: &str, order_index: u32) -> Result<SubtaskGroup> {
        let name = require_name("name", name)?;

        let group = self.with_conn(|conn| {
            if task_row(conn, task_id)?.is_none() {
                return Err(ErrorReport::task_not_found(task_id).into());
            }
            insert_group(conn, task_id, &name, order_index)
        })?;

        info!(group_id = %group.id, task_id, order_index, "Created subtask group");
        Ok(group)
    }

    pub fn get_group(&self, group_id: &str) -> Result<Option<SubtaskGroup>> {
        self.with_conn(|conn| group_row(conn, group_id))
    }

    pub fn list_groups(&self, task_id: &str) -> Result<Vec<SubtaskGroup>> {
        self.with_conn(|conn| group_rows(conn, task_id))
    }

    pub fn rename_group(&self, group_id: &str, name: &str) -> Result<SubtaskGroup> {
        let name = require_name("name", name)?;

        let group = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE subtask_groups SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now_ms(), group_id],
            )?;
            if changed == 0 {
                return Err(ErrorReport::group_not_found(group_id).into());
            }
            group_row(conn, group_id)?.ok_or_else(|| ErrorReport::group_not_found(group_id).into())
        })?;

        info!(group_id, name = %group.name, "Renamed subtask group");
        Ok(group)
    }

    // =========================================================================
    // Ordering rows
    // =========================================================================

    /// `(id, order_index)` of every group of a task.
    pub fn group_order(&self, task_id: &str) -> Result<Vec<OrderEntry>> {
        Ok(self
            .list_groups(task_id)?
            .into_iter()
            .map(|g| OrderEntry::new(g.id, g.order_index))
            .collect())
    }

    /// Write a batch of group indices in one transaction.
    pub fn write_group_order(&self, entries: &[OrderEntry]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "UPDATE subtask_groups SET order_index = ?1, updated_at = ?2 WHERE id = ?3",
                )?;
                let now = now_ms();
                for entry in entries {
                    let changed = stmt.execute(params![entry.order_index, now, entry.id])?;
                    if changed == 0 {
                        return Err(ErrorReport::group_not_found(&entry.id).into());
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn group_location(&self, group_id: &str) -> Result<Option<PartitionLocation>> {
        Ok(self.get_group(group_id)?.map(|g| PartitionLocation {
            id: g.id,
            owner_id: g.task_id,
            order_index: g.order_index,
        }))
    }

    /// Delete a group row; its subtasks go with it. Siblings are not renumbered.
    pub fn delete_group_row(&self, group_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("DELETE FROM subtask_groups WHERE id = ?1", params![group_id])?;
            if changed == 0 {
                return Err(ErrorReport::group_not_found(group_id).into());
            }
            Ok(())
        })
    }
}
