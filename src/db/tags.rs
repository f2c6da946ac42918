//! Tags and task-tag links.

use super::tasks::task_row;
use super::{Database, new_id, now_ms, optional_text, require_name};
use crate::error::ErrorReport;
use crate::types::Tag;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode as SqliteErrorCode, OptionalExtension, Row, params};
use tracing::info;

pub fn parse_tag_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn tag_row(conn: &Connection, tag_id: &str) -> Result<Option<Tag>> {
    let tag = conn
        .query_row(
            "SELECT id, name, color, created_at, updated_at FROM tags WHERE id = ?1",
            params![tag_id],
            parse_tag_row,
        )
        .optional()?;
    Ok(tag)
}

/// Map a UNIQUE violation on `tags.name` to `ALREADY_EXISTS`.
fn map_unique(err: rusqlite::Error, name: &str) -> anyhow::Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == SqliteErrorCode::ConstraintViolation => {
            ErrorReport::already_exists("Tag", name).into()
        }
        other => other.into(),
    }
}

impl Database {
    pub fn create_tag(&self, name: &str, color: Option<String>) -> Result<Tag> {
        let name = require_name("name", name)?;
        let color = optional_text(color);

        let tag = self.with_conn(|conn| {
            let id = new_id();
            let now = now_ms();
            conn.execute(
                "INSERT INTO tags (id, name, color, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id, name, color, now],
            )
            .map_err(|e| map_unique(e, &name))?;
            tag_row(conn, &id)?.ok_or_else(|| ErrorReport::tag_not_found(&id).into())
        })?;

        info!(tag_id = %tag.id, name = %tag.name, "Created tag");
        Ok(tag)
    }

    pub fn get_tag(&self, tag_id: &str) -> Result<Option<Tag>> {
        self.with_conn(|conn| tag_row(conn, tag_id))
    }

    /// Find a tag by exact name.
    pub fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        self.with_conn(|conn| {
            let tag = conn
                .query_row(
                    "SELECT id, name, color, created_at, updated_at FROM tags WHERE name = ?1",
                    params![name.trim()],
                    parse_tag_row,
                )
                .optional()?;
            Ok(tag)
        })
    }

    /// All tags, by name.
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, color, created_at, updated_at FROM tags ORDER BY name ASC",
            )?;
            let tags = stmt
                .query_map([], parse_tag_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tags)
        })
    }

    pub fn update_tag(&self, tag_id: &str, name: &str, color: Option<String>) -> Result<Tag> {
        let name = require_name("name", name)?;
        let color = optional_text(color);

        let tag = self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE tags SET name = ?1, color = ?2, updated_at = ?3 WHERE id = ?4",
                    params![name, color, now_ms(), tag_id],
                )
                .map_err(|e| map_unique(e, &name))?;
            if changed == 0 {
                return Err(ErrorReport::tag_not_found(tag_id).into());
            }
            tag_row(conn, tag_id)?.ok_or_else(|| ErrorReport::tag_not_found(tag_id).into())
        })?;

        info!(tag_id, name = %tag.name, "Updated tag");
        Ok(tag)
    }

    /// Delete a tag and detach it from every task.
    pub fn delete_tag(&self, tag_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tags WHERE id = ?1", params![tag_id])?;
            if changed == 0 {
                return Err(ErrorReport::tag_not_found(tag_id).into());
            }
            Ok(())
        })?;

        info!(tag_id, "Deleted tag");
        Ok(())
    }

    /// Attach tags to a task. Already-attached tags are left alone.
    pub fn add_tags_to_task(&self, task_id: &str, tag_ids: &[String]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if task_row(&tx, task_id)?.is_none() {
                return Err(ErrorReport::task_not_found(task_id).into());
            }
            let now = now_ms();
            for tag_id in tag_ids {
                if tag_row(&tx, tag_id)?.is_none() {
                    return Err(ErrorReport::tag_not_found(tag_id).into());
                }
                tx.execute(
                    "INSERT OR IGNORE INTO task_tags (task_id, tag_id, created_at) VALUES (?1, ?2, ?3)",
                    params![task_id, tag_id, now],
                )?;
            }
            tx.commit()?;
            Ok(())
        })?;

        info!(task_id, count = tag_ids.len(), "Attached tags");
        Ok(())
    }

    /// Detach the listed tags from a task, or every tag when the list is empty.
    pub fn remove_tags_from_task(&self, task_id: &str, tag_ids: &[String]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if tag_ids.is_empty() {
                tx.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
            } else {
                for tag_id in tag_ids {
                    tx.execute(
                        "DELETE FROM task_tags WHERE task_id = ?1 AND tag_id = ?2",
                        params![task_id, tag_id],
                    )?;
                }
            }
            tx.commit()?;
            Ok(())
        })?;

        info!(task_id, count = tag_ids.len(), "Detached tags");
        Ok(())
    }

    /// Replace a task's tags with exactly `tag_ids`.
    pub fn set_task_tags(&self, task_id: &str, tag_ids: &[String]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if task_row(&tx, task_id)?.is_none() {
                return Err(ErrorReport::task_not_found(task_id).into());
            }
            tx.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
            let now = now_ms();
            for tag_id in tag_ids {
                if tag_row(&tx, tag_id)?.is_none() {
                    return Err(ErrorReport::tag_not_found(tag_id).into());
                }
                tx.execute(
                    "INSERT OR IGNORE INTO task_tags (task_id, tag_id, created_at) VALUES (?1, ?2, ?3)",
                    params![task_id, tag_id, now],
                )?;
            }
            tx.commit()?;
            Ok(())
        })?;

        info!(task_id, count = tag_ids.len(), "Replaced task tags");
        Ok(())
    }

    /// Tags attached to a task, by name.
    pub fn tags_for_task(&self, task_id: &str) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.name, t.color, t.created_at, t.updated_at
                 FROM tags t
                 INNER JOIN task_tags tt ON tt.tag_id = t.id
                 WHERE tt.task_id = ?1
                 ORDER BY t.name ASC",
            )?;
            let tags = stmt
                .query_map(params![task_id], parse_tag_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tags)
        })
    }
}
