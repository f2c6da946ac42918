//! Quotes shown alongside the task list.

use super::{Database, new_id, now_ms, require_name};
use crate::error::ErrorReport;
use crate::types::Quote;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, info};

pub fn parse_quote_row(row: &Row) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: row.get("id")?,
        quote_text: row.get("quote_text")?,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    pub fn add_quote(&self, text: &str) -> Result<Quote> {
        let text = require_name("quote_text", text)?;

        let quote = Quote {
            id: new_id(),
            quote_text: text,
            created_at: now_ms(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO quotes (id, quote_text, created_at) VALUES (?1, ?2, ?3)",
                params![quote.id, quote.quote_text, quote.created_at],
            )?;
            Ok(())
        })?;

        info!(quote_id = %quote.id, "Added quote");
        Ok(quote)
    }

    /// All quotes, oldest first.
    pub fn list_quotes(&self) -> Result<Vec<Quote>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, quote_text, created_at FROM quotes ORDER BY created_at ASC, id ASC",
            )?;
            let quotes = stmt
                .query_map([], parse_quote_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(quotes)
        })
    }

    /// One quote picked at random, or `None` when there are none.
    pub fn random_quote(&self) -> Result<Option<Quote>> {
        let quote = self.with_conn(|conn| {
            let quote = conn
                .query_row(
                    "SELECT id, quote_text, created_at FROM quotes ORDER BY RANDOM() LIMIT 1",
                    [],
                    parse_quote_row,
                )
                .optional()?;
            Ok(quote)
        })?;

        debug!(found = quote.is_some(), "Picked random quote");
        Ok(quote)
    }

    pub fn delete_quote(&self, quote_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM quotes WHERE id = ?1", params![quote_id])?;
            if changed == 0 {
                return Err(ErrorReport::quote_not_found(quote_id).into());
            }
            Ok(())
        })?;

        info!(quote_id, "Deleted quote");
        Ok(())
    }
}
