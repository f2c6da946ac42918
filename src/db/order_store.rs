//! `OrderStore` over the SQLite tables.
//!
//! Subtasks are items, subtask groups are partitions, tasks are owners.
//! Each batch write runs in a single transaction.

use super::Database;
use crate::store::OrderStore;
use crate::types::{ItemLocation, OrderEntry, PartitionLocation, Placement};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
impl OrderStore for Database {
    async fn fetch_partition_members(
        &self,
        owner_id: &str,
        partition_id: Option<&str>,
    ) -> Result<Vec<OrderEntry>> {
        self.subtask_order(owner_id, partition_id)
    }

    async fn write_order_indices(&self, updates: &[Placement]) -> Result<()> {
        self.write_subtask_placements(updates)
    }

    async fn fetch_owner_partitions(&self, owner_id: &str) -> Result<Vec<OrderEntry>> {
        self.group_order(owner_id)
    }

    async fn write_partition_order_indices(&self, updates: &[OrderEntry]) -> Result<()> {
        self.write_group_order(updates)
    }

    async fn locate_item(&self, item_id: &str) -> Result<Option<ItemLocation>> {
        self.subtask_location(item_id)
    }

    async fn locate_partition(&self, partition_id: &str) -> Result<Option<PartitionLocation>> {
        self.group_location(partition_id)
    }

    async fn delete_item(&self, item_id: &str) -> Result<()> {
        self.delete_subtask_row(item_id)
    }

    async fn delete_partition(&self, partition_id: &str) -> Result<()> {
        self.delete_group_row(partition_id)
    }
}
