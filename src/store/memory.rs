//! In-process `OrderStore` backed by hash maps.

use super::OrderStore;
use crate::types::{ItemLocation, OrderEntry, PartitionLocation, Placement};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct ItemRow {
    owner_id: String,
    partition_id: Option<String>,
    order_index: u32,
}

#[derive(Debug, Clone)]
struct PartitionRow {
    owner_id: String,
    order_index: u32,
}

#[derive(Debug, Default)]
struct State {
    items: HashMap<String, ItemRow>,
    partitions: HashMap<String, PartitionRow>,
    fail_writes: bool,
}

/// Ordering state held in memory. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an item row as-is. No densification is applied.
    pub fn insert_item(
        &self,
        item_id: &str,
        owner_id: &str,
        partition_id: Option<&str>,
        order_index: u32,
    ) {
        let mut state = self.state.lock().unwrap();
        state.items.insert(
            item_id.to_string(),
            ItemRow {
                owner_id: owner_id.to_string(),
                partition_id: partition_id.map(str::to_string),
                order_index,
            },
        );
    }

    /// Insert or overwrite a partition row as-is.
    pub fn insert_partition(&self, partition_id: &str, owner_id: &str, order_index: u32) {
        let mut state = self.state.lock().unwrap();
        state.partitions.insert(
            partition_id.to_string(),
            PartitionRow {
                owner_id: owner_id.to_string(),
                order_index,
            },
        );
    }

    /// Make every subsequent write and delete fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Ids of a partition in stored order.
    pub fn sequence(&self, owner_id: &str, partition_id: Option<&str>) -> Vec<(String, u32)> {
        let state = self.state.lock().unwrap();
        let mut seq: Vec<(String, u32)> = state
            .items
            .iter()
            .filter(|(_, row)| row.owner_id == owner_id && row.partition_id.as_deref() == partition_id)
            .map(|(id, row)| (id.clone(), row.order_index))
            .collect();
        seq.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        seq
    }

    /// Partition ids of an owner in stored order.
    pub fn partition_sequence(&self, owner_id: &str) -> Vec<(String, u32)> {
        let state = self.state.lock().unwrap();
        let mut seq: Vec<(String, u32)> = state
            .partitions
            .iter()
            .filter(|(_, row)| row.owner_id == owner_id)
            .map(|(id, row)| (id.clone(), row.order_index))
            .collect();
        seq.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        seq
    }

    fn check_writable(state: &State) -> Result<()> {
        if state.fail_writes {
            bail!("memory store is rejecting writes");
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn fetch_partition_members(
        &self,
        owner_id: &str,
        partition_id: Option<&str>,
    ) -> Result<Vec<OrderEntry>> {
        Ok(self
            .sequence(owner_id, partition_id)
            .into_iter()
            .map(|(id, idx)| OrderEntry::new(id, idx))
            .collect())
    }

    async fn write_order_indices(&self, updates: &[Placement]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state)?;
        for update in updates {
            let row = state
                .items
                .get_mut(&update.id)
                .ok_or_else(|| anyhow!("item not found: {}", update.id))?;
            row.partition_id = update.partition_id.clone();
            row.order_index = update.order_index;
        }
        Ok(())
    }

    async fn fetch_owner_partitions(&self, owner_id: &str) -> Result<Vec<OrderEntry>> {
        Ok(self
            .partition_sequence(owner_id)
            .into_iter()
            .map(|(id, idx)| OrderEntry::new(id, idx))
            .collect())
    }

    async fn write_partition_order_indices(&self, updates: &[OrderEntry]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state)?;
        for update in updates {
            let row = state
                .partitions
                .get_mut(&update.id)
                .ok_or_else(|| anyhow!("partition not found: {}", update.id))?;
            row.order_index = update.order_index;
        }
        Ok(())
    }

    async fn locate_item(&self, item_id: &str) -> Result<Option<ItemLocation>> {
        let state = self.state.lock().unwrap();
        Ok(state.items.get(item_id).map(|row| ItemLocation {
            id: item_id.to_string(),
            owner_id: row.owner_id.clone(),
            partition_id: row.partition_id.clone(),
            order_index: row.order_index,
        }))
    }

    async fn locate_partition(&self, partition_id: &str) -> Result<Option<PartitionLocation>> {
        let state = self.state.lock().unwrap();
        Ok(state.partitions.get(partition_id).map(|row| PartitionLocation {
            id: partition_id.to_string(),
            owner_id: row.owner_id.clone(),
            order_index: row.order_index,
        }))
    }

    async fn delete_item(&self, item_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state)?;
        state.items.remove(item_id);
        Ok(())
    }

    async fn delete_partition(&self, partition_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state)?;
        state.partitions.remove(partition_id);
        state
            .items
            .retain(|_, row| row.partition_id.as_deref() != Some(partition_id));
        Ok(())
    }
}
