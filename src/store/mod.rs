//! Storage capability consumed by the ordered collection manager.

pub mod memory;

pub use memory::MemoryStore;

use crate::types::{ItemLocation, OrderEntry, PartitionLocation, Placement};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence collaborator for item and partition ordering.
///
/// Reads must reflect the latest committed state. Batch writes report a
/// single outcome; an implementation may have applied a subset of the
/// batch when it reports failure.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Items of `owner_id` in the given partition (`None` = ungrouped).
    async fn fetch_partition_members(
        &self,
        owner_id: &str,
        partition_id: Option<&str>,
    ) -> Result<Vec<OrderEntry>>;

    /// Set `(partition_id, order_index)` for every listed item.
    async fn write_order_indices(&self, updates: &[Placement]) -> Result<()>;

    /// Partitions of `owner_id`.
    async fn fetch_owner_partitions(&self, owner_id: &str) -> Result<Vec<OrderEntry>>;

    /// Set `order_index` for every listed partition.
    async fn write_partition_order_indices(&self, updates: &[OrderEntry]) -> Result<()>;

    async fn locate_item(&self, item_id: &str) -> Result<Option<ItemLocation>>;

    async fn locate_partition(&self, partition_id: &str) -> Result<Option<PartitionLocation>>;

    async fn delete_item(&self, item_id: &str) -> Result<()>;

    /// Delete a partition together with the items it contains.
    async fn delete_partition(&self, partition_id: &str) -> Result<()>;
}
