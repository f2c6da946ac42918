//! Ordered collection manager.
//!
//! Keeps subtasks (items) densely ordered within their partition (a group,
//! or the task's implicit ungrouped set) and keeps groups densely ordered
//! within their task. Every mutation reads the full membership of each
//! affected sequence, computes the complete target order in memory and
//! writes all of it back in one batch.

use crate::error::{OrderError, OrderResult};
use crate::ordering;
use crate::store::OrderStore;
use crate::types::{OrderEntry, Placement, partition_label};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Serialises operations per owner within this process.
///
/// Entries nobody holds or waits on are pruned on the next acquire, so the
/// table only grows with the number of owners in flight at once.
#[derive(Default)]
struct OwnerLocks {
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OwnerLocks {
    async fn acquire(&self, owner_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            inflight.retain(|key, lock| key == owner_id || Arc::strong_count(lock) > 1);
            Arc::clone(
                inflight
                    .entry(owner_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inflight.lock().await.len()
    }
}

/// Result of a `move_item` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Final position of the moved item in its destination.
    pub index: u32,
    /// Every placement that was written, source and destination.
    pub written: Vec<Placement>,
}

pub struct OrderedCollectionManager<S> {
    store: S,
    locks: OwnerLocks,
}

impl<S: OrderStore> OrderedCollectionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: OwnerLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rewrite a partition so `ordered_ids[i]` gets `order_index = i`.
    ///
    /// `ordered_ids` must be exactly the partition's current membership.
    pub async fn reorder_within_partition(
        &self,
        owner_id: &str,
        partition_id: Option<&str>,
        ordered_ids: &[String],
    ) -> OrderResult<Vec<OrderEntry>> {
        let _guard = self.locks.acquire(owner_id).await;

        if let Some(pid) = partition_id {
            self.ensure_partition_of(owner_id, pid).await?;
        }

        let members = self.read_members(owner_id, partition_id).await?;
        if let Err(fault) = ordering::validate_permutation(&members, ordered_ids) {
            warn!(owner_id, partition = %partition_label(partition_id), %fault, "Rejected item reorder");
            return Err(OrderError::InvalidPermutation {
                scope: partition_label(partition_id),
                reason: fault.to_string(),
            });
        }

        let placements = ordering::place(ordered_ids, partition_id);
        self.write_items(&placements).await?;

        info!(owner_id, partition = %partition_label(partition_id), count = placements.len(), "Reordered items");
        Ok(ordering::densify(ordered_ids))
    }

    /// Move an item to `target_index` of `to_partition_id`.
    ///
    /// The index is clamped to the destination's length after removal.
    /// Source and destination are rewritten together in one batch.
    pub async fn move_item(
        &self,
        item_id: &str,
        from_partition_id: Option<&str>,
        to_partition_id: Option<&str>,
        target_index: usize,
    ) -> OrderResult<MoveOutcome> {
        let not_found = || OrderError::ItemNotFound {
            item_id: item_id.to_string(),
            partition: partition_label(from_partition_id),
        };

        // Owner is only known after the lookup; re-check under the lock.
        let owner_id = self.read_item(item_id).await?.ok_or_else(not_found)?.owner_id;
        let _guard = self.locks.acquire(&owner_id).await;

        let location = self.read_item(item_id).await?.ok_or_else(not_found)?;
        if location.partition_id.as_deref() != from_partition_id || location.owner_id != owner_id {
            warn!(item_id, from = %partition_label(from_partition_id), "Item is not in the source partition");
            return Err(not_found());
        }
        if let Some(pid) = to_partition_id {
            self.ensure_partition_of(&owner_id, pid).await?;
        }

        let mut source =
            ordering::current_sequence(self.read_members(&owner_id, from_partition_id).await?);
        if ordering::remove(&mut source, item_id).is_none() {
            return Err(not_found());
        }

        let (index, written) = if from_partition_id == to_partition_id {
            let index = ordering::insert_clamped(&mut source, item_id.to_string(), target_index);
            (index, ordering::place(&source, to_partition_id))
        } else {
            let mut dest =
                ordering::current_sequence(self.read_members(&owner_id, to_partition_id).await?);
            let index = ordering::insert_clamped(&mut dest, item_id.to_string(), target_index);
            let mut written = ordering::place(&source, from_partition_id);
            written.extend(ordering::place(&dest, to_partition_id));
            (index, written)
        };

        self.write_items(&written).await?;

        info!(
            item_id,
            from = %partition_label(from_partition_id),
            to = %partition_label(to_partition_id),
            index,
            "Moved item"
        );
        Ok(MoveOutcome {
            index: index as u32,
            written,
        })
    }

    /// Rewrite an owner's partitions so `ordered_ids[i]` gets `order_index = i`.
    pub async fn reorder_partitions(
        &self,
        owner_id: &str,
        ordered_ids: &[String],
    ) -> OrderResult<Vec<OrderEntry>> {
        let _guard = self.locks.acquire(owner_id).await;

        let partitions = self.read_partitions(owner_id).await?;
        if let Err(fault) = ordering::validate_permutation(&partitions, ordered_ids) {
            warn!(owner_id, %fault, "Rejected partition reorder");
            return Err(OrderError::InvalidPermutation {
                scope: format!("partitions of {}", owner_id),
                reason: fault.to_string(),
            });
        }

        let entries = ordering::densify(ordered_ids);
        self.write_partitions(&entries).await?;

        info!(owner_id, count = entries.len(), "Reordered partitions");
        Ok(entries)
    }

    /// Index a new item appended to the partition should take.
    pub async fn append_item(
        &self,
        owner_id: &str,
        partition_id: Option<&str>,
    ) -> OrderResult<u32> {
        let _guard = self.locks.acquire(owner_id).await;
        if let Some(pid) = partition_id {
            self.ensure_partition_of(owner_id, pid).await?;
        }
        let count = self.read_members(owner_id, partition_id).await?.len() as u32;
        debug!(owner_id, partition = %partition_label(partition_id), index = count, "Append slot");
        Ok(count)
    }

    /// Index a new partition appended to the owner should take.
    pub async fn append_partition(&self, owner_id: &str) -> OrderResult<u32> {
        let _guard = self.locks.acquire(owner_id).await;
        let count = self.read_partitions(owner_id).await?.len() as u32;
        debug!(owner_id, index = count, "Append partition slot");
        Ok(count)
    }

    /// Delete an item and close the gap it leaves.
    ///
    /// Returns the rewritten order of the item's former partition.
    pub async fn remove_item(&self, item_id: &str) -> OrderResult<Vec<OrderEntry>> {
        let not_found = || OrderError::ItemNotFound {
            item_id: item_id.to_string(),
            partition: "any partition".to_string(),
        };

        let owner_id = self.read_item(item_id).await?.ok_or_else(not_found)?.owner_id;
        let _guard = self.locks.acquire(&owner_id).await;
        let location = self.read_item(item_id).await?.ok_or_else(not_found)?;
        let partition_id = location.partition_id.as_deref();

        let mut remaining =
            ordering::current_sequence(self.read_members(&location.owner_id, partition_id).await?);
        ordering::remove(&mut remaining, item_id);

        self.store
            .delete_item(item_id)
            .await
            .map_err(OrderError::StorageWriteFailure)?;
        self.write_items(&ordering::place(&remaining, partition_id))
            .await?;

        info!(item_id, partition = %partition_label(partition_id), remaining = remaining.len(), "Removed item");
        Ok(ordering::densify(&remaining))
    }

    /// Delete a partition (and its items) and close the gap it leaves.
    ///
    /// Returns the rewritten order of the owner's remaining partitions.
    pub async fn remove_partition(&self, partition_id: &str) -> OrderResult<Vec<OrderEntry>> {
        let not_found = || OrderError::PartitionNotFound(partition_id.to_string());

        let owner_id = self
            .read_partition(partition_id)
            .await?
            .ok_or_else(not_found)?
            .owner_id;
        let _guard = self.locks.acquire(&owner_id).await;
        let location = self.read_partition(partition_id).await?.ok_or_else(not_found)?;

        let mut remaining =
            ordering::current_sequence(self.read_partitions(&location.owner_id).await?);
        ordering::remove(&mut remaining, partition_id);

        self.store
            .delete_partition(partition_id)
            .await
            .map_err(OrderError::StorageWriteFailure)?;
        let entries = ordering::densify(&remaining);
        self.write_partitions(&entries).await?;

        info!(partition_id, owner_id = %location.owner_id, remaining = entries.len(), "Removed partition");
        Ok(entries)
    }

    // =========================================================================
    // Storage helpers
    // =========================================================================

    async fn ensure_partition_of(&self, owner_id: &str, partition_id: &str) -> OrderResult<()> {
        match self.read_partition(partition_id).await? {
            Some(loc) if loc.owner_id == owner_id => Ok(()),
            _ => {
                warn!(owner_id, partition_id, "Partition does not belong to owner");
                Err(OrderError::PartitionNotFound(partition_id.to_string()))
            }
        }
    }

    async fn read_item(&self, item_id: &str) -> OrderResult<Option<crate::types::ItemLocation>> {
        self.store
            .locate_item(item_id)
            .await
            .map_err(OrderError::StorageReadFailure)
    }

    async fn read_partition(
        &self,
        partition_id: &str,
    ) -> OrderResult<Option<crate::types::PartitionLocation>> {
        self.store
            .locate_partition(partition_id)
            .await
            .map_err(OrderError::StorageReadFailure)
    }

    async fn read_members(
        &self,
        owner_id: &str,
        partition_id: Option<&str>,
    ) -> OrderResult<Vec<OrderEntry>> {
        let members = self
            .store
            .fetch_partition_members(owner_id, partition_id)
            .await
            .map_err(OrderError::StorageReadFailure)?;
        if !ordering::is_dense(&members) {
            debug!(owner_id, partition = %partition_label(partition_id), "Stored indices have gaps; next write renumbers them");
        }
        Ok(members)
    }

    async fn read_partitions(&self, owner_id: &str) -> OrderResult<Vec<OrderEntry>> {
        let partitions = self
            .store
            .fetch_owner_partitions(owner_id)
            .await
            .map_err(OrderError::StorageReadFailure)?;
        if !ordering::is_dense(&partitions) {
            debug!(owner_id, "Stored partition indices have gaps; next write renumbers them");
        }
        Ok(partitions)
    }

    async fn write_items(&self, placements: &[Placement]) -> OrderResult<()> {
        if placements.is_empty() {
            return Ok(());
        }
        self.store
            .write_order_indices(placements)
            .await
            .map_err(OrderError::StorageWriteFailure)
    }

    async fn write_partitions(&self, entries: &[OrderEntry]) -> OrderResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.store
            .write_partition_order_indices(entries)
            .await
            .map_err(OrderError::StorageWriteFailure)
    }
}
