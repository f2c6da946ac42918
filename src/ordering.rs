//! Sequence arithmetic for dense, zero-based sibling ordering.
//!
//! Every function here works on in-memory id sequences. Nothing here talks
//! to storage; the manager reads the full current state, runs these
//! functions, and writes back the complete result.

use crate::types::{OrderEntry, Placement};
use std::collections::HashSet;

/// Why a proposed ordering is not a permutation of the current members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermutationFault {
    LengthMismatch { expected: usize, actual: usize },
    Duplicate(String),
    Unknown(String),
}

impl std::fmt::Display for PermutationFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermutationFault::LengthMismatch { expected, actual } => {
                write!(f, "expected {} ids, got {}", expected, actual)
            }
            PermutationFault::Duplicate(id) => write!(f, "duplicate id {}", id),
            PermutationFault::Unknown(id) => write!(f, "id {} is not a member", id),
        }
    }
}

/// Current sequence of ids, in order.
///
/// Tolerates gaps and duplicate indices in stored rows: members are sorted
/// by `(order_index, id)` so the result is deterministic either way.
pub fn current_sequence(mut members: Vec<OrderEntry>) -> Vec<String> {
    members.sort_by(|a, b| {
        a.order_index
            .cmp(&b.order_index)
            .then_with(|| a.id.cmp(&b.id))
    });
    members.into_iter().map(|m| m.id).collect()
}

/// Check that `ordered_ids` is exactly a permutation of `members`.
pub fn validate_permutation(
    members: &[OrderEntry],
    ordered_ids: &[String],
) -> Result<(), PermutationFault> {
    let known: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(ordered_ids.len());

    for id in ordered_ids {
        if !known.contains(id.as_str()) {
            return Err(PermutationFault::Unknown(id.clone()));
        }
        if !seen.insert(id.as_str()) {
            return Err(PermutationFault::Duplicate(id.clone()));
        }
    }

    // All ids are distinct known members; the only way left to fail is
    // leaving some members out.
    if ordered_ids.len() != known.len() {
        return Err(PermutationFault::LengthMismatch {
            expected: known.len(),
            actual: ordered_ids.len(),
        });
    }

    Ok(())
}

/// Assign `order_index = position` to every id.
pub fn densify(ids: &[String]) -> Vec<OrderEntry> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| OrderEntry::new(id.clone(), index as u32))
        .collect()
}

/// Same as [`densify`] but tags each entry with the partition it lives in.
pub fn place(ids: &[String], partition_id: Option<&str>) -> Vec<Placement> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| Placement {
            id: id.clone(),
            partition_id: partition_id.map(str::to_string),
            order_index: index as u32,
        })
        .collect()
}

/// Remove `id` from the sequence. Returns its former position.
pub fn remove(seq: &mut Vec<String>, id: &str) -> Option<usize> {
    let pos = seq.iter().position(|s| s == id)?;
    seq.remove(pos);
    Some(pos)
}

/// Insert `id` at `target`, clamped to `[0, len]`. Returns the final position.
pub fn insert_clamped(seq: &mut Vec<String>, id: String, target: usize) -> usize {
    let pos = target.min(seq.len());
    seq.insert(pos, id);
    pos
}

/// True if the indices form exactly `{0, .., n-1}`.
pub fn is_dense(entries: &[OrderEntry]) -> bool {
    let mut indices: Vec<u32> = entries.iter().map(|e| e.order_index).collect();
    indices.sort_unstable();
    indices.iter().enumerate().all(|(i, &idx)| idx as usize == i)
}
