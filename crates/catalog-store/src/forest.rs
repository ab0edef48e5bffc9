//! Effort forest builder
//!
//! Software efforts are stored flat, each carrying an optional
//! `parent_uuid`. This module rebuilds the display forest from that flat
//! list in a single linear pass over copies; the input is never mutated.
//!
//! Tolerances and hard errors are deliberate:
//! - a `parent_uuid` that resolves to nothing (the parent was deleted)
//!   demotes the effort to a root with a warning, never an error
//! - a duplicate uuid is an error
//! - a parent cycle is an error (`CycleDetected`) rather than the silent
//!   truncation the behavior was reverse-engineered from; cycles would
//!   otherwise make every top-down consumer of the forest loop forever

use catalog_model::{EffortUuid, SoftwareEffort};
use std::collections::HashMap;

/// Malformed effort parent graphs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffortTreeError {
    /// Two efforts share a uuid
    #[error("duplicate effort uuid: {0}")]
    DuplicateUuid(EffortUuid),

    /// Parent pointers close one or more cycles
    #[error("cyclic parent references among efforts: {uuids:?}")]
    CycleDetected { uuids: Vec<EffortUuid> },
}

/// One effort with its resolved children
#[derive(Debug, Clone, PartialEq)]
pub struct EffortNode {
    pub effort: SoftwareEffort,
    pub children: Vec<EffortNode>,
}

impl EffortNode {
    /// Total efforts in this subtree, self included
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(EffortNode::subtree_len).sum::<usize>()
    }
}

/// Rebuild the forest for one program's efforts
///
/// Root order and child order both follow input order.
///
/// # Errors
/// [`EffortTreeError::DuplicateUuid`] on a repeated uuid,
/// [`EffortTreeError::CycleDetected`] when parent pointers form a cycle.
pub fn build_forest(efforts: &[SoftwareEffort]) -> Result<Vec<EffortNode>, EffortTreeError> {
    let mut index_of: HashMap<EffortUuid, usize> = HashMap::with_capacity(efforts.len());
    for (i, effort) in efforts.iter().enumerate() {
        if index_of.insert(effort.uuid, i).is_some() {
            return Err(EffortTreeError::DuplicateUuid(effort.uuid));
        }
    }

    let mut child_indices: Vec<Vec<usize>> = vec![Vec::new(); efforts.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (i, effort) in efforts.iter().enumerate() {
        match effort.parent_uuid {
            Some(parent_uuid) => match index_of.get(&parent_uuid) {
                Some(&parent_index) => child_indices[parent_index].push(i),
                None => {
                    tracing::warn!(
                        effort = %effort.uuid,
                        parent = %parent_uuid,
                        "dangling parent reference; demoting effort to root"
                    );
                    roots.push(i);
                }
            },
            None => roots.push(i),
        }
    }

    // Everything must be reachable from a root; leftovers are cycle members
    let mut visited = vec![false; efforts.len()];
    let mut stack: Vec<usize> = roots.clone();
    while let Some(i) = stack.pop() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        stack.extend(&child_indices[i]);
    }

    if visited.iter().any(|v| !v) {
        let mut uuids: Vec<EffortUuid> = efforts
            .iter()
            .enumerate()
            .filter(|(i, _)| !visited[*i])
            .map(|(_, e)| e.uuid)
            .collect();
        uuids.sort();
        return Err(EffortTreeError::CycleDetected { uuids });
    }

    fn build(i: usize, efforts: &[SoftwareEffort], child_indices: &[Vec<usize>]) -> EffortNode {
        EffortNode {
            effort: efforts[i].clone(),
            children: child_indices[i]
                .iter()
                .map(|&c| build(c, efforts, child_indices))
                .collect(),
        }
    }

    Ok(roots
        .into_iter()
        .map(|i| build(i, efforts, &child_indices))
        .collect())
}
