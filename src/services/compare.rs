//! Snapshot comparison - finds drives attached or detached between two polls

use crate::models::{Drive, Operation, Snapshot};

/// Result of comparing two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Changes in emission order: additions first, then removals
    pub operations: Vec<Operation>,
    /// The new baseline; always equal to the current snapshot
    pub drives: Snapshot,
}

/// Compare `previous` against `current` using structural equality.
///
/// Drives only present in `current` become `Add` operations (in `current`
/// order), drives only present in `previous` become `Remove` operations (in
/// `previous` order). Drives present in both produce nothing.
pub fn diff(previous: &[Drive], current: Snapshot) -> Comparison {
    let added = current
        .iter()
        .filter(|drive| !previous.contains(drive))
        .cloned()
        .map(Operation::Add);

    let removed = previous
        .iter()
        .filter(|drive| !current.contains(drive))
        .cloned()
        .map(Operation::Remove);

    let operations = added.chain(removed).collect();

    Comparison {
        operations,
        drives: current,
    }
}
