//! Drag-and-drop reordering.
//!
//! Reordering happens inside the unpinned partition only. `move_within` is
//! the reference algorithm the simulated backend applies; live hosts are
//! expected to produce the same order through their own move primitive.

use crate::types::errors::BackendError;
use crate::types::tab::{index_in_range, Tab, TabId};

/// What a drop should do against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPlan {
    /// Nothing to do; no backend call must be issued.
    NoOp,
    Move { tab_id: TabId, target: usize },
}

/// Clamps a drop target to the last position of a partition of `len` tabs.
pub fn clamp_target(target: usize, len: usize) -> usize {
    target.min(len.saturating_sub(1))
}

/// Decides the effect of dropping `dragged` at `target` given the current tabs.
pub fn plan_drop(tabs: &[Tab], dragged: TabId, target: usize) -> Result<DropPlan, BackendError> {
    let tab = tabs
        .iter()
        .find(|t| t.id == dragged)
        .ok_or(BackendError::TabNotFound(dragged))?;

    if tab.pinned {
        return Ok(DropPlan::NoOp);
    }

    let unpinned = tabs.iter().filter(|t| !t.pinned).count();
    let target = clamp_target(target, unpinned);
    if tab.index == target {
        return Ok(DropPlan::NoOp);
    }

    Ok(DropPlan::Move {
        tab_id: dragged,
        target,
    })
}

/// Moves the tab at position `from` to position `to` (clamped to the end),
/// then re-derives every tab's `index` from its position.
///
/// Returns false when `from` is out of range; the slice is left untouched.
pub fn move_within(tabs: &mut Vec<Tab>, from: usize, to: usize) -> bool {
    if !index_in_range(from, tabs.len()) {
        return false;
    }
    let tab = tabs.remove(from);
    let to = to.min(tabs.len());
    tabs.insert(to, tab);
    renumber(tabs);
    true
}

/// Assigns `index = position` to every tab of one partition.
pub fn renumber(tabs: &mut [Tab]) {
    for (position, tab) in tabs.iter_mut().enumerate() {
        tab.index = position;
    }
}
