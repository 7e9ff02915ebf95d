//! Decision surface for the closest-row-at-or-before probe.
//!
//! The memstore walks its sets; the tracker — owned by the store layer,
//! which knows about delete semantics, TTLs and table boundaries —
//! decides what counts. Modeled as a small capability trait so tests
//! and the store layer can each bring their own.

use std::sync::Arc;

use crate::cell::Cell;

/// Caller-supplied state accumulating deletes and candidates while the
/// memstore walks toward the closest row at or before a target.
pub trait ClosestRowTracker {
    /// First possible cell on the target row; where forward walks start.
    fn target_key(&self) -> Arc<Cell>;

    /// True once `cell` lies beyond the row started at `first_on_row`.
    fn is_too_far(&self, cell: &Cell, first_on_row: &Cell) -> bool;

    /// Expired cells are removed from the set as the walk passes them.
    fn is_expired(&self, cell: &Cell) -> bool;

    /// Offers a cell on the current row. Returns true when it settles
    /// the row as a candidate, ending the forward walk.
    fn handle(&mut self, cell: &Arc<Cell>) -> bool;

    /// False once the backward walk has left the target table.
    fn is_target_table(&self, cell: &Cell) -> bool;

    /// False once earlier rows can no longer improve on the best
    /// candidate found so far.
    fn is_better_candidate(&self, cell: &Cell) -> bool;
}
