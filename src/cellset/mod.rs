//! # Cell Set Module
//!
//! [`OrderedCellSet`] is the concurrent ordered container behind each
//! memstore generation.
//!
//! ## Design Invariants
//!
//! - **Set, not map.** Members are full cell identities; adding a cell
//!   equal to an existing member is a no-op and the *first* insertion
//!   wins. A map keyed by column would silently replace versions and
//!   break the accounting and MVCC contracts layered on top.
//! - Iteration is weakly consistent: cursors never fail under concurrent
//!   mutation and may or may not observe inserts that race with them.
//! - The optional row-prefix bloom filter absorbs the first `p` bytes of
//!   every inserted row; `may_contain_row_prefix` answers definitively
//!   "no" only when the filter was enabled for the set.
//!
//! ## Cursors
//!
//! Cursors re-locate by key (`lower_bound`/`upper_bound` from the last
//! returned cell) instead of holding a borrowing iterator, so they stay
//! valid however the set changes underneath them — including removal of
//! the cell they last returned.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::borrow::Borrow;
use std::cmp::Ordering as CmpOrdering;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use bloomfilter::Bloom;
use crossbeam_skiplist::SkipMap;
use tracing::warn;

use crate::cell::Cell;

// ------------------------------------------------------------------------------------------------
// Constants
// ------------------------------------------------------------------------------------------------

/// Sentinel disabling the row-prefix bloom filter.
pub const ROW_PREFIX_BLOOM_DISABLED: i32 = -1;

/// Expected distinct row prefixes a set-level bloom is sized for.
const BLOOM_EXPECTED_ROW_PREFIXES: usize = 64 * 1024;

/// Acceptable false-positive rate for the row-prefix bloom.
const BLOOM_FALSE_POSITIVE_RATE: f64 = 0.01;

// ------------------------------------------------------------------------------------------------
// Ordered Cell Set
// ------------------------------------------------------------------------------------------------

/// Shared key wrapper: ordering delegates to the cell's primary order.
#[derive(Clone)]
struct CellKey(Arc<Cell>);

impl PartialEq for CellKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl Eq for CellKey {}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.0.as_ref().cmp(other.0.as_ref())
    }
}

impl Borrow<Cell> for CellKey {
    fn borrow(&self) -> &Cell {
        &self.0
    }
}

/// Concurrent ordered set of cells with an optional row-prefix bloom.
///
/// Backed by a lock-free skip list; per-element operations never take a
/// set-wide lock. Shared as `Arc` so cursors and scanners can outlive
/// the generation rotation that replaces it.
pub struct OrderedCellSet {
    map: SkipMap<CellKey, ()>,
    bloom: Option<Mutex<Bloom<Vec<u8>>>>,
    bloom_prefix_len: usize,
}

impl OrderedCellSet {
    /// Creates a set; `row_prefix_bloom_length` > 0 enables the bloom
    /// over that many leading row bytes, [`ROW_PREFIX_BLOOM_DISABLED`]
    /// (or 0) disables it.
    pub fn new(row_prefix_bloom_length: i32) -> Self {
        let (bloom, prefix_len) = if row_prefix_bloom_length > 0 {
            match Bloom::new_for_fp_rate(BLOOM_EXPECTED_ROW_PREFIXES, BLOOM_FALSE_POSITIVE_RATE) {
                Ok(bloom) => (Some(Mutex::new(bloom)), row_prefix_bloom_length as usize),
                Err(e) => {
                    warn!("row-prefix bloom unavailable, running without: {e}");
                    (None, 0)
                }
            }
        } else {
            (None, 0)
        };
        Self {
            map: SkipMap::new(),
            bloom,
            bloom_prefix_len: prefix_len,
        }
    }

    /// Inserts `cell` unless an equal member already exists.
    ///
    /// Returns true iff this call inserted. The existing member is never
    /// replaced.
    pub fn add(&self, cell: Arc<Cell>) -> bool {
        let entry = self.map.get_or_insert(CellKey(cell.clone()), ());
        let inserted = Arc::ptr_eq(&entry.key().0, &cell);
        if inserted {
            if let Some(bloom) = &self.bloom {
                bloom.lock().unwrap().set(&self.row_prefix(&cell));
            }
        }
        inserted
    }

    /// True iff a member equal to `cell` is present.
    pub fn contains(&self, cell: &Cell) -> bool {
        self.map.contains_key(cell)
    }

    /// Removes the member equal to `cell`; true iff one was removed.
    ///
    /// The bloom filter is append-only; removal leaves its bits set.
    pub fn remove(&self, cell: &Cell) -> bool {
        self.map.remove(cell).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Smallest member.
    pub fn first(&self) -> Option<Arc<Cell>> {
        self.map.front().map(|entry| entry.key().0.clone())
    }

    /// True when the set may hold a row sharing `cell`'s prefix. Always
    /// true when the bloom is disabled.
    pub fn may_contain_row_prefix(&self, cell: &Cell) -> bool {
        match &self.bloom {
            Some(bloom) => bloom.lock().unwrap().check(&self.row_prefix(cell)),
            None => true,
        }
    }

    fn row_prefix(&self, cell: &Cell) -> Vec<u8> {
        let row = cell.row();
        row[..row.len().min(self.bloom_prefix_len)].to_vec()
    }
}

// ------------------------------------------------------------------------------------------------
// Cursors
// ------------------------------------------------------------------------------------------------

enum CursorPos {
    Start,
    /// Next return is the first member `>=` this probe.
    Before(Arc<Cell>),
    /// Next return is the first member `>` this cell.
    After(Arc<Cell>),
}

/// Forward cursor. Weakly consistent: members inserted at or beyond the
/// position after a step may be observed; nothing is ever observed
/// twice and removal of the last-returned cell does not disturb it.
pub struct CellCursor {
    set: Arc<OrderedCellSet>,
    pos: CursorPos,
}

impl CellCursor {
    /// Cursor starting at the smallest member of `set`.
    pub fn from_start(set: Arc<OrderedCellSet>) -> Self {
        Self {
            set,
            pos: CursorPos::Start,
        }
    }

    /// Cursor over members of `set` that are `>= from`.
    pub fn tail(set: Arc<OrderedCellSet>, from: &Arc<Cell>) -> Self {
        Self {
            set,
            pos: CursorPos::Before(Arc::clone(from)),
        }
    }

    pub fn next(&mut self) -> Option<Arc<Cell>> {
        let entry = match &self.pos {
            CursorPos::Start => self.set.map.front(),
            CursorPos::Before(probe) => self.set.map.lower_bound(Bound::Included(probe.as_ref())),
            CursorPos::After(last) => self.set.map.lower_bound(Bound::Excluded(last.as_ref())),
        }?;
        let cell = entry.key().0.clone();
        self.pos = CursorPos::After(Arc::clone(&cell));
        Some(cell)
    }
}

/// Descending cursor walking strictly below its moving upper bound.
pub struct DescendingCellCursor {
    set: Arc<OrderedCellSet>,
    upper: Arc<Cell>,
}

impl DescendingCellCursor {
    /// Cursor over members of `set` strictly `< before`, largest first.
    pub fn head(set: Arc<OrderedCellSet>, before: &Arc<Cell>) -> Self {
        Self {
            set,
            upper: Arc::clone(before),
        }
    }

    pub fn next(&mut self) -> Option<Arc<Cell>> {
        let entry = self
            .set
            .map
            .upper_bound(Bound::Excluded(self.upper.as_ref()))?;
        let cell = entry.key().0.clone();
        self.upper = Arc::clone(&cell);
        Some(cell)
    }
}
