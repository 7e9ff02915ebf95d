//! Scanners over memstore contents.
//!
//! [`MemStoreScanner`] is the read-path scanner: it merges the live and
//! snapshot sets it captured at construction into one ordered,
//! read-point-filtered stream and pins both arenas for its lifetime.
//!
//! A scanner keeps observing the generations as they were when it was
//! created: a rotation that happens mid-scan neither disturbs it nor
//! becomes visible to it. The enclosing store scanner is expected to
//! recreate memstore scanners whenever it refreshes its reader list.
//!
//! [`SnapshotScanner`] is the flusher's scanner: a plain ordered walk of
//! one frozen set, no read-point filtering and no pinning — the flush
//! owns the snapshot generation until it calls `clear_snapshot`.

use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

use crate::arena::Arena;
use crate::cell::{comparator::CellComparator, Cell};
use crate::cellset::{CellCursor, OrderedCellSet};
use crate::mvcc::MvccController;

use super::{Generations, MemStoreInner, ScanRequest};

// ------------------------------------------------------------------------------------------------
// MemStore Scanner
// ------------------------------------------------------------------------------------------------

/// Merging scanner over the live set and snapshot captured at creation.
///
/// Holds one look-ahead cell per source; `peek`/`next` resolve the lower
/// of the two under the primary order. Look-aheads only ever carry cells
/// whose write sequence is at or below the calling thread's read point.
pub struct MemStoreScanner {
    inner: Arc<MemStoreInner>,
    comparator: CellComparator,
    live: Arc<OrderedCellSet>,
    snapshot: Arc<OrderedCellSet>,
    live_arena: Option<Arc<Arena>>,
    snapshot_arena: Option<Arc<Arena>>,
    live_cursor: Option<CellCursor>,
    snapshot_cursor: Option<CellCursor>,
    live_next: Option<Arc<Cell>>,
    snapshot_next: Option<Arc<Cell>>,
    reseek_fallbacks: u64,
    closed: bool,
}

impl MemStoreScanner {
    pub(crate) fn new(inner: Arc<MemStoreInner>, gens: &Generations) -> Self {
        if let Some(arena) = &gens.live_arena {
            arena.pin_scanner();
        }
        if let Some(arena) = &gens.snapshot_arena {
            arena.pin_scanner();
        }
        let comparator = inner.comparator;
        Self {
            comparator,
            live: Arc::clone(&gens.live),
            snapshot: Arc::clone(&gens.snapshot),
            live_arena: gens.live_arena.clone(),
            snapshot_arena: gens.snapshot_arena.clone(),
            live_cursor: None,
            snapshot_cursor: None,
            live_next: None,
            snapshot_next: None,
            reseek_fallbacks: 0,
            closed: false,
            inner,
        }
    }

    /// Positions both sources at the first visible cell `>= key`.
    /// True iff either source has one.
    pub fn seek(&mut self, key: &Arc<Cell>) -> bool {
        if self.closed {
            return false;
        }
        let mut live_cursor = CellCursor::tail(Arc::clone(&self.live), key);
        let mut snapshot_cursor = CellCursor::tail(Arc::clone(&self.snapshot), key);
        self.live_next = Self::advance(&self.inner.mvcc, &mut live_cursor);
        self.snapshot_next = Self::advance(&self.inner.mvcc, &mut snapshot_cursor);
        self.live_cursor = Some(live_cursor);
        self.snapshot_cursor = Some(snapshot_cursor);
        self.live_next.is_some() || self.snapshot_next.is_some()
    }

    /// Re-positions at `key`, stepping linearly while the combined step
    /// count stays within the configured budget and falling back to a
    /// full [`MemStoreScanner::seek`] beyond it.
    ///
    /// With `a` steps pending on one source and `b` on the other, a
    /// linear walk wins whenever `a + b` fits the budget, whichever side
    /// it is spent on — so the budget is shared and spent greedily,
    /// live source first.
    pub fn reseek(&mut self, key: &Arc<Cell>) -> bool {
        if self.closed {
            return false;
        }
        let (Some(mut live_cursor), Some(mut snapshot_cursor)) =
            (self.live_cursor.take(), self.snapshot_cursor.take())
        else {
            return self.seek(key);
        };

        let limit = self.inner.config.reseek_linear_limit;
        let mvcc = Arc::clone(&self.inner.mvcc);
        let mut stepped = 0usize;

        loop {
            let Some(next) = self.live_next.clone() else { break };
            if self.comparator.compare(&next, key).is_ge() {
                break;
            }
            stepped += 1;
            if stepped > limit {
                break;
            }
            self.live_next = Self::advance(&mvcc, &mut live_cursor);
        }
        while stepped <= limit {
            let Some(next) = self.snapshot_next.clone() else { break };
            if self.comparator.compare(&next, key).is_ge() {
                break;
            }
            stepped += 1;
            if stepped > limit {
                break;
            }
            self.snapshot_next = Self::advance(&mvcc, &mut snapshot_cursor);
        }

        self.live_cursor = Some(live_cursor);
        self.snapshot_cursor = Some(snapshot_cursor);

        if stepped > limit {
            self.reseek_fallbacks += 1;
            trace!(limit, "linear reseek budget exhausted, seeking");
            return self.seek(key);
        }
        self.live_next.is_some() || self.snapshot_next.is_some()
    }

    /// Lower of the two look-aheads under the primary order, live side
    /// winning ties.
    pub fn peek(&self) -> Option<Arc<Cell>> {
        match (&self.live_next, &self.snapshot_next) {
            (None, None) => None,
            (Some(live), None) => Some(Arc::clone(live)),
            (None, Some(snap)) => Some(Arc::clone(snap)),
            (Some(live), Some(snap)) => {
                if self.comparator.compare(live, snap).is_le() {
                    Some(Arc::clone(live))
                } else {
                    Some(Arc::clone(snap))
                }
            }
        }
    }

    /// Takes the lower look-ahead and advances the source it came from.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Arc<Cell>> {
        let taken = self.peek()?;
        let from_live = self
            .live_next
            .as_ref()
            .is_some_and(|cell| Arc::ptr_eq(cell, &taken));
        let mvcc = Arc::clone(&self.inner.mvcc);
        if from_live {
            self.live_next = self
                .live_cursor
                .as_mut()
                .and_then(|cursor| Self::advance(&mvcc, cursor));
        } else {
            self.snapshot_next = self
                .snapshot_cursor
                .as_mut()
                .and_then(|cursor| Self::advance(&mvcc, cursor));
        }
        Some(taken)
    }

    /// Releases cursors, look-aheads and arena pins. Idempotent; also
    /// run by `Drop`, so an abandoned scanner cannot strand a pin.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.live_next = None;
        self.snapshot_next = None;
        self.live_cursor = None;
        self.snapshot_cursor = None;
        if let Some(arena) = self.live_arena.take() {
            arena.unpin_scanner();
        }
        if let Some(arena) = self.snapshot_arena.take() {
            arena.unpin_scanner();
        }
    }

    /// The memstore outranks every on-disk file for the same key: its
    /// cells are newer than anything already flushed.
    pub fn sequence_id(&self) -> u64 {
        u64::MAX
    }

    /// Store-level pre-filter; delegates to the memstore's timestamp
    /// windows.
    pub fn should_use_scanner(
        &self,
        scan: &ScanRequest,
        _columns: &[Bytes],
        oldest_unexpired_ts: i64,
    ) -> bool {
        self.inner.should_seek(scan, oldest_unexpired_ts)
    }

    /// False only when neither generation buffers any delete, letting
    /// the store skip delete tracking for this scanner entirely.
    pub fn passes_delete_column_check(&self, _cell: &Cell) -> bool {
        self.inner.delete_tally() > 0
    }

    /// True when either captured set may hold a row sharing `cell`'s
    /// prefix.
    pub fn passes_row_key_prefix_bloom_filter(&self, cell: &Cell) -> bool {
        self.live.may_contain_row_prefix(cell) || self.snapshot.may_contain_row_prefix(cell)
    }

    /// How many reseeks overflowed their linear budget so far.
    pub fn reseek_fallbacks(&self) -> u64 {
        self.reseek_fallbacks
    }

    /// Steps `cursor` to its next cell visible at the calling thread's
    /// read point.
    fn advance(mvcc: &MvccController, cursor: &mut CellCursor) -> Option<Arc<Cell>> {
        let read_point = mvcc.thread_read_point();
        while let Some(cell) = cursor.next() {
            if cell.write_seq() <= read_point {
                return Some(cell);
            }
        }
        None
    }
}

impl Drop for MemStoreScanner {
    fn drop(&mut self) {
        self.close();
    }
}

// ------------------------------------------------------------------------------------------------
// Snapshot Scanner
// ------------------------------------------------------------------------------------------------

/// Ordered walk of one frozen set for the flusher. Emits everything —
/// the flush persists all versions, visible or not.
pub struct SnapshotScanner {
    set: Arc<OrderedCellSet>,
    cursor: CellCursor,
    next: Option<Arc<Cell>>,
}

impl SnapshotScanner {
    pub(crate) fn new(set: Arc<OrderedCellSet>) -> Self {
        let mut cursor = CellCursor::from_start(Arc::clone(&set));
        let next = cursor.next();
        Self { set, cursor, next }
    }

    /// Re-positions at the first cell `>= key`.
    pub fn seek(&mut self, key: &Arc<Cell>) -> bool {
        self.cursor = CellCursor::tail(Arc::clone(&self.set), key);
        self.next = self.cursor.next();
        self.next.is_some()
    }

    pub fn peek(&self) -> Option<Arc<Cell>> {
        self.next.clone()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Arc<Cell>> {
        let taken = self.next.take()?;
        self.next = self.cursor.next();
        Some(taken)
    }
}
