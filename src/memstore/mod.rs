//! # MemStore Module
//!
//! ## Design Invariants
//!
//! - A cell lives in exactly one of the live set or the snapshot set.
//! - Cell bytes are owned by the arena of the generation the cell sits
//!   in (or by the caller's original buffer when arenas are off or the
//!   cell is oversize).
//! - An arena is never reclaimed while a scanner still pins it.
//! - `smallest_write_seq` is a lower bound on the write sequences of
//!   every live cell; it resets to `u64::MAX` when a snapshot empties
//!   the live set.
//! - `heap_size` covers the live set only (per-entry overhead plus cell
//!   heap size, 8-byte aligned) and never drops below [`DEEP_OVERHEAD`].
//! - The snapshot set is non-empty only between `snapshot()` and its
//!   matching `clear_snapshot()`.
//!
//! ## Flush Semantics
//!
//! `snapshot()` atomically moves the live generation aside — set, arena
//! and time range together — and starts a fresh one. The flusher reads
//! the frozen generation via `get_snapshot()` / `snapshot_scanners()`,
//! persists it, then calls `clear_snapshot()`, which discards the frozen
//! set and retires its arena (outside the rotation lock; its chunks
//! reach the pool once every scanner unpins).
//!
//! ## Concurrency
//!
//! One read-write lock per memstore, held the unusual way around:
//! *writers and readers both take the read side* — the backing set is
//! per-element concurrent, so they only need the generation references
//! to stay put. The write side is taken by `snapshot()` and
//! `clear_snapshot()` alone, for the brief reference rotation.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

pub mod scanner;
pub mod tracker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::arena::{pool::ArenaPool, Arena};
use crate::cell::{comparator::CellComparator, Cell, CellType};
use crate::cellset::{CellCursor, DescendingCellCursor, OrderedCellSet, ROW_PREFIX_BLOOM_DISABLED};
use crate::mvcc::MvccController;
use crate::timerange::{TimeRange, TimeRangeTracker};

use self::scanner::{MemStoreScanner, SnapshotScanner};
use self::tracker::ClosestRowTracker;

// ------------------------------------------------------------------------------------------------
// Size accounting
// ------------------------------------------------------------------------------------------------

pub(crate) const fn align8(n: u64) -> u64 {
    (n + 7) & !7
}

/// Amortized per-entry overhead of the backing concurrent set: the
/// skip-list node, its tower links and the shared cell handle.
pub const ENTRY_OVERHEAD: u64 = 48;

/// Heap attributed to one empty cell set (skip-list head, bloom handle).
const CELL_SET_OVERHEAD: u64 = 256;

/// Fixed heap of an empty memstore: the struct with its lock, counters
/// and trackers, plus two empty cell sets.
pub const DEEP_OVERHEAD: u64 = align8(
    std::mem::size_of::<MemStoreInner>() as u64
        + 2 * CELL_SET_OVERHEAD
        + 2 * std::mem::size_of::<TimeRangeTracker>() as u64,
);

/// Heap delta of one successful insert.
fn heap_size_change(cell: &Cell) -> u64 {
    align8(ENTRY_OVERHEAD + cell.heap_size())
}

// ------------------------------------------------------------------------------------------------
// Configuration
// ------------------------------------------------------------------------------------------------

pub const DEFAULT_ARENA_CHUNK_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_ARENA_POOL_MAX_CHUNKS: usize = 16;
pub const DEFAULT_RESEEK_LINEAR_LIMIT: usize = 20;

/// Tuning knobs of one memstore instance.
#[derive(Debug, Clone)]
pub struct MemStoreConfig {
    /// Copy cell bytes into arena-owned chunks instead of retaining
    /// caller buffers.
    pub use_arena: bool,

    /// Slab chunk size of the arena, in bytes. Requests above it keep
    /// the caller's buffer.
    pub arena_chunk_bytes: usize,

    /// High-water mark for the shared chunk recycler; consumed by
    /// whoever constructs the [`ArenaPool`] handed to `new`.
    pub arena_pool_max_chunks: usize,

    /// Cells a scanner reseek may step over linearly, across both of
    /// its sources, before falling back to a logarithmic seek.
    pub reseek_linear_limit: usize,
}

impl Default for MemStoreConfig {
    fn default() -> Self {
        Self {
            use_arena: true,
            arena_chunk_bytes: DEFAULT_ARENA_CHUNK_BYTES,
            arena_pool_max_chunks: DEFAULT_ARENA_POOL_MAX_CHUNKS,
            reseek_linear_limit: DEFAULT_RESEEK_LINEAR_LIMIT,
        }
    }
}

/// Per-column-family settings the region hands down at creation.
#[derive(Debug, Clone)]
pub struct FamilyDescriptor {
    /// Row-prefix length for the per-set bloom filter;
    /// [`ROW_PREFIX_BLOOM_DISABLED`] turns it off.
    pub row_prefix_bloom_length: i32,
}

impl Default for FamilyDescriptor {
    fn default() -> Self {
        Self {
            row_prefix_bloom_length: ROW_PREFIX_BLOOM_DISABLED,
        }
    }
}

/// Read-path parameters the store hands down when opening scanners.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub time_range: TimeRange,
}

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors surfaced by [`MemStore`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemStoreError {
    /// `clear_snapshot` was handed a set that is not the current
    /// snapshot. State is left untouched.
    #[error("unexpected snapshot: the passed set is not the current snapshot")]
    UnexpectedSnapshot,
}

// ------------------------------------------------------------------------------------------------
// MemStore Core
// ------------------------------------------------------------------------------------------------

/// The two generations a memstore rotates through. Guarded by the
/// memstore lock: shared for access, exclusive for rotation.
pub(crate) struct Generations {
    pub(crate) live: Arc<OrderedCellSet>,
    pub(crate) snapshot: Arc<OrderedCellSet>,
    pub(crate) live_arena: Option<Arc<Arena>>,
    pub(crate) snapshot_arena: Option<Arc<Arena>>,
    pub(crate) live_time_range: Arc<TimeRangeTracker>,
    pub(crate) snapshot_time_range: Arc<TimeRangeTracker>,
}

pub(crate) struct MemStoreInner {
    pub(crate) config: MemStoreConfig,
    pub(crate) comparator: CellComparator,
    family: Option<FamilyDescriptor>,
    pub(crate) mvcc: Arc<MvccController>,
    pool: Option<Arc<ArenaPool>>,
    pub(crate) gens: RwLock<Generations>,
    heap_size: AtomicU64,
    snapshot_heap_size: AtomicU64,
    smallest_write_seq: AtomicU64,
    deletes_in_live: AtomicU64,
    deletes_in_snapshot: AtomicU64,
    arena_allocated_bytes: AtomicU64,
}

/// The in-memory write buffer of one column family of one region.
///
/// Cheap to clone: a handle over shared state, so the region, the
/// flusher and background readers can all hold one.
#[derive(Clone)]
pub struct MemStore {
    inner: Arc<MemStoreInner>,
}

impl MemStore {
    /// Creates a memstore.
    ///
    /// `mvcc` and `pool` are process-wide collaborators passed in
    /// explicitly so tests can substitute them; `pool` is only consulted
    /// when `config.use_arena` is set.
    pub fn new(
        config: MemStoreConfig,
        comparator: CellComparator,
        family: Option<FamilyDescriptor>,
        mvcc: Arc<MvccController>,
        pool: Option<Arc<ArenaPool>>,
    ) -> Self {
        let bloom_len = family
            .as_ref()
            .map_or(ROW_PREFIX_BLOOM_DISABLED, |f| f.row_prefix_bloom_length);
        let live_arena = config
            .use_arena
            .then(|| Arc::new(Arena::new(config.arena_chunk_bytes, pool.clone())));

        let gens = Generations {
            live: Arc::new(OrderedCellSet::new(bloom_len)),
            snapshot: Arc::new(OrderedCellSet::new(bloom_len)),
            live_arena,
            snapshot_arena: None,
            live_time_range: Arc::new(TimeRangeTracker::new()),
            snapshot_time_range: Arc::new(TimeRangeTracker::new()),
        };

        Self {
            inner: Arc::new(MemStoreInner {
                config,
                comparator,
                family,
                mvcc,
                pool,
                gens: RwLock::new(gens),
                heap_size: AtomicU64::new(DEEP_OVERHEAD),
                snapshot_heap_size: AtomicU64::new(0),
                smallest_write_seq: AtomicU64::new(u64::MAX),
                deletes_in_live: AtomicU64::new(0),
                deletes_in_snapshot: AtomicU64::new(0),
                arena_allocated_bytes: AtomicU64::new(0),
            }),
        }
    }

    // --------------------------------------------------------------------------------------------
    // Write path
    // --------------------------------------------------------------------------------------------

    /// Writes one cell. `seq_num` is the WAL sequence of the edit and
    /// feeds the smallest-write-seq floor the flusher reports.
    ///
    /// Returns the heap delta: the aligned entry cost for a fresh
    /// insert, 0 when an equal cell was already present.
    pub fn add(&self, cell: Cell, seq_num: u64) -> u64 {
        let gens = self.inner.gens.read().unwrap();
        let (delta, _) = self.inner.add_to_live(&gens, cell, seq_num);
        delta
    }

    /// Writes one delete. The delete flavor travels in the cell type;
    /// the insert path is the same as [`MemStore::add`].
    pub fn delete(&self, cell: Cell, seq_num: u64) -> u64 {
        debug_assert!(cell.is_delete());
        self.add(cell, seq_num)
    }

    /// Counter upsert: writes a `Put` of `new_value` for the column and,
    /// still under the same shared lock, removes every *prior* `Put` of
    /// that exact column so versions do not pile up. Delete cells and
    /// other qualifiers are untouched.
    ///
    /// The new cell carries write sequence 0, making it visible to every
    /// reader at once: a concurrent scan sees the old value, the new
    /// one, or both — never neither.
    ///
    /// Returns the net heap delta (inserted minus removed), which can be
    /// negative.
    pub fn update_column_value(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        new_value: i64,
        now: i64,
        seq_num: u64,
    ) -> i64 {
        let inner = &self.inner;
        let gens = inner.gens.read().unwrap();

        let cell = Cell::new(
            Bytes::copy_from_slice(row),
            Bytes::copy_from_slice(family),
            Bytes::copy_from_slice(qualifier),
            now,
            CellType::Put,
            Bytes::copy_from_slice(&new_value.to_be_bytes()),
            0,
        );
        let (added, stored) = inner.add_to_live(&gens, cell, seq_num);
        let mut delta = added as i64;

        let first = Arc::new(Cell::first_on_row_col(
            stored.row_bytes().clone(),
            Bytes::copy_from_slice(family),
            Bytes::copy_from_slice(qualifier),
        ));
        let mut cursor = CellCursor::tail(Arc::clone(&gens.live), &first);
        while let Some(found) = cursor.next() {
            if Arc::ptr_eq(&found, &stored) {
                continue;
            }
            if found.row() != stored.row() {
                break;
            }
            if found.qualifier() == stored.qualifier() && found.cell_type() == CellType::Put {
                if gens.live.remove(&found) {
                    let freed = heap_size_change(&found);
                    delta -= freed as i64;
                    inner.heap_size.fetch_sub(freed, Ordering::SeqCst);
                }
            }
        }

        trace!(
            row = %HexKey(row),
            value = new_value,
            delta,
            "column value updated in place"
        );
        delta
    }

    // --------------------------------------------------------------------------------------------
    // Flush handoff
    // --------------------------------------------------------------------------------------------

    /// Rotates the live generation into the snapshot slot.
    ///
    /// A no-op when the previous snapshot has not been cleared yet
    /// (logged — the flusher failed or is still running) or when the
    /// live set is empty.
    pub fn snapshot(&self) {
        let inner = &self.inner;
        let mut gens = inner.gens.write().unwrap();

        if !gens.snapshot.is_empty() {
            warn!(
                "snapshot requested while the previous one is still pending; \
                 doing nothing (ongoing flush, or did the last attempt fail?)"
            );
            return;
        }
        if gens.live.is_empty() {
            return;
        }

        let bloom_len = inner
            .family
            .as_ref()
            .map_or(ROW_PREFIX_BLOOM_DISABLED, |f| f.row_prefix_bloom_length);
        gens.snapshot = std::mem::replace(
            &mut gens.live,
            Arc::new(OrderedCellSet::new(bloom_len)),
        );
        gens.snapshot_time_range = std::mem::replace(
            &mut gens.live_time_range,
            Arc::new(TimeRangeTracker::new()),
        );
        gens.snapshot_arena = gens.live_arena.take();
        if inner.config.use_arena {
            gens.live_arena = Some(Arc::new(Arena::new(
                inner.config.arena_chunk_bytes,
                inner.pool.clone(),
            )));
        }

        inner.smallest_write_seq.store(u64::MAX, Ordering::SeqCst);
        let frozen_bytes = inner.heap_size.load(Ordering::SeqCst) - DEEP_OVERHEAD;
        inner.snapshot_heap_size.store(frozen_bytes, Ordering::SeqCst);
        inner.heap_size.store(DEEP_OVERHEAD, Ordering::SeqCst);
        inner
            .deletes_in_snapshot
            .store(inner.deletes_in_live.swap(0, Ordering::SeqCst), Ordering::SeqCst);

        debug!(
            cells = gens.snapshot.len(),
            bytes = frozen_bytes,
            "live generation rotated to snapshot"
        );
    }

    /// The current snapshot set, for the flusher. Empty unless a
    /// `snapshot()` is awaiting its `clear_snapshot()`.
    pub fn get_snapshot(&self) -> Arc<OrderedCellSet> {
        Arc::clone(&self.inner.gens.read().unwrap().snapshot)
    }

    /// Discards the flushed snapshot.
    ///
    /// `snapshot` must be the set returned by [`MemStore::get_snapshot`]
    /// for the rotation being completed, otherwise
    /// [`MemStoreError::UnexpectedSnapshot`] is returned and nothing
    /// changes. The frozen arena is retired outside the rotation lock;
    /// its chunks reach the pool once the last pinning scanner closes.
    pub fn clear_snapshot(&self, snapshot: &Arc<OrderedCellSet>) -> Result<(), MemStoreError> {
        let inner = &self.inner;
        let stolen_arena;
        {
            let mut gens = inner.gens.write().unwrap();
            if !Arc::ptr_eq(&gens.snapshot, snapshot) {
                return Err(MemStoreError::UnexpectedSnapshot);
            }
            if !gens.snapshot.is_empty() {
                let bloom_len = inner
                    .family
                    .as_ref()
                    .map_or(ROW_PREFIX_BLOOM_DISABLED, |f| f.row_prefix_bloom_length);
                gens.snapshot = Arc::new(OrderedCellSet::new(bloom_len));
                gens.snapshot_time_range = Arc::new(TimeRangeTracker::new());
            }
            stolen_arena = gens.snapshot_arena.take();
            inner.snapshot_heap_size.store(0, Ordering::SeqCst);
            inner.deletes_in_snapshot.store(0, Ordering::SeqCst);
        }

        if let Some(arena) = stolen_arena {
            arena.close();
        }
        debug!("snapshot cleared");
        Ok(())
    }

    /// Timestamp window of the pending snapshot.
    pub fn snapshot_time_range(&self) -> Arc<TimeRangeTracker> {
        Arc::clone(&self.inner.gens.read().unwrap().snapshot_time_range)
    }

    // --------------------------------------------------------------------------------------------
    // Read path
    // --------------------------------------------------------------------------------------------

    /// Opens the scanner over this memstore. Returned as a one-element
    /// list to slot into the store's scanner stack alongside file
    /// scanners.
    pub fn scanners(&self) -> Vec<MemStoreScanner> {
        let gens = self.inner.gens.read().unwrap();
        vec![MemStoreScanner::new(Arc::clone(&self.inner), &gens)]
    }

    /// Read-only scanner over a frozen set the flusher is persisting.
    pub fn snapshot_scanners(snapshot: Arc<OrderedCellSet>) -> Vec<SnapshotScanner> {
        vec![SnapshotScanner::new(snapshot)]
    }

    /// Smallest cell of either set whose row sorts strictly after
    /// `cell`'s row — or the smallest cell overall for `None`.
    ///
    /// Deletes and expired cells are *not* suppressed here; that is the
    /// caller's business.
    pub fn get_next_row(&self, cell: Option<&Arc<Cell>>) -> Option<Arc<Cell>> {
        let inner = &self.inner;
        let gens = inner.gens.read().unwrap();
        let live = Self::next_row_in(&gens.live, cell, &inner.comparator);
        let snap = Self::next_row_in(&gens.snapshot, cell, &inner.comparator);
        match (live, snap) {
            (None, result) | (result, None) => result,
            (Some(a), Some(b)) => {
                if inner.comparator.compare_rows(&a, &b).is_le() {
                    Some(a)
                } else {
                    Some(b)
                }
            }
        }
    }

    fn next_row_in(
        set: &Arc<OrderedCellSet>,
        after: Option<&Arc<Cell>>,
        comparator: &CellComparator,
    ) -> Option<Arc<Cell>> {
        let mut cursor = match after {
            None => CellCursor::from_start(Arc::clone(set)),
            Some(cell) => CellCursor::tail(Arc::clone(set), cell),
        };
        while let Some(found) = cursor.next() {
            if let Some(cell) = after {
                if comparator.compare_rows(&found, cell).is_le() {
                    continue;
                }
            }
            return Some(found);
        }
        None
    }

    /// Closest-row-at-or-before probe used by reverse row lookups.
    ///
    /// Walks forward from the tracker's target on both sets,
    /// accumulating candidates and dropping expired deletes in place;
    /// when a set yields nothing on the target row, backs up row by row
    /// until the tracker declares the walk out of bounds.
    pub fn get_row_key_at_or_before(&self, tracker: &mut dyn ClosestRowTracker) {
        let gens = self.inner.gens.read().unwrap();
        Self::closest_at_or_before_in(&gens.live, tracker);
        Self::closest_at_or_before_in(&gens.snapshot, tracker);
    }

    fn closest_at_or_before_in(set: &Arc<OrderedCellSet>, tracker: &mut dyn ClosestRowTracker) {
        if set.is_empty() {
            return;
        }
        let target = tracker.target_key();
        if !Self::walk_forward_in_single_row(set, &target, tracker) {
            Self::walk_back_row_by_row(set, tracker);
        }
    }

    /// Walks one row forward from its first possible key. Returns true
    /// once the tracker accepts a candidate on the row.
    fn walk_forward_in_single_row(
        set: &Arc<OrderedCellSet>,
        first_on_row: &Arc<Cell>,
        tracker: &mut dyn ClosestRowTracker,
    ) -> bool {
        let mut cursor = CellCursor::tail(Arc::clone(set), first_on_row);
        while let Some(cell) = cursor.next() {
            if tracker.is_too_far(&cell, first_on_row) {
                break;
            }
            if tracker.is_expired(&cell) {
                set.remove(&cell);
                continue;
            }
            if tracker.handle(&cell) {
                return true;
            }
        }
        false
    }

    fn walk_back_row_by_row(set: &Arc<OrderedCellSet>, tracker: &mut dyn ClosestRowTracker) {
        let mut first_on_row = tracker.target_key();
        while let Some(previous) = Self::member_of_previous_row(set, tracker, &first_on_row) {
            if !tracker.is_target_table(&previous) {
                break;
            }
            if !tracker.is_better_candidate(&previous) {
                break;
            }
            first_on_row = Arc::new(Cell::first_on_row(previous.row_bytes().clone()));
            if Self::walk_forward_in_single_row(set, &first_on_row, tracker) {
                break;
            }
        }
    }

    /// Largest non-expired cell strictly before `first_on_row`; expired
    /// cells met on the way are dropped from the set.
    fn member_of_previous_row(
        set: &Arc<OrderedCellSet>,
        tracker: &mut dyn ClosestRowTracker,
        first_on_row: &Arc<Cell>,
    ) -> Option<Arc<Cell>> {
        let mut cursor = DescendingCellCursor::head(Arc::clone(set), first_on_row);
        while let Some(cell) = cursor.next() {
            if tracker.is_expired(&cell) {
                set.remove(&cell);
                continue;
            }
            return Some(cell);
        }
        None
    }

    /// False when this memstore definitely holds nothing for the scan:
    /// neither generation's timestamp window intersects the requested
    /// range, or everything buffered is older than
    /// `oldest_unexpired_ts`.
    pub fn should_seek(&self, scan: &ScanRequest, oldest_unexpired_ts: i64) -> bool {
        self.inner.should_seek(scan, oldest_unexpired_ts)
    }

    // --------------------------------------------------------------------------------------------
    // Accounting
    // --------------------------------------------------------------------------------------------

    /// Heap of the live generation including the fixed overhead.
    pub fn heap_size(&self) -> u64 {
        self.inner.heap_size.load(Ordering::SeqCst)
    }

    /// Heap of the live cells alone.
    pub fn key_size(&self) -> u64 {
        self.heap_size() - DEEP_OVERHEAD
    }

    /// Heap frozen by the pending snapshot; 0 outside a flush.
    pub fn snapshot_heap_size(&self) -> u64 {
        self.inner.snapshot_heap_size.load(Ordering::SeqCst)
    }

    /// What the next flush would write: the pending snapshot if one
    /// exists, else the live cells.
    pub fn flushable_size(&self) -> u64 {
        let snapshot = self.snapshot_heap_size();
        if snapshot > 0 {
            snapshot
        } else {
            self.key_size()
        }
    }

    /// Lower bound on the write sequences of live cells; `u64::MAX`
    /// when the live set has been empty since the last rotation.
    pub fn smallest_write_seq(&self) -> u64 {
        self.inner.smallest_write_seq.load(Ordering::SeqCst)
    }

    /// Cell bytes successfully placed in arenas over this memstore's
    /// lifetime.
    pub fn arena_allocated_bytes(&self) -> u64 {
        self.inner.arena_allocated_bytes.load(Ordering::SeqCst)
    }

    /// Trace-logs every cell of both generations.
    pub fn dump(&self) {
        let gens = self.inner.gens.read().unwrap();
        for (name, set) in [("live", &gens.live), ("snapshot", &gens.snapshot)] {
            let mut cursor = CellCursor::from_start(Arc::clone(set));
            while let Some(cell) = cursor.next() {
                trace!(
                    set = name,
                    row = %HexKey(cell.row()),
                    ts = cell.timestamp(),
                    cell_type = ?cell.cell_type(),
                    write_seq = cell.write_seq(),
                    value_len = cell.value().len(),
                    "dump"
                );
            }
        }
    }
}

impl MemStoreInner {
    /// Shared insert path: clones the cell into the live arena when one
    /// is on, inserts, and settles the books. Returns the heap delta and
    /// the cell reference that actually sits in the set.
    fn add_to_live(&self, gens: &Generations, cell: Cell, seq_num: u64) -> (u64, Arc<Cell>) {
        let stored = Arc::new(self.maybe_clone_with_arena(gens.live_arena.as_deref(), cell));
        let inserted = gens.live.add(Arc::clone(&stored));
        let delta = if inserted { heap_size_change(&stored) } else { 0 };

        gens.live_time_range.include_timestamp(stored.timestamp());
        self.heap_size.fetch_add(delta, Ordering::SeqCst);
        if stored.is_delete() {
            self.deletes_in_live.fetch_add(1, Ordering::SeqCst);
        }
        self.smallest_write_seq.fetch_min(seq_num, Ordering::SeqCst);

        trace!(
            row = %HexKey(stored.row()),
            ts = stored.timestamp(),
            write_seq = stored.write_seq(),
            seq_num,
            delta,
            "cell added"
        );
        (delta, stored)
    }

    /// Copies the cell payload into the arena, re-backing the cell on
    /// the arena region. Oversize payloads (and a missing arena) leave
    /// the caller's buffer in place.
    fn maybe_clone_with_arena(&self, arena: Option<&Arena>, cell: Cell) -> Cell {
        let Some(arena) = arena else {
            return cell;
        };
        let Some(allocation) = arena.allocate(cell.data_len()) else {
            return cell;
        };
        let backing = allocation.fill(&[cell.row(), cell.family(), cell.qualifier(), cell.value()]);
        let cloned = cell.with_backing(backing);
        self.arena_allocated_bytes
            .fetch_add(cloned.heap_size(), Ordering::SeqCst);
        cloned
    }

    pub(crate) fn should_seek(&self, scan: &ScanRequest, oldest_unexpired_ts: i64) -> bool {
        let gens = self.gens.read().unwrap();
        let in_window = gens.live_time_range.includes_range(&scan.time_range)
            || gens.snapshot_time_range.includes_range(&scan.time_range);
        let newest = gens
            .live_time_range
            .max_timestamp()
            .max(gens.snapshot_time_range.max_timestamp());
        in_window && newest >= oldest_unexpired_ts
    }

    /// Deletes buffered across both generations.
    pub(crate) fn delete_tally(&self) -> u64 {
        self.deletes_in_live.load(Ordering::SeqCst) + self.deletes_in_snapshot.load(Ordering::SeqCst)
    }
}

// ------------------------------------------------------------------------------------------------
// Tracing Helper
// ------------------------------------------------------------------------------------------------

/// Hex rendering of a row key for log lines, truncated past 24 bytes.
pub(crate) struct HexKey<'a>(pub &'a [u8]);

impl std::fmt::Display for HexKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = if self.0.len() <= 24 { self.0 } else { &self.0[..12] };
        for byte in shown {
            write!(f, "{byte:02x}")?;
        }
        if shown.len() < self.0.len() {
            write!(f, "..[{} bytes]", self.0.len())?;
        }
        Ok(())
    }
}
