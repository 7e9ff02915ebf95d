//! Timestamp windows: [`TimeRange`] requested by a scan and
//! [`TimeRangeTracker`], the rolling [min,max] window a cell set has
//! actually absorbed. The memstore keeps one tracker per generation and
//! consults them to skip scans whose requested window cannot intersect
//! anything buffered.

use std::sync::atomic::{AtomicI64, Ordering};

/// Half-open timestamp interval `[min, max)` requested by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    min: i64,
    max: i64,
}

impl TimeRange {
    pub fn new(min: i64, max: i64) -> Self {
        debug_assert!(min <= max);
        Self { min, max }
    }

    /// The interval matching every timestamp.
    pub fn all_time() -> Self {
        Self {
            min: 0,
            max: i64::MAX,
        }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::all_time()
    }
}

/// Rolling [min,max] over every timestamp folded in so far.
///
/// Updated by writers under the shared side of the memstore lock, so the
/// fold-in is a pair of atomic min/max folds rather than a mutex.
/// A tracker that has absorbed nothing intersects no range.
#[derive(Debug)]
pub struct TimeRangeTracker {
    min_ts: AtomicI64,
    max_ts: AtomicI64,
}

impl TimeRangeTracker {
    pub fn new() -> Self {
        Self {
            min_ts: AtomicI64::new(i64::MAX),
            max_ts: AtomicI64::new(i64::MIN),
        }
    }

    /// Folds one timestamp into the window.
    pub fn include_timestamp(&self, ts: i64) {
        self.min_ts.fetch_min(ts, Ordering::AcqRel);
        self.max_ts.fetch_max(ts, Ordering::AcqRel);
    }

    /// True iff the window intersects `range`.
    pub fn includes_range(&self, range: &TimeRange) -> bool {
        self.min_ts.load(Ordering::Acquire) < range.max()
            && self.max_ts.load(Ordering::Acquire) >= range.min()
    }

    /// Largest timestamp absorbed; `i64::MIN` when empty.
    pub fn max_timestamp(&self) -> i64 {
        self.max_ts.load(Ordering::Acquire)
    }

    /// Smallest timestamp absorbed; `i64::MAX` when empty.
    pub fn min_timestamp(&self) -> i64 {
        self.min_ts.load(Ordering::Acquire)
    }
}

impl Default for TimeRangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------
