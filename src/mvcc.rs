//! Multi-version concurrency control.
//!
//! [`MvccController`] hands out monotonically increasing write sequence
//! numbers and tracks the read point — the largest sequence whose write
//! has completed. Readers carry a *thread* read point: scanner
//! advancement drops every cell whose `write_seq` exceeds it, so a
//! reader observes a consistent prefix of the write history.
//!
//! The controller is an explicit singleton: construct one per process
//! (or per test) and hand the same `Arc` to every memstore. The
//! per-thread read point itself is process-wide, like a reader's
//! identity — a thread that never entered a read context observes
//! everything.

use std::sync::atomic::{AtomicU64, Ordering};

thread_local! {
    static THREAD_READ_POINT: std::cell::Cell<Option<u64>> =
        const { std::cell::Cell::new(None) };
}

/// Write-sequence source and read-point registry.
#[derive(Debug)]
pub struct MvccController {
    write_seq: AtomicU64,
    read_point: AtomicU64,
}

impl MvccController {
    pub fn new() -> Self {
        Self {
            write_seq: AtomicU64::new(0),
            read_point: AtomicU64::new(0),
        }
    }

    /// Reserves the next write sequence number (first call returns 1).
    pub fn assign_write_seq(&self) -> u64 {
        self.write_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Marks `seq` complete, advancing the global read point to at least
    /// it. Completion order may differ from assignment order; the read
    /// point only ever moves forward.
    pub fn complete_write(&self, seq: u64) {
        self.read_point.fetch_max(seq, Ordering::SeqCst);
    }

    /// Largest completed write sequence.
    pub fn read_point(&self) -> u64 {
        self.read_point.load(Ordering::SeqCst)
    }

    /// The calling thread's read point. `u64::MAX` when the thread never
    /// set one: such a reader observes every write.
    pub fn thread_read_point(&self) -> u64 {
        THREAD_READ_POINT.with(|p| p.get()).unwrap_or(u64::MAX)
    }

    /// Pins the calling thread's read point to `seq`.
    pub fn set_thread_read_point(&self, seq: u64) {
        THREAD_READ_POINT.with(|p| p.set(Some(seq)));
    }

    /// Re-pins the calling thread's read point to the current global
    /// read point.
    pub fn reset_thread_read_point(&self) -> u64 {
        let seq = self.read_point();
        self.set_thread_read_point(seq);
        seq
    }

    /// Removes the calling thread's read point; the thread goes back to
    /// observing everything.
    pub fn clear_thread_read_point(&self) {
        THREAD_READ_POINT.with(|p| p.set(None));
    }
}

impl Default for MvccController {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------
