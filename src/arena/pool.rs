//! Process-wide recycler of arena chunk buffers.
//!
//! Arenas come and go with every flush; their chunks are all the same
//! size, so retired chunks are parked here and revived for the next
//! arena instead of churning the allocator. The pool is an explicit
//! singleton: construct one per process and hand the same `Arc` to every
//! memstore.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::BytesMut;
use tracing::debug;

/// Bounded cache of retired chunk buffers.
///
/// A parked buffer may still share its backing allocation with live
/// cells (a scanner outliving its snapshot, a slow flush). Checkout
/// therefore revives a buffer only when it holds the sole reference
/// ([`BytesMut::try_reclaim`]); anything still shared stays parked until
/// its cells die, and a fresh buffer is allocated instead.
pub struct ArenaPool {
    max_chunks: usize,
    parked: Mutex<Vec<BytesMut>>,
    reused: AtomicU64,
    allocated: AtomicU64,
    discarded: AtomicU64,
}

impl ArenaPool {
    /// Creates a pool keeping at most `max_chunks` retired buffers.
    pub fn new(max_chunks: usize) -> Self {
        Self {
            max_chunks,
            parked: Mutex::new(Vec::new()),
            reused: AtomicU64::new(0),
            allocated: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Returns a zeroed buffer of `chunk_bytes`, revived from the pool
    /// when possible.
    pub fn checkout(&self, chunk_bytes: usize) -> BytesMut {
        {
            let mut parked = self.parked.lock().unwrap();
            if let Some(mut buf) = parked.pop() {
                if buf.try_reclaim(chunk_bytes) {
                    drop(parked);
                    buf.clear();
                    buf.resize(chunk_bytes, 0);
                    self.reused.fetch_add(1, Ordering::Relaxed);
                    return buf;
                }
                // Still shared with live cells; park it again for later.
                parked.insert(0, buf);
            }
        }
        self.allocated.fetch_add(1, Ordering::Relaxed);
        BytesMut::zeroed(chunk_bytes)
    }

    /// Parks a retired chunk buffer; drops it beyond the high-water mark.
    pub fn check_in(&self, mut buf: BytesMut) {
        // An empty view can reclaim the whole backing allocation later;
        // a non-empty one never could.
        buf.clear();
        let mut parked = self.parked.lock().unwrap();
        if parked.len() >= self.max_chunks {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(max_chunks = self.max_chunks, "arena pool full, dropping chunk");
            return;
        }
        parked.push(buf);
    }

    /// Number of buffers currently parked.
    pub fn parked_chunks(&self) -> usize {
        self.parked.lock().unwrap().len()
    }

    /// Lifetime (reused, freshly allocated, discarded) tallies.
    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.reused.load(Ordering::Relaxed),
            self.allocated.load(Ordering::Relaxed),
            self.discarded.load(Ordering::Relaxed),
        )
    }
}
