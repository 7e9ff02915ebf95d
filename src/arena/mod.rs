//! # Arena Module ("LAB")
//!
//! Slab allocator backing the byte storage of memstore cells. Many small
//! long-lived cell buffers fragment the heap badly; the arena instead
//! carves cell payloads out of large fixed-size chunks so that a whole
//! chunk's worth of cells comes and goes together.
//!
//! ## Design Invariants
//!
//! - Allocations within one chunk are contiguous and non-overlapping:
//!   each [`Allocation`] is an exclusively owned writable region split
//!   off the front of the current chunk.
//! - A request larger than the chunk size returns `None`; the caller
//!   keeps its original buffer. Never an error.
//! - `allocate` after [`Arena::close`] returns `None`; the memstore has
//!   already rotated to a fresh arena by then.
//! - Chunks are surrendered to the [`pool::ArenaPool`] only once the
//!   arena is retired **and** its scanner pin count has reached zero.
//!
//! ## Scanner pins
//!
//! Scanners capture the arenas of the sets they iterate and pin them for
//! their lifetime ([`Arena::pin_scanner`] / [`Arena::unpin_scanner`]).
//! The owning memstore retires the arena with [`Arena::close`] when the
//! generation is discarded; whichever of "retire" and "last unpin"
//! happens second hands the chunks back.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------


// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

pub mod pool;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use self::pool::ArenaPool;

// ------------------------------------------------------------------------------------------------
// Allocation
// ------------------------------------------------------------------------------------------------

/// An exclusively owned writable region carved off an arena chunk.
///
/// The caller fills it and freezes it into [`Bytes`] that share the
/// chunk's backing allocation.
pub struct Allocation {
    buf: BytesMut,
}

impl Allocation {
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Copies `parts` into the region back to back and freezes it.
    ///
    /// The concatenated length of `parts` must equal the allocation
    /// length the region was requested with.
    pub fn fill(mut self, parts: &[&[u8]]) -> Bytes {
        let mut off = 0;
        for part in parts {
            self.buf[off..off + part.len()].copy_from_slice(part);
            off += part.len();
        }
        debug_assert_eq!(off, self.buf.len());
        self.buf.freeze()
    }
}

// ------------------------------------------------------------------------------------------------
// Chunk
// ------------------------------------------------------------------------------------------------

/// One slab. `remaining` is the unallocated tail; carving happens under
/// a short lock, the lock-free `free` counter lets full chunks refuse
/// without contending.
struct Chunk {
    remaining: Mutex<BytesMut>,
    free: AtomicUsize,
}

impl Chunk {
    fn new(buf: BytesMut) -> Self {
        let free = buf.len();
        Self {
            remaining: Mutex::new(buf),
            free: AtomicUsize::new(free),
        }
    }

    fn try_carve(&self, len: usize) -> Option<BytesMut> {
        if self.free.load(Ordering::Acquire) < len {
            return None;
        }
        let mut remaining = self.remaining.lock().unwrap();
        if remaining.len() < len {
            return None;
        }
        let piece = remaining.split_to(len);
        self.free.store(remaining.len(), Ordering::Release);
        Some(piece)
    }

    fn take_remainder(&self) -> BytesMut {
        self.free.store(0, Ordering::Release);
        std::mem::take(&mut *self.remaining.lock().unwrap())
    }
}

// ------------------------------------------------------------------------------------------------
// Arena
// ------------------------------------------------------------------------------------------------

/// Slab allocator for one memstore generation.
///
/// `allocate`, `pin_scanner` and `unpin_scanner` are concurrent-safe;
/// `close` is called once by the owning memstore after the generation is
/// discarded.
pub struct Arena {
    chunk_bytes: usize,
    pool: Option<Arc<ArenaPool>>,
    chunks: Mutex<ChunkList>,
    scanner_pins: AtomicUsize,
    retired: AtomicBool,
    surrendered: AtomicBool,
    /// Total chunk bytes this arena has claimed, recycled or fresh.
    chunk_bytes_claimed: AtomicUsize,
}

struct ChunkList {
    current: Arc<Chunk>,
    /// Exhausted chunks, retained so their remainders can be pooled.
    full: Vec<Arc<Chunk>>,
}

impl Arena {
    /// Creates an arena of `chunk_bytes`-sized slabs, recycling through
    /// `pool` when one is supplied.
    pub fn new(chunk_bytes: usize, pool: Option<Arc<ArenaPool>>) -> Self {
        assert!(chunk_bytes > 0);
        let arena = Self {
            chunk_bytes,
            pool,
            chunks: Mutex::new(ChunkList {
                current: Arc::new(Chunk::new(BytesMut::new())),
                full: Vec::new(),
            }),
            scanner_pins: AtomicUsize::new(0),
            retired: AtomicBool::new(false),
            surrendered: AtomicBool::new(false),
            chunk_bytes_claimed: AtomicUsize::new(0),
        };
        // Seed the first real chunk so the common path never sees the
        // placeholder.
        let first = arena.claim_chunk();
        arena.chunks.lock().unwrap().current = Arc::new(first);
        arena
    }

    /// Carves `len` bytes off the current chunk, swapping in a new chunk
    /// on overflow. Returns `None` for oversize requests and after
    /// [`Arena::close`]; the caller then keeps its original buffer.
    pub fn allocate(&self, len: usize) -> Option<Allocation> {
        if len > self.chunk_bytes || self.retired.load(Ordering::Acquire) {
            return None;
        }
        loop {
            let chunk = self.chunks.lock().unwrap().current.clone();
            if let Some(buf) = chunk.try_carve(len) {
                return Some(Allocation { buf });
            }

            if self.retired.load(Ordering::Acquire) {
                return None;
            }
            let mut chunks = self.chunks.lock().unwrap();
            // Another allocator may have swapped while we were deciding.
            if Arc::ptr_eq(&chunks.current, &chunk) {
                let fresh = Arc::new(self.claim_chunk());
                let exhausted = std::mem::replace(&mut chunks.current, fresh);
                chunks.full.push(exhausted);
            }
        }
    }

    /// Registers a scanner holding cells backed by this arena.
    pub fn pin_scanner(&self) {
        self.scanner_pins.fetch_add(1, Ordering::SeqCst);
    }

    /// Releases one scanner pin; the last unpin of a retired arena hands
    /// the chunks back to the pool.
    pub fn unpin_scanner(&self) {
        let previous = self.scanner_pins.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "unpin without matching pin");
        if previous == 1 && self.retired.load(Ordering::SeqCst) {
            self.surrender_chunks();
        }
    }

    /// Retires the arena. Chunks are handed back immediately if no
    /// scanner still pins it, otherwise by the last unpin.
    pub fn close(&self) {
        self.retired.store(true, Ordering::SeqCst);
        if self.scanner_pins.load(Ordering::SeqCst) == 0 {
            self.surrender_chunks();
        }
    }

    /// Current scanner pin count.
    pub fn scanner_pin_count(&self) -> usize {
        self.scanner_pins.load(Ordering::SeqCst)
    }

    /// Total chunk bytes claimed by this arena over its lifetime.
    pub fn memory_usage(&self) -> usize {
        self.chunk_bytes_claimed.load(Ordering::Acquire)
    }

    fn claim_chunk(&self) -> Chunk {
        self.chunk_bytes_claimed
            .fetch_add(self.chunk_bytes, Ordering::AcqRel);
        let buf = match &self.pool {
            Some(pool) => pool.checkout(self.chunk_bytes),
            None => BytesMut::zeroed(self.chunk_bytes),
        };
        Chunk::new(buf)
    }

    /// Hands every chunk remainder to the pool (or drops them when no
    /// pool is configured). The retire/unpin race is benign: only the
    /// first caller drains anything.
    fn surrender_chunks(&self) {
        if self.surrendered.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut chunks = self.chunks.lock().unwrap();
        let current = std::mem::replace(&mut chunks.current, Arc::new(Chunk::new(BytesMut::new())));
        let drained: Vec<Arc<Chunk>> = chunks
            .full
            .drain(..)
            .chain(std::iter::once(current))
            .collect();
        drop(chunks);

        trace!(chunks = drained.len(), "arena retired, surrendering chunks");
        if let Some(pool) = &self.pool {
            for chunk in drained {
                pool.check_in(chunk.take_remainder());
            }
        }
    }
}
