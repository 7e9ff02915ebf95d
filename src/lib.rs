//! # Cellarium
//!
//! The in-memory write buffer ("MemStore") of a log-structured,
//! column-family table engine. One `MemStore` fronts the immutable
//! on-disk files of a single column family of a single region: it absorbs
//! every write (puts and typed deletes, modeled as cells), serves reads by
//! merging its contents into the store's scanner stack, and periodically
//! hands its accumulated cells to a flush collaborator.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                      MemStore                          │
//! │  ┌──────────────┐      ┌──────────────┐                │
//! │  │  Live set    │      │ Snapshot set │                │
//! │  │  + arena     │─────►│  + arena     │──► (flusher)   │
//! │  │  + timerange │ snap │  + timerange │ clear_snapshot │
//! │  └──────┬───────┘      └──────┬───────┘                │
//! │         │                     │                        │
//! │         └──► MemStoreScanner ◄┘                        │
//! │           merged, read-point filtered                  │
//! │                                                        │
//! │  Arena chunks recycle through a shared ArenaPool once  │
//! │  retired and unpinned by every scanner.                │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cell`] | Immutable versioned cells and the comparator set |
//! | [`timerange`] | Rolling [min,max] timestamp window per cell set |
//! | [`arena`] | Slab allocator ("LAB") with refcounted scanner pins + chunk pool |
//! | [`cellset`] | Concurrent ordered cell set with row-prefix bloom filter |
//! | [`mvcc`] | Write-sequence assignment and per-thread read points |
//! | [`memstore`] | The MemStore core: writes, flush handoff, scanners |
//!
//! ## Key properties
//!
//! - **Many writers, many readers** — writers and readers share the read
//!   side of one lock; only the brief snapshot rotation excludes them.
//! - **Set, not map** — equal cells never overwrite; the first insertion
//!   wins, so concurrent duplicate edits cannot clobber each other.
//! - **Arena-backed cells** — cell bytes are copied into large slab
//!   chunks to fight heap fragmentation from many small long-lived cells;
//!   chunks recycle through a bounded process-wide pool.
//! - **Snapshot-consistent scanners** — a scanner pins the sets and
//!   arenas it captured at creation and filters by its thread's MVCC
//!   read point.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use cellarium::cell::{comparator::CellComparator, Cell, CellType};
//! use cellarium::memstore::{MemStore, MemStoreConfig};
//! use cellarium::mvcc::MvccController;
//!
//! let mvcc = Arc::new(MvccController::new());
//! let store = Arc::new(MemStore::new(
//!     MemStoreConfig::default(),
//!     CellComparator,
//!     None,
//!     mvcc.clone(),
//!     None,
//! ));
//!
//! // Write
//! let seq = mvcc.assign_write_seq();
//! let cell = Cell::new(
//!     Bytes::from_static(b"row-1"),
//!     Bytes::from_static(b"f"),
//!     Bytes::from_static(b"q"),
//!     100,
//!     CellType::Put,
//!     Bytes::from_static(b"v"),
//!     seq,
//! );
//! store.add(cell, seq);
//! mvcc.complete_write(seq);
//!
//! // Read
//! let mut scanner = store.scanners().remove(0);
//! let probe = Arc::new(Cell::first_on_row(Bytes::from_static(b"row-1")));
//! assert!(scanner.seek(&probe));
//! assert_eq!(scanner.next().unwrap().value(), b"v");
//! scanner.close();
//!
//! // Flush handoff
//! store.snapshot();
//! let frozen = store.get_snapshot();
//! // ... persist `frozen` ...
//! store.clear_snapshot(&frozen).unwrap();
//! ```

pub mod arena;
pub mod cell;
pub mod cellset;
pub mod memstore;
pub mod mvcc;
pub mod timerange;
