use std::sync::Arc;

use bytes::Bytes;
use tracing_subscriber::EnvFilter;

use crate::arena::pool::ArenaPool;
use crate::cell::{comparator::CellComparator, Cell, CellType};
use crate::memstore::{FamilyDescriptor, MemStore, MemStoreConfig};
use crate::mvcc::MvccController;

/// Initialize tracing subscriber controlled by `RUST_LOG` env var.
/// Safe to call multiple times — only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Memstore over a fresh controller, default config, no pool.
pub fn default_store() -> (MemStore, Arc<MvccController>) {
    init_tracing();
    let mvcc = Arc::new(MvccController::new());
    let store = MemStore::new(
        MemStoreConfig::default(),
        CellComparator,
        None,
        Arc::clone(&mvcc),
        None,
    );
    (store, mvcc)
}

/// Memstore wired to a shared chunk pool with small 4 KiB chunks, so
/// pool traffic shows up with little data.
pub fn pooled_store(pool: &Arc<ArenaPool>) -> (MemStore, Arc<MvccController>) {
    init_tracing();
    let mvcc = Arc::new(MvccController::new());
    let config = MemStoreConfig {
        arena_chunk_bytes: 4096,
        ..MemStoreConfig::default()
    };
    let store = MemStore::new(
        config,
        CellComparator,
        None,
        Arc::clone(&mvcc),
        Some(Arc::clone(pool)),
    );
    (store, mvcc)
}

/// Memstore with a custom config and family descriptor.
pub fn store_with(config: MemStoreConfig, family: Option<FamilyDescriptor>) -> (MemStore, Arc<MvccController>) {
    init_tracing();
    let mvcc = Arc::new(MvccController::new());
    let store = MemStore::new(config, CellComparator, family, Arc::clone(&mvcc), None);
    (store, mvcc)
}

/// A `Put` cell on family `f`, qualifier `q`.
pub fn put(row: &str, ts: i64, value: &str, seq: u64) -> Cell {
    put_q(row, "q", ts, value, seq)
}

/// A `Put` cell on family `f` with an explicit qualifier.
pub fn put_q(row: &str, qualifier: &str, ts: i64, value: &str, seq: u64) -> Cell {
    Cell::new(
        Bytes::copy_from_slice(row.as_bytes()),
        Bytes::from_static(b"f"),
        Bytes::copy_from_slice(qualifier.as_bytes()),
        ts,
        CellType::Put,
        Bytes::copy_from_slice(value.as_bytes()),
        seq,
    )
}

/// A point `Delete` cell on family `f`, qualifier `q`.
pub fn delete(row: &str, ts: i64, seq: u64) -> Cell {
    Cell::new(
        Bytes::copy_from_slice(row.as_bytes()),
        Bytes::from_static(b"f"),
        Bytes::from_static(b"q"),
        ts,
        CellType::Delete,
        Bytes::new(),
        seq,
    )
}

/// First-on-row seek probe.
pub fn probe(row: &str) -> Arc<Cell> {
    Arc::new(Cell::first_on_row(Bytes::copy_from_slice(row.as_bytes())))
}

/// Everything a fresh scanner emits, in order.
pub fn scan_all(store: &MemStore) -> Vec<Arc<Cell>> {
    let mut scanner = store.scanners().remove(0);
    let mut out = Vec::new();
    if scanner.seek(&Arc::new(Cell::first_on_row(Bytes::new()))) {
        while let Some(cell) = scanner.next() {
            out.push(cell);
        }
    }
    scanner.close();
    out
}
