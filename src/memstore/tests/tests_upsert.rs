#[cfg(test)]
mod tests {
    use crate::cell::CellType;
    use crate::memstore::tests::helpers::{default_store, delete, put_q, scan_all};

    #[test]
    fn repeated_upserts_leave_one_put() {
        let (store, _) = default_store();
        store.update_column_value(b"r", b"f", b"q", 1, 100, 10);
        store.update_column_value(b"r", b"f", b"q", 2, 101, 11);
        store.update_column_value(b"r", b"f", b"q", 3, 102, 12);

        let cells = scan_all(&store);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].cell_type(), CellType::Put);
        assert_eq!(cells[0].value(), &3i64.to_be_bytes()[..]);
        assert_eq!(cells[0].timestamp(), 102);
    }

    #[test]
    fn upsert_heap_reflects_a_single_entry() {
        let (store, _) = default_store();
        let first = store.update_column_value(b"r", b"f", b"q", 1, 100, 10);
        assert!(first > 0);
        assert_eq!(store.key_size() as i64, first);

        // Same-shaped cell in, same-shaped cell out: the books balance.
        let second = store.update_column_value(b"r", b"f", b"q", 2, 101, 11);
        assert_eq!(second, 0);
        assert_eq!(store.key_size() as i64, first);
    }

    #[test]
    fn upsert_tracks_the_wal_sequence() {
        let (store, _) = default_store();
        store.update_column_value(b"r", b"f", b"q", 1, 100, 10);
        assert_eq!(store.smallest_write_seq(), 10);
    }

    #[test]
    fn upsert_preserves_delete_cells() {
        let (store, _) = default_store();
        store.delete(delete("r", 50, 1), 1);
        store.update_column_value(b"r", b"f", b"q", 7, 100, 2);
        store.update_column_value(b"r", b"f", b"q", 8, 101, 3);

        let cells = scan_all(&store);
        assert_eq!(cells.len(), 2);
        // Newest first: the fresh put at ts 101, then the tombstone.
        assert_eq!(cells[0].cell_type(), CellType::Put);
        assert_eq!(cells[0].value(), &8i64.to_be_bytes()[..]);
        assert_eq!(cells[1].cell_type(), CellType::Delete);
        assert_eq!(cells[1].timestamp(), 50);
    }

    #[test]
    fn upsert_leaves_other_qualifiers_alone() {
        let (store, _) = default_store();
        store.add(put_q("r", "other", 90, "keep-me", 1), 1);
        store.update_column_value(b"r", b"f", b"q", 5, 100, 2);
        store.update_column_value(b"r", b"f", b"q", 6, 101, 3);

        let cells = scan_all(&store);
        assert_eq!(cells.len(), 2);
        let kept = cells
            .iter()
            .find(|c| c.qualifier() == b"other")
            .expect("untouched qualifier");
        assert_eq!(kept.value(), b"keep-me");
    }

    #[test]
    fn upsert_stops_at_the_row_boundary() {
        let (store, _) = default_store();
        store.add(put_q("r-next", "q", 90, "neighbor", 1), 1);
        store.update_column_value(b"r", b"f", b"q", 5, 100, 2);
        store.update_column_value(b"r", b"f", b"q", 6, 101, 3);

        let cells = scan_all(&store);
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().any(|c| c.row() == b"r-next"));
    }

    #[test]
    fn upsert_is_visible_at_any_read_point() {
        let (store, mvcc) = default_store();
        store.add(put_q("r", "plain", 100, "v", 4), 4);
        store.update_column_value(b"r", b"f", b"q", 5, 100, 5);

        // A reader pinned before every write still sees the upsert
        // (write sequence 0), but not the plain add.
        mvcc.set_thread_read_point(0);
        let visible = scan_all(&store);
        mvcc.clear_thread_read_point();

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].qualifier(), b"q");
        assert_eq!(visible[0].write_seq(), 0);
    }
}
