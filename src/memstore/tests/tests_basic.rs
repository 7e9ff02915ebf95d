#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::cell::CellType;
    use crate::memstore::tests::helpers::{default_store, delete, probe, put, scan_all};
    use crate::memstore::DEEP_OVERHEAD;

    #[test]
    fn add_accounts_heap_and_returns_delta() {
        let (store, _) = default_store();
        assert_eq!(store.heap_size(), DEEP_OVERHEAD);
        assert_eq!(store.key_size(), 0);

        let delta = store.add(put("r1", 100, "v1", 1), 1);
        assert!(delta > 0);
        assert_eq!(delta % 8, 0);
        assert_eq!(store.key_size(), delta);
        assert_eq!(store.heap_size(), DEEP_OVERHEAD + delta);
    }

    #[test]
    fn duplicate_add_contributes_nothing() {
        let (store, _) = default_store();
        let first = store.add(put("r1", 100, "v1", 5), 5);
        let second = store.add(put("r1", 100, "v1", 5), 5);

        assert!(first > 0);
        assert_eq!(second, 0);
        assert_eq!(store.key_size(), first);
        assert_eq!(scan_all(&store).len(), 1);
    }

    #[test]
    fn distinct_write_seqs_are_distinct_cells() {
        // Same column, same timestamp, different write sequences: both
        // versions are retained.
        let (store, _) = default_store();
        store.add(put("r1", 100, "v1", 1), 1);
        store.add(put("r1", 100, "v2", 2), 2);
        assert_eq!(scan_all(&store).len(), 2);
    }

    #[test]
    fn delete_keeps_its_flavor() {
        let (store, _) = default_store();
        let delta = store.delete(delete("r1", 100, 1), 1);
        assert!(delta > 0);

        let cells = scan_all(&store);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].cell_type(), CellType::Delete);
    }

    #[test]
    fn delete_tally_feeds_scanner_check() {
        let (store, _) = default_store();
        {
            let scanner = store.scanners().remove(0);
            assert!(!scanner.passes_delete_column_check(&put("x", 1, "v", 1)));
        }
        store.delete(delete("r1", 100, 1), 1);
        let scanner = store.scanners().remove(0);
        assert!(scanner.passes_delete_column_check(&put("x", 1, "v", 1)));
    }

    #[test]
    fn smallest_write_seq_is_a_running_minimum() {
        let (store, _) = default_store();
        assert_eq!(store.smallest_write_seq(), u64::MAX);

        store.add(put("a", 100, "v", 7), 7);
        assert_eq!(store.smallest_write_seq(), 7);
        store.add(put("b", 100, "v", 3), 3);
        assert_eq!(store.smallest_write_seq(), 3);
        store.add(put("c", 100, "v", 9), 9);
        assert_eq!(store.smallest_write_seq(), 3);
    }

    #[test]
    fn get_next_row_walks_rows_not_versions() {
        let (store, _) = default_store();
        store.add(put("a", 100, "v", 1), 1);
        store.add(put("a", 200, "v", 2), 2);
        store.add(put("b", 100, "v", 3), 3);

        let first = store.get_next_row(None).unwrap();
        assert_eq!(first.row(), b"a");

        let next = store.get_next_row(Some(&first)).unwrap();
        assert_eq!(next.row(), b"b");

        assert!(store.get_next_row(Some(&next)).is_none());
    }

    #[test]
    fn get_next_row_spans_both_generations() {
        let (store, _) = default_store();
        store.add(put("a", 100, "v", 1), 1);
        store.add(put("c", 100, "v", 2), 2);
        store.snapshot();
        store.add(put("b", 100, "v", 3), 3);

        let a = store.get_next_row(None).unwrap();
        assert_eq!(a.row(), b"a");
        let b = store.get_next_row(Some(&a)).unwrap();
        assert_eq!(b.row(), b"b");
        let c = store.get_next_row(Some(&b)).unwrap();
        assert_eq!(c.row(), b"c");
    }

    #[test]
    fn arena_clone_rebacks_cell_bytes() {
        let (store, _) = default_store();
        store.add(put("r1", 100, "arena-backed-value", 1), 1);

        let cells = scan_all(&store);
        assert_eq!(cells[0].value(), b"arena-backed-value");
        assert!(store.arena_allocated_bytes() > 0);
    }

    #[test]
    fn scanner_seek_probe_lands_on_row() {
        let (store, _) = default_store();
        store.add(put("aa", 100, "v1", 1), 1);
        store.add(put("bb", 100, "v2", 2), 2);

        let mut scanner = store.scanners().remove(0);
        assert!(scanner.seek(&probe("b")));
        assert_eq!(scanner.peek().unwrap().row(), b"bb");
        scanner.close();
    }

    #[test]
    fn dump_traverses_both_generations() {
        let (store, _) = default_store();
        store.add(put("a", 100, "v", 1), 1);
        store.snapshot();
        store.add(put("b", 100, "v", 2), 2);
        store.dump();
    }
}
