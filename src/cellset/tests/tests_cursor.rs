#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::cell::{Cell, CellType};
    use crate::cellset::{
        CellCursor, DescendingCellCursor, OrderedCellSet, ROW_PREFIX_BLOOM_DISABLED,
    };

    fn cell(row: &str, seq: u64) -> Arc<Cell> {
        Arc::new(Cell::new(
            Bytes::copy_from_slice(row.as_bytes()),
            Bytes::from_static(b"f"),
            Bytes::from_static(b"q"),
            100,
            CellType::Put,
            Bytes::from_static(b"v"),
            seq,
        ))
    }

    fn probe(row: &str) -> Arc<Cell> {
        Arc::new(Cell::first_on_row(Bytes::copy_from_slice(row.as_bytes())))
    }

    fn populated() -> Arc<OrderedCellSet> {
        let set = Arc::new(OrderedCellSet::new(ROW_PREFIX_BLOOM_DISABLED));
        for (i, row) in ["a", "c", "e", "g"].iter().enumerate() {
            set.add(cell(row, i as u64 + 1));
        }
        set
    }

    #[test]
    fn tail_cursor_starts_at_lower_bound() {
        let set = populated();
        let mut cursor = CellCursor::tail(Arc::clone(&set), &probe("d"));
        assert_eq!(cursor.next().unwrap().row(), b"e");
        assert_eq!(cursor.next().unwrap().row(), b"g");
        assert!(cursor.next().is_none());
    }

    #[test]
    fn tail_cursor_includes_exact_match() {
        let set = populated();
        let mut cursor = CellCursor::tail(Arc::clone(&set), &probe("c"));
        assert_eq!(cursor.next().unwrap().row(), b"c");
    }

    #[test]
    fn exhausted_cursor_picks_up_later_inserts() {
        // Weak consistency: the cursor re-locates by key, so members
        // inserted beyond the position after a miss become visible.
        let set = populated();
        let mut cursor = CellCursor::tail(Arc::clone(&set), &probe("x"));
        assert!(cursor.next().is_none());

        set.add(cell("y", 9));
        assert_eq!(cursor.next().unwrap().row(), b"y");
    }

    #[test]
    fn removal_of_last_returned_does_not_disturb_stepping() {
        let set = populated();
        let mut cursor = CellCursor::from_start(Arc::clone(&set));
        let first = cursor.next().unwrap();
        assert_eq!(first.row(), b"a");

        assert!(set.remove(&first));
        assert_eq!(cursor.next().unwrap().row(), b"c");
    }

    #[test]
    fn cursor_never_revisits_members() {
        let set = populated();
        let mut cursor = CellCursor::from_start(Arc::clone(&set));
        let mut seen = Vec::new();
        while let Some(c) = cursor.next() {
            seen.push(String::from_utf8_lossy(c.row()).into_owned());
        }
        assert_eq!(seen, ["a", "c", "e", "g"]);
    }

    #[test]
    fn descending_cursor_walks_strictly_below_bound() {
        let set = populated();
        let mut cursor = DescendingCellCursor::head(Arc::clone(&set), &probe("e"));
        assert_eq!(cursor.next().unwrap().row(), b"c");
        assert_eq!(cursor.next().unwrap().row(), b"a");
        assert!(cursor.next().is_none());
    }

    #[test]
    fn descending_cursor_excludes_its_bound_cell() {
        let set = populated();
        let on_e = cell("e", 3);
        // Bound is the real cell, not a row probe: members >= it stay out.
        let mut cursor = DescendingCellCursor::head(Arc::clone(&set), &on_e);
        assert_eq!(cursor.next().unwrap().row(), b"c");
    }
}
