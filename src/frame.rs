// ==============================================================================
// frame.rs - Dense Row-Ordered Data Frame
// ==============================================================================
// Description: Null-aware tabular structure built from sparse store records
// ==============================================================================

use std::collections::{BTreeSet, HashMap};

use nalgebra::DMatrix;

/// A sparse record as handed over by the record store: one row identifier plus
/// whatever columns were present for that row. Absent columns are simply not
/// listed; a present-but-missing value is `None`.
#[derive(Debug, Clone, Default)]
pub struct SparseRecord {
    pub id: String,
    pub columns: Vec<(String, Option<f64>)>,
}

impl SparseRecord {
    pub fn new(id: impl Into<String>, columns: Vec<(String, Option<f64>)>) -> Self {
        SparseRecord {
            id: id.into(),
            columns,
        }
    }
}

/// Dense, row-ordered table of nullable values.
///
/// Invariants: row identifiers are unique and sorted ascending; column
/// identifiers are the union of columns seen across source records, with
/// missing cells as `None`. Frames are immutable; every operation that
/// "modifies" a frame produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    row_ids: Vec<String>,
    col_ids: Vec<String>,
    // row-major, row_ids.len() * col_ids.len()
    cells: Vec<Option<f64>>,
}

impl Frame {
    pub fn empty() -> Self {
        Frame {
            row_ids: Vec::new(),
            col_ids: Vec::new(),
            cells: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_ids.len()
    }

    pub fn col_count(&self) -> usize {
        self.col_ids.len()
    }

    /// A frame with zero rows carries no usable observations. Callers check
    /// this rather than relying on a thrown error.
    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    pub fn col_ids(&self) -> &[String] {
        &self.col_ids
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row * self.col_ids.len() + col]
    }

    fn row(&self, row: usize) -> &[Option<f64>] {
        let width = self.col_ids.len();
        &self.cells[row * width..(row + 1) * width]
    }

    /// Restrict to rows whose identifier is in `keep`. Identifiers in `keep`
    /// that are not present in the frame are silently ignored.
    pub fn retain_rows(&self, keep: &BTreeSet<String>) -> Frame {
        self.filter_rows(|id| keep.contains(id))
    }

    /// Drop every row whose identifier is in `drop`.
    pub fn drop_rows(&self, drop: &BTreeSet<String>) -> Frame {
        self.filter_rows(|id| !drop.contains(id))
    }

    fn filter_rows(&self, mut keep: impl FnMut(&str) -> bool) -> Frame {
        let mut row_ids = Vec::new();
        let mut cells = Vec::new();
        for (r, id) in self.row_ids.iter().enumerate() {
            if keep(id) {
                row_ids.push(id.clone());
                cells.extend_from_slice(self.row(r));
            }
        }
        Frame {
            row_ids,
            col_ids: self.col_ids.clone(),
            cells,
        }
    }

    /// Re-sort rows ascending by identifier. The builder already emits sorted
    /// frames; alignment applies this again before any pruning so the order
    /// invariant never depends on where a frame came from.
    pub fn sorted_by_row_id(&self) -> Frame {
        if self.row_ids.windows(2).all(|w| w[0] <= w[1]) {
            return self.clone();
        }
        let mut order: Vec<usize> = (0..self.row_ids.len()).collect();
        order.sort_by(|&a, &b| self.row_ids[a].cmp(&self.row_ids[b]));
        let mut row_ids = Vec::with_capacity(self.row_ids.len());
        let mut cells = Vec::with_capacity(self.cells.len());
        for r in order {
            row_ids.push(self.row_ids[r].clone());
            cells.extend_from_slice(self.row(r));
        }
        Frame {
            row_ids,
            col_ids: self.col_ids.clone(),
            cells,
        }
    }

    /// Drop every column containing a null in any row. Column order is
    /// otherwise preserved.
    pub fn drop_null_columns(&self) -> Frame {
        let keep: Vec<usize> = (0..self.col_ids.len())
            .filter(|&c| (0..self.row_ids.len()).all(|r| self.get(r, c).is_some()))
            .collect();
        self.take_columns(&keep)
    }

    /// Identifiers of rows that still contain a null in any column.
    pub fn null_row_ids(&self) -> Vec<String> {
        self.row_ids
            .iter()
            .enumerate()
            .filter(|(r, _)| self.row(*r).iter().any(|cell| cell.is_none()))
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Restrict to the named columns, in the order given. Unknown names are
    /// ignored.
    pub fn select_columns(&self, cols: &[String]) -> Frame {
        let index: HashMap<&str, usize> = self
            .col_ids
            .iter()
            .enumerate()
            .map(|(c, id)| (id.as_str(), c))
            .collect();
        let keep: Vec<usize> = cols
            .iter()
            .filter_map(|name| index.get(name.as_str()).copied())
            .collect();
        self.take_columns(&keep)
    }

    fn take_columns(&self, keep: &[usize]) -> Frame {
        let mut cells = Vec::with_capacity(self.row_ids.len() * keep.len());
        for r in 0..self.row_ids.len() {
            for &c in keep {
                cells.push(self.get(r, c));
            }
        }
        Frame {
            row_ids: self.row_ids.clone(),
            col_ids: keep.iter().map(|&c| self.col_ids[c].clone()).collect(),
            cells,
        }
    }

    /// Dense matrix view for the statistical routines. The caller is expected
    /// to have pruned nulls through alignment first; any null that survives
    /// shows up as NaN in the matrix (and is caught by the degenerate-result
    /// check downstream) rather than silently becoming a number.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.row_ids.len(), self.col_ids.len(), |r, c| {
            self.get(r, c).unwrap_or(f64::NAN)
        })
    }

    /// Turn the frame back into one sparse record per row.
    pub fn to_records(&self) -> Vec<SparseRecord> {
        self.row_ids
            .iter()
            .enumerate()
            .map(|(r, id)| SparseRecord {
                id: id.clone(),
                columns: self
                    .col_ids
                    .iter()
                    .cloned()
                    .zip(self.row(r).iter().copied())
                    .collect(),
            })
            .collect()
    }
}

/// Builds a frame from a sequence of sparse records.
pub struct FrameBuilder;

impl FrameBuilder {
    /// Build a row-sorted frame from `records`.
    ///
    /// Column order is the order columns are first encountered. Records
    /// sharing an identifier are merged into one row: the later record's
    /// columns overwrite the earlier one's for overlapping column names
    /// (last-write-wins), giving the union-of-columns behavior sparse sources
    /// need. An empty record sequence yields a zero-row frame, not an error.
    pub fn build(records: impl IntoIterator<Item = SparseRecord>) -> Frame {
        let mut col_ids: Vec<String> = Vec::new();
        let mut col_index: HashMap<String, usize> = HashMap::new();
        let mut rows: HashMap<String, HashMap<usize, Option<f64>>> = HashMap::new();

        for record in records {
            let row = rows.entry(record.id).or_default();
            for (name, value) in record.columns {
                let next = col_ids.len();
                let col = *col_index.entry(name.clone()).or_insert_with(|| {
                    col_ids.push(name);
                    next
                });
                row.insert(col, value);
            }
        }

        let mut row_ids: Vec<String> = rows.keys().cloned().collect();
        row_ids.sort_unstable();

        let mut cells = Vec::with_capacity(row_ids.len() * col_ids.len());
        for id in &row_ids {
            let row = &rows[id];
            for col in 0..col_ids.len() {
                cells.push(row.get(&col).copied().flatten());
            }
        }

        Frame {
            row_ids,
            col_ids,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, columns: &[(&str, Option<f64>)]) -> SparseRecord {
        SparseRecord::new(
            id,
            columns
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        )
    }

    #[test]
    fn test_build_sorts_rows_and_unions_columns() {
        let frame = FrameBuilder::build(vec![
            record("s2", &[("g1", Some(3.0))]),
            record("s1", &[("g1", Some(1.0)), ("g2", Some(2.0))]),
        ]);
        assert_eq!(frame.row_ids(), &["s1".to_string(), "s2".to_string()]);
        assert_eq!(frame.col_ids(), &["g1".to_string(), "g2".to_string()]);
        // s2 never saw g2, so the cell is null
        assert_eq!(frame.get(1, 1), None);
        assert_eq!(frame.get(0, 1), Some(2.0));
    }

    #[test]
    fn test_build_duplicate_id_last_write_wins() {
        let frame = FrameBuilder::build(vec![
            record("s1", &[("g1", Some(1.0)), ("g2", Some(2.0))]),
            record("s1", &[("g2", Some(9.0)), ("g3", Some(3.0))]),
        ]);
        assert_eq!(frame.row_count(), 1);
        assert_eq!(frame.get(0, 0), Some(1.0));
        assert_eq!(frame.get(0, 1), Some(9.0));
        assert_eq!(frame.get(0, 2), Some(3.0));
    }

    #[test]
    fn test_build_empty_input_yields_zero_row_frame() {
        let frame = FrameBuilder::build(Vec::new());
        assert!(frame.is_empty());
        assert_eq!(frame.row_count(), 0);
        assert_eq!(frame.col_count(), 0);
    }

    #[test]
    fn test_round_trip_through_records() {
        let frame = FrameBuilder::build(vec![
            record("s3", &[("g1", Some(5.0)), ("g2", None)]),
            record("s1", &[("g1", Some(1.0)), ("g2", Some(2.0))]),
            record("s2", &[("g2", Some(4.0))]),
        ]);
        let rebuilt = FrameBuilder::build(frame.to_records());
        assert_eq!(rebuilt, frame);
    }

    #[test]
    fn test_retain_rows_ignores_unknown_ids() {
        let frame = FrameBuilder::build(vec![
            record("s1", &[("g1", Some(1.0))]),
            record("s2", &[("g1", Some(2.0))]),
        ]);
        let keep: BTreeSet<String> = ["s2".to_string(), "s9".to_string()].into();
        let subset = frame.retain_rows(&keep);
        assert_eq!(subset.row_ids(), &["s2".to_string()]);
    }

    #[test]
    fn test_drop_null_columns_checks_every_row() {
        let frame = FrameBuilder::build(vec![
            record("s1", &[("g1", Some(1.0)), ("g2", Some(2.0))]),
            record("s2", &[("g1", Some(3.0)), ("g2", None)]),
        ]);
        let pruned = frame.drop_null_columns();
        assert_eq!(pruned.col_ids(), &["g1".to_string()]);
        assert_eq!(pruned.row_count(), 2);
    }

    #[test]
    fn test_select_columns_keeps_given_order() {
        let frame = FrameBuilder::build(vec![record(
            "s1",
            &[("g1", Some(1.0)), ("g2", Some(2.0)), ("g3", Some(3.0))],
        )]);
        let selected = frame.select_columns(&["g3".to_string(), "g1".to_string()]);
        assert_eq!(selected.col_ids(), &["g3".to_string(), "g1".to_string()]);
        assert_eq!(selected.get(0, 0), Some(3.0));
    }

    #[test]
    fn test_to_matrix_preserves_layout() {
        let frame = FrameBuilder::build(vec![
            record("s1", &[("g1", Some(1.0)), ("g2", Some(2.0))]),
            record("s2", &[("g1", Some(3.0)), ("g2", Some(4.0))]),
        ]);
        let matrix = frame.to_matrix();
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix[(1, 0)], 3.0);
        assert_eq!(matrix[(0, 1)], 2.0);
    }
}
