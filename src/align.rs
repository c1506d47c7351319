// ==============================================================================
// align.rs - Dataset Alignment
// ==============================================================================
// Description: Reconciles molecular/clinical frames to a common NA-free view
// ==============================================================================

use std::collections::BTreeSet;

use tracing::debug;

use crate::frame::Frame;

/// Outcome of one alignment pass: the aligned frame(s) plus which rows were
/// dropped on the way. Emptiness is not fatal here; the run lifecycle checks
/// it once, centrally, after alignment completes.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    pub primary: Frame,
    pub secondary: Option<Frame>,
    pub clinical: Option<Frame>,
    /// Rows removed from the primary frame (NA pruning and clinical
    /// reconciliation), ascending.
    pub dropped_from_primary: Vec<String>,
    /// Rows removed from the clinical frame (NA pruning and reconciliation),
    /// ascending.
    pub dropped_from_clinical: Vec<String>,
    /// Set when primary and secondary share no feature columns at all.
    pub no_shared_columns: bool,
}

impl AlignmentResult {
    pub fn primary_is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn secondary_is_empty(&self) -> bool {
        self.secondary.as_ref().is_some_and(Frame::is_empty)
    }

    pub fn clinical_is_empty(&self) -> bool {
        self.clinical.as_ref().is_some_and(Frame::is_empty)
    }
}

/// Align one or two molecular frames and an optional clinical frame.
///
/// The steps run in a fixed order the statistical routines depend on:
/// restrict to requested samples, sort, prune null columns before null rows,
/// restrict clinical to the surviving molecular rows, then reconcile. When a
/// clinical frame is present, reconciliation is on rows and symmetric: the
/// symmetric difference between the two surviving row sets is removed from
/// both frames. When a secondary molecular frame is present, the two frames
/// describe different sample populations, so reconciliation is on columns
/// instead: both are restricted to the shared feature identifiers, ascending.
pub fn align(
    primary: Frame,
    secondary: Option<Frame>,
    clinical: Option<Frame>,
    requested_samples: Option<&BTreeSet<String>>,
) -> AlignmentResult {
    let mut dropped_from_primary: BTreeSet<String> = BTreeSet::new();
    let mut dropped_from_clinical: BTreeSet<String> = BTreeSet::new();

    // 1. Requested-sample restriction; ids absent from a frame are ignored.
    let mut primary = match requested_samples {
        Some(requested) => primary.retain_rows(requested),
        None => primary,
    };
    let mut secondary = secondary.map(|frame| match requested_samples {
        Some(requested) => frame.retain_rows(requested),
        None => frame,
    });

    // 2. Row order is an invariant of every later step.
    primary = primary.sorted_by_row_id();
    secondary = secondary.map(|frame| frame.sorted_by_row_id());
    let mut clinical = clinical.map(|frame| frame.sorted_by_row_id());

    // 3. Column-wise NA pruning across all rows, before any row pruning: a
    // column with a missing value anywhere is unusable for dense routines,
    // and dropping it preserves more rows than dropping its null rows would.
    primary = primary.drop_null_columns();
    secondary = secondary.map(|frame| frame.drop_null_columns());

    // 4. Row-wise NA pruning of whatever survived, per frame.
    for id in primary.null_row_ids() {
        dropped_from_primary.insert(id);
    }
    primary = primary.drop_rows(&dropped_from_primary);
    secondary = secondary.map(|frame| {
        let nulls: BTreeSet<String> = frame.null_row_ids().into_iter().collect();
        frame.drop_rows(&nulls)
    });

    // 5. Clinical restriction to the surviving molecular rows, then NA row
    // pruning over the requested feature columns.
    clinical = clinical.map(|frame| {
        let molecular_rows: BTreeSet<String> = primary.row_ids().iter().cloned().collect();
        let frame = frame.retain_rows(&molecular_rows);
        let nulls: BTreeSet<String> = frame.null_row_ids().into_iter().collect();
        for id in &nulls {
            dropped_from_clinical.insert(id.clone());
        }
        frame.drop_rows(&nulls)
    });

    // 6. Reconcile row sets symmetrically so molecular and clinical end up
    // with exactly the same identifiers.
    if let Some(clin) = clinical.take() {
        let primary_rows: BTreeSet<String> = primary.row_ids().iter().cloned().collect();
        let clinical_rows: BTreeSet<String> = clin.row_ids().iter().cloned().collect();
        let mismatched: BTreeSet<String> = primary_rows
            .symmetric_difference(&clinical_rows)
            .cloned()
            .collect();
        for id in &mismatched {
            if primary_rows.contains(id) {
                dropped_from_primary.insert(id.clone());
            } else {
                dropped_from_clinical.insert(id.clone());
            }
        }
        primary = primary.drop_rows(&mismatched);
        clinical = Some(clin.drop_rows(&mismatched));
    }

    // 6b. Two molecular frames are different populations measured over the
    // same features; intersect on columns, ascending, never on rows.
    let mut no_shared_columns = false;
    if let Some(second) = secondary.take() {
        let primary_cols: BTreeSet<String> = primary.col_ids().iter().cloned().collect();
        let shared: Vec<String> = second
            .col_ids()
            .iter()
            .filter(|id| primary_cols.contains(*id))
            .cloned()
            .collect();
        let mut shared_sorted = shared;
        shared_sorted.sort_unstable();
        no_shared_columns = shared_sorted.is_empty();
        primary = primary.select_columns(&shared_sorted);
        secondary = Some(second.select_columns(&shared_sorted));
    }

    debug!(
        primary_rows = primary.row_count(),
        primary_cols = primary.col_count(),
        dropped_primary = dropped_from_primary.len(),
        dropped_clinical = dropped_from_clinical.len(),
        "alignment complete"
    );

    AlignmentResult {
        primary,
        secondary,
        clinical,
        dropped_from_primary: dropped_from_primary.into_iter().collect(),
        dropped_from_clinical: dropped_from_clinical.into_iter().collect(),
        no_shared_columns,
    }
}
