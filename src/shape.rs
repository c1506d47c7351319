// ==============================================================================
// shape.rs - Result Shaping
// ==============================================================================
// Description: Maps raw numeric output back to identifier-labeled records
// ==============================================================================

use nalgebra::DMatrix;
use serde::Serialize;

use crate::frame::Frame;

/// One labeled output record: an identifier plus that row's values, with the
/// optional auxiliary label sequence attached when the caller supplies one
/// (distance results carry the counterpart frame's sample ids this way).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapedRecord {
    pub id: String,
    pub value: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Vec<String>>,
}

/// Label each matrix row with an identifier from `labels`.
///
/// With `row_wise` the identifiers come from the frame's row ids, in their
/// current (sorted) order; otherwise from its column ids. Output preserves the
/// matrix's row order. The matrix row count must equal the chosen axis length:
/// a mismatch means an alignment bug upstream, and mislabeling data silently
/// would be far worse than failing, so this asserts.
pub fn shape(
    matrix: &DMatrix<f64>,
    labels: &Frame,
    row_wise: bool,
    meta: Option<&[String]>,
) -> Vec<ShapedRecord> {
    let ids = if row_wise {
        labels.row_ids()
    } else {
        labels.col_ids()
    };
    assert_eq!(
        matrix.nrows(),
        ids.len(),
        "result rows do not match label axis length"
    );

    let meta: Option<Vec<String>> = meta.map(<[String]>::to_vec);
    ids.iter()
        .enumerate()
        .map(|(r, id)| ShapedRecord {
            id: id.clone(),
            value: matrix.row(r).iter().copied().collect(),
            meta: meta.clone(),
        })
        .collect()
}
