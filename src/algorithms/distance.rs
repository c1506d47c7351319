// ==============================================================================
// distance.rs - Distance Variant
// ==============================================================================
// Description: Sample-to-sample correlation between two molecular collections
// ==============================================================================

use crate::models::DistanceRequest;
use crate::runner::{AlgorithmRunner, RunOutcome};
use crate::shape::{shape, ShapedRecord};
use crate::stats;
use crate::store::RecordStore;

use super::requested_sample_set;

/// Shaped distance output: one record per sample of the second collection,
/// carrying that sample's correlations against every sample of the first.
#[derive(Debug)]
pub struct DistancePayload {
    pub d: Vec<ShapedRecord>,
}

pub async fn run(store: &dyn RecordStore, request: &DistanceRequest) -> RunOutcome<DistancePayload> {
    let mut runner = AlgorithmRunner::new(store);

    let primary = match runner
        .fetch_molecular_frame(&request.molecular_collection, &request.genes)
        .await
    {
        Ok(frame) => frame,
        Err(err) => return runner.fail(err),
    };
    let secondary = match runner
        .fetch_molecular_frame(&request.molecular_collection2, &request.genes)
        .await
    {
        Ok(frame) => frame,
        Err(err) => return runner.fail(err),
    };

    let requested = requested_sample_set(request.samples.as_ref());
    let aligned = runner.align(primary, Some(secondary), None, requested.as_ref());
    if let Err(err) = runner.validate(&aligned, true, false) {
        return runner.fail(err);
    }

    let secondary_frame = match aligned.secondary.as_ref() {
        Some(frame) => frame,
        None => unreachable!("secondary frame was provided to alignment"),
    };
    let a = aligned.primary.to_matrix();
    let b = secondary_frame.to_matrix();
    let d = match runner.execute(|| stats::correlation::row_correlation(&a, &b)) {
        Ok(matrix) => matrix,
        Err(err) => return runner.fail(err),
    };
    if let Err(err) = runner.check_degenerate(&d, "results are NaN; no overlapping marker IDs?") {
        return runner.fail(err);
    }

    // each output row carries the first collection's sample ids as labels
    // for its correlation values
    let meta = aligned.primary.row_ids().to_vec();
    let records = shape(&d, secondary_frame, true, Some(&meta));
    runner.succeed(DistancePayload { d: records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::frame::SparseRecord;
    use crate::store::fake::FakeStore;

    fn molecular(rows: &[(&str, &[(&str, f64)])]) -> Vec<SparseRecord> {
        rows.iter()
            .map(|(id, columns)| {
                SparseRecord::new(
                    *id,
                    columns
                        .iter()
                        .map(|(name, value)| (name.to_string(), Some(*value)))
                        .collect(),
                )
            })
            .collect()
    }

    fn request() -> DistanceRequest {
        serde_json::from_value(serde_json::json!({
            "genes": [],
            "n_components": 2,
            "molecular_collection": "brain_mrna",
            "molecular_collection2": "breast_mrna"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_d_is_second_population_by_first_with_meta_labels() {
        let mut store = FakeStore::default();
        store.molecular.insert(
            "brain_mrna".to_string(),
            molecular(&[
                ("a1", &[("g1", 1.0), ("g2", 2.0), ("g3", 3.0)]),
                ("a2", &[("g1", 3.0), ("g2", 2.0), ("g3", 1.0)]),
            ]),
        );
        store.molecular.insert(
            "breast_mrna".to_string(),
            molecular(&[("b1", &[("g1", 2.0), ("g2", 4.0), ("g3", 6.0)])]),
        );
        let outcome = run(&store, &request()).await;
        let RunOutcome::Success { payload, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(payload.d.len(), 1);
        assert_eq!(payload.d[0].id, "b1");
        assert_eq!(payload.d[0].value.len(), 2);
        // b1 rises with a1 and falls with a2
        assert!((payload.d[0].value[0] - 1.0).abs() < 1e-9);
        assert!((payload.d[0].value[1] + 1.0).abs() < 1e-9);
        assert_eq!(
            payload.d[0].meta.as_deref(),
            Some(["a1".to_string(), "a2".to_string()].as_slice())
        );
    }

    #[tokio::test]
    async fn test_no_shared_genes_reports_before_invocation() {
        let mut store = FakeStore::default();
        store.molecular.insert(
            "brain_mrna".to_string(),
            molecular(&[("a1", &[("g1", 1.0)])]),
        );
        store.molecular.insert(
            "breast_mrna".to_string(),
            molecular(&[("b1", &[("g9", 1.0)])]),
        );
        let outcome = run(&store, &request()).await;
        let error = outcome.failure().expect("expected failure");
        assert_eq!(error.kind(), ErrorKind::NoDataError);
        assert_eq!(error.reason(), "No overlapping genes for comparison");
    }

    #[tokio::test]
    async fn test_all_nan_result_is_degenerate_not_ok() {
        // constant rows: correlation is undefined everywhere, the routine
        // itself raises no error
        let mut store = FakeStore::default();
        store.molecular.insert(
            "brain_mrna".to_string(),
            molecular(&[("a1", &[("g1", 2.0), ("g2", 2.0)])]),
        );
        store.molecular.insert(
            "breast_mrna".to_string(),
            molecular(&[("b1", &[("g1", 5.0), ("g2", 5.0)])]),
        );
        let outcome = run(&store, &request()).await;
        let error = outcome.failure().expect("expected failure");
        assert_eq!(error.kind(), ErrorKind::DegenerateResultError);
        assert_eq!(error.reason(), "results are NaN; no overlapping marker IDs?");
    }
}
