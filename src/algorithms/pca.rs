// ==============================================================================
// pca.rs - PCA Variant
// ==============================================================================
// Description: Principal-component analysis over one molecular collection
// ==============================================================================

use crate::models::PcaRequest;
use crate::runner::{AlgorithmRunner, RunOutcome};
use crate::shape::{shape, ShapedRecord};
use crate::stats;
use crate::store::RecordStore;

use super::requested_sample_set;

/// Shaped PCA output: sample scores, per-gene loadings, and the explained
/// variance ratio per component.
#[derive(Debug)]
pub struct PcaPayload {
    pub scores: Vec<ShapedRecord>,
    pub loadings: Vec<ShapedRecord>,
    pub variance: Vec<f64>,
}

pub async fn run(store: &dyn RecordStore, request: &PcaRequest) -> RunOutcome<PcaPayload> {
    let mut runner = AlgorithmRunner::new(store);

    let primary = match runner
        .fetch_molecular_frame(&request.molecular_collection, &request.genes)
        .await
    {
        Ok(frame) => frame,
        Err(err) => return runner.fail(err),
    };

    let requested = requested_sample_set(request.samples.as_ref());
    let aligned = runner.align(primary, None, None, requested.as_ref());
    if let Err(err) = runner.validate(&aligned, false, false) {
        return runner.fail(err);
    }

    let matrix = aligned.primary.to_matrix();
    let n_components = request.n_components;
    let fit = match runner.execute(|| stats::pca::fit(&matrix, n_components)) {
        Ok(fit) => fit,
        Err(err) => return runner.fail(err),
    };
    if let Err(err) =
        runner.check_degenerate(&fit.scores, "results are NaN; too few rows in input?")
    {
        return runner.fail(err);
    }

    let scores = shape(&fit.scores, &aligned.primary, true, None);
    let loadings = shape(&fit.components.transpose(), &aligned.primary, false, None);
    runner.succeed(PcaPayload {
        scores,
        loadings,
        variance: fit.explained_variance_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::frame::SparseRecord;
    use crate::store::fake::FakeStore;

    fn store() -> FakeStore {
        let mut store = FakeStore::default();
        store.molecular.insert(
            "brain_mrna".to_string(),
            vec![
                SparseRecord::new(
                    "s1",
                    vec![("g1".to_string(), Some(1.0)), ("g2".to_string(), Some(2.0))],
                ),
                SparseRecord::new(
                    "s2",
                    vec![("g1".to_string(), Some(2.0)), ("g2".to_string(), Some(4.0))],
                ),
                SparseRecord::new(
                    "s3",
                    vec![("g1".to_string(), Some(3.0)), ("g2".to_string(), Some(6.0))],
                ),
            ],
        );
        store
    }

    fn request(n_components: usize) -> PcaRequest {
        serde_json::from_value(serde_json::json!({
            "disease": "brain",
            "genes": [],
            "n_components": n_components,
            "molecular_collection": "brain_mrna"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_scores_labeled_by_sample_loadings_by_gene() {
        let store = store();
        let outcome = run(&store, &request(2)).await;
        let RunOutcome::Success { payload, warnings } = outcome else {
            panic!("expected success");
        };
        assert!(warnings.is_empty());
        let ids: Vec<&str> = payload.scores.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
        let gene_ids: Vec<&str> = payload.loadings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(gene_ids, vec!["g1", "g2"]);
        assert_eq!(payload.variance.len(), 2);
        assert!((payload.variance[0] - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_collection_fails_with_fetch_error() {
        let store = FakeStore::default();
        let outcome = run(&store, &request(2)).await;
        let error = outcome.failure().expect("expected failure");
        assert_eq!(error.kind(), ErrorKind::DataFetchError);
    }

    #[tokio::test]
    async fn test_too_many_components_is_a_compute_error() {
        let store = store();
        let outcome = run(&store, &request(5)).await;
        let error = outcome.failure().expect("expected failure");
        assert_eq!(error.kind(), ErrorKind::ComputeError);
    }

    #[tokio::test]
    async fn test_requested_samples_restrict_rows() {
        let store = store();
        let mut req = request(1);
        req.samples = Some(vec!["s1".to_string(), "s3".to_string()]);
        let outcome = run(&store, &req).await;
        let RunOutcome::Success { payload, .. } = outcome else {
            panic!("expected success");
        };
        let ids: Vec<&str> = payload.scores.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s3"]);
    }
}
