// ==============================================================================
// plsr.rs - PLSR Variant
// ==============================================================================
// Description: PLS regression of clinical features on a molecular collection
// ==============================================================================

use crate::models::PlsrRequest;
use crate::runner::{AlgorithmRunner, RunOutcome};
use crate::shape::{shape, ShapedRecord};
use crate::stats;
use crate::store::RecordStore;

use super::requested_sample_set;

/// Shaped PLSR output. Scores are per sample, loadings per gene or clinical
/// feature; `coefficients` carries the regression coefficients per gene.
#[derive(Debug)]
pub struct PlsrPayload {
    pub x_scores: Vec<ShapedRecord>,
    pub y_scores: Vec<ShapedRecord>,
    pub x_loadings: Vec<ShapedRecord>,
    pub y_loadings: Vec<ShapedRecord>,
    pub coefficients: Vec<ShapedRecord>,
}

pub async fn run(store: &dyn RecordStore, request: &PlsrRequest) -> RunOutcome<PlsrPayload> {
    let mut runner = AlgorithmRunner::new(store);

    let map = match runner.fetch_sample_map(&request.disease).await {
        Ok(map) => map,
        Err(err) => return runner.fail(err),
    };
    let primary = match runner
        .fetch_molecular_frame(&request.molecular_collection, &request.genes)
        .await
    {
        Ok(frame) => frame,
        Err(err) => return runner.fail(err),
    };
    let clinical = match runner
        .fetch_clinical_frame(
            &request.clinical_collection,
            &map,
            &request.features,
            request.samples.as_deref(),
        )
        .await
    {
        Ok(frame) => frame,
        Err(err) => return runner.fail(err),
    };

    let requested = requested_sample_set(request.samples.as_ref());
    let aligned = runner.align(primary, None, Some(clinical), requested.as_ref());
    if let Err(err) = runner.validate(&aligned, false, true) {
        return runner.fail(err);
    }

    let clinical_frame = match aligned.clinical.as_ref() {
        Some(frame) => frame,
        None => unreachable!("clinical frame was provided to alignment"),
    };
    let x = aligned.primary.to_matrix();
    let y = clinical_frame.to_matrix();
    let n_components = request.n_components;
    let fit = match runner.execute(|| stats::pls::fit(&x, &y, n_components)) {
        Ok(fit) => fit,
        Err(err) => return runner.fail(err),
    };
    if let Err(err) =
        runner.check_degenerate(&fit.x_scores, "results are NaN; too few rows in input?")
    {
        return runner.fail(err);
    }

    let x_scores = shape(&fit.x_scores, &aligned.primary, true, None);
    let y_scores = shape(&fit.y_scores, clinical_frame, true, None);
    let x_loadings = shape(&fit.x_loadings, &aligned.primary, false, None);
    let y_loadings = shape(&fit.y_loadings, clinical_frame, false, None);
    let coefficients = shape(&fit.coefficients, &aligned.primary, false, None);
    runner.succeed(PlsrPayload {
        x_scores,
        y_scores,
        x_loadings,
        y_loadings,
        coefficients,
    })
}
