// ==============================================================================
// runner.rs - Algorithm Run Lifecycle
// ==============================================================================
// Description: Fetch, align, validate, execute, and shape one algorithm run
// ==============================================================================

use std::collections::BTreeSet;
use std::time::Instant;

use nalgebra::DMatrix;
use tracing::{debug, info, warn};

use crate::align::{self, AlignmentResult};
use crate::errors::AnalysisError;
use crate::frame::{Frame, FrameBuilder, SparseRecord};
use crate::samplemap::SampleIdMap;
use crate::stats::StatsError;
use crate::store::RecordStore;
use crate::warnings::WarningScope;

/// Lifecycle states of one run. Failure from any state is terminal for the
/// request; there are no retries anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Fetched,
    Aligned,
    Validated,
    Executed,
    Shaped,
    Failed,
    Done,
}

/// The only thing returned across the runner boundary: either a shaped
/// payload with its accumulated warnings, or one classified failure with a
/// human-readable reason. No partially-populated state leaks out.
#[derive(Debug)]
pub enum RunOutcome<T> {
    Success { payload: T, warnings: Vec<String> },
    Failure { error: AnalysisError },
}

impl<T> RunOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    pub fn failure(&self) -> Option<&AnalysisError> {
        match self {
            RunOutcome::Failure { error } => Some(error),
            RunOutcome::Success { .. } => None,
        }
    }
}

/// Generic lifecycle controller shared by every algorithm variant.
///
/// The variant modules drive it stage by stage; the runner owns state
/// transitions, warning accumulation, and error classification, so no
/// variant can skip the empty-frame check or leave a warning scope behind.
pub struct AlgorithmRunner<'a> {
    store: &'a dyn RecordStore,
    state: RunState,
    warnings: Vec<String>,
}

impl<'a> AlgorithmRunner<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        AlgorithmRunner {
            store,
            state: RunState::Init,
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Record a non-fatal diagnostic for the response's warning list.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    fn advance(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state transition");
        self.state = next;
    }

    /// Fetch a molecular collection and build its frame.
    pub async fn fetch_molecular_frame(
        &mut self,
        collection: &str,
        genes: &[String],
    ) -> Result<Frame, AnalysisError> {
        let started = Instant::now();
        let records = self
            .store
            .fetch_molecular(collection, genes)
            .await
            .map_err(|err| AnalysisError::DataFetch(err.to_string()))?;
        debug!(
            collection,
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "molecular frame fetched"
        );
        self.advance(RunState::Fetched);
        Ok(FrameBuilder::build(records))
    }

    /// Fetch the dataset's sample/patient identifier map.
    pub async fn fetch_sample_map(&mut self, dataset: &str) -> Result<SampleIdMap, AnalysisError> {
        let lookup = self
            .store
            .fetch_sample_map(dataset)
            .await
            .map_err(|err| AnalysisError::DataFetch(err.to_string()))?;
        Ok(SampleIdMap::build(&lookup))
    }

    /// Fetch a clinical collection, translating between sample and patient
    /// naming spaces through `map`.
    ///
    /// Requested sample ids missing from the map are dropped with a warning,
    /// as are fetched records whose patient id has no sample mapping; a
    /// requested feature absent from a record is warned about once and left
    /// as a null cell for alignment to prune.
    pub async fn fetch_clinical_frame(
        &mut self,
        collection: &str,
        map: &SampleIdMap,
        features: &[String],
        samples: Option<&[String]>,
    ) -> Result<Frame, AnalysisError> {
        let patients: Option<Vec<String>> = match samples {
            Some(ids) => {
                let mut wanted = Vec::with_capacity(ids.len());
                for sample in ids {
                    match map.to_patient_id(sample) {
                        Some(patient) => wanted.push(patient.to_string()),
                        None => self.warn(format!(
                            "{sample} does not occur in mapping table, dropping sample"
                        )),
                    }
                }
                Some(wanted)
            }
            None => None,
        };

        let records = self
            .store
            .fetch_clinical(collection, patients.as_deref(), features)
            .await
            .map_err(|err| AnalysisError::DataFetch(err.to_string()))?;

        let mut missing_features: BTreeSet<String> = BTreeSet::new();
        let mut sparse = Vec::with_capacity(records.len());
        for record in records {
            let Some(sample_id) = map.to_sample_id(&record.patient_id) else {
                self.warn(format!(
                    "{} does not occur in mapping table, dropping sample",
                    record.patient_id
                ));
                continue;
            };
            let columns = features
                .iter()
                .map(|feature| match record.columns.get(feature) {
                    Some(value) => (feature.clone(), *value),
                    None => {
                        missing_features.insert(feature.clone());
                        (feature.clone(), None)
                    }
                })
                .collect();
            sparse.push(SparseRecord::new(sample_id, columns));
        }
        for feature in missing_features {
            self.warn(format!("feature {feature} not present in record, skipping"));
        }

        self.advance(RunState::Fetched);
        Ok(FrameBuilder::build(sparse))
    }

    /// Run dataset alignment and surface the dropped rows as warnings.
    pub fn align(
        &mut self,
        primary: Frame,
        secondary: Option<Frame>,
        clinical: Option<Frame>,
        requested_samples: Option<&BTreeSet<String>>,
    ) -> AlignmentResult {
        let result = align::align(primary, secondary, clinical, requested_samples);
        if !result.dropped_from_primary.is_empty() {
            self.warn(format!(
                "dropped rows without complete data from molecular input: {}",
                result.dropped_from_primary.join(", ")
            ));
        }
        if !result.dropped_from_clinical.is_empty() {
            self.warn(format!(
                "dropped rows without complete data from clinical input: {}",
                result.dropped_from_clinical.join(", ")
            ));
        }
        self.advance(RunState::Aligned);
        result
    }

    /// Check every frame the variant requires for emptiness. A routine must
    /// never be invoked on an empty matrix, so an empty required frame fails
    /// the run here.
    pub fn validate(
        &mut self,
        aligned: &AlignmentResult,
        needs_secondary: bool,
        needs_clinical: bool,
    ) -> Result<(), AnalysisError> {
        if needs_secondary && aligned.no_shared_columns {
            return Err(AnalysisError::NoData(
                "No overlapping genes for comparison".to_string(),
            ));
        }
        if aligned.primary_is_empty() {
            return Err(AnalysisError::NoData(
                "No non-NA rows in molecular input".to_string(),
            ));
        }
        if needs_secondary && aligned.secondary_is_empty() {
            return Err(AnalysisError::NoData(
                "No non-NA rows in molecular input2".to_string(),
            ));
        }
        if needs_clinical && aligned.clinical_is_empty() {
            return Err(AnalysisError::NoData(
                "No non-NA rows in clinical input".to_string(),
            ));
        }
        self.advance(RunState::Validated);
        Ok(())
    }

    /// Invoke the statistical routine with a warning scope installed for
    /// exactly this call. The scope is torn down on every exit path before
    /// the result is inspected.
    pub fn execute<T>(
        &mut self,
        routine: impl FnOnce() -> Result<T, StatsError>,
    ) -> Result<T, AnalysisError> {
        let started = Instant::now();
        let scope = WarningScope::enter();
        let result = routine();
        let collected = scope.finish();
        self.warnings.extend(collected);
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "statistical routine finished"
        );
        match result {
            Ok(value) => {
                self.advance(RunState::Executed);
                Ok(value)
            }
            Err(err) => Err(AnalysisError::Compute(err.to_string())),
        }
    }

    /// A routine can "succeed" and still hand back an entirely-NaN matrix;
    /// its own error mechanism never reports that, so it is caught here.
    pub fn check_degenerate(
        &mut self,
        output: &DMatrix<f64>,
        reason: &str,
    ) -> Result<(), AnalysisError> {
        if !output.is_empty() && output.iter().all(|value| value.is_nan()) {
            return Err(AnalysisError::DegenerateResult(reason.to_string()));
        }
        Ok(())
    }

    pub fn succeed<T>(mut self, payload: T) -> RunOutcome<T> {
        self.advance(RunState::Shaped);
        self.advance(RunState::Done);
        RunOutcome::Success {
            payload,
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    pub fn fail<T>(mut self, error: AnalysisError) -> RunOutcome<T> {
        self.advance(RunState::Failed);
        info!(kind = ?error.kind(), reason = %error, "analysis run failed");
        RunOutcome::Failure { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::FakeStore;
    use crate::store::ClinicalRecord;
    use std::collections::HashMap;

    fn store_with_map() -> FakeStore {
        let mut store = FakeStore::default();
        store.sample_maps.insert(
            "brain".to_string(),
            [("s1".to_string(), "p1".to_string())].into(),
        );
        store.clinical.insert(
            "brain_clinical".to_string(),
            vec![ClinicalRecord {
                patient_id: "p1".to_string(),
                columns: [("age".to_string(), Some(61.0))].into(),
            }],
        );
        store
    }

    #[tokio::test]
    async fn test_unmapped_requested_sample_warns_and_drops() {
        let store = store_with_map();
        let mut runner = AlgorithmRunner::new(&store);
        let map = runner.fetch_sample_map("brain").await.unwrap();
        let samples = vec!["s3".to_string()];
        let frame = runner
            .fetch_clinical_frame(
                "brain_clinical",
                &map,
                &["age".to_string()],
                Some(&samples),
            )
            .await
            .unwrap();
        assert!(frame.is_empty());
        assert_eq!(
            runner.warnings(),
            &["s3 does not occur in mapping table, dropping sample".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_feature_warns_once_and_leaves_null() {
        let store = store_with_map();
        let mut runner = AlgorithmRunner::new(&store);
        let map = runner.fetch_sample_map("brain").await.unwrap();
        let features = vec!["age".to_string(), "grade".to_string()];
        let frame = runner
            .fetch_clinical_frame("brain_clinical", &map, &features, None)
            .await
            .unwrap();
        assert_eq!(frame.row_ids(), &["s1".to_string()]);
        assert_eq!(frame.get(0, 1), None);
        assert_eq!(
            runner.warnings(),
            &["feature grade not present in record, skipping".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_collection_is_a_fetch_error() {
        let store = FakeStore::default();
        let mut runner = AlgorithmRunner::new(&store);
        let err = runner
            .fetch_molecular_frame("nope", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DataFetch(_)));
    }

    #[test]
    fn test_execute_collects_scoped_warnings_on_error_too() {
        let store = FakeStore::default();
        let mut runner = AlgorithmRunner::new(&store);
        let result: Result<(), AnalysisError> = runner.execute(|| {
            crate::warnings::emit("partial progress");
            Err(StatsError::EmptyInput)
        });
        assert!(matches!(result, Err(AnalysisError::Compute(_))));
        assert_eq!(runner.warnings(), &["partial progress".to_string()]);
    }

    #[test]
    fn test_degenerate_check_triggers_on_all_nan_only() {
        let store = FakeStore::default();
        let mut runner = AlgorithmRunner::new(&store);
        let all_nan = DMatrix::from_element(2, 2, f64::NAN);
        assert!(runner
            .check_degenerate(&all_nan, "results are NaN; too few rows in input?")
            .is_err());
        let mut partial = all_nan.clone();
        partial[(0, 0)] = 1.0;
        assert!(runner.check_degenerate(&partial, "x").is_ok());
    }
}
