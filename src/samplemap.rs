// ==============================================================================
// samplemap.rs - Sample/Patient Identifier Mapping
// ==============================================================================
// Description: Per-request bijection between sample and patient naming spaces
// ==============================================================================

use std::collections::HashMap;

/// Bijection between the sample and patient identifier spaces for one dataset.
///
/// Built once per request from the dataset's single samplemap document, which
/// maps sample-id to patient-id; the inverse direction is built and cached at
/// the same time. Lookup misses are the caller's signal to skip and warn,
/// never to substitute or fail.
#[derive(Debug, Clone, Default)]
pub struct SampleIdMap {
    sample_to_patient: HashMap<String, String>,
    patient_to_sample: HashMap<String, String>,
}

impl SampleIdMap {
    /// Build from the samplemap lookup document (sample-id → patient-id).
    pub fn build(lookup: &HashMap<String, String>) -> Self {
        let sample_to_patient: HashMap<String, String> = lookup
            .iter()
            .map(|(sample, patient)| (sample.clone(), patient.clone()))
            .collect();
        let patient_to_sample = sample_to_patient
            .iter()
            .map(|(sample, patient)| (patient.clone(), sample.clone()))
            .collect();
        SampleIdMap {
            sample_to_patient,
            patient_to_sample,
        }
    }

    pub fn to_patient_id(&self, sample_id: &str) -> Option<&str> {
        self.sample_to_patient.get(sample_id).map(String::as_str)
    }

    pub fn to_sample_id(&self, patient_id: &str) -> Option<&str> {
        self.patient_to_sample.get(patient_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sample_to_patient.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_to_patient.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> HashMap<String, String> {
        [
            ("TCGA-01-0001-01".to_string(), "TCGA-01-0001".to_string()),
            ("TCGA-01-0002-01".to_string(), "TCGA-01-0002".to_string()),
        ]
        .into()
    }

    #[test]
    fn test_maps_both_directions() {
        let map = SampleIdMap::build(&lookup());
        assert_eq!(map.to_patient_id("TCGA-01-0001-01"), Some("TCGA-01-0001"));
        assert_eq!(map.to_sample_id("TCGA-01-0002"), Some("TCGA-01-0002-01"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_miss_is_absent_not_fatal() {
        let map = SampleIdMap::build(&lookup());
        assert_eq!(map.to_patient_id("s3"), None);
        assert_eq!(map.to_sample_id("nobody"), None);
    }
}
