// ==============================================================================
// store.rs - Record Store Access
// ==============================================================================
// Description: Document-store client behind the RecordStore trait
// ==============================================================================
// Molecular collections hold one document per gene, either dictionary-shaped
// ({id, data: {sample: value}}) or array-packed ({id, d: [...], m: [...]}).
// Clinical collections hold one document per patient. The adapter normalizes
// both into "row id -> {column: value}" sparse records, so the frame builder
// never sees the on-disk orientation.
// ==============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Database};
use thiserror::Error;
use tracing::debug;

use crate::frame::SparseRecord;

/// Errors surfaced by the record store.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("store query failed: {0}")]
    Query(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// One clinical document: a patient identifier plus the requested features
/// that were actually present on the document.
#[derive(Debug, Clone, Default)]
pub struct ClinicalRecord {
    pub patient_id: String,
    pub columns: HashMap<String, Option<f64>>,
}

/// Read access to the document store, as the pipeline consumes it.
///
/// Injected into the run lifecycle so tests can substitute a fake store; the
/// production implementation is `MongoRecordStore`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a molecular collection, optionally restricted to `genes`
    /// (empty = all), as sample-keyed sparse records.
    async fn fetch_molecular(
        &self,
        collection: &str,
        genes: &[String],
    ) -> Result<Vec<SparseRecord>, StoreError>;

    /// Fetch a clinical collection projected to `features`, optionally
    /// restricted to `patients`.
    async fn fetch_clinical(
        &self,
        collection: &str,
        patients: Option<&[String]>,
        features: &[String],
    ) -> Result<Vec<ClinicalRecord>, StoreError>;

    /// Fetch the dataset's samplemap document (sample-id → patient-id).
    async fn fetch_sample_map(&self, dataset: &str)
        -> Result<HashMap<String, String>, StoreError>;
}

/// MongoDB-backed record store. The client is pooled and created once at
/// process start; requests share it and never re-establish connections.
pub struct MongoRecordStore {
    db: Database,
}

impl MongoRecordStore {
    pub async fn connect(mongo_url: &str, db_name: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(mongo_url).await?;
        Ok(MongoRecordStore {
            db: client.database(db_name),
        })
    }

    pub fn new(db: Database) -> Self {
        MongoRecordStore { db }
    }

    async fn ensure_collection(&self, name: &str) -> Result<(), StoreError> {
        let names = self.db.list_collection_names().await?;
        if names.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(StoreError::UnknownCollection(name.to_string()))
        }
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn fetch_molecular(
        &self,
        collection: &str,
        genes: &[String],
    ) -> Result<Vec<SparseRecord>, StoreError> {
        self.ensure_collection(collection).await?;
        let filter = if genes.is_empty() {
            doc! {}
        } else {
            doc! { "id": { "$in": genes } }
        };
        let mut cursor = self.db.collection::<Document>(collection).find(filter).await?;
        let mut documents = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            documents.push(document);
        }
        debug!(collection, documents = documents.len(), "molecular fetch");
        Ok(molecular_records_from_documents(&documents))
    }

    async fn fetch_clinical(
        &self,
        collection: &str,
        patients: Option<&[String]>,
        features: &[String],
    ) -> Result<Vec<ClinicalRecord>, StoreError> {
        self.ensure_collection(collection).await?;
        let filter = match patients {
            Some(ids) => doc! { "patient_ID": { "$in": ids } },
            None => doc! {},
        };
        let mut projection = doc! { "patient_ID": 1 };
        for feature in features {
            projection.insert(feature.as_str(), 1);
        }
        let mut cursor = self
            .db
            .collection::<Document>(collection)
            .find(filter)
            .projection(projection)
            .await?;
        let mut documents = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            documents.push(document);
        }
        debug!(collection, documents = documents.len(), "clinical fetch");
        Ok(clinical_records_from_documents(&documents, features))
    }

    async fn fetch_sample_map(
        &self,
        dataset: &str,
    ) -> Result<HashMap<String, String>, StoreError> {
        let collection = format!("{dataset}_samplemap");
        let document = self
            .db
            .collection::<Document>(&collection)
            .find_one(doc! {})
            .await?
            .ok_or_else(|| StoreError::UnknownCollection(collection.clone()))?;
        Ok(sample_map_from_document(&document))
    }
}

/// Transpose gene-major molecular documents into sample-keyed records.
/// Sample order is first-encountered; gene (column) order is document order.
pub fn molecular_records_from_documents(documents: &[Document]) -> Vec<SparseRecord> {
    let mut sample_order: Vec<String> = Vec::new();
    let mut by_sample: HashMap<String, Vec<(String, Option<f64>)>> = HashMap::new();

    for document in documents {
        let Ok(gene) = document.get_str("id") else {
            debug!("skipping molecular document without id field");
            continue;
        };
        for (sample, value) in molecular_cells(document) {
            if !by_sample.contains_key(&sample) {
                sample_order.push(sample.clone());
            }
            by_sample
                .entry(sample)
                .or_default()
                .push((gene.to_string(), value));
        }
    }

    sample_order
        .into_iter()
        .map(|sample| {
            let columns = by_sample.remove(&sample).unwrap_or_default();
            SparseRecord::new(sample, columns)
        })
        .collect()
}

/// Per-sample cells of one gene document, in either document shape.
fn molecular_cells(document: &Document) -> Vec<(String, Option<f64>)> {
    if let Ok(data) = document.get_document("data") {
        return data
            .iter()
            .map(|(sample, value)| (sample.clone(), bson_to_cell(value)))
            .collect();
    }
    if let (Ok(values), Ok(names)) = (document.get_array("d"), document.get_array("m")) {
        return names
            .iter()
            .zip(values.iter())
            .filter_map(|(name, value)| match name {
                Bson::String(sample) => Some((sample.clone(), bson_to_cell(value))),
                _ => None,
            })
            .collect();
    }
    Vec::new()
}

/// Keep only the requested features that are actually on each document.
pub fn clinical_records_from_documents(
    documents: &[Document],
    features: &[String],
) -> Vec<ClinicalRecord> {
    documents
        .iter()
        .filter_map(|document| {
            let Ok(patient_id) = document.get_str("patient_ID") else {
                debug!("skipping clinical document without patient_ID field");
                return None;
            };
            let columns = features
                .iter()
                .filter_map(|feature| {
                    document
                        .get(feature)
                        .map(|value| (feature.clone(), bson_to_cell(value)))
                })
                .collect();
            Some(ClinicalRecord {
                patient_id: patient_id.to_string(),
                columns,
            })
        })
        .collect()
}

/// All string-valued fields of the samplemap document except its object id.
pub fn sample_map_from_document(document: &Document) -> HashMap<String, String> {
    document
        .iter()
        .filter(|(key, _)| key.as_str() != "_id")
        .filter_map(|(key, value)| match value {
            Bson::String(patient) => Some((key.clone(), patient.clone())),
            _ => None,
        })
        .collect()
}

/// Numeric view of one BSON cell. Non-numeric values and non-finite numbers
/// (including the literal "NaN"/"NaT" strings some loaders leave behind)
/// become nulls, to be pruned by alignment.
fn bson_to_cell(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) if v.is_finite() => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_molecular_dictionary_shape_transposed() {
        let documents = vec![
            doc! { "id": "g1", "data": { "s1": 1.0, "s2": 3.0 } },
            doc! { "id": "g2", "data": { "s1": 2.0 } },
        ];
        let records = molecular_records_from_documents(&documents);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "s1");
        assert_eq!(
            records[0].columns,
            vec![("g1".to_string(), Some(1.0)), ("g2".to_string(), Some(2.0))]
        );
        // s2 only appears in the g1 document
        assert_eq!(records[1].columns, vec![("g1".to_string(), Some(3.0))]);
    }

    #[test]
    fn test_molecular_array_shape_transposed() {
        let documents = vec![doc! { "id": "g1", "d": [1.5, 2.5], "m": ["s1", "s2"] }];
        let records = molecular_records_from_documents(&documents);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "s2");
        assert_eq!(records[1].columns, vec![("g1".to_string(), Some(2.5))]);
    }

    #[test]
    fn test_non_numeric_cells_become_null() {
        let documents = vec![doc! { "id": "g1", "data": { "s1": "NaN", "s2": "2.5", "s3": Bson::Null } }];
        let records = molecular_records_from_documents(&documents);
        assert_eq!(records[0].columns[0].1, None);
        assert_eq!(records[1].columns[0].1, Some(2.5));
        assert_eq!(records[2].columns[0].1, None);
    }

    #[test]
    fn test_clinical_records_keep_only_present_features() {
        let documents = vec![doc! { "patient_ID": "p1", "age_at_diagnosis": 61, "days_to_death": Bson::Null }];
        let features = vec!["age_at_diagnosis".to_string(), "days_to_death".to_string(), "grade".to_string()];
        let records = clinical_records_from_documents(&documents, &features);
        assert_eq!(records[0].patient_id, "p1");
        assert_eq!(records[0].columns.get("age_at_diagnosis"), Some(&Some(61.0)));
        assert_eq!(records[0].columns.get("days_to_death"), Some(&None));
        // grade was not on the document at all
        assert!(!records[0].columns.contains_key("grade"));
    }

    #[test]
    fn test_sample_map_skips_object_id() {
        let document = doc! { "_id": mongodb::bson::oid::ObjectId::new(), "s1": "p1", "s2": "p2" };
        let map = sample_map_from_document(&document);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("s1"), Some(&"p1".to_string()));
    }
}
