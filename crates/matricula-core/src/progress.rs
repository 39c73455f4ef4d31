//! Review progress: per-document, per-record, per-field confirmation flags.
//!
//! Persisted shape (shared by every backend):
//!
//! ```json
//! {
//!   "a.json": {
//!     "0": { "tipo": true, "valor": false, "doc_alienante_0": true },
//!     "2": { "tipo": false },
//!     "finalizado": true
//!   }
//! }
//! ```
//!
//! Record indices are stringified in JSON. `finalizado` sits beside the record
//! entries and is only written once a document has been finalized.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::{FieldKey, Record};

const FINALIZED_KEY: &str = "finalizado";

/// Flags for a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordProgress {
    fields: BTreeMap<FieldKey, bool>,
}

impl RecordProgress {
    pub fn get(&self, key: FieldKey) -> Option<bool> {
        self.fields.get(&key).copied()
    }

    pub fn set(&mut self, key: FieldKey, value: bool) {
        self.fields.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, bool)> + '_ {
        self.fields.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Progress for one uploaded file, keyed by record index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentProgress {
    records: BTreeMap<usize, RecordProgress>,
    finalized: Option<bool>,
}

impl DocumentProgress {
    pub fn record(&self, index: usize) -> Option<&RecordProgress> {
        self.records.get(&index)
    }

    pub fn records(&self) -> impl Iterator<Item = (usize, &RecordProgress)> {
        self.records.iter().map(|(i, r)| (*i, r))
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.unwrap_or(false)
    }

    fn record_mut(&mut self, index: usize) -> &mut RecordProgress {
        self.records.entry(index).or_default()
    }
}

impl Serialize for DocumentProgress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.records.len() + usize::from(self.finalized.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (index, record) in &self.records {
            map.serialize_entry(&index.to_string(), record)?;
        }
        if let Some(finalized) = self.finalized {
            map.serialize_entry(FINALIZED_KEY, &finalized)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DocumentProgress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = DocumentProgress;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of record index to field flags")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut doc = DocumentProgress::default();
                while let Some(key) = map.next_key::<String>()? {
                    if key == FINALIZED_KEY {
                        doc.finalized = Some(map.next_value()?);
                        continue;
                    }
                    let index: usize = key.parse().map_err(|_| {
                        de::Error::custom(format!("record index must be a non-negative integer, got {key:?}"))
                    })?;
                    doc.records.insert(index, map.next_value()?);
                }
                Ok(doc)
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

/// Informational confirmed-versus-total count for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewTally {
    pub confirmed: usize,
    pub total: usize,
}

/// All review progress, keyed by uploaded file name. The unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressStore {
    documents: BTreeMap<String, DocumentProgress>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document_names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn document(&self, file_name: &str) -> Option<&DocumentProgress> {
        self.documents.get(file_name)
    }

    /// Create an empty entry for `file_name` if there is none. Idempotent.
    pub fn ensure_document_entry(&mut self, file_name: &str) -> &mut DocumentProgress {
        if !self.documents.contains_key(file_name) {
            debug!(file = file_name, "creating document progress");
        }
        self.documents.entry(file_name.to_string()).or_default()
    }

    /// Create an empty record entry (and its document) if absent. Idempotent.
    pub fn ensure_record_entry(&mut self, file_name: &str, index: usize) -> &mut RecordProgress {
        self.ensure_document_entry(file_name).record_mut(index)
    }

    /// Add a `false` flag for every field `record` exposes that has no flag
    /// yet. Existing flags are left untouched, so re-uploading a file merges
    /// into its stored progress.
    pub fn ensure_record_fields(&mut self, file_name: &str, index: usize, record: &Record) {
        let entry = self.ensure_record_entry(file_name, index);
        for key in FieldKey::for_record(record) {
            entry.fields.entry(key).or_insert(false);
        }
    }

    /// Stored flag, if any.
    pub fn field(&self, file_name: &str, index: usize, key: FieldKey) -> Option<bool> {
        self.documents
            .get(file_name)
            .and_then(|d| d.record(index))
            .and_then(|r| r.get(key))
    }

    /// Stored flag, `false` when absent.
    pub fn get_field(&self, file_name: &str, index: usize, key: FieldKey) -> bool {
        self.field(file_name, index, key).unwrap_or(false)
    }

    /// Write a flag, creating the document and record entries as needed.
    pub fn set_field(&mut self, file_name: &str, index: usize, key: FieldKey, value: bool) {
        self.ensure_record_entry(file_name, index).set(key, value);
    }

    /// Confirm type, value, and every party document of `record`.
    ///
    /// Party counts come from the live record, so exactly
    /// `2 + grantors + grantees` flags are set.
    pub fn mark_all_correct(&mut self, file_name: &str, index: usize, record: &Record) {
        let entry = self.ensure_record_entry(file_name, index);
        for key in FieldKey::for_record(record) {
            entry.set(key, true);
        }
        debug!(file = file_name, record = index, "marked all fields correct");
    }

    /// Set the document-level completion marker. Does not lock the document.
    pub fn finalize(&mut self, file_name: &str) {
        self.ensure_document_entry(file_name).finalized = Some(true);
    }

    pub fn is_finalized(&self, file_name: &str) -> bool {
        self.documents
            .get(file_name)
            .is_some_and(DocumentProgress::is_finalized)
    }

    pub fn tally(&self, file_name: &str, index: usize, record: &Record) -> ReviewTally {
        let keys = FieldKey::for_record(record);
        let confirmed = keys
            .iter()
            .filter(|&&k| self.get_field(file_name, index, k))
            .count();
        ReviewTally {
            confirmed,
            total: keys.len(),
        }
    }
}
