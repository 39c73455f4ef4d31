//! Session-scoped review state.
//!
//! A [`ReviewContext`] holds exactly one [`ProgressStore`], the documents
//! uploaded during the session, and a page cursor per document. It does no
//! I/O; persistence wraps it from the store crate.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::ReviewError;
use crate::pagination::{DEFAULT_PAGE_SIZE, PageCursor, Pagination};
use crate::schema::{ensure_reviewable, validate, validate_bytes};
use crate::{FieldKey, Matricula, ProgressStore, Record, SchemaValidationError};

#[derive(Debug, Default)]
pub struct BatchReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<ReviewError>,
}

#[derive(Debug)]
pub struct ReviewContext {
    progress: ProgressStore,
    documents: BTreeMap<String, Matricula>,
    cursors: BTreeMap<String, PageCursor>,
    page_size: usize,
}

impl Default for ReviewContext {
    fn default() -> Self {
        Self::new(ProgressStore::default(), DEFAULT_PAGE_SIZE)
    }
}

impl ReviewContext {
    pub fn new(progress: ProgressStore, page_size: usize) -> Self {
        Self {
            progress,
            documents: BTreeMap::new(),
            cursors: BTreeMap::new(),
            page_size,
        }
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressStore {
        &mut self.progress
    }

    /// Swap the whole in-memory store, as a reload does. Uploaded documents
    /// and cursors are kept.
    pub fn replace_progress(&mut self, progress: ProgressStore) -> ProgressStore {
        std::mem::replace(&mut self.progress, progress)
    }

    pub fn document(&self, file_name: &str) -> Option<&Matricula> {
        self.documents.get(file_name)
    }

    pub fn uploaded(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Validate an upload and bring it into the session.
    ///
    /// An upload whose name already has stored progress merges into it;
    /// nothing stored is replaced.
    pub fn ingest(&mut self, file_name: &str, raw: &Value) -> Result<&Matricula, ReviewError> {
        let parsed = validate(raw);
        self.admit(file_name, parsed)
    }

    pub fn ingest_bytes(&mut self, file_name: &str, bytes: &[u8]) -> Result<&Matricula, ReviewError> {
        let parsed = validate_bytes(bytes);
        self.admit(file_name, parsed)
    }

    /// Ingest several uploads. A bad file is reported and skipped; it never
    /// stops the rest of the batch or touches other files' progress.
    pub fn ingest_batch<I, N, B>(&mut self, files: I) -> BatchReport
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: AsRef<[u8]>,
    {
        let mut report = BatchReport::default();
        for (name, bytes) in files {
            let name = name.as_ref();
            match self.ingest_bytes(name, bytes.as_ref()) {
                Ok(_) => report.accepted.push(name.to_string()),
                Err(e) => {
                    warn!(file = name, error = %e, "skipping upload");
                    report.rejected.push(e);
                }
            }
        }
        report
    }

    fn admit(
        &mut self,
        file_name: &str,
        parsed: Result<Matricula, SchemaValidationError>,
    ) -> Result<&Matricula, ReviewError> {
        let matricula = parsed.map_err(|source| ReviewError::Schema {
            file_name: file_name.to_string(),
            source,
        })?;
        ensure_reviewable(file_name, &matricula)?;

        self.progress.ensure_document_entry(file_name);
        let pagination = Pagination::new(matricula.records.len(), self.page_size);
        self.cursors
            .entry(file_name.to_string())
            .and_modify(|c| c.repaginate(pagination))
            .or_insert_with(|| PageCursor::new(pagination));

        info!(file = file_name, records = matricula.records.len(), "document ready for review");
        self.documents.insert(file_name.to_string(), matricula);
        Ok(&self.documents[file_name])
    }

    pub fn cursor(&self, file_name: &str) -> Option<&PageCursor> {
        self.cursors.get(file_name)
    }

    fn cursor_mut(&mut self, file_name: &str) -> Result<&mut PageCursor, ReviewError> {
        self.cursors
            .get_mut(file_name)
            .ok_or_else(|| ReviewError::UnknownDocument(file_name.to_string()))
    }

    pub fn current_page(&self, file_name: &str) -> Option<usize> {
        self.cursor(file_name).map(PageCursor::page)
    }

    pub fn next_page(&mut self, file_name: &str) -> Result<usize, ReviewError> {
        Ok(self.cursor_mut(file_name)?.next())
    }

    pub fn prev_page(&mut self, file_name: &str) -> Result<usize, ReviewError> {
        Ok(self.cursor_mut(file_name)?.prev())
    }

    pub fn goto_page(&mut self, file_name: &str, page: usize) -> Result<usize, ReviewError> {
        Ok(self.cursor_mut(file_name)?.goto(page))
    }

    /// Records on the document's current page, paired with their indices.
    ///
    /// Every visible record gets its field flags initialised (missing ones
    /// as `false`) the way a rendered page would.
    pub fn visible_records(&mut self, file_name: &str) -> Result<Vec<(usize, &Record)>, ReviewError> {
        let range = self
            .cursors
            .get(file_name)
            .map(PageCursor::visible_range)
            .ok_or_else(|| ReviewError::UnknownDocument(file_name.to_string()))?;
        let matricula = self
            .documents
            .get(file_name)
            .ok_or_else(|| ReviewError::UnknownDocument(file_name.to_string()))?;

        let mut visible = Vec::with_capacity(range.len());
        for index in range {
            let record = &matricula.records[index];
            self.progress.ensure_record_fields(file_name, index, record);
            visible.push((index, record));
        }
        Ok(visible)
    }

    fn record(&self, file_name: &str, index: usize) -> Result<&Record, ReviewError> {
        self.documents
            .get(file_name)
            .ok_or_else(|| ReviewError::UnknownDocument(file_name.to_string()))?
            .records
            .get(index)
            .ok_or_else(|| ReviewError::UnknownRecord {
                file_name: file_name.to_string(),
                index,
            })
    }

    /// Toggle a single flag of an uploaded record. Only keys the record
    /// actually has are accepted.
    pub fn set_field(&mut self, file_name: &str, index: usize, key: FieldKey, value: bool) -> Result<(), ReviewError> {
        let record = self.record(file_name, index)?;
        if !FieldKey::for_record(record).contains(&key) {
            return Err(ReviewError::UnknownField {
                file_name: file_name.to_string(),
                index,
                key,
            });
        }
        self.progress.set_field(file_name, index, key, value);
        Ok(())
    }

    pub fn mark_all_correct(&mut self, file_name: &str, index: usize) -> Result<(), ReviewError> {
        let record = self
            .documents
            .get(file_name)
            .ok_or_else(|| ReviewError::UnknownDocument(file_name.to_string()))?
            .records
            .get(index)
            .ok_or_else(|| ReviewError::UnknownRecord {
                file_name: file_name.to_string(),
                index,
            })?;
        self.progress.mark_all_correct(file_name, index, record);
        Ok(())
    }

    /// Mark the document as reviewed. Further edits remain possible.
    pub fn finalize(&mut self, file_name: &str) {
        self.progress.finalize(file_name);
        info!(file = file_name, "document finalized");
    }
}
