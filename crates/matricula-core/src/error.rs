use std::fmt;

use thiserror::Error;

use crate::FieldKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The upload is not JSON at all.
    Unparseable(String),
}

/// One broken constraint, located by a dotted path such as
/// `registros.2.alienantes.0.documento` (`$` for the document root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "{}: field required", self.path),
            ViolationKind::TypeMismatch { expected, found } => {
                write!(f, "{}: expected {expected}, got {found}", self.path)
            }
            ViolationKind::Unparseable(reason) => {
                write!(f, "{}: not valid JSON ({reason})", self.path)
            }
        }
    }
}

/// Every violation found in one pass over an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SchemaValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema violation(s)", self.violations.len())?;
        for v in &self.violations {
            write!(f, "\n  {v}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file_name} has no records to review")]
pub struct EmptyRecordSetError {
    pub file_name: String,
}

/// Per-file failure while bringing an upload into a review session.
///
/// None of these abort a batch; the remaining files are still processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("{file_name} is invalid: {source}")]
    Schema {
        file_name: String,
        #[source]
        source: SchemaValidationError,
    },

    #[error(transparent)]
    EmptyRecordSet(#[from] EmptyRecordSetError),

    #[error("{0} has not been uploaded in this session")]
    UnknownDocument(String),

    #[error("{file_name} has no record {index}")]
    UnknownRecord { file_name: String, index: usize },

    #[error("record {index} of {file_name} has no field {key}")]
    UnknownField {
        file_name: String,
        index: usize,
        key: FieldKey,
    },
}
