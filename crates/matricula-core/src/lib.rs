pub mod error;
pub mod field;
pub mod matricula;
pub mod pagination;
pub mod progress;
pub mod schema;
pub mod session;

pub use error::{EmptyRecordSetError, ReviewError, SchemaValidationError, Violation, ViolationKind};
pub use field::{FieldKey, UnknownFieldKey};
pub use matricula::{Amount, Matricula, Party, Property, Record};
pub use pagination::{DEFAULT_PAGE_SIZE, PageCursor, Pagination};
pub use progress::{DocumentProgress, ProgressStore, RecordProgress, ReviewTally};
pub use schema::{ensure_reviewable, validate, validate_bytes};
pub use session::{BatchReport, ReviewContext};
