//! Progress persistence: local JSON file and remote object store.

mod backend;
mod config;
mod error;
mod local;
mod session;

pub use backend::{ProgressBackend, decode, encode};
pub use config::{BackendConfig, connect};
pub use error::StoreError;
pub use local::{DEFAULT_PROGRESS_FILE, LocalFileBackend};
pub use session::ReviewSession;

#[cfg(feature = "remote")]
mod remote;
#[cfg(feature = "remote")]
pub use remote::{DEFAULT_OBJECT_KEY, RemoteObjectBackend};
