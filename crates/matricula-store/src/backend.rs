//! Backend abstraction and the JSON encoding every backend shares.

use async_trait::async_trait;
use matricula_core::ProgressStore;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::StoreError;

/// Whole-document persistence of a [`ProgressStore`].
///
/// `save` replaces the persisted document outright. Concurrent sessions
/// saving to the same location are not coordinated: the last save wins.
#[async_trait]
pub trait ProgressBackend: Send + Sync {
    /// Human-readable location, for logs and operator messages.
    fn describe(&self) -> String;

    /// Read the persisted store. A document that does not exist yet loads
    /// as an empty store.
    async fn load(&self) -> Result<ProgressStore, StoreError>;

    async fn save(&self, store: &ProgressStore) -> Result<(), StoreError>;
}

/// Encode a store as 4-space indented JSON. Both backends write exactly
/// these bytes, so progress files move freely between them.
pub fn encode(store: &ProgressStore) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    store.serialize(&mut ser)?;
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<ProgressStore, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}
