//! Progress persisted as a single object in a remote bucket.
//!
//! Speaks plain path-style object HTTP: `GET {endpoint}/{bucket}/{key}` to
//! load and `PUT` of the same URL to save. Credentials are supplied from
//! outside as an optional bearer token.

use async_trait::async_trait;
use matricula_core::ProgressStore;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::backend::{ProgressBackend, decode, encode};
use crate::StoreError;

/// Object key used when none is configured.
pub const DEFAULT_OBJECT_KEY: &str = "validation_progress.json";

pub struct RemoteObjectBackend {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    key: String,
    token: Option<String>,
}

impl RemoteObjectBackend {
    /// `endpoint` should be like `https://storage.example.com` (a trailing
    /// slash is tolerated).
    pub fn new(endpoint: String, bucket: String, key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.trim_matches('/').to_string(),
            key: key.trim_start_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn object_url(&self) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, self.key)
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let req = self.client.request(method, self.object_url());
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

async fn server_error(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    StoreError::Server { status, body }
}

#[async_trait]
impl ProgressBackend for RemoteObjectBackend {
    fn describe(&self) -> String {
        format!("object {}", self.object_url())
    }

    async fn load(&self) -> Result<ProgressStore, StoreError> {
        let url = self.object_url();
        info!(url = %url, "loading progress from object store");
        let resp = self.request(reqwest::Method::GET).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            info!(url = %url, "no saved progress object, starting empty");
            return Ok(ProgressStore::new());
        }
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "object store load failed");
            return Err(server_error(resp).await);
        }

        let bytes = resp.bytes().await?;
        let store = decode(&bytes)?;
        info!(documents = store.document_names().count(), "loaded progress");
        Ok(store)
    }

    async fn save(&self, store: &ProgressStore) -> Result<(), StoreError> {
        let body = encode(store)?;
        let url = self.object_url();
        info!(url = %url, bytes = body.len(), "saving progress to object store");
        let resp = self
            .request(reqwest::Method::PUT)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!(url = %url, status = resp.status().as_u16(), "object store save failed");
            return Err(server_error(resp).await);
        }
        Ok(())
    }
}
