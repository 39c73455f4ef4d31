use std::path::PathBuf;

use crate::{LocalFileBackend, ProgressBackend, StoreError};

/// Where review progress lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Local {
        path: PathBuf,
    },
    Remote {
        endpoint: String,
        bucket: String,
        key: String,
        token: Option<String>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local {
            path: PathBuf::from(crate::local::DEFAULT_PROGRESS_FILE),
        }
    }
}

/// Build the backend a configuration names.
pub fn connect(config: &BackendConfig) -> Result<Box<dyn ProgressBackend>, StoreError> {
    match config {
        BackendConfig::Local { path } => Ok(Box::new(LocalFileBackend::new(path.clone()))),
        #[cfg(feature = "remote")]
        BackendConfig::Remote {
            endpoint,
            bucket,
            key,
            token,
        } => Ok(Box::new(
            crate::RemoteObjectBackend::new(endpoint.clone(), bucket.clone(), key.clone()).with_token(token.clone()),
        )),
        #[cfg(not(feature = "remote"))]
        BackendConfig::Remote { .. } => Err(StoreError::Other(
            "remote object backend requires the `remote` feature".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local_progress_file() {
        let backend = connect(&BackendConfig::default()).unwrap();
        assert_eq!(backend.describe(), "file validation_progress.json");
    }

    #[cfg(feature = "remote")]
    #[test]
    fn remote_config_builds_object_backend() {
        let backend = connect(&BackendConfig::Remote {
            endpoint: "https://storage.example.com".into(),
            bucket: "revisao".into(),
            key: "progress.json".into(),
            token: None,
        })
        .unwrap();
        assert_eq!(
            backend.describe(),
            "object https://storage.example.com/revisao/progress.json"
        );
    }
}
