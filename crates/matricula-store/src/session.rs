//! A review context bound to the backend it is saved to and reloaded from.

use matricula_core::ReviewContext;
use tracing::{info, warn};

use crate::{ProgressBackend, StoreError};

pub struct ReviewSession {
    context: ReviewContext,
    backend: Box<dyn ProgressBackend>,
}

impl ReviewSession {
    /// Load persisted progress and start a session on it.
    pub async fn open(backend: Box<dyn ProgressBackend>, page_size: usize) -> Result<Self, StoreError> {
        let progress = backend.load().await?;
        info!(backend = %backend.describe(), "review session opened");
        Ok(Self {
            context: ReviewContext::new(progress, page_size),
            backend,
        })
    }

    pub fn context(&self) -> &ReviewContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ReviewContext {
        &mut self.context
    }

    pub fn backend(&self) -> &dyn ProgressBackend {
        self.backend.as_ref()
    }

    /// Overwrite the persisted document with the in-memory store.
    pub async fn save(&self) -> Result<(), StoreError> {
        if let Err(e) = self.backend.save(self.context.progress()).await {
            warn!(backend = %self.backend.describe(), error = %e, "progress NOT saved");
            return Err(e);
        }
        Ok(())
    }

    /// Replace the in-memory store with whatever is persisted now.
    ///
    /// On failure the current in-memory store is kept untouched, so a flaky
    /// backend never wipes unsaved review work.
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        match self.backend.load().await {
            Ok(progress) => {
                self.context.replace_progress(progress);
                info!(backend = %self.backend.describe(), "progress reloaded");
                Ok(())
            }
            Err(e) => {
                warn!(
                    backend = %self.backend.describe(),
                    error = %e,
                    "reload failed, keeping in-memory progress"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use matricula_core::{DEFAULT_PAGE_SIZE, FieldKey, ProgressStore};
    use serde_json::json;
    use tempfile::TempDir;

    use crate::LocalFileBackend;

    /// Backend whose load can be switched to fail.
    #[derive(Default)]
    struct Flaky {
        stored: Mutex<Option<ProgressStore>>,
        fail: Mutex<bool>,
    }

    #[async_trait]
    impl ProgressBackend for Arc<Flaky> {
        fn describe(&self) -> String {
            "flaky".into()
        }

        async fn load(&self) -> Result<ProgressStore, StoreError> {
            if *self.fail.lock().unwrap() {
                return Err(StoreError::Server {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(self.stored.lock().unwrap().clone().unwrap_or_default())
        }

        async fn save(&self, store: &ProgressStore) -> Result<(), StoreError> {
            if *self.fail.lock().unwrap() {
                return Err(StoreError::Other("offline".into()));
            }
            *self.stored.lock().unwrap() = Some(store.clone());
            Ok(())
        }
    }

    fn upload(records: usize) -> serde_json::Value {
        let record = json!({
            "tipo": "compra e venda",
            "valor": { "valor": 1, "moeda": "BRL" },
            "data": "",
            "objeto": "",
            "pct": 100,
            "alienantes": [{ "nome": "Ana", "documento": "1", "tipo_documento": "CPF" }],
            "adquirentes": []
        });
        json!({
            "registros": vec![record; records],
            "bem": { "proprietarios": [], "area": 1, "area_unidade": "m2" }
        })
    }

    #[tokio::test]
    async fn toggled_flag_survives_a_fresh_session() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("progress.json");

        let mut first = ReviewSession::open(Box::new(LocalFileBackend::new(&path)), DEFAULT_PAGE_SIZE)
            .await
            .unwrap();
        first.context_mut().ingest("a.json", &upload(4)).unwrap();
        first.context_mut().next_page("a.json").unwrap();
        first.context_mut().prev_page("a.json").unwrap();
        first.context_mut().visible_records("a.json").unwrap();
        first
            .context_mut()
            .set_field("a.json", 2, FieldKey::DocAlienante(0), true)
            .unwrap();
        first.save().await.unwrap();
        drop(first);

        let second = ReviewSession::open(Box::new(LocalFileBackend::new(&path)), DEFAULT_PAGE_SIZE)
            .await
            .unwrap();
        let progress = second.context().progress();
        assert!(progress.get_field("a.json", 2, FieldKey::DocAlienante(0)));
        assert_eq!(progress.field("a.json", 2, FieldKey::Tipo), Some(false));
        assert_eq!(progress.field("a.json", 2, FieldKey::Valor), Some(false));
        assert!(!progress.get_field("a.json", 0, FieldKey::DocAlienante(0)));
    }

    #[tokio::test]
    async fn adding_a_document_keeps_untouched_documents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("progress.json");
        let mut seed = ProgressStore::new();
        seed.set_field("old.json", 1, FieldKey::Valor, true);
        seed.finalize("old.json");
        LocalFileBackend::new(&path).save(&seed).await.unwrap();

        let mut session = ReviewSession::open(Box::new(LocalFileBackend::new(&path)), 3).await.unwrap();
        session.context_mut().ingest("new.json", &upload(1)).unwrap();
        session.context_mut().mark_all_correct("new.json", 0).unwrap();
        session.save().await.unwrap();

        let loaded = LocalFileBackend::new(&path).load().await.unwrap();
        assert_eq!(loaded.document("old.json"), seed.document("old.json"));
        assert!(loaded.get_field("new.json", 0, FieldKey::DocAlienante(0)));
    }

    #[tokio::test]
    async fn failed_reload_keeps_in_memory_progress() {
        let backend = Arc::new(Flaky::default());
        let mut session = ReviewSession::open(Box::new(backend.clone()), 3).await.unwrap();
        session
            .context_mut()
            .progress_mut()
            .set_field("a.json", 0, FieldKey::Tipo, true);

        *backend.fail.lock().unwrap() = true;
        assert!(session.reload().await.is_err());
        assert!(session.context().progress().get_field("a.json", 0, FieldKey::Tipo));
    }

    #[tokio::test]
    async fn reload_picks_up_out_of_band_changes() {
        let backend = Arc::new(Flaky::default());
        let mut session = ReviewSession::open(Box::new(backend.clone()), 3).await.unwrap();
        session
            .context_mut()
            .progress_mut()
            .set_field("mine.json", 0, FieldKey::Tipo, true);

        let mut theirs = ProgressStore::new();
        theirs.set_field("theirs.json", 0, FieldKey::Valor, true);
        *backend.stored.lock().unwrap() = Some(theirs.clone());

        session.reload().await.unwrap();
        assert_eq!(session.context().progress(), &theirs);
    }

    #[tokio::test]
    async fn failed_save_is_reported() {
        let backend = Arc::new(Flaky::default());
        let session = ReviewSession::open(Box::new(backend.clone()), 3).await.unwrap();
        *backend.fail.lock().unwrap() = true;
        assert!(session.save().await.is_err());
        assert!(backend.stored.lock().unwrap().is_none());
    }
}
