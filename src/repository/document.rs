//! Document repository

use crate::changes::{ChangeNotifier, NotificationOutcome};
use crate::messaging::ChangeEvent;
use crate::models::{new_id, timestamp_now, Document, DocumentPatch, IndexedEntity, NewDocument};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::index::{expect_one, require, IndexRepository};
use crate::repository::Created;
use crate::search::{build_filter, IndexedField, SearchConfig, SearchEngine, UpdateScript};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// CRUD over the document index
#[derive(Clone)]
pub struct DocumentRepository {
    index: IndexRepository<Document>,
    notifier: ChangeNotifier,
}

impl DocumentRepository {
    pub fn new(engine: Arc<dyn SearchEngine>, config: &SearchConfig, notifier: ChangeNotifier) -> Self {
        Self {
            index: IndexRepository::new(engine, config.documents.clone(), config),
            notifier,
        }
    }

    pub fn index(&self) -> &IndexRepository<Document> {
        &self.index
    }

    /// The same repository with `deadline` replacing the configured request timeout
    ///
    /// `repository.with_deadline(d).get_by_id(id)` bounds a single call.
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        Self {
            index: self.index.with_timeout(deadline),
            notifier: self.notifier.clone(),
        }
    }

    /// Index a new document and announce it on the bus
    ///
    /// A publish failure is reported in [`Created::notification`]; the
    /// document stays indexed.
    pub async fn create(
        &self,
        document: NewDocument,
        user_id: Option<&str>,
    ) -> RepositoryResult<Created> {
        let document = document.into_document(new_id(), timestamp_now());

        self.index.run("create", self.index.insert(&document)).await?;
        info!(index = %self.index.index_name(), id = %document.id, "Document created");

        let notification = self
            .notifier
            .notify(&ChangeEvent::document_created(&document, user_id))
            .await;

        Ok(Created {
            id: document.id,
            notification,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> RepositoryResult<Document> {
        self.index
            .run("get_by_id", async {
                require("id", id)?;
                self.index
                    .find_one(build_filter(IndexedField::Id, id))
                    .await?
                    .ok_or_else(|| RepositoryError::not_found(Document::KIND, id))
            })
            .await
    }

    /// Assign every field set in `patch` and stamp `updated_at`
    pub async fn update(&self, id: &str, patch: DocumentPatch) -> RepositoryResult<bool> {
        self.index
            .run("update", async {
                require("id", id)?;
                let script = UpdateScript::assign(patch.into_fields(), timestamp_now());
                let counts = self
                    .index
                    .update_where(build_filter(IndexedField::Id, id), script)
                    .await?;
                expect_one(Document::KIND, id, counts, counts.updated)?;
                info!(index = %self.index.index_name(), id = %id, "Document updated");
                Ok(true)
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        self.index
            .run("delete", async {
                require("id", id)?;
                let counts = self
                    .index
                    .delete_where(build_filter(IndexedField::Id, id))
                    .await?;
                expect_one(Document::KIND, id, counts, counts.deleted)?;
                info!(index = %self.index.index_name(), id = %id, "Document deleted");
                Ok(true)
            })
            .await
    }

    /// All documents; an empty or missing index yields an empty list
    pub async fn get_all(&self) -> RepositoryResult<Vec<Document>> {
        self.index.run("get_all", self.index.find_all()).await
    }
}
