use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    error::AppError,
    storage::{db::SurrealDbClient, types::index_document::IndexDocument},
};

/// Outcome of creating the target collection at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub id: String,
    pub reason: String,
}

/// Per-document result of one bulk submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub submitted: usize,
    pub failures: Vec<DocumentFailure>,
}

impl BulkReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn indexed(&self) -> usize {
        self.submitted.saturating_sub(self.failures.len())
    }

    pub fn failure_message(&self) -> String {
        self.failures
            .iter()
            .map(|failure| format!("[{}]: {}", failure.id, failure.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Write side of the search/index store.
#[async_trait]
pub trait IndexSink: Send + Sync {
    async fn ensure_collection(&self, collection: &str) -> Result<CollectionStatus, AppError>;

    /// Submits `documents` as one batch. Rejected documents are reported in
    /// the returned [`BulkReport`]; an `Err` means the batch never reached the
    /// store.
    async fn bulk_index(
        &self,
        collection: &str,
        documents: Vec<IndexDocument>,
    ) -> Result<BulkReport, AppError>;
}

pub fn validate_collection_name(collection: &str) -> Result<(), AppError> {
    let mut chars = collection.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "invalid collection name: {collection:?}"
        )))
    }
}

#[derive(Clone)]
pub struct SurrealIndexSink {
    db: Arc<SurrealDbClient>,
}

impl SurrealIndexSink {
    pub fn new(db: Arc<SurrealDbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IndexSink for SurrealIndexSink {
    async fn ensure_collection(&self, collection: &str) -> Result<CollectionStatus, AppError> {
        validate_collection_name(collection)?;

        let response = self
            .db
            .client
            .query(format!("DEFINE TABLE {collection} SCHEMALESS;"))
            .await?;

        match response.check() {
            Ok(_) => {
                info!(%collection, "created index collection");
                Ok(CollectionStatus::Created)
            }
            Err(err) if err.to_string().contains("already exists") => {
                debug!(%collection, "index collection already exists");
                Ok(CollectionStatus::AlreadyExists)
            }
            Err(err) => Err(AppError::Database(err)),
        }
    }

    async fn bulk_index(
        &self,
        collection: &str,
        documents: Vec<IndexDocument>,
    ) -> Result<BulkReport, AppError> {
        validate_collection_name(collection)?;

        if documents.is_empty() {
            return Ok(BulkReport::default());
        }

        let statements: String = (0..documents.len())
            .map(|i| format!("CREATE type::thing($collection, $id_{i}) CONTENT $body_{i};\n"))
            .collect();

        let mut query = self
            .db
            .client
            .query(statements)
            .bind(("collection", collection.to_string()));
        for (i, document) in documents.iter().enumerate() {
            query = query
                .bind((format!("id_{i}"), document.id.clone()))
                .bind((format!("body_{i}"), document.body()));
        }

        let mut response = query.await?;
        let mut errors: Vec<(usize, surrealdb::Error)> = response.take_errors().into_iter().collect();
        errors.sort_by_key(|(i, _)| *i);

        let failures = errors
            .into_iter()
            .map(|(i, err)| DocumentFailure {
                id: documents
                    .get(i)
                    .map(|document| document.id.clone())
                    .unwrap_or_default(),
                reason: err.to_string(),
            })
            .collect();

        Ok(BulkReport {
            submitted: documents.len(),
            failures,
        })
    }
}
