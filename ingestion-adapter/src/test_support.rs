use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use common::{
    error::AppError,
    storage::{
        index_sink::{BulkReport, CollectionStatus, DocumentFailure, IndexSink},
        types::index_document::IndexDocument,
    },
};
use tokio::sync::{Mutex, Notify};

use crate::provider::{SearchProvider, SearchQuery};

pub(crate) struct MockProvider {
    response: Result<Vec<String>, String>,
    gate: Option<Arc<Notify>>,
    pub entered: Arc<Notify>,
    pub queries: Mutex<Vec<SearchQuery>>,
}

impl MockProvider {
    pub fn returning(urls: &[&str]) -> Self {
        Self {
            response: Ok(urls.iter().map(|url| (*url).to_string()).collect()),
            gate: None,
            entered: Arc::new(Notify::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(count: usize) -> Self {
        let urls: Vec<String> = (0..count)
            .map(|i| format!("https://live.example.com/photo_{i}_b.jpg"))
            .collect();
        Self {
            response: Ok(urls),
            gate: None,
            entered: Arc::new(Notify::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            gate: None,
            entered: Arc::new(Notify::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Holds every search call until the returned gate is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>, AppError> {
        self.queries.lock().await.push(query.clone());
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.response.clone().map_err(AppError::Provider)
    }
}

pub(crate) struct PanickingProvider;

#[async_trait]
impl SearchProvider for PanickingProvider {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<String>, AppError> {
        panic!("provider exploded");
    }
}

#[derive(Default, Clone, Copy)]
pub(crate) enum SinkBehavior {
    #[default]
    Accept,
    RejectFirst,
    Unavailable,
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    behavior: SinkBehavior,
    gate: Option<Arc<Notify>>,
    pub entered: Arc<Notify>,
    pub submissions: Mutex<Vec<(String, Vec<IndexDocument>)>>,
    pub collections: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn with_behavior(behavior: SinkBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Holds every bulk write until the returned gate is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.lock().await.len()
    }
}

#[async_trait]
impl IndexSink for RecordingSink {
    async fn ensure_collection(&self, collection: &str) -> Result<CollectionStatus, AppError> {
        if matches!(self.behavior, SinkBehavior::Unavailable) {
            return Err(AppError::InternalError("index store unavailable".into()));
        }
        let mut collections = self.collections.lock().await;
        if collections.iter().any(|existing| existing == collection) {
            return Ok(CollectionStatus::AlreadyExists);
        }
        collections.push(collection.to_string());
        Ok(CollectionStatus::Created)
    }

    async fn bulk_index(
        &self,
        collection: &str,
        documents: Vec<IndexDocument>,
    ) -> Result<BulkReport, AppError> {
        if matches!(self.behavior, SinkBehavior::Unavailable) {
            return Err(AppError::InternalError("index store unavailable".into()));
        }
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let failures = match (self.behavior, documents.first()) {
            (SinkBehavior::RejectFirst, Some(first)) => vec![DocumentFailure {
                id: first.id.clone(),
                reason: "mapper_parsing_exception".into(),
            }],
            _ => Vec::new(),
        };
        let submitted = documents.len();

        self.submissions
            .lock()
            .await
            .push((collection.to_string(), documents));

        Ok(BulkReport {
            submitted,
            failures,
        })
    }
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub(crate) async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Like [`eventually`] for conditions that need to await.
pub(crate) async fn eventually_async<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
