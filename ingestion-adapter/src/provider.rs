use async_trait::async_trait;
use common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSort {
    #[default]
    Relevance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub tags: Vec<String>,
    pub limit: u32,
    pub page: u32,
    pub sort: SearchSort,
}

/// Remote content provider queried by term handlers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns result URLs for items tagged with `query.tags`, at most
    /// `query.limit` of them. Failures are reported as [`AppError::Provider`].
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>, AppError>;
}
