use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Dispatch rejected: {0}")]
    DispatchRejected(String),
    #[error("Search provider error: {0}")]
    Provider(String),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("Invalid handler transition: {0}")]
    Transition(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}
