#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod adapter;
pub mod command;
pub mod gateway;
pub mod handler;
pub mod provider;
pub mod supervisor;
pub mod terms;

#[cfg(test)]
mod test_support;

pub use adapter::TermAdapter;
pub use command::{Answer, Command, Control, Medium};
pub use gateway::{CommandGateway, Request};
pub use handler::{HandlerContext, HandlerOutcome, HandlerPhase, TermHandler};
pub use provider::{SearchProvider, SearchQuery, SearchSort};
pub use supervisor::{HandlerSupervisor, SupervisorTuning, SweepReport};
pub use terms::{RoutingKey, Terms};
