use std::sync::Arc;

use common::{error::AppError, storage::index_sink::IndexSink, utils::config::AppConfig};
use tracing::{debug, info, warn};

use crate::{
    command::{Answer, Command, Medium},
    gateway::{CommandGateway, Request},
    provider::SearchProvider,
    supervisor::{HandlerSupervisor, SupervisorTuning},
};

/// Ingestion adapter for one medium: validates inbound commands and hands
/// them to its [`HandlerSupervisor`].
pub struct TermAdapter {
    name: String,
    gateway: CommandGateway,
    supervisor: HandlerSupervisor,
    sink: Arc<dyn IndexSink>,
}

impl TermAdapter {
    pub fn new(
        name: impl Into<String>,
        medium: Medium,
        provider: Arc<dyn SearchProvider>,
        sink: Arc<dyn IndexSink>,
        tuning: SupervisorTuning,
    ) -> Self {
        Self {
            name: name.into(),
            gateway: CommandGateway::new(medium),
            supervisor: HandlerSupervisor::new(provider, Arc::clone(&sink), tuning),
            sink,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn SearchProvider>,
        sink: Arc<dyn IndexSink>,
    ) -> Result<Self, AppError> {
        let medium: Medium = config.medium.parse()?;
        let tuning = SupervisorTuning::from_config(config)?;
        Ok(Self::new(
            config.adapter_name.clone(),
            medium,
            provider,
            sink,
            tuning,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn medium(&self) -> Medium {
        self.gateway.medium()
    }

    pub fn supervisor(&self) -> &HandlerSupervisor {
        &self.supervisor
    }

    /// Creates the target collection and starts the sweeper. A failed
    /// bootstrap is logged and does not prevent startup.
    pub async fn start(&self) {
        let collection = &self.supervisor.tuning().collection;
        match self.sink.ensure_collection(collection).await {
            Ok(status) => debug!(adapter = %self.name, %collection, ?status, "index collection ready"),
            Err(err) => warn!(
                adapter = %self.name,
                %collection,
                error = %err,
                "could not create index collection; continuing"
            ),
        }

        self.supervisor.start_sweeper();
        info!(adapter = %self.name, medium = %self.medium(), "adapter started");
    }

    /// Answers `Ack` once a round is dispatched or a control applied; the
    /// round's own outcome is only visible in logs.
    pub async fn execute(&self, command: Command) -> Answer {
        let request = match self.gateway.validate(command) {
            Ok(request) => request,
            Err(answer) => {
                debug!(adapter = %self.name, ?answer, "command rejected by gateway");
                return answer;
            }
        };

        match request {
            Request::Control(terms, control) => {
                if self.supervisor.control(&terms.routing_key(), control).await {
                    Answer::Ack
                } else {
                    Answer::Fail
                }
            }
            Request::Search(terms) => match self.supervisor.dispatch(terms).await {
                Ok(_) => Answer::Ack,
                Err(AppError::DispatchRejected(_)) => Answer::Fail,
                Err(err) => {
                    warn!(adapter = %self.name, error = %err, "dispatch failed");
                    Answer::Error
                }
            },
        }
    }

    pub async fn shutdown(&self) {
        info!(adapter = %self.name, "adapter stopping");
        self.supervisor.shutdown().await;
    }
}
