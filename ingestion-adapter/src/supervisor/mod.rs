mod config;

pub use config::SupervisorTuning;

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Mutex, PoisonError},
};

use common::{error::AppError, storage::index_sink::IndexSink};
use tokio::{
    sync::RwLock,
    task::JoinHandle,
    time::{interval, timeout, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    command::Control,
    handler::{HandlerContext, HandlerOutcome, TermHandler},
    provider::SearchProvider,
    terms::{RoutingKey, Terms},
};

/// Keys reclaimed by one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reaped: Vec<RoutingKey>,
}

/// Owns the registry of live term handlers: dispatches new rounds, routes
/// control operations, and reaps finished handlers on a fixed interval.
#[derive(Clone)]
pub struct HandlerSupervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    context: HandlerContext,
    tuning: SupervisorTuning,
    handlers: RwLock<HashMap<RoutingKey, Arc<TermHandler>>>,
    shutdown: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl HandlerSupervisor {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        sink: Arc<dyn IndexSink>,
        tuning: SupervisorTuning,
    ) -> Self {
        let context = HandlerContext {
            provider,
            sink,
            collection: Arc::from(tuning.collection.as_str()),
            result_limit: tuning.result_limit,
        };

        Self {
            inner: Arc::new(SupervisorInner {
                context,
                tuning,
                handlers: RwLock::new(HashMap::new()),
                shutdown: CancellationToken::new(),
                sweeper: Mutex::new(None),
            }),
        }
    }

    pub fn tuning(&self) -> &SupervisorTuning {
        &self.inner.tuning
    }

    /// Registers a handler for `terms` and starts its round.
    ///
    /// A routing key that already has an entry, live or finished but not yet
    /// swept, is rejected; the existing handler is left untouched.
    #[tracing::instrument(skip_all, fields(doc_type = %terms.kind()))]
    pub async fn dispatch(&self, terms: Terms) -> Result<RoutingKey, AppError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(AppError::DispatchRejected(
                "supervisor is shutting down".into(),
            ));
        }

        let key = terms.routing_key();
        if terms.is_empty() || key.is_empty() {
            return Err(AppError::Validation("terms carry no values".into()));
        }

        let mut handlers = self.inner.handlers.write().await;
        // Shutdown may have drained the registry while we waited for the guard.
        if self.inner.shutdown.is_cancelled() {
            return Err(AppError::DispatchRejected(
                "supervisor is shutting down".into(),
            ));
        }
        match handlers.entry(key.clone()) {
            Entry::Occupied(_) => {
                warn!(routing_key = %key, "handler already registered; dispatch rejected");
                Err(AppError::DispatchRejected(format!(
                    "a handler for '{key}' is already registered"
                )))
            }
            Entry::Vacant(slot) => {
                let handler = TermHandler::spawn(Arc::new(terms), self.inner.context.clone());
                slot.insert(handler);
                info!(routing_key = %key, "started term handler");
                Ok(key)
            }
        }
    }

    /// Forwards `op` to the handler registered under `key`. Returns `false`
    /// when no such handler exists or it refuses the operation.
    pub async fn control(&self, key: &RoutingKey, op: Control) -> bool {
        let Some(handler) = self.handler(key).await else {
            debug!(routing_key = %key, ?op, "no handler registered for control");
            return false;
        };

        let accepted = match op {
            Control::Pause => handler.do_pause(),
            Control::Resume => handler.do_resume(),
            Control::Stop => handler.do_stop(),
        };
        info!(routing_key = %key, ?op, accepted, "control applied");
        accepted
    }

    /// One reaping pass: removes every finished handler from the registry and
    /// collects its result. Failures of individual handlers are logged.
    pub async fn sweep(&self) -> SweepReport {
        let finished: Vec<(RoutingKey, Arc<TermHandler>)> = {
            let handlers = self.inner.handlers.read().await;
            handlers
                .iter()
                .filter(|(_, handler)| handler.is_done())
                .map(|(key, handler)| (key.clone(), Arc::clone(handler)))
                .collect()
        };

        if finished.is_empty() {
            return SweepReport::default();
        }

        let mut reaped = Vec::with_capacity(finished.len());
        {
            let mut handlers = self.inner.handlers.write().await;
            for (key, handler) in finished {
                let registered = handlers
                    .get(&key)
                    .is_some_and(|current| Arc::ptr_eq(current, &handler));
                if registered {
                    handlers.remove(&key);
                    reaped.push((key, handler));
                }
            }
        }

        for (key, handler) in &reaped {
            log_retirement(key, handler.retire().await);
        }

        SweepReport {
            reaped: reaped.into_iter().map(|(key, _)| key).collect(),
        }
    }

    /// Sweeps every `sweep_interval` until [`shutdown`](Self::shutdown).
    /// Missed ticks are skipped rather than replayed.
    pub async fn run_sweeper(self) {
        let mut ticker = interval(self.inner.tuning.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_ms = u64::try_from(self.inner.tuning.sweep_interval.as_millis())
                .unwrap_or(u64::MAX),
            "handler sweeper started"
        );

        loop {
            tokio::select! {
                () = self.inner.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.sweep().await;
                    if !report.reaped.is_empty() {
                        debug!(reaped = report.reaped.len(), "sweep reclaimed handlers");
                    }
                }
            }
        }

        info!("handler sweeper stopped");
    }

    /// Spawns [`run_sweeper`](Self::run_sweeper) once; later calls are no-ops.
    pub fn start_sweeper(&self) {
        let mut sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if sweeper.is_none() {
            *sweeper = Some(tokio::spawn(self.clone().run_sweeper()));
        }
    }

    /// Stops the sweeper and every registered handler, then waits up to
    /// `shutdown_grace` per handler for its round to end.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            if let Err(err) = sweeper.await {
                error!(error = %err, "handler sweeper panicked");
            }
        }

        let drained: Vec<(RoutingKey, Arc<TermHandler>)> =
            self.inner.handlers.write().await.drain().collect();
        for (_, handler) in &drained {
            handler.do_stop();
        }
        for (key, handler) in &drained {
            match timeout(self.inner.tuning.shutdown_grace, handler.retire()).await {
                Ok(result) => log_retirement(key, result),
                Err(_) => warn!(routing_key = %key, "term handler did not stop within grace period"),
            }
        }

        info!(stopped = drained.len(), "handler supervisor shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    pub async fn handler(&self, key: &RoutingKey) -> Option<Arc<TermHandler>> {
        self.inner.handlers.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &RoutingKey) -> bool {
        self.inner.handlers.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.inner.handlers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.handlers.read().await.is_empty()
    }

    pub async fn active_keys(&self) -> Vec<RoutingKey> {
        let mut keys: Vec<RoutingKey> = self.inner.handlers.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn log_retirement(key: &RoutingKey, result: Result<HandlerOutcome, AppError>) {
    match result {
        Ok(HandlerOutcome::Indexed(report)) => {
            debug!(routing_key = %key, indexed = report.indexed(), "reaped term handler");
        }
        Ok(HandlerOutcome::Stopped) => {
            debug!(routing_key = %key, "reaped stopped term handler");
        }
        Err(AppError::Join(err)) => {
            error!(routing_key = %key, error = %err, "term handler panicked");
        }
        Err(err) => {
            warn!(routing_key = %key, error = %err, "term handler ended with failure");
        }
    }
}
