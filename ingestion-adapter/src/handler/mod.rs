mod state;

pub use state::{HandlerPhase, PhaseTransition};

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Instant,
};

use common::{
    error::AppError,
    storage::{
        index_sink::{BulkReport, IndexSink},
        types::index_document::IndexDocument,
    },
};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    provider::{SearchProvider, SearchQuery, SearchSort},
    terms::{RoutingKey, Terms},
};

use self::state::compute_next_phase;

/// Collaborators and limits shared by every handler of one supervisor.
#[derive(Clone)]
pub struct HandlerContext {
    pub provider: Arc<dyn SearchProvider>,
    pub sink: Arc<dyn IndexSink>,
    pub collection: Arc<str>,
    pub result_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Indexed(BulkReport),
    Stopped,
}

/// Signals at a safe point that the round must be abandoned.
struct StopRequested;

/// Publishes `done` when the run future finishes, unwinds or is dropped.
struct DoneGuard<'a>(&'a AtomicBool);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// One search-and-index round for a single [`Terms`], running as its own
/// task. The supervisor keeps the `Arc` in its registry and drives control
/// through it.
pub struct TermHandler {
    terms: Arc<Terms>,
    key: RoutingKey,
    done: AtomicBool,
    phase: Mutex<HandlerPhase>,
    pause_tx: watch::Sender<bool>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<Result<HandlerOutcome, AppError>>>>,
}

impl TermHandler {
    fn new(terms: Arc<Terms>) -> Self {
        let (pause_tx, _) = watch::channel(false);
        Self {
            key: terms.routing_key(),
            terms,
            done: AtomicBool::new(false),
            phase: Mutex::new(HandlerPhase::Created),
            pause_tx,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Creates a handler for `terms` and starts its round on the runtime.
    pub fn spawn(terms: Arc<Terms>, context: HandlerContext) -> Arc<Self> {
        let handler = Arc::new(Self::new(terms));
        let task = tokio::spawn(Arc::clone(&handler).run(context));
        *lock(&handler.task) = Some(task);
        handler
    }

    pub fn terms(&self) -> &Terms {
        &self.terms
    }

    pub fn routing_key(&self) -> &RoutingKey {
        &self.key
    }

    pub fn phase(&self) -> HandlerPhase {
        *lock(&self.phase)
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        *self.pause_tx.borrow()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Asks the round to suspend at its next safe point. A bulk write that is
    /// already submitted always runs to completion.
    pub fn do_pause(&self) -> bool {
        if self.is_done() || self.cancel.is_cancelled() || self.phase().is_terminal() {
            return false;
        }
        self.pause_tx.send_replace(true);
        debug!(routing_key = %self.key, "pause requested");
        true
    }

    /// Clears a pending pause. False when the handler was not paused.
    pub fn do_resume(&self) -> bool {
        if !self.is_paused()
            || self.is_done()
            || self.cancel.is_cancelled()
            || self.phase().is_terminal()
        {
            return false;
        }
        self.pause_tx.send_replace(false);
        debug!(routing_key = %self.key, "resume requested");
        true
    }

    /// Requests cancellation. Idempotent and non-blocking; a stop issued
    /// while the provider call is in flight takes effect once it returns.
    pub fn do_stop(&self) -> bool {
        if self.is_done() {
            return false;
        }
        self.cancel.cancel();
        debug!(routing_key = %self.key, "stop requested");
        true
    }

    /// Cancels whatever is left of the round and collects the task result.
    /// Called by the supervisor once `done` is observed, or on shutdown.
    pub(crate) async fn retire(&self) -> Result<HandlerOutcome, AppError> {
        self.cancel.cancel();
        let task = lock(&self.task).take();
        match task {
            Some(task) => task.await?,
            None => Err(AppError::InternalError(format!(
                "handler {} already retired",
                self.key
            ))),
        }
    }

    #[tracing::instrument(
        skip_all,
        fields(routing_key = %self.key, doc_type = %self.terms.kind())
    )]
    async fn run(self: Arc<Self>, context: HandlerContext) -> Result<HandlerOutcome, AppError> {
        let _done = DoneGuard(&self.done);
        info!("term handler started");

        if self.cancel.is_cancelled() {
            self.transition(PhaseTransition::Stop)?;
            info!("term handler stopped before start");
            return Ok(HandlerOutcome::Stopped);
        }
        self.transition(PhaseTransition::Start)?;

        if self.checkpoint().await.is_err() {
            return self.stopped();
        }

        let query = SearchQuery {
            tags: self.terms.tags(),
            limit: context.result_limit,
            page: 1,
            sort: SearchSort::Relevance,
        };

        let started = Instant::now();
        let mut urls = match context.provider.search(&query).await {
            Ok(urls) => urls,
            Err(err) => {
                self.transition(PhaseTransition::Fail)?;
                error!(error = %err, "search provider failed");
                return Err(err);
            }
        };
        let lapse_micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        urls.truncate(usize::try_from(context.result_limit).unwrap_or(usize::MAX));
        info!(results = urls.len(), lapse_micros, "searched provider");

        if self.checkpoint().await.is_err() {
            return self.stopped();
        }

        match self.index(&context, urls).await {
            Ok(report) => {
                self.transition(PhaseTransition::Complete)?;
                info!(
                    indexed = report.indexed(),
                    failed = report.failures.len(),
                    "term handler finished"
                );
                Ok(HandlerOutcome::Indexed(report))
            }
            Err(err) => {
                self.transition(PhaseTransition::Fail)?;
                error!(error = %err, "bulk index submission failed");
                Err(err)
            }
        }
    }

    /// Builds one document per url and submits them as a single batch.
    async fn index(
        &self,
        context: &HandlerContext,
        urls: Vec<String>,
    ) -> Result<BulkReport, AppError> {
        let doc_type = self.terms.kind();
        let documents: Vec<IndexDocument> = urls
            .into_iter()
            .map(|url| IndexDocument::new(doc_type, url))
            .collect();

        let report = context
            .sink
            .bulk_index(&context.collection, documents)
            .await?;

        if report.has_failures() {
            warn!(
                collection = %context.collection,
                failed = report.failures.len(),
                submitted = report.submitted,
                failures = %report.failure_message(),
                "bulk index reported failures"
            );
        }

        Ok(report)
    }

    /// Safe point: honours a pending stop, and parks while paused.
    async fn checkpoint(&self) -> Result<(), StopRequested> {
        if self.cancel.is_cancelled() {
            return Err(StopRequested);
        }

        let mut pause_rx = self.pause_tx.subscribe();
        if !*pause_rx.borrow_and_update() {
            return Ok(());
        }

        self.transition(PhaseTransition::Pause)
            .map_err(|_| StopRequested)?;
        info!("term handler paused");

        while *pause_rx.borrow_and_update() {
            tokio::select! {
                () = self.cancel.cancelled() => return Err(StopRequested),
                changed = pause_rx.changed() => {
                    if changed.is_err() {
                        return Err(StopRequested);
                    }
                }
            }
        }

        self.transition(PhaseTransition::Resume)
            .map_err(|_| StopRequested)?;
        info!("term handler resumed");

        if self.cancel.is_cancelled() {
            return Err(StopRequested);
        }
        Ok(())
    }

    fn stopped(&self) -> Result<HandlerOutcome, AppError> {
        self.transition(PhaseTransition::Stop)?;
        info!("term handler stopped without indexing");
        Ok(HandlerOutcome::Stopped)
    }

    fn transition(&self, event: PhaseTransition) -> Result<HandlerPhase, AppError> {
        let mut phase = lock(&self.phase);
        let next = compute_next_phase(*phase, event)?;
        *phase = next;
        Ok(next)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
