//! Failure routing
//!
//! [`FailureRouter::route`] hands a report to a background worker over an
//! unbounded channel and returns immediately; the caller's request path never
//! waits on persistence or alerting. The worker deduplicates equivalent
//! failures into one [`FailureRecord`] per dedup window and notifies
//! operators once per window for high and critical severities.

use crate::config::FaultRouterConfig;
use crate::error::{FaultError, FaultResult};
use crate::notify::Notifier;
use crate::record::{FailureRecord, FailureReport};
use crate::store::FailureStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug)]
enum Command {
    Report(FailureReport),
    Close(oneshot::Sender<()>),
}

/// Fire-and-forget failure routing with deduplication and alerting.
pub struct FailureRouter {
    sender: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl FailureRouter {
    /// Start a router worker over the given store and notifier.
    ///
    /// # Errors
    /// Returns [`FaultError::InvalidConfiguration`] if the configuration
    /// fails validation.
    pub fn new(
        config: FaultRouterConfig,
        store: Arc<dyn FailureStore>,
        notifier: Arc<dyn Notifier>,
    ) -> FaultResult<Self> {
        config.validate().map_err(FaultError::InvalidConfiguration)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = RouterWorker {
            receiver,
            store,
            notifier,
            config,
        };
        Ok(Self {
            sender,
            worker: tokio::spawn(worker.run()),
        })
    }

    /// Queue one failure for routing.
    ///
    /// Never blocks and never fails the caller; a report arriving after
    /// shutdown is logged and dropped.
    pub fn route(&self, report: FailureReport) {
        if let Err(rejected) = self.sender.send(Command::Report(report)) {
            if let Command::Report(report) = rejected.0 {
                warn!(
                    service = %report.service,
                    operation = %report.operation,
                    "failure router is shut down, dropping report"
                );
            }
        }
    }

    /// Drain queued reports and stop the worker.
    ///
    /// Returns once every report routed before this call has been processed.
    pub async fn close(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Command::Close(ack)).is_err() {
            return;
        }
        // An error here means the worker exited while draining; either way
        // nothing remains queued.
        let _ = done.await;
    }
}

impl std::fmt::Debug for FailureRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureRouter").finish_non_exhaustive()
    }
}

impl Drop for FailureRouter {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

struct RouterWorker {
    receiver: mpsc::UnboundedReceiver<Command>,
    store: Arc<dyn FailureStore>,
    notifier: Arc<dyn Notifier>,
    config: FaultRouterConfig,
}

impl RouterWorker {
    async fn run(mut self) {
        debug!("failure router worker started");
        while let Some(command) = self.receiver.recv().await {
            match command {
                Command::Report(report) => self.process(report).await,
                Command::Close(ack) => {
                    // Refuse new sends, then drain whatever is still queued.
                    self.receiver.close();
                    while let Some(Command::Report(report)) = self.receiver.recv().await {
                        self.process(report).await;
                    }
                    let _ = ack.send(());
                    break;
                }
            }
        }
        debug!("failure router worker stopped");
    }

    async fn process(&self, report: FailureReport) {
        let ttl = self.config.record_ttl();
        let hash = report.dedup_hash();

        let existing = match self.store.find_by_hash(&hash).await {
            Ok(found) => found.filter(|record| !record.is_expired()),
            Err(err) => {
                warn!(dedup_hash = %hash, error = %err, "failure store lookup failed");
                None
            }
        };

        let mut record = match existing {
            Some(mut record) => {
                record.observe_again(ttl);
                record
            }
            None => {
                let severity = self
                    .config
                    .severity
                    .severity_for(&report.service, report.kind);
                FailureRecord::new(&report, severity, ttl)
            }
        };

        // One alert per live record; an alert that failed to go out leaves
        // the flag unset so the next occurrence tries again.
        if record.severity.should_notify() && !record.notified {
            let summary = format!(
                "{} {} failing with {} (occurrences: {})",
                record.service, record.operation, record.error_kind, record.occurrence_count
            );
            match self
                .notifier
                .notify(record.severity, &summary, &record.context)
                .await
            {
                Ok(()) => record.notified = true,
                Err(err) => {
                    warn!(
                        dedup_hash = %record.dedup_hash,
                        error = %err,
                        "failure notification did not go out"
                    );
                }
            }
        }

        // Persistence is attempted regardless of how notification went.
        if let Err(err) = self.store.upsert(&record).await {
            warn!(
                dedup_hash = %record.dedup_hash,
                error = %err,
                "failed to persist failure record"
            );
        }
    }
}
