use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::progress::{PROGRESS_CAPACITY, ProgressEvent};
use crate::core::workflow::{MigrationRequest, Workflow, WorkflowReport};
use crate::providers::RemoteHost;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("a migration is already running; wait for it to finish")]
pub struct AlreadyRunning;

/// Starts migrations, refusing a second one while the first is still going.
#[derive(Clone)]
pub struct MigrationRunner {
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when the worker task ends, however it ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A live run: the event stream plus the handle to await the report.
pub struct RunningMigration {
    pub events: mpsc::Receiver<ProgressEvent>,
    handle: JoinHandle<WorkflowReport>,
}

impl RunningMigration {
    /// Waits for the worker to finish and returns its report.
    pub async fn wait(self) -> Result<WorkflowReport> {
        self.handle.await.context("migration worker panicked")
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the pipeline on a worker task. Returns `AlreadyRunning` when a
    /// previous run has not finished yet.
    pub fn try_start(
        &self,
        request: MigrationRequest,
        host: Arc<dyn RemoteHost>,
    ) -> Result<RunningMigration, AlreadyRunning> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AlreadyRunning);
        }

        let guard = BusyGuard(Arc::clone(&self.busy));
        let (tx, rx) = mpsc::channel(PROGRESS_CAPACITY);
        debug!("starting migration worker for '{}'", request.name);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            Workflow::new(request, tx).run(host.as_ref()).await
        });

        Ok(RunningMigration { events: rx, handle })
    }
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}
