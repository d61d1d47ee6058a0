use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::apply::{EditSink, FsEditSink};
use crate::config::MendConfig;
use crate::rewrite::{self, RewriteReport};
use crate::walker;
use crate::watcher::extract::MoveOperation;

/// Hook for keeping any downstream per-file state in sync with a processed
/// move. Called once per file-level sub-move after edits have been applied.
pub trait ProjectIndex: Send + Sync {
    fn invalidate(&self, path: &Path);
    fn reload(&self, path: &Path);
}

/// Default index: no downstream state to maintain.
pub struct NoopIndex;

impl ProjectIndex for NoopIndex {
    fn invalidate(&self, path: &Path) {
        tracing::debug!(path = %path.display(), "index invalidate");
    }
    fn reload(&self, path: &Path) {
        tracing::debug!(path = %path.display(), "index reload");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error(transparent)]
    Pipeline(#[from] anyhow::Error),
    /// The queue worker stopped before this move was processed.
    #[error("move queue closed")]
    QueueClosed,
}

/// Summary of one processed move operation.
#[derive(Debug, Default, Serialize)]
pub struct MoveReport {
    pub files_changed: usize,
    pub edits_applied: usize,
    pub unresolved_repairs: usize,
    pub conflicts: usize,
    /// Files whose edits could not be written. Failures are isolated; the
    /// remaining files are still rewritten.
    pub failed_files: Vec<PathBuf>,
}

/// The full rewrite pipeline for one move operation: walk the project, expand
/// the move into file-level sub-moves, compute edits, and apply them.
pub struct MovePipeline {
    project_root: PathBuf,
    config: MendConfig,
    sink: Arc<dyn EditSink>,
    index: Arc<dyn ProjectIndex>,
}

impl MovePipeline {
    pub fn new(project_root: PathBuf, config: MendConfig) -> Self {
        Self {
            project_root,
            config,
            sink: Arc::new(FsEditSink),
            index: Arc::new(NoopIndex),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EditSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_index(mut self, index: Arc<dyn ProjectIndex>) -> Self {
        self.index = index;
        self
    }

    /// Compute the edits a move requires without applying anything.
    pub fn plan(&self, op: &MoveOperation) -> Result<RewriteReport, MoveError> {
        let files = walker::walk_project(&self.project_root, &self.config)?;
        let moves = rewrite::moved_files_for(op, &files);
        Ok(rewrite::rewrite_project(&files, &moves))
    }

    /// Run the full pipeline for one move: plan, then apply each edit group.
    ///
    /// A sink failure on one file is recorded and does not stop the rest.
    pub fn process(&self, op: &MoveOperation) -> Result<MoveReport, MoveError> {
        let files = walker::walk_project(&self.project_root, &self.config)?;
        let moves = rewrite::moved_files_for(op, &files);
        let rewrite_report = rewrite::rewrite_project(&files, &moves);

        let mut report = MoveReport {
            unresolved_repairs: rewrite_report.unresolved.len(),
            conflicts: rewrite_report.conflicts,
            ..Default::default()
        };

        for group in &rewrite_report.edit_groups {
            match self.sink.apply(&group.path, &group.edits) {
                Ok(()) => {
                    report.files_changed += 1;
                    report.edits_applied += group.edits.len();
                }
                Err(err) => {
                    warn!(file = %group.path.display(), error = %err, "failed to apply edits");
                    report.failed_files.push(group.path.clone());
                }
            }
        }

        for moved in &moves {
            self.index.invalidate(&moved.from);
            self.index.reload(&moved.to);
        }

        info!(
            from = %op.from.display(),
            to = %op.to.display(),
            files_changed = report.files_changed,
            edits_applied = report.edits_applied,
            "processed move"
        );
        Ok(report)
    }
}

struct QueueItem {
    op: MoveOperation,
    done: oneshot::Sender<Result<MoveReport, MoveError>>,
}

/// Serializes move processing: one pipeline run at a time, in submission
/// order. A failure in one move never prevents the next from running.
pub struct MoveQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
    worker: tokio::task::JoinHandle<()>,
}

/// Receipt for a submitted move; await it with [`MoveTicket::wait`].
pub struct MoveTicket {
    rx: oneshot::Receiver<Result<MoveReport, MoveError>>,
}

impl MoveTicket {
    pub async fn wait(self) -> Result<MoveReport, MoveError> {
        self.rx.await.map_err(|_| MoveError::QueueClosed)?
    }
}

impl MoveQueue {
    pub fn new(pipeline: MovePipeline) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueueItem>();
        let pipeline = Arc::new(pipeline);
        let worker = tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                let pipeline = Arc::clone(&pipeline);
                let op = item.op.clone();
                // The pipeline is blocking (file walks, parsing, writes);
                // keep it off the async executor threads.
                let result = tokio::task::spawn_blocking(move || pipeline.process(&op))
                    .await
                    .unwrap_or_else(|join_err| Err(MoveError::Pipeline(join_err.into())));
                if let Err(err) = &result {
                    warn!(error = %err, "move processing failed");
                }
                let _ = item.done.send(result);
            }
        });
        Self { tx, worker }
    }

    /// Enqueue a move for processing. Returns immediately; the returned
    /// ticket resolves when the pipeline run completes.
    pub fn handle_move(&self, op: MoveOperation) -> MoveTicket {
        let (done, rx) = oneshot::channel();
        // If the worker already stopped, the dropped sender makes the ticket
        // resolve to QueueClosed.
        let _ = self.tx.send(QueueItem { op, done });
        MoveTicket { rx }
    }

    /// Stop the worker and reject anything still queued: pending tickets
    /// resolve with [`MoveError::QueueClosed`]. A move already handed to the
    /// pipeline runs to completion, though its ticket also reports closure.
    pub async fn shutdown(self) {
        drop(self.tx);
        self.worker.abort();
        let _ = self.worker.await;
    }
}
