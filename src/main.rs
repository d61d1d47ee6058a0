mod cli;

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use import_mend::config::MendConfig;
use import_mend::queue::{MovePipeline, MoveQueue, MoveReport};
use import_mend::specifier;
use import_mend::watcher::batcher::EventBatcher;
use import_mend::watcher::event::FsEvent;
use import_mend::watcher::extract::{self, MoveKind, MoveOperation, MoveOutcome};
use import_mend::watcher::start_watcher;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { path, quiet_ms } => run_watch(&path, quiet_ms).await,
        Commands::Apply {
            path,
            from,
            to,
            dry_run,
            json,
        } => run_apply(&path, from, to, dry_run, json),
    }
}

async fn run_watch(path: &Path, quiet_ms: Option<u64>) -> Result<()> {
    let root = project_root(path)?;
    let mut config = MendConfig::load(&root);
    if quiet_ms.is_some() {
        config.quiet_ms = quiet_ms;
    }

    let (_watcher, events) = start_watcher(&root, &config)?;
    let (batcher, batches) = EventBatcher::new(config.quiet_period());
    let queue = MoveQueue::new(MovePipeline::new(root.clone(), config));

    info!(root = %root.display(), "watching for file moves (ctrl-c to stop)");

    pump_events(events, batcher, batches, &queue, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;

    info!("shutting down");
    queue.shutdown().await;
    Ok(())
}

/// Drive the watch pipeline until `stop` resolves: forward raw events into
/// the batcher, correlate completed batches, and enqueue resolved moves.
///
/// Tickets are awaited on spawned tasks, never inline: a running pipeline
/// must not stall event intake, or bursts belonging to separate moves pile
/// up in the channel and merge into one undecidable batch. The queue already
/// serializes processing in submission order.
async fn pump_events(
    mut events: mpsc::UnboundedReceiver<FsEvent>,
    batcher: EventBatcher,
    mut batches: mpsc::Receiver<Vec<FsEvent>>,
    queue: &MoveQueue,
    stop: impl Future<Output = ()>,
) {
    tokio::pin!(stop);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                batcher.add(event);
            }
            Some(batch) = batches.recv() => {
                match extract::extract_move(&batch) {
                    MoveOutcome::Resolved(op) => {
                        info!(from = %op.from.display(), to = %op.to.display(), "detected move");
                        let ticket = queue.handle_move(op);
                        tokio::spawn(async move {
                            if let Ok(report) = ticket.wait().await {
                                print_report(&report);
                            }
                        });
                    }
                    MoveOutcome::Declined(reason) => {
                        debug!(%reason, "batch did not describe a move");
                    }
                }
            }
            _ = &mut stop => break,
        }
    }
}

fn run_apply(path: &Path, from: PathBuf, to: PathBuf, dry_run: bool, json: bool) -> Result<()> {
    let root = project_root(path)?;
    let from = absolutize(&root, from);
    let to = absolutize(&root, to);

    if !to.exists() {
        bail!(
            "destination {} does not exist (apply expects the move to have already happened)",
            to.display()
        );
    }

    let op = MoveOperation {
        kind: if to.is_dir() {
            MoveKind::Folder
        } else {
            MoveKind::File
        },
        from,
        to,
    };

    let config = MendConfig::load(&root);
    let pipeline = MovePipeline::new(root, config);

    if dry_run {
        let report = pipeline.plan(&op)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report.edit_groups)?);
        } else {
            for group in &report.edit_groups {
                println!("{}:", group.path.display());
                for edit in &group.edits {
                    println!(
                        "  {}:{}-{}:{} -> {}",
                        edit.start.line, edit.start.column, edit.end.line, edit.end.column,
                        edit.new_text
                    );
                }
            }
            println!(
                "{} file(s) would change, {} unresolved repair(s).",
                report.edit_groups.len(),
                report.unresolved.len()
            );
        }
        return Ok(());
    }

    let report = pipeline.process(&op)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &MoveReport) {
    println!(
        "Rewrote {} import(s) across {} file(s).",
        report.edits_applied, report.files_changed
    );
    if report.unresolved_repairs > 0 {
        println!("{} import(s) left untouched (no repair target).", report.unresolved_repairs);
    }
    for failed in &report.failed_files {
        println!("Failed to update {}.", failed.display());
    }
}

fn project_root(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(specifier::normalize(&absolutize(&cwd, path.to_path_buf())))
}

/// Make a user-supplied path absolute against `base` without touching the
/// filesystem — the pre-move path no longer exists, so canonicalization is
/// not an option.
fn absolutize(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        specifier::normalize(&path)
    } else {
        specifier::normalize(&base.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::oneshot;

    use import_mend::apply::{EditSink, FsEditSink};
    use import_mend::rewrite::editor::TextEdit;

    /// Sink that stalls before writing, keeping a pipeline run in flight
    /// while further watcher events arrive.
    struct SlowSink;

    impl EditSink for SlowSink {
        fn apply(&self, path: &Path, edits: &[TextEdit]) -> anyhow::Result<()> {
            std::thread::sleep(Duration::from_millis(200));
            FsEditSink.apply(path, edits)
        }
    }

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_event_intake_stays_responsive_while_move_processes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let app = write(
            &root,
            "src/app.ts",
            "import { a } from './a';\nimport { b } from './b';\n",
        );
        write(&root, "src/lib/a.ts", "export const a = 1;\n");
        write(&root, "src/lib/b.ts", "export const b = 2;\n");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (batcher, batches) = EventBatcher::new(Duration::from_millis(25));
        let queue = MoveQueue::new(
            MovePipeline::new(root.clone(), MendConfig::default()).with_sink(Arc::new(SlowSink)),
        );
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        // Two bursts far enough apart to batch separately, the second landing
        // while the first move is still in the pipeline. If intake stalls on
        // the running move, the bursts merge into one undecidable batch and
        // neither import gets rewritten.
        let feeder = {
            let root = root.clone();
            tokio::spawn(async move {
                let _ = events_tx.send(FsEvent::delete(root.join("src/a.ts")));
                let _ = events_tx.send(FsEvent::create(root.join("src/lib/a.ts")));
                tokio::time::sleep(Duration::from_millis(100)).await;
                let _ = events_tx.send(FsEvent::delete(root.join("src/b.ts")));
                let _ = events_tx.send(FsEvent::create(root.join("src/lib/b.ts")));
                tokio::time::sleep(Duration::from_millis(600)).await;
                let _ = stop_tx.send(());
            })
        };

        pump_events(events_rx, batcher, batches, &queue, async {
            let _ = stop_rx.await;
        })
        .await;
        feeder.await.unwrap();

        assert_eq!(
            fs::read_to_string(&app).unwrap(),
            "import { a } from './lib/a';\nimport { b } from './lib/b';\n"
        );
        queue.shutdown().await;
    }
}
