use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::event::FsEvent;

/// Default quiet period before a batch of filesystem events is considered
/// complete.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Coalesces bursts of raw create/delete notifications into single batches.
///
/// Every [`add`](EventBatcher::add) buffers the event and restarts the quiet
/// period timer; when the timer elapses with no further events, the whole
/// buffer is sent as one batch. A trailing event never splits a batch — it
/// restarts the timer instead. No bound is imposed on the buffer; a
/// pathological burst produces one large batch.
///
/// Dropping the batcher cancels any pending timer without flushing.
pub struct EventBatcher {
    tx: mpsc::UnboundedSender<FsEvent>,
    _task: JoinHandle<()>,
}

impl EventBatcher {
    /// Spawn the batching task. Batches arrive on the returned receiver.
    pub fn new(quiet_period: Duration) -> (Self, mpsc::Receiver<Vec<FsEvent>>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<FsEvent>();
        let (batch_tx, batch_rx) = mpsc::channel::<Vec<FsEvent>>(16);

        let task = tokio::spawn(async move {
            loop {
                // Wait for the first event of the next batch.
                let Some(first) = rx.recv().await else {
                    return; // disposed
                };
                let mut buffer = vec![first];

                loop {
                    let timer = tokio::time::sleep(quiet_period);
                    tokio::pin!(timer);
                    tokio::select! {
                        event = rx.recv() => match event {
                            // A fresh sleep is created on the next iteration,
                            // which is the timer reset.
                            Some(event) => buffer.push(event),
                            // Disposed mid-batch: drop the pending buffer.
                            None => return,
                        },
                        _ = &mut timer => {
                            if batch_tx.send(buffer).await.is_err() {
                                return; // receiver gone
                            }
                            break;
                        }
                    }
                }
            }
        });

        (Self { tx, _task: task }, batch_rx)
    }

    /// Append an event to the current batch and restart the quiet period.
    pub fn add(&self, event: FsEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_batch() {
        let (batcher, mut batches) = EventBatcher::new(DEFAULT_QUIET_PERIOD);
        batcher.add(FsEvent::delete("/p/a.ts"));
        batcher.add(FsEvent::create("/p/lib/a.ts"));

        let batch = batches.recv().await.expect("batch");
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_during_quiet_period_restarts_timer() {
        let (batcher, mut batches) = EventBatcher::new(Duration::from_millis(100));
        batcher.add(FsEvent::delete("/p/a.ts"));
        // Keep poking the batcher before the quiet period elapses.
        for i in 0..5 {
            tokio::time::sleep(Duration::from_millis(60)).await;
            assert!(batches.try_recv().is_err(), "batch fired early at step {i}");
            batcher.add(FsEvent::create(format!("/p/{i}.ts")));
        }

        let batch = batches.recv().await.expect("batch");
        assert_eq!(batch.len(), 6, "one batch, never split");
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_bursts_form_separate_batches() {
        let (batcher, mut batches) = EventBatcher::new(Duration::from_millis(100));
        batcher.add(FsEvent::delete("/p/a.ts"));
        let first = batches.recv().await.expect("first batch");
        assert_eq!(first.len(), 1);

        batcher.add(FsEvent::create("/p/b.ts"));
        let second = batches.recv().await.expect("second batch");
        assert_eq!(second.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_batch() {
        let (batcher, mut batches) = EventBatcher::new(Duration::from_millis(100));
        batcher.add(FsEvent::delete("/p/a.ts"));
        drop(batcher);
        assert!(batches.recv().await.is_none(), "pending batch must not flush");
    }
}
