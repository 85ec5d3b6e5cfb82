//! Run controller
//!
//! Owns the single active run: the active flag, the cancellation token and
//! the worker task that wraps the whole queue in its top-level repeats.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::action::Instrument;
use crate::error::Result;
use crate::queue::{Program, Queue};

use super::cancel::CancelToken;
use super::interpreter::Interpreter;
use super::pacing;
use super::report::RunReport;

/// What a call to [`RunController::start`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A worker was spawned
    Started,
    /// Another run is still in progress; nothing changed
    AlreadyActive,
    /// The queue has no items; nothing changed
    EmptyQueue,
}

/// Clears the active flag when the worker exits, however it exits
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct RunController {
    instrument: Arc<dyn Instrument>,
    active: Arc<AtomicBool>,
    cancel: Mutex<Option<CancelToken>>,
    handle: Mutex<Option<JoinHandle<RunReport>>>,
}

impl RunController {
    pub fn new(instrument: Arc<dyn Instrument>) -> Self {
        Self {
            instrument,
            active: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// True while a worker is running
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start running `queue` `top_count` times, each repetition padded to
    /// `top_interval`.
    ///
    /// Returns without doing anything when a run is already active or the
    /// queue is empty. A queue with unbalanced markers is an error and never
    /// starts.
    pub async fn start(&self, queue: &Queue, top_count: u32, top_interval: Duration) -> Result<StartOutcome> {
        if queue.is_empty() {
            tracing::info!("Queue is empty, nothing to run");
            return Ok(StartOutcome::EmptyQueue);
        }
        let program = queue.compile()?;

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!("A run is already active, ignoring start request");
            return Ok(StartOutcome::AlreadyActive);
        }

        let cancel = CancelToken::new();
        *self.cancel.lock().await = Some(cancel.clone());

        let guard = ActiveGuard(self.active.clone());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            run_repetitions(program, top_count, top_interval, cancel).await
        });
        *self.handle.lock().await = Some(handle);
        Ok(StartOutcome::Started)
    }

    /// Request the active run to stop and halt the instrument.
    ///
    /// Does not wait for the worker; use [`RunController::wait`] for that.
    pub async fn stop(&self) {
        if let Some(cancel) = self.cancel.lock().await.as_ref() {
            cancel.cancel();
        }
        tracing::info!("Stop requested");
        if let Err(e) = self.instrument.halt().await {
            tracing::warn!("Failed to halt instrument: {}", e);
        }
    }

    /// Wait for the current worker to finish and return its report.
    ///
    /// `None` when no run was started or the report was already collected.
    pub async fn wait(&self) -> Option<RunReport> {
        let handle = self.handle.lock().await.take()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!("Run worker failed: {}", e);
                None
            }
        }
    }
}

async fn run_repetitions(
    program: Program,
    top_count: u32,
    top_interval: Duration,
    cancel: CancelToken,
) -> RunReport {
    let started_at = Utc::now();
    let run_started = Instant::now();
    let interpreter = Interpreter::new(cancel.clone());
    let mut repetitions = 0;

    tracing::info!(
        repeats = top_count,
        interval_secs = top_interval.as_secs_f64(),
        "Starting run at {}",
        started_at.format("%Y-%m-%d %H:%M:%S")
    );

    for repetition in 1..=top_count {
        if cancel.is_cancelled() {
            break;
        }
        let started = Instant::now();
        tracing::debug!(repetition, "Top-level repetition");

        interpreter.run(program.nodes(), 0).await;
        if cancel.is_cancelled() {
            break;
        }
        repetitions += 1;

        let elapsed = started.elapsed();
        match pacing::remaining(top_interval, elapsed) {
            Some(wait) => {
                tracing::info!(
                    depth = 0,
                    wait_ms = wait.as_millis() as u64,
                    "Waiting {:.2} seconds for main loop interval",
                    wait.as_secs_f64()
                );
                if !cancel.sleep(wait).await {
                    break;
                }
            }
            None if pacing::overran(top_interval, elapsed) => {
                tracing::warn!(
                    depth = 0,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Not waiting, the main loop took {:.2} seconds",
                    elapsed.as_secs_f64()
                );
            }
            None => {}
        }
    }

    let report = RunReport {
        started_at,
        elapsed: run_started.elapsed(),
        repetitions,
        cancelled: cancel.is_cancelled(),
        stats: interpreter.stats(),
    };
    tracing::info!(
        elapsed_ms = report.elapsed.as_millis() as u64,
        repetitions = report.repetitions,
        cancelled = report.cancelled,
        "Main loop completed or stopped"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{FnAction, NullInstrument};
    use crate::error::LooperError;
    use crate::queue::QueueItem;
    use std::sync::atomic::AtomicU32;

    fn counting_queue(counter: &Arc<AtomicU32>) -> Queue {
        let c = counter.clone();
        Queue::new().with(QueueItem::action(
            "count",
            FnAction::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        ))
    }

    fn controller() -> RunController {
        RunController::new(Arc::new(NullInstrument))
    }

    #[tokio::test]
    async fn test_runs_top_level_repetitions() {
        let counter = Arc::new(AtomicU32::new(0));
        let controller = controller();

        let outcome = controller
            .start(&counting_queue(&counter), 3, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(outcome, StartOutcome::Started);

        let report = controller.wait().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(report.repetitions, 3);
        assert!(!report.cancelled);
        assert_eq!(report.stats.actions_run, 3);
        assert!(!controller.is_active());
    }

    #[tokio::test]
    async fn test_empty_queue_is_noop() {
        let controller = controller();
        let outcome = controller.start(&Queue::new(), 1, Duration::ZERO).await.unwrap();
        assert_eq!(outcome, StartOutcome::EmptyQueue);
        assert!(!controller.is_active());
        assert!(controller.wait().await.is_none());
    }

    #[tokio::test]
    async fn test_unbalanced_queue_rejected() {
        let controller = controller();
        let queue = Queue::new().with(QueueItem::loop_start(2, Duration::ZERO, None).unwrap());
        let err = controller.start(&queue, 1, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, LooperError::UnbalancedQueue { index: 0, .. }));
        assert!(!controller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_active_is_noop() {
        let counter = Arc::new(AtomicU32::new(0));
        let controller = controller();
        let queue = counting_queue(&counter);

        controller.start(&queue, 2, Duration::from_secs(60)).await.unwrap();
        let second = controller.start(&queue, 2, Duration::from_secs(60)).await.unwrap();
        assert_eq!(second, StartOutcome::AlreadyActive);

        let report = controller.wait().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(report.repetitions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_top_interval_pads_repetitions() {
        let counter = Arc::new(AtomicU32::new(0));
        let controller = controller();
        controller
            .start(&counting_queue(&counter), 2, Duration::from_secs(10))
            .await
            .unwrap();

        let report = controller.wait().await.unwrap();
        // trailing wait after the last repetition is kept
        assert!(report.elapsed >= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_top_interval() {
        let counter = Arc::new(AtomicU32::new(0));
        let controller = controller();
        controller
            .start(&counting_queue(&counter), 5, Duration::from_secs(600))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.stop().await;

        let report = controller.wait().await.unwrap();
        assert!(report.cancelled);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(report.elapsed < Duration::from_secs(600));
        assert!(!controller.is_active());
    }

    #[tokio::test]
    async fn test_zero_repeats_runs_nothing() {
        let counter = Arc::new(AtomicU32::new(0));
        let controller = controller();
        controller
            .start(&counting_queue(&counter), 0, Duration::ZERO)
            .await
            .unwrap();
        let report = controller.wait().await.unwrap();
        assert_eq!(report.repetitions, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_can_start_again_after_finish() {
        let counter = Arc::new(AtomicU32::new(0));
        let controller = controller();
        let queue = counting_queue(&counter);

        controller.start(&queue, 1, Duration::ZERO).await.unwrap();
        controller.wait().await.unwrap();
        let outcome = controller.start(&queue, 1, Duration::ZERO).await.unwrap();
        assert_eq!(outcome, StartOutcome::Started);
        controller.wait().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
