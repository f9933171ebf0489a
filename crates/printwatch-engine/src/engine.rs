//! The poll scheduler task and the handle consumers hold.
//!
//! State machine: `Idle → Scheduled → Fetching → Scheduled ...`. A swap may
//! happen in any phase; it bumps the generation so a fetch started against
//! the old adapter can never be applied, even if its completion is already
//! queued.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use printwatch_adapters::PrinterAdapter;
use printwatch_core::{BackoffTracker, FailureKind, FetchError, PollRecord, StatusSnapshot};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::config::{EngineConfig, bound_interval};
use crate::update::{EngineCommand, EnginePhase, StatusUpdate};

// ─── Handle ───────────────────────────────────────────────────────

/// Handle to a running engine task.
///
/// Every method only enqueues a command; the task applies them in order.
/// Dropping the handle stops the engine, as does dropping the update
/// receiver returned by [`start`](Self::start).
pub struct PollEngine {
    commands: mpsc::UnboundedSender<EngineCommand>,
    phase: watch::Receiver<EnginePhase>,
    task: JoinHandle<()>,
}

impl PollEngine {
    /// Spawn the engine on the current tokio runtime. The first fetch is
    /// issued immediately.
    pub fn start(
        adapter: Arc<dyn PrinterAdapter>,
        mut config: EngineConfig,
    ) -> (Self, mpsc::UnboundedReceiver<StatusUpdate>) {
        config.poll_interval = bound_interval(config.poll_interval);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(EnginePhase::Idle);

        let (engine_loop, completions) = EngineLoop::new(adapter, config, update_tx, phase_tx);
        let task = tokio::spawn(engine_loop.run(command_rx, completions));

        let engine = Self {
            commands: command_tx,
            phase: phase_rx,
            task,
        };
        (engine, update_rx)
    }

    /// Fetch now instead of waiting for the timer. Ignored while a fetch is
    /// in flight; does not reset backoff.
    pub fn poll_now(&self) {
        self.send(EngineCommand::PollNow);
    }

    /// Switch to another backend. Any in-flight fetch is cancelled and its
    /// result discarded; backoff and `last_ok`/`last_error` start over.
    pub fn swap_adapter(&self, adapter: Arc<dyn PrinterAdapter>) {
        self.send(EngineCommand::Swap(adapter));
    }

    /// Change the healthy poll cadence, effective from the next success.
    pub fn set_interval(&self, interval: Duration) {
        self.send(EngineCommand::SetInterval(interval));
    }

    pub fn phase(&self) -> EnginePhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<EnginePhase> {
        self.phase.clone()
    }

    /// Stop the task and wait for it to exit. Cancels any in-flight fetch.
    pub async fn stop(self) {
        self.send(EngineCommand::Stop);
        if let Err(e) = self.task.await {
            tracing::warn!("poll engine task ended abnormally: {e}");
        }
    }

    fn send(&self, command: EngineCommand) {
        if let Err(e) = self.commands.send(command) {
            tracing::debug!("poll engine already stopped, dropping {:?}", e.0);
        }
    }
}

// ─── Engine task ──────────────────────────────────────────────────

/// Result of one spawned fetch, tagged with the generation it ran under.
#[derive(Debug)]
struct Completion {
    generation: u64,
    result: Result<StatusSnapshot, FetchError>,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Sole owner of the scheduling state.
struct EngineLoop {
    adapter: Arc<dyn PrinterAdapter>,
    config: EngineConfig,
    backoff: BackoffTracker,
    record: PollRecord,
    generation: u64,
    in_flight: Option<InFlight>,
    deadline: Option<Instant>,
    updates: mpsc::UnboundedSender<StatusUpdate>,
    phase: watch::Sender<EnginePhase>,
    completion_tx: mpsc::UnboundedSender<Completion>,
}

impl EngineLoop {
    fn new(
        adapter: Arc<dyn PrinterAdapter>,
        config: EngineConfig,
        updates: mpsc::UnboundedSender<StatusUpdate>,
        phase: watch::Sender<EnginePhase>,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let backoff = BackoffTracker::new(config.backoff.clone());
        let engine_loop = Self {
            adapter,
            config,
            backoff,
            record: PollRecord::new(),
            generation: 0,
            in_flight: None,
            deadline: None,
            updates,
            phase,
            completion_tx,
        };
        (engine_loop, completion_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<EngineCommand>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        tracing::info!(
            backend = self.adapter.name(),
            "poll engine started (interval {:.1}s)",
            self.config.poll_interval.as_secs_f64()
        );
        self.arm(Duration::ZERO);

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(EngineCommand::PollNow) => self.poll_now(),
                    Some(EngineCommand::Swap(adapter)) => self.swap(adapter),
                    Some(EngineCommand::SetInterval(interval)) => self.set_interval(interval),
                    Some(EngineCommand::Stop) | None => break,
                },
                Some(done) = completions.recv() => {
                    if !self.complete(done) {
                        tracing::info!("status consumer went away, stopping poll engine");
                        break;
                    }
                }
                () = wait_until(self.deadline) => self.begin_fetch(),
            }
        }

        self.shutdown();
    }

    fn arm(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
        self.set_phase(EnginePhase::Scheduled);
    }

    fn set_phase(&self, phase: EnginePhase) {
        self.phase.send_replace(phase);
    }

    fn poll_now(&mut self) {
        if self.in_flight.is_some() {
            tracing::debug!("poll now ignored, fetch already in flight");
            return;
        }
        tracing::debug!("poll now");
        self.begin_fetch();
    }

    fn set_interval(&mut self, interval: Duration) {
        self.config.poll_interval = bound_interval(interval);
        tracing::info!(
            "poll interval set to {:.1}s",
            self.config.poll_interval.as_secs_f64()
        );
    }

    /// Spawn one fetch under the current generation, bounded by the outer
    /// deadline.
    fn begin_fetch(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        self.deadline = None;

        let generation = self.generation;
        let adapter = Arc::clone(&self.adapter);
        let fetch_deadline = self.config.fetch_deadline;
        let completions = self.completion_tx.clone();

        let handle = tokio::spawn(async move {
            let fetch = AssertUnwindSafe(adapter.fetch()).catch_unwind();
            let result = match tokio::time::timeout(fetch_deadline, fetch).await {
                Ok(Ok(result)) => result,
                Ok(Err(panic)) => {
                    let reason = panic_reason(panic.as_ref());
                    tracing::error!(
                        backend = adapter.name(),
                        "adapter panicked during fetch: {reason}"
                    );
                    Err(FetchError::Transport(format!("adapter panicked: {reason}")))
                }
                Err(_) => Err(FetchError::Timeout(fetch_deadline)),
            };
            let _ = completions.send(Completion { generation, result });
        });

        self.in_flight = Some(InFlight { generation, handle });
        self.set_phase(EnginePhase::Fetching);
    }

    /// Apply a finished fetch. Returns `false` once nobody is listening.
    fn complete(&mut self, done: Completion) -> bool {
        if done.generation != self.generation {
            tracing::debug!(
                "discarding completion from generation {} (current {})",
                done.generation,
                self.generation
            );
            return true;
        }
        self.in_flight = None;

        let update = match done.result {
            Ok(snapshot) => {
                self.backoff.record_success();
                self.record.record_success(Utc::now());
                tracing::debug!(backend = self.adapter.name(), "poll ok: {}", snapshot.state);
                self.arm(self.config.poll_interval);
                StatusUpdate {
                    snapshot: self.record.apply(snapshot),
                    failure: None,
                }
            }
            Err(err) => {
                let kind = err.kind();
                let delay = self.backoff.record_failure();
                let delay = self.backoff.policy().with_jitter(delay, &mut rand::rng());
                self.log_failure(&err, delay);
                self.record.record_failure(&err.to_string());
                self.arm(delay);
                StatusUpdate {
                    snapshot: self.record.apply(StatusSnapshot::new(kind.snapshot_state())),
                    failure: Some(kind),
                }
            }
        };

        self.updates.send(update).is_ok()
    }

    fn log_failure(&self, err: &FetchError, retry_in: Duration) {
        let backend = self.adapter.name();
        let failures = self.backoff.consecutive_failures();
        let retry_in_s = retry_in.as_secs_f64();
        match err.kind() {
            // Kept apart from connectivity noise: usually a firmware or parser bug.
            FailureKind::Parse => tracing::warn!(
                backend,
                failures,
                "unexpected payload from printer, retrying in {retry_in_s:.1}s: {err}"
            ),
            _ => tracing::warn!(
                backend,
                failures,
                "poll failed, retrying in {retry_in_s:.1}s: {err}"
            ),
        }
    }

    fn swap(&mut self, adapter: Arc<dyn PrinterAdapter>) {
        self.cancel_in_flight();
        self.generation = self.generation.wrapping_add(1);
        tracing::info!(
            from = self.adapter.name(),
            to = adapter.name(),
            generation = self.generation,
            "swapping printer adapter"
        );
        self.adapter = adapter;
        self.backoff.reset();
        self.record.reset();
        self.arm(self.config.poll_interval);
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
            tracing::debug!(
                "cancelled in-flight fetch (generation {})",
                in_flight.generation
            );
        }
    }

    fn shutdown(&mut self) {
        self.cancel_in_flight();
        self.deadline = None;
        self.set_phase(EnginePhase::Stopped);
        tracing::info!("poll engine stopped");
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown cause"
    }
}

/// Sleep until `deadline`, or forever when no timer is armed.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use printwatch_core::{BackoffPolicy, PrinterStatus};

    struct IdleAdapter;

    #[async_trait]
    impl PrinterAdapter for IdleAdapter {
        fn name(&self) -> &'static str {
            "idle"
        }

        async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
            Ok(StatusSnapshot::new(PrinterStatus::Idle))
        }
    }

    fn engine_loop() -> (
        EngineLoop,
        mpsc::UnboundedReceiver<StatusUpdate>,
        watch::Receiver<EnginePhase>,
    ) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(EnginePhase::Idle);
        let config = EngineConfig::default().with_backoff(BackoffPolicy {
            jitter_fraction: 0.0,
            ..BackoffPolicy::default()
        });
        let (engine_loop, _completions) =
            EngineLoop::new(Arc::new(IdleAdapter), config, update_tx, phase_tx);
        (engine_loop, update_rx, phase_rx)
    }

    fn failed(generation: u64) -> Completion {
        Completion {
            generation,
            result: Err(FetchError::Transport("connection refused".into())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_completion_is_ignored() {
        let (mut engine, mut updates, _phase) = engine_loop();
        engine.generation = 3;

        assert!(engine.complete(failed(2)));
        assert!(updates.try_recv().is_err());
        assert_eq!(engine.backoff.consecutive_failures(), 0);
        assert_eq!(engine.record.last_error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_interval_is_capped_at_one_day() {
        let (mut engine, mut updates, _phase) = engine_loop();
        engine.set_interval(Duration::MAX);

        assert!(engine.complete(Completion {
            generation: 0,
            result: Ok(StatusSnapshot::new(PrinterStatus::Idle)),
        }));
        assert!(updates.try_recv().is_ok());
        assert_eq!(
            engine.deadline,
            Some(Instant::now() + Duration::from_secs(86_400))
        );
    }

    #[test]
    fn panic_reason_reads_str_and_string_payloads() {
        let text: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_reason(text.as_ref()), "boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bad payload"));
        assert_eq!(panic_reason(owned.as_ref()), "bad payload");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_reason(other.as_ref()), "unknown cause");
    }

    #[tokio::test(start_paused = true)]
    async fn current_failure_is_applied() {
        let (mut engine, mut updates, phase) = engine_loop();

        assert!(engine.complete(failed(0)));
        let update = updates.try_recv().expect("update emitted");
        assert_eq!(update.failure, Some(FailureKind::Transport));
        assert_eq!(update.snapshot.state, PrinterStatus::Offline);
        assert_eq!(
            update.snapshot.last_error(),
            Some("printer unreachable: connection refused")
        );
        assert_eq!(engine.backoff.consecutive_failures(), 1);
        assert_eq!(*phase.borrow(), EnginePhase::Scheduled);
        assert_eq!(
            engine.deadline,
            Some(Instant::now() + Duration::from_secs(3))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn swap_resets_backoff_and_record() {
        let (mut engine, _updates, _phase) = engine_loop();
        engine.complete(failed(0));
        engine.complete(failed(0));
        assert_eq!(engine.backoff.consecutive_failures(), 2);

        engine.swap(Arc::new(IdleAdapter));
        assert_eq!(engine.generation, 1);
        assert_eq!(engine.backoff.consecutive_failures(), 0);
        assert_eq!(engine.record, PollRecord::new());
        assert_eq!(
            engine.deadline,
            Some(Instant::now() + engine.config.poll_interval)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completion_after_swap_is_dropped() {
        let (mut engine, mut updates, _phase) = engine_loop();
        engine.begin_fetch();
        let started_under = engine.generation;
        engine.swap(Arc::new(IdleAdapter));

        assert!(engine.complete(Completion {
            generation: started_under,
            result: Ok(StatusSnapshot::new(PrinterStatus::Printing)),
        }));
        assert!(updates.try_recv().is_err());
        assert!(engine.record.last_ok().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_receiver_reports_false() {
        let (mut engine, updates, _phase) = engine_loop();
        drop(updates);
        assert!(!engine.complete(Completion {
            generation: 0,
            result: Ok(StatusSnapshot::new(PrinterStatus::Idle)),
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_now_does_not_double_fetch() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(Arc<AtomicUsize>);

        #[async_trait]
        impl PrinterAdapter for Counting {
            fn name(&self) -> &'static str {
                "counting"
            }

            async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(StatusSnapshot::new(PrinterStatus::Idle))
            }
        }

        let (mut engine, _updates, phase) = engine_loop();
        let calls = Arc::new(AtomicUsize::new(0));
        engine.adapter = Arc::new(Counting(Arc::clone(&calls)));

        engine.begin_fetch();
        engine.poll_now();
        engine.poll_now();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(engine.in_flight.is_some());
        assert_eq!(*phase.borrow(), EnginePhase::Fetching);
    }
}
