//! Periodic ingestion scheduler
//!
//! Runs the [`IngestPipeline`] once at startup and then every interval, on
//! its own tokio task. A run that is due while the previous one is still in
//! flight is skipped rather than queued.
//!
//! ```text
//!            trigger (startup / interval due)
//!   ┌──────┐ ─────────────────────────────► ┌─────────┐
//!   │ Idle │                                │ Running │ ──┐ trigger: skipped
//!   └──────┘ ◄───────────────────────────── └─────────┘ ◄─┘
//!                    run finished
//! ```

use crate::config::{SchedulerConfig, MAX_INTERVAL_HOURS};
use crate::ingest::IngestPipeline;
use crate::types::IngestionRun;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Shortest polling period the loop accepts.
pub const MIN_POLL: Duration = Duration::from_millis(1);

/// Longest interval between runs (one year).
pub const MAX_INTERVAL: Duration = Duration::from_secs(MAX_INTERVAL_HOURS * 60 * 60);

/// Whether an ingestion run is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Result of asking the scheduler to start a run.
#[derive(Debug)]
pub enum TickOutcome {
    /// A run was started; the handle resolves to its summary
    Started(JoinHandle<IngestionRun>),
    /// A run was already in flight; nothing was started
    Skipped,
}

impl TickOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, TickOutcome::Started(_))
    }
}

/// Snapshot of scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub ticks_skipped: u64,
}

#[derive(Default)]
struct Counters {
    running: AtomicBool,
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    ticks_skipped: AtomicU64,
}

/// Clears the running flag when a run task ends, including by panic.
struct RunningGuard(Arc<Counters>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

/// Drives the ingestion pipeline on a fixed cadence.
///
/// Cloning shares the same pipeline and counters.
#[derive(Clone)]
pub struct Scheduler {
    pipeline: Arc<IngestPipeline>,
    interval: Duration,
    poll: Duration,
    run_at_startup: bool,
    counters: Arc<Counters>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<IngestPipeline>, config: &SchedulerConfig) -> Self {
        Self::with_timing(pipeline, config.interval(), config.poll_interval())
            .run_at_startup(config.run_at_startup)
    }

    /// Build a scheduler with explicit interval and polling granularity.
    ///
    /// `poll` is raised to [`MIN_POLL`] and `interval` capped at
    /// [`MAX_INTERVAL`], so due times never overflow and the ticker never
    /// gets a zero period.
    pub fn with_timing(pipeline: Arc<IngestPipeline>, interval: Duration, poll: Duration) -> Self {
        if poll < MIN_POLL || interval > MAX_INTERVAL {
            tracing::warn!(
                interval_secs = interval.as_secs(),
                poll_ms = poll.as_millis() as u64,
                "Scheduler timing out of range, clamping"
            );
        }
        Self {
            pipeline,
            interval: interval.min(MAX_INTERVAL),
            poll: poll.max(MIN_POLL),
            run_at_startup: true,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn run_at_startup(mut self, enabled: bool) -> Self {
        self.run_at_startup = enabled;
        self
    }

    pub fn state(&self) -> SchedulerState {
        if self.counters.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            runs_started: self.counters.runs_started.load(Ordering::Relaxed),
            runs_completed: self.counters.runs_completed.load(Ordering::Relaxed),
            ticks_skipped: self.counters.ticks_skipped.load(Ordering::Relaxed),
        }
    }

    /// Start a run now unless one is already in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn trigger(&self) -> TickOutcome {
        if self
            .counters
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.counters.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            tracing::info!("Ingestion run still in progress, skipping tick");
            return TickOutcome::Skipped;
        }

        let run_number = self.counters.runs_started.fetch_add(1, Ordering::Relaxed) + 1;
        let pipeline = Arc::clone(&self.pipeline);
        let counters = Arc::clone(&self.counters);

        let handle = tokio::spawn(async move {
            let _guard = RunningGuard(Arc::clone(&counters));
            tracing::info!(run_number, "Scheduled ingestion starting");
            let run = pipeline.run().await;
            counters.runs_completed.fetch_add(1, Ordering::Relaxed);
            run
        });

        TickOutcome::Started(handle)
    }

    /// Spawn the scheduling loop on its own task.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = self.clone();
        let join = tokio::spawn(self.run_loop(shutdown_rx));
        SchedulerHandle {
            scheduler,
            shutdown: shutdown_tx,
            join,
        }
    }

    async fn run_loop(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            poll_secs = self.poll.as_secs(),
            run_at_startup = self.run_at_startup,
            "Scheduler started"
        );

        let mut next_due = if self.run_at_startup {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };

        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    if now >= next_due {
                        // Advance even when skipped so a long run does not queue a retry
                        next_due = now + self.interval;
                        // The run task is detached; its summary is logged by the pipeline
                        let _ = self.trigger();
                    }
                }
                // Only `true` is ever sent; a dropped sender also means stop
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!("Scheduler stopped");
    }
}

/// Handle to a running scheduler loop.
pub struct SchedulerHandle {
    scheduler: Scheduler,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Stop the loop and wait for it to exit.
    ///
    /// An in-flight run is not cancelled; it finishes on its own task.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "Scheduler task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::error::Result;
    use crate::ingest::SourceAdapter;
    use crate::types::RawCandidate;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use url::Url;

    /// Blocks every fetch until released.
    struct GatedSource {
        base: Url,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl SourceAdapter for GatedSource {
        fn name(&self) -> &str {
            "Gated"
        }

        fn base_url(&self) -> &Url {
            &self.base
        }

        async fn fetch(&self) -> Result<Vec<RawCandidate>> {
            self.gate.notified().await;
            Ok(vec![RawCandidate {
                title: Some("Python Developer".to_string()),
                href: Some("/jobs/1".to_string()),
                ..Default::default()
            }])
        }
    }

    fn gated_pipeline() -> (Arc<IngestPipeline>, Arc<Notify>) {
        let store = Store::open_in_memory().unwrap();
        store.migrate().unwrap();
        let gate = Arc::new(Notify::new());
        let source = GatedSource {
            base: Url::parse("https://gated.example").unwrap(),
            gate: Arc::clone(&gate),
        };
        let pipeline = IngestPipeline::new(Arc::new(store), vec![Box::new(source)]);
        (Arc::new(pipeline), gate)
    }

    fn empty_pipeline() -> Arc<IngestPipeline> {
        let store = Store::open_in_memory().unwrap();
        store.migrate().unwrap();
        Arc::new(IngestPipeline::new(Arc::new(store), vec![]))
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_trigger_while_running_is_skipped() {
        let (pipeline, gate) = gated_pipeline();
        let scheduler =
            Scheduler::with_timing(pipeline, Duration::from_secs(3600), Duration::from_secs(60));

        let first = scheduler.trigger();
        assert!(first.is_started());
        assert_eq!(scheduler.state(), SchedulerState::Running);

        assert!(matches!(scheduler.trigger(), TickOutcome::Skipped));
        assert!(matches!(scheduler.trigger(), TickOutcome::Skipped));
        assert_eq!(
            scheduler.stats(),
            SchedulerStats {
                runs_started: 1,
                runs_completed: 0,
                ticks_skipped: 2,
            }
        );

        gate.notify_one();
        let TickOutcome::Started(handle) = first else {
            unreachable!()
        };
        let run = handle.await.unwrap();
        assert_eq!(run.listings_written, 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.stats().runs_completed, 1);

        // Idle again: the next trigger starts a new run
        let next = scheduler.trigger();
        assert!(next.is_started());
        gate.notify_one();
        if let TickOutcome::Started(handle) = next {
            handle.await.unwrap();
        }
        assert_eq!(scheduler.stats().runs_started, 2);
        assert_eq!(scheduler.stats().ticks_skipped, 2);
    }

    #[tokio::test]
    async fn test_loop_runs_once_at_startup() {
        let scheduler = Scheduler::with_timing(
            empty_pipeline(),
            Duration::from_secs(3600),
            Duration::from_millis(5),
        );
        let handle = scheduler.start();

        let observed = handle.scheduler().clone();
        wait_for(|| observed.stats().runs_completed == 1).await;

        // Many polls later the interval is still not due
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(observed.stats().runs_started, 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_loop_without_startup_run_waits_for_interval() {
        let scheduler = Scheduler::with_timing(
            empty_pipeline(),
            Duration::from_secs(3600),
            Duration::from_millis(5),
        )
        .run_at_startup(false);
        let handle = scheduler.start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.scheduler().stats().runs_started, 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_out_of_range_timing_is_clamped() {
        let scheduler = Scheduler::with_timing(empty_pipeline(), Duration::MAX, Duration::ZERO);
        assert_eq!(scheduler.poll, MIN_POLL);
        assert_eq!(scheduler.interval, MAX_INTERVAL);

        // Startup run happens and the next due time is far off, without panicking
        let handle = scheduler.start();
        let observed = handle.scheduler().clone();
        wait_for(|| observed.stats().runs_completed == 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(observed.stats().runs_started, 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_loop_repeats_each_interval() {
        let scheduler = Scheduler::with_timing(
            empty_pipeline(),
            Duration::from_millis(20),
            Duration::from_millis(5),
        );
        let handle = scheduler.start();

        let observed = handle.scheduler().clone();
        wait_for(|| observed.stats().runs_completed >= 3).await;

        handle.shutdown().await;
    }
}
