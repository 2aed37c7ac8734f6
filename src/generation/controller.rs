//! Background generation controller.
//!
//! A [`GenerationController`] owns one [`SeriesBuilder`], one target
//! [`SeriesList`] and one logger. `start()` spawns a single worker thread
//! that draws candidates, runs them through the injected
//! [`GenerationStrategy`], and appends accepted ones until the desired count,
//! a guard, a stop request, or a builder deadlock ends the run.
//!
//! ## Locking
//!
//! The worker is the only writer of the list and of the status while a run
//! is active. Lock order is `control` before `list`/`builder`/`log`; the
//! worker never holds a list or builder lock while taking `control`. The
//! injected logger is only called with no lock held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock, RwLockUpgradableReadGuard};

use super::status::GenerationStatus;
use super::strategy::{GenerationStrategy, QualityControlled, Unconstrained};
use crate::core::config::{GenerationConfig, Thresholds};
use crate::core::error::{
    ConfigurationError, ControllerError, GenerationDeadlockError, InvalidStateError,
};
use crate::core::log::{GameLogRecord, GenerationLog, LogLevel};
use crate::series::{SeriesBuilder, SeriesList, SORTED_COMMENT};

/// Name of the background generation thread.
pub const WORKER_THREAD_NAME: &str = "tombola-generation";

struct Control {
    status: GenerationStatus,
    config: GenerationConfig,
    worker: Option<JoinHandle<()>>,
    accumulated: Duration,
    run_started: Option<Instant>,
    last_error: Option<GenerationDeadlockError>,
}

struct Shared {
    control: Mutex<Control>,
    finished: Condvar,
    stop: AtomicBool,
    list: RwLock<Option<SeriesList>>,
    builder: Mutex<Option<Box<dyn SeriesBuilder>>>,
    log: RwLock<Option<Arc<dyn GenerationLog>>>,
}

impl Shared {
    /// Move `Initializing` to `Ready` once everything mandatory is present.
    fn refresh_ready(&self, control: &mut Control) {
        if control.status == GenerationStatus::Initializing
            && control.config.is_complete()
            && self.builder.lock().is_some()
            && self.list.read().is_some()
            && self.log.read().is_some()
        {
            control.status = GenerationStatus::Ready;
        }
    }

    fn list_len(&self) -> usize {
        self.list.read().as_ref().map_or(0, SeriesList::len)
    }
}

/// Why a worker left its loop.
enum Outcome {
    Completed,
    StopRequested,
    IterationGuard(u64),
    TimeGuard(Duration),
    Deadlock(GenerationDeadlockError),
    MissingBuilder,
}

/// State machine plus single background worker.
///
/// All methods take `&self`; wrap the controller in an `Arc` to stop or
/// join it from another thread.
pub struct GenerationController {
    strategy: Arc<dyn GenerationStrategy>,
    shared: Arc<Shared>,
}

impl GenerationController {
    /// Create an unconfigured controller using `strategy`.
    pub fn new<S: GenerationStrategy + 'static>(strategy: S) -> Self {
        Self {
            strategy: Arc::new(strategy),
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    status: GenerationStatus::Initializing,
                    config: GenerationConfig::new(),
                    worker: None,
                    accumulated: Duration::ZERO,
                    run_started: None,
                    last_error: None,
                }),
                finished: Condvar::new(),
                stop: AtomicBool::new(false),
                list: RwLock::new(None),
                builder: Mutex::new(None),
                log: RwLock::new(None),
            }),
        }
    }

    /// Controller accepting every candidate.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self::new(Unconstrained)
    }

    /// Controller rejecting candidates above the similarity thresholds.
    #[must_use]
    pub fn quality_controlled() -> Self {
        Self::new(QualityControlled)
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    #[must_use]
    pub fn status(&self) -> GenerationStatus {
        self.shared.control.lock().status
    }

    /// Copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> GenerationConfig {
        self.shared.control.lock().config.clone()
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    /// Lock control, refusing if a worker is alive.
    fn idle_control(
        &self,
        what: &'static str,
    ) -> Result<parking_lot::MutexGuard<'_, Control>, InvalidStateError> {
        let control = self.shared.control.lock();
        if control.status.is_active() {
            return Err(InvalidStateError::Busy(what));
        }
        Ok(control)
    }

    /// Install the series builder.
    pub fn set_builder<B: SeriesBuilder + 'static>(
        &self,
        builder: B,
    ) -> Result<(), ControllerError> {
        let mut control = self.idle_control("builder")?;
        *self.shared.builder.lock() = Some(Box::new(builder));
        self.shared.refresh_ready(&mut control);
        Ok(())
    }

    /// Install the target list. Generation resumes on whatever it holds.
    pub fn set_list(&self, list: SeriesList) -> Result<(), ControllerError> {
        let mut control = self.idle_control("list")?;
        *self.shared.list.write() = Some(list);
        self.shared.refresh_ready(&mut control);
        Ok(())
    }

    /// Install the logging capability.
    pub fn set_logger(&self, log: Arc<dyn GenerationLog>) -> Result<(), ControllerError> {
        let mut control = self.idle_control("logger")?;
        *self.shared.log.write() = Some(log);
        self.shared.refresh_ready(&mut control);
        Ok(())
    }

    pub fn set_desired_count(&self, count: usize) -> Result<(), ControllerError> {
        let mut control = self.idle_control("desired count")?;
        control.config.set_desired_count(count)?;
        self.shared.refresh_ready(&mut control);
        Ok(())
    }

    pub fn set_iteration_guard(&self, guard: u64) -> Result<(), ControllerError> {
        let mut control = self.idle_control("iteration guard")?;
        control.config.set_iteration_guard(guard)?;
        self.shared.refresh_ready(&mut control);
        Ok(())
    }

    pub fn set_time_guard_ms(&self, guard_ms: u64) -> Result<(), ControllerError> {
        let mut control = self.idle_control("time guard")?;
        control.config.set_time_guard_ms(guard_ms)?;
        self.shared.refresh_ready(&mut control);
        Ok(())
    }

    /// Set the max-equal-per-card threshold.
    ///
    /// Once series exist (outside `Initializing`/`Ready`) the threshold may
    /// only grow; a lower value fails with `InvalidStateError`. Raising it
    /// while running takes effect at the worker's next candidate.
    pub fn set_max_equal_per_card(&self, value: u8) -> Result<(), ControllerError> {
        self.set_threshold(
            value,
            "max equal per card",
            |c| c.max_equal_per_card(),
            |c, v| c.set_max_equal_per_card(v),
        )
    }

    /// Set the max-equal-per-row threshold. Same rule as
    /// [`set_max_equal_per_card`](Self::set_max_equal_per_card).
    pub fn set_max_equal_per_row(&self, value: u8) -> Result<(), ControllerError> {
        self.set_threshold(
            value,
            "max equal per row",
            |c| c.max_equal_per_row(),
            |c, v| c.set_max_equal_per_row(v),
        )
    }

    fn set_threshold(
        &self,
        value: u8,
        name: &'static str,
        current: impl Fn(&GenerationConfig) -> Option<u8>,
        apply: impl Fn(&mut GenerationConfig, u8) -> Result<(), ConfigurationError>,
    ) -> Result<(), ControllerError> {
        let mut control = self.shared.control.lock();

        // Validate on a copy so a rejected value never lands
        let mut candidate = control.config.clone();
        apply(&mut candidate, value)?;

        let free = matches!(
            control.status,
            GenerationStatus::Initializing | GenerationStatus::Ready
        ) || self.shared.list_len() == 0;

        if !free {
            if let Some(existing) = current(&control.config) {
                if value < existing {
                    return Err(InvalidStateError::ThresholdDecrease {
                        name,
                        current: existing,
                        requested: value,
                    }
                    .into());
                }
            }
        }

        control.config = candidate;
        self.shared.refresh_ready(&mut control);
        Ok(())
    }

    /// Apply every value set in `config`, stopping at the first error.
    pub fn configure(&self, config: &GenerationConfig) -> Result<(), ControllerError> {
        if let Some(count) = config.desired_count() {
            self.set_desired_count(count)?;
        }
        if let Some(value) = config.max_equal_per_card() {
            self.set_max_equal_per_card(value)?;
        }
        if let Some(value) = config.max_equal_per_row() {
            self.set_max_equal_per_row(value)?;
        }
        if let Some(guard) = config.iteration_guard() {
            self.set_iteration_guard(guard)?;
        }
        if let Some(guard) = config.time_guard_ms() {
            self.set_time_guard_ms(guard)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Spawn the worker. Returns immediately.
    pub fn start(&self) -> Result<(), ControllerError> {
        let mut control = self.shared.control.lock();
        if !control.status.can_start() {
            return Err(match control.status {
                GenerationStatus::Initializing => InvalidStateError::NotConfigured,
                status => InvalidStateError::AlreadyRunning(status),
            }
            .into());
        }

        let desired = control.config.desired_count().unwrap_or(0);
        let current = self.shared.list_len();
        if desired <= current {
            return Err(InvalidStateError::CountReached { desired, current }.into());
        }
        let Some(log) = self.shared.log.read().clone() else {
            return Err(InvalidStateError::NotConfigured.into());
        };

        // A finished but unjoined worker from the previous run
        if let Some(previous) = control.worker.take() {
            let _ = previous.join();
        }

        let started = Instant::now();
        self.shared.stop.store(false, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let strategy = Arc::clone(&self.strategy);
        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(shared, strategy, log, started, current))
            .map_err(|err| ControllerError::WorkerSpawn(err.to_string()))?;

        // The worker blocks on `control` before its first check
        control.status = GenerationStatus::Running;
        control.run_started = Some(started);
        control.last_error = None;
        control.worker = Some(handle);
        Ok(())
    }

    /// Ask the worker to stop at its next check.
    pub fn request_stop(&self) -> Result<(), InvalidStateError> {
        let mut control = self.shared.control.lock();
        match control.status {
            GenerationStatus::Running => {
                control.status = GenerationStatus::Stopping;
                self.shared.stop.store(true, Ordering::Release);
                Ok(())
            }
            GenerationStatus::Stopping => Ok(()),
            status => Err(InvalidStateError::NoWorker(status)),
        }
    }

    /// Block until the worker exits and return the final status.
    pub fn join(&self) -> Result<GenerationStatus, InvalidStateError> {
        self.wait(None).map(|status| status.unwrap_or(GenerationStatus::Running))
    }

    /// Block until the worker exits or `timeout` elapses.
    ///
    /// Returns `Some(status)` once the worker has exited, `None` on timeout.
    pub fn join_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<GenerationStatus>, InvalidStateError> {
        self.wait(Some(timeout))
    }

    fn wait(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Option<GenerationStatus>, InvalidStateError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut control = self.shared.control.lock();
        if control.worker.is_none() {
            return Err(InvalidStateError::NothingToJoin(control.status));
        }

        while control.status.is_active() {
            match deadline {
                Some(deadline) => {
                    if self
                        .shared
                        .finished
                        .wait_until(&mut control, deadline)
                        .timed_out()
                        && control.status.is_active()
                    {
                        return Ok(None);
                    }
                }
                None => self.shared.finished.wait(&mut control),
            }
        }

        // The worker's last act was publishing its status; the thread is
        // exiting and joins promptly
        if let Some(handle) = control.worker.take() {
            let _ = handle.join();
        }
        Ok(Some(control.status))
    }

    // ---------------------------------------------------------------------
    // Results
    // ---------------------------------------------------------------------

    /// Generation time: zero before the first start, live while running,
    /// frozen afterwards. Accumulates across resumed runs.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        let control = self.shared.control.lock();
        control.accumulated + control.run_started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    /// The deadlock that ended the last run, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<GenerationDeadlockError> {
        self.shared.control.lock().last_error.clone()
    }

    /// Read the list under a shared lock. `None` if no list is installed.
    ///
    /// Keep the closure short while a run is active; the worker waits for
    /// it before appending.
    pub fn with_list<R>(&self, f: impl FnOnce(&SeriesList) -> R) -> Option<R> {
        self.shared.list.read().as_ref().map(f)
    }

    /// Clone of the list as it is now.
    #[must_use]
    pub fn snapshot(&self) -> Option<SeriesList> {
        self.shared.list.read().clone()
    }

    #[must_use]
    pub fn list_len(&self) -> usize {
        self.shared.list_len()
    }

    /// Remove the list from an idle controller. The controller returns to
    /// `Initializing` until a new list is installed.
    pub fn take_list(&self) -> Result<Option<SeriesList>, InvalidStateError> {
        let mut control = self.idle_control("list")?;
        let list = self.shared.list.write().take();
        if list.is_some() {
            control.status = GenerationStatus::Initializing;
        }
        Ok(list)
    }

    /// Seed of the installed builder.
    #[must_use]
    pub fn builder_seed(&self) -> Option<u64> {
        self.shared.builder.lock().as_ref().map(|b| b.seed())
    }

    /// Cards produced by the builder so far, rejected candidates included.
    #[must_use]
    pub fn cards_produced(&self) -> Option<u64> {
        self.shared.builder.lock().as_ref().map(|b| b.cards_produced())
    }

    #[must_use]
    pub fn avoid_empty_column(&self) -> Option<bool> {
        self.shared.builder.lock().as_ref().map(|b| b.avoid_empty_column())
    }
}

impl Drop for GenerationController {
    fn drop(&mut self) {
        let _ = self.request_stop();
        let worker = self.shared.control.lock().worker.take();
        if let Some(handle) = worker {
            let _ = handle.join();
        }
    }
}

/// Publishes a terminal status if the worker unwinds before doing so.
///
/// Joiners hold `control` while joining a finished worker, so the normal
/// exit path must not touch it.
struct ExitGuard(Arc<Shared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        let mut control = self.0.control.lock();
        if control.status.is_active() {
            if let Some(started) = control.run_started.take() {
                control.accumulated += started.elapsed();
            }
            control.status = GenerationStatus::Stopped;
        }
        self.0.finished.notify_all();
    }
}

fn run_worker(
    shared: Arc<Shared>,
    strategy: Arc<dyn GenerationStrategy>,
    log: Arc<dyn GenerationLog>,
    started: Instant,
    resumed_from: usize,
) {
    let _guard = ExitGuard(Arc::clone(&shared));
    let desired = shared.control.lock().config.desired_count().unwrap_or(0);
    log.info(&format!(
        "{} generation {} with {} of {} series",
        strategy.name(),
        if resumed_from == 0 { "started" } else { "resumed" },
        resumed_from,
        desired
    ));

    let mut rejected_in_row: u64 = 0;
    let mut rejected_total: u64 = 0;
    let mut candidates: u64 = 0;

    let outcome = loop {
        let (desired, thresholds, iteration_guard, time_guard) = {
            let control = shared.control.lock();
            let config = &control.config;
            (
                config.desired_count().unwrap_or(0),
                config.thresholds().unwrap_or(Thresholds {
                    max_equal_per_card: u8::MAX,
                    max_equal_per_row: u8::MAX,
                }),
                config.iteration_guard().unwrap_or(u64::MAX),
                Duration::from_millis(config.time_guard_ms().unwrap_or(u64::MAX)),
            )
        };

        if shared.list_len() >= desired {
            break Outcome::Completed;
        }
        if shared.stop.load(Ordering::Acquire) {
            break Outcome::StopRequested;
        }
        if rejected_in_row > iteration_guard {
            break Outcome::IterationGuard(rejected_in_row);
        }
        let elapsed = started.elapsed();
        if elapsed >= time_guard {
            break Outcome::TimeGuard(elapsed);
        }

        let built = shared.builder.lock().as_mut().map(|b| b.build_series());
        let candidate = match built {
            Some(Ok(series)) => series,
            Some(Err(err)) => break Outcome::Deadlock(err),
            None => break Outcome::MissingBuilder,
        };
        candidates += 1;

        let guard = shared.list.upgradable_read();
        let Some(list) = guard.as_ref() else {
            break Outcome::Completed;
        };
        if !strategy.accept(&candidate, list.series(), thresholds) {
            drop(guard);
            rejected_in_row += 1;
            rejected_total += 1;
            continue;
        }

        let checksum = candidate.checksum();
        let accepted = {
            let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
            guard.as_mut().map(|list| {
                list.push(candidate);
                list.len()
            })
        };
        // Logged outside every lock: a logger may call back into the controller
        if let Some(len) = accepted {
            log.game(&GameLogRecord {
                level: LogLevel::Verbose,
                id: strategy.name().to_string(),
                sequence: len as u64,
                payload: format!("checksum={checksum:08x} candidates={candidates}"),
                message: format!(
                    "accepted series {len}/{desired} after {rejected_in_row} rejections"
                ),
            });
        }
        rejected_in_row = 0;
    };

    if rejected_total > 0 {
        log.verbose(&format!(
            "{rejected_total} of {candidates} candidates rejected by {}",
            strategy.name()
        ));
    }
    finish_run(&shared, strategy.as_ref(), log.as_ref(), started, candidates, outcome);
}

fn finish_run(
    shared: &Shared,
    strategy: &dyn GenerationStrategy,
    log: &dyn GenerationLog,
    started: Instant,
    candidates: u64,
    outcome: Outcome,
) {
    let run_elapsed = started.elapsed();
    let (total_elapsed, desired) = {
        let control = shared.control.lock();
        (
            control.accumulated + run_elapsed,
            control.config.desired_count().unwrap_or(0),
        )
    };
    let builder_info = shared
        .builder
        .lock()
        .as_ref()
        .map(|b| (b.seed(), b.cards_produced(), b.method_name()));

    let accepted = match shared.list.write().as_mut() {
        Some(list) => {
            if let Some((seed, produced, method)) = builder_info {
                list.set_provenance(seed, method, strategy.name());
                list.set_counters(produced, total_elapsed.as_millis() as u64);
            }
            if matches!(outcome, Outcome::Completed) {
                list.compare_all();
                list.sort_best_to_worst();
                list.relabel();
                list.reset_checks();
                list.add_comment_once(SORTED_COMMENT);
            }
            list.len()
        }
        None => 0,
    };

    let (status, last_error) = match outcome {
        Outcome::Completed => {
            log.info(&format!(
                "generation completed: {accepted} series from {candidates} candidates in {} ms",
                run_elapsed.as_millis()
            ));
            (GenerationStatus::Completed, None)
        }
        Outcome::StopRequested => {
            log.info(&format!(
                "generation stopped on request with {accepted} of {desired} series"
            ));
            (GenerationStatus::Stopped, None)
        }
        Outcome::IterationGuard(rejected) => {
            log.error(&format!(
                "iteration guard exceeded: {rejected} consecutive candidates rejected; \
                 stopping with {accepted} of {desired} series"
            ));
            (GenerationStatus::Stopped, None)
        }
        Outcome::TimeGuard(elapsed) => {
            log.error(&format!(
                "time guard exceeded after {} ms; stopping with {accepted} of {desired} series",
                elapsed.as_millis()
            ));
            (GenerationStatus::Stopped, None)
        }
        Outcome::Deadlock(err) => {
            log.fatal(&format!(
                "series builder failed: {err}; stopping with {accepted} of {desired} series"
            ));
            (GenerationStatus::Stopped, Some(err))
        }
        Outcome::MissingBuilder => {
            log.fatal("no series builder installed");
            (GenerationStatus::Stopped, None)
        }
    };

    let mut control = shared.control.lock();
    control.accumulated += run_elapsed;
    control.run_started = None;
    control.status = status;
    control.last_error = last_error;
    shared.finished.notify_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log::MemoryLog;
    use crate::series::PerfectSwapBuilder;

    fn configured(controller: &GenerationController, count: usize) -> Arc<MemoryLog> {
        let log = Arc::new(MemoryLog::new());
        controller.set_builder(PerfectSwapBuilder::new(42)).unwrap();
        controller.set_list(SeriesList::new("unit")).unwrap();
        controller.set_logger(log.clone()).unwrap();
        controller
            .configure(&GenerationConfig::recommended().with_desired_count(count).unwrap())
            .unwrap();
        log
    }

    #[test]
    fn test_initializing_until_complete() {
        let controller = GenerationController::unconstrained();
        assert_eq!(controller.status(), GenerationStatus::Initializing);
        assert_eq!(
            controller.start(),
            Err(ControllerError::InvalidState(InvalidStateError::NotConfigured))
        );

        controller.set_builder(PerfectSwapBuilder::new(1)).unwrap();
        controller.set_list(SeriesList::new("x")).unwrap();
        controller.configure(&GenerationConfig::recommended()).unwrap();
        assert_eq!(controller.status(), GenerationStatus::Initializing);

        controller.set_logger(Arc::new(MemoryLog::new())).unwrap();
        assert_eq!(controller.status(), GenerationStatus::Ready);
    }

    #[test]
    fn test_setter_rejects_invalid_value() {
        let controller = GenerationController::unconstrained();
        let err = controller.set_max_equal_per_card(4).unwrap_err();
        assert!(matches!(err, ControllerError::Configuration(_)));
        assert_eq!(controller.config().max_equal_per_card(), None);
    }

    #[test]
    fn test_join_without_worker() {
        let controller = GenerationController::unconstrained();
        configured(&controller, 3);
        assert!(matches!(
            controller.join(),
            Err(InvalidStateError::NothingToJoin(GenerationStatus::Ready))
        ));
        assert!(matches!(
            controller.request_stop(),
            Err(InvalidStateError::NoWorker(GenerationStatus::Ready))
        ));
    }

    #[test]
    fn test_run_to_completion() {
        let controller = GenerationController::unconstrained();
        let log = configured(&controller, 4);
        assert_eq!(controller.elapsed(), Duration::ZERO);

        controller.start().unwrap();
        assert_eq!(controller.join().unwrap(), GenerationStatus::Completed);
        assert_eq!(controller.list_len(), 4);
        assert_eq!(log.records().len(), 4);
        assert!(controller.elapsed() > Duration::ZERO);
        assert_eq!(controller.cards_produced(), Some(24));

        // Joined already
        assert!(controller.join().is_err());

        let frozen = controller.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(controller.elapsed(), frozen);
    }

    #[test]
    fn test_start_rejected_when_count_reached() {
        let controller = GenerationController::unconstrained();
        configured(&controller, 2);
        controller.start().unwrap();
        controller.join().unwrap();
        assert_eq!(
            controller.start(),
            Err(ControllerError::InvalidState(InvalidStateError::CountReached {
                desired: 2,
                current: 2
            }))
        );
    }

    #[test]
    fn test_take_list_returns_to_initializing() {
        let controller = GenerationController::unconstrained();
        configured(&controller, 2);
        controller.start().unwrap();
        controller.join().unwrap();

        let list = controller.take_list().unwrap().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(controller.status(), GenerationStatus::Initializing);
        assert!(controller.snapshot().is_none());
    }
}
