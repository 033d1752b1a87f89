use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use clinic_core::TenantId;
use clinic_forecast::{ForecastEngine, ForecastError, ForecastResult, ForecastSource};

/// Destination for computed forecasts.
///
/// Forecasts are derived read data, not domain events; they never go back
/// into the event stream.
pub trait ForecastSink: Send + Sync + 'static {
    fn emit(&self, tenant_id: TenantId, result: ForecastResult);
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryForecastSink {
    inner: Mutex<Vec<(TenantId, ForecastResult)>>,
}

impl InMemoryForecastSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(TenantId, ForecastResult)> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ForecastSink for InMemoryForecastSink {
    fn emit(&self, tenant_id: TenantId, result: ForecastResult) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((tenant_id, result));
    }
}

/// Config for the forecast runner.
#[derive(Debug, Clone)]
pub struct ForecastRunner {
    pub interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
    /// `None` uses the engine's configured horizon.
    pub horizon_days: Option<u32>,
    pub engine: ForecastEngine,
}

impl Default for ForecastRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
            horizon_days: None,
            engine: ForecastEngine::default(),
        }
    }
}

/// Handle for a running forecast runner (shutdown + trigger hook).
#[derive(Debug)]
pub struct ForecastRunnerHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ForecastRunnerHandle {
    /// Event-trigger hook: call after the forecast inputs projection changed.
    ///
    /// Triggers are coalesced; if a pass is already pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the runner thread and wait for it to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl ForecastRunner {
    pub fn with_engine(mut self, engine: ForecastEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawn a tenant-scoped runner.
    ///
    /// - Schedule: one pass on startup, then every `interval`
    /// - Event-trigger: `handle.trigger()` requests an extra pass
    /// - Failures: logged and retried with bounded exponential backoff; never propagate
    ///
    /// Fails with `InvalidInput` for a zero `interval`.
    pub fn spawn_for_tenant<R, S>(
        &self,
        name: &'static str,
        tenant_id: TenantId,
        source: Arc<R>,
        sink: Arc<S>,
    ) -> io::Result<ForecastRunnerHandle>
    where
        R: ForecastSource + 'static,
        S: ForecastSink + 'static,
    {
        if self.interval.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "forecast runner interval must be greater than zero",
            ));
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runner_loop(name, tenant_id, cfg, shutdown_rx, trigger_rx, source, sink))?;

        Ok(ForecastRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        })
    }

    /// Forecast every item of `tenant_id` once and emit the results.
    ///
    /// Returns how many forecasts were emitted. Items that vanish between
    /// listing and reading are skipped; any other source failure aborts the pass.
    pub fn run_once<R, S>(&self, tenant_id: TenantId, source: &R, sink: &S) -> Result<usize, ForecastError>
    where
        R: ForecastSource + ?Sized,
        S: ForecastSink + ?Sized,
    {
        let now = Utc::now();
        let mut emitted = 0;

        for item_id in source.item_ids(tenant_id)? {
            match self
                .engine
                .forecast_item(source, tenant_id, item_id, self.horizon_days, now)
            {
                Ok(result) => {
                    sink.emit(tenant_id, result);
                    emitted += 1;
                }
                Err(ForecastError::ItemNotFound { item_id }) => {
                    warn!(tenant = %tenant_id, item = %item_id, "item disappeared before forecasting; skipped");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(emitted)
    }
}

/// Pass bookkeeping for one runner thread: schedule, pending flag and retry state.
#[derive(Debug)]
struct PassSchedule {
    interval: Duration,
    next_tick: Instant,
    pending: bool,
    failures: u32,
    backoff_until: Option<Instant>,
}

impl PassSchedule {
    /// First pass runs immediately.
    fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_tick: now + interval,
            pending: true,
            failures: 0,
            backoff_until: None,
        }
    }

    /// Mark a pass pending when the tick is due. Missed ticks collapse into
    /// one pass and the cadence stays aligned to the original start.
    fn on_tick(&mut self, now: Instant) {
        if now < self.next_tick {
            return;
        }
        self.pending = true;
        let behind = now.duration_since(self.next_tick).as_nanos();
        let missed = behind / self.interval.as_nanos().max(1) + 1;
        self.next_tick += self.interval.saturating_mul(u32::try_from(missed).unwrap_or(u32::MAX));
    }

    fn in_backoff(&mut self, now: Instant) -> bool {
        match self.backoff_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.backoff_until = None;
                false
            }
            None => false,
        }
    }

    fn succeeded(&mut self) {
        self.failures = 0;
    }

    /// Retry up to `max_retries` times, then drop back to the regular schedule.
    fn failed(&mut self, now: Instant, max_retries: u32, base_backoff: Duration) {
        self.failures += 1;
        if self.failures <= max_retries {
            self.pending = true;
            self.backoff_until = Some(now + backoff(base_backoff, self.failures));
        } else {
            self.failures = 0;
        }
    }

    fn idle_for(&self, now: Instant) -> Duration {
        self.next_tick
            .saturating_duration_since(now)
            .min(Duration::from_millis(250))
    }
}

fn runner_loop<R, S>(
    name: &'static str,
    tenant_id: TenantId,
    cfg: ForecastRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    source: Arc<R>,
    sink: Arc<S>,
) where
    R: ForecastSource + 'static,
    S: ForecastSink + 'static,
{
    info!(runner = name, tenant = %tenant_id, interval = ?cfg.interval, "forecast runner started");

    let mut schedule = PassSchedule::new(cfg.interval, Instant::now());

    loop {
        // Shutdown wins over any pending pass.
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        schedule.on_tick(Instant::now());

        // Coalesce every trigger received since the last pass.
        while trigger_rx.try_recv().is_ok() {
            schedule.pending = true;
        }

        if schedule.in_backoff(Instant::now()) {
            thread::sleep(Duration::from_millis(50));
            continue;
        }

        if !schedule.pending {
            thread::sleep(schedule.idle_for(Instant::now()));
            continue;
        }
        schedule.pending = false;

        match cfg.run_once(tenant_id, source.as_ref(), sink.as_ref()) {
            Ok(emitted) => {
                schedule.succeeded();
                debug!(runner = name, tenant = %tenant_id, emitted, "forecast pass complete");
            }
            Err(e) => {
                warn!(runner = name, tenant = %tenant_id, error = %e, attempt = schedule.failures + 1, "forecast pass failed");
                schedule.failed(Instant::now(), cfg.max_retries, cfg.base_backoff);
            }
        }
    }

    info!(runner = name, tenant = %tenant_id, "forecast runner stopped");
}

/// `base * 2^(attempt-1)`, capped at 10s.
fn backoff(base: Duration, attempt: u32) -> Duration {
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ms = base.as_millis().saturating_mul(pow as u128);
    Duration::from_millis(ms.min(10_000) as u64)
}
