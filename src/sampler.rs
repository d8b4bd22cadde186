use {
    crate::{
        config::Settings,
        sensor::SensorKey,
        source::{
            Clock, CoreCounts, LoadAverage, MetricSource, SourceError, SysinfoSource, SystemClock,
        },
        stats,
        window::Window,
    },
    chrono::{DateTime, Local, TimeDelta},
    std::{
        sync::{
            Arc, Mutex, MutexGuard, PoisonError,
            mpsc::{self, RecvTimeoutError},
        },
        thread,
        time::{Duration, Instant},
    },
    tracing::{debug, info, warn},
};


/// samples host metrics into sliding windows.
///
/// a sampler is created, then started exactly once. starting it moves it onto its own thread and
/// hands back a [`Monitor`], through which it is read and eventually stopped.
pub struct Sampler<S = SysinfoSource, C = SystemClock> {
    /// the underlying source of host metrics.
    source: S,
    /// state shared with every [`Monitor`].
    shared: Arc<Shared<C>>,
    /// time between cpu, frequency and load samples.
    interval: Duration,
    /// time between temperature samples.
    temp_interval: Duration,
    /// sensor groups to look for, in order of preference.
    sensor_keys: Vec<String>,
    /// the sensor group resolved at start, if any.
    sensor: Option<SensorKey>,
    /// when temperature was last attempted, whether or not it succeeded.
    last_temperature: Option<Instant>,
    /// why the last temperature attempt failed. held until the next attempt.
    temperature_notice: Option<String>,
}

/// a handle to a running [`Sampler`].
pub struct Monitor<C = SystemClock> {
    shared: Arc<Shared<C>>,
    stop: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

struct Shared<C> {
    clock: C,
    snapshot: Mutex<Snapshot>,
}

/// a consistent, point-in-time copy of everything the sampler has recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    phase: Phase,
    /// cpu-cadence readings, oldest first.
    readings: Window<Reading>,
    /// temperature readings in celsius, oldest first.
    temperatures: Window<f64>,
    /// the temperature sensor group, resolved once at start.
    sensor: Option<SensorKey>,
    cores: CoreCounts,
    /// the most recent read failure.
    ///
    /// a cpu failure lasts until the next tick; a temperature failure until the next attempt.
    notice: Option<String>,
}

/// the lifecycle of a sampling session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Created,
    Running {
        started: DateTime<Local>,
    },
    Stopped {
        started: DateTime<Local>,
        ended: DateTime<Local>,
    },
}

/// one successful cpu-cadence sample.
///
/// frequency and load are recorded alongside the cpu reading so that every metric at the same
/// index was taken at the same moment.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    pub at: DateTime<Local>,
    pub cpu: f64,
    pub frequency: Option<f64>,
    pub load: Option<LoadAverage>,
}

#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("cannot read cpu usage on this platform: {0}")]
    Startup(#[source] SourceError),
    #[error("failed to spawn the sampler thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("the sampler thread panicked")]
    Panicked,
}

// === impl Sampler ===

impl<S, C> Sampler<S, C>
where
    S: MetricSource,
    C: Clock,
{
    /// creates a new [`Sampler`]. window capacities are fixed here.
    pub fn new(settings: &Settings, source: S, clock: C) -> Self {
        let interval = settings.sample_interval();
        let temp_interval = settings.temp_sample_interval();
        let duration = settings.window_duration();

        let snapshot = Snapshot {
            phase: Phase::Created,
            readings: Window::spanning(duration, interval),
            temperatures: Window::spanning(duration, temp_interval),
            sensor: None,
            cores: CoreCounts::default(),
            notice: None,
        };

        Self {
            source,
            shared: Arc::new(Shared {
                clock,
                snapshot: Mutex::new(snapshot),
            }),
            interval,
            temp_interval,
            sensor_keys: settings.sensor_keys.clone(),
            sensor: None,
            last_temperature: None,
            temperature_notice: None,
        }
    }

    /// starts sampling on a dedicated thread.
    ///
    /// fails if cpu usage cannot be read at all, before any sample is taken.
    pub fn start(mut self) -> Result<Monitor<C>, SamplerError>
    where
        S: Send + 'static,
        C: Send + Sync + 'static,
    {
        self.begin()?;

        let (stop, stopped) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let thread = thread::Builder::new()
            .name("sampler".to_owned())
            .spawn(move || self.run(stopped))
            .map_err(SamplerError::Spawn)?;

        Ok(Monitor {
            shared,
            stop,
            thread: Some(thread),
        })
    }

    /// a copy of the current windows and session state.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().clone()
    }

    /// moves from `Created` to `Running`: primes the cpu counter and resolves the sensor.
    pub(crate) fn begin(&mut self) -> Result<(), SamplerError> {
        let Self {
            source,
            shared,
            sensor_keys,
            sensor,
            ..
        } = self;

        // the first reading only establishes a baseline.
        source.read_cpu_percent().map_err(SamplerError::Startup)?;

        *sensor = source.discover_sensor(sensor_keys);
        match sensor {
            Some(key) => info!(%key, "using temperature sensor"),
            None => warn!("no temperature sensor found; temperature will not be sampled"),
        }
        let cores = source.read_core_counts();

        let started = shared.clock.wall();
        let mut snapshot = shared.lock();
        snapshot.sensor = sensor.clone();
        snapshot.cores = cores;
        snapshot.phase = Phase::Running { started };
        info!(%started, "sampler started");

        Ok(())
    }

    fn run(mut self, stopped: mpsc::Receiver<()>) {
        while self.shared.is_running() {
            let began = self.shared.clock.now();
            self.tick();

            let elapsed = self.shared.clock.now().saturating_duration_since(began);
            match stopped.recv_timeout(self.interval.saturating_sub(elapsed)) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!("sampler exited");
    }

    /// takes one round of samples.
    ///
    /// platform reads happen before the lock is taken, so readers are never blocked on them.
    pub(crate) fn tick(&mut self) {
        let Self {
            source,
            shared,
            temp_interval,
            sensor,
            last_temperature,
            temperature_notice,
            ..
        } = self;

        let now = shared.clock.now();
        let at = shared.clock.wall();

        let cpu = source.read_cpu_percent();
        let frequency = source.read_frequency_mhz();
        let load = source.read_load_averages();

        let due = last_temperature
            .is_none_or(|last| now.saturating_duration_since(last) >= *temp_interval);
        let temperature = match (due, &*sensor) {
            (true, Some(key)) => {
                *last_temperature = Some(now);
                let reading = source.read_temperature(key);
                *temperature_notice = match reading {
                    Some(_) => None,
                    None => {
                        debug!(%key, "no temperature reading");
                        Some(format!("no temperature reading from {key}"))
                    }
                };
                reading
            }
            (true, None) => {
                *last_temperature = Some(now);
                None
            }
            (false, _) => None,
        };

        let mut snapshot = shared.lock();
        let mut notice = None;

        match cpu {
            Ok(cpu) => snapshot.readings.push(Reading {
                at,
                cpu,
                frequency,
                load,
            }),
            Err(error) => {
                warn!(%error, "cpu read failed");
                notice = Some(format!("cpu read failed: {error}"));
            }
        }

        if let Some(celsius) = temperature {
            snapshot.temperatures.push(celsius);
        }

        snapshot.notice = notice.or_else(|| temperature_notice.clone());
    }
}

// === impl Monitor ===

impl<C: Clock> Monitor<C> {
    /// a copy of the current windows and session state.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// asks the sampler to halt after its in-flight tick.
    ///
    /// the end time is recorded by the first call only. returns whether this call stopped it.
    pub fn stop(&self) -> bool {
        let Self { shared, stop, .. } = self;

        let stopped = {
            let mut snapshot = shared.lock();
            match snapshot.phase {
                Phase::Running { started } => {
                    let ended = shared.clock.wall();
                    snapshot.phase = Phase::Stopped { started, ended };
                    info!(%ended, "sampler stopped");
                    true
                }
                Phase::Created | Phase::Stopped { .. } => false,
            }
        };

        // the sampler may already be gone; that's fine.
        let _ = stop.send(());
        stopped
    }

    /// stops the sampler, waits for its thread to exit, and returns the final snapshot.
    pub fn join(mut self) -> Result<Snapshot, SamplerError> {
        self.stop();
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| SamplerError::Panicked)?;
            debug!("sampler joined");
        }

        Ok(self.snapshot())
    }
}

impl<C> Drop for Monitor<C> {
    fn drop(&mut self) {
        // wake the sampler; it exits once it sees the channel disconnected.
        let _ = self.stop.send(());
    }
}

// === impl Shared ===

impl<C> Shared<C> {
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_running(&self) -> bool {
        matches!(self.lock().phase, Phase::Running { .. })
    }
}

// === impl Snapshot ===

impl Snapshot {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn started(&self) -> Option<DateTime<Local>> {
        match self.phase {
            Phase::Created => None,
            Phase::Running { started } | Phase::Stopped { started, .. } => Some(started),
        }
    }

    pub fn ended(&self) -> Option<DateTime<Local>> {
        match self.phase {
            Phase::Stopped { ended, .. } => Some(ended),
            Phase::Created | Phase::Running { .. } => None,
        }
    }

    /// how long the session ran. only known once it has stopped.
    pub fn duration(&self) -> Option<TimeDelta> {
        match self.phase {
            Phase::Stopped { started, ended } => Some(ended - started),
            Phase::Created | Phase::Running { .. } => None,
        }
    }

    pub fn readings(&self) -> &Window<Reading> {
        &self.readings
    }

    pub fn temperatures(&self) -> &Window<f64> {
        &self.temperatures
    }

    pub fn sensor(&self) -> Option<&SensorKey> {
        self.sensor.as_ref()
    }

    pub fn cores(&self) -> CoreCounts {
        self.cores
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// cpu usage samples, oldest first.
    pub fn cpu(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().map(|r| r.cpu)
    }

    pub fn latest_cpu(&self) -> Option<f64> {
        self.readings.latest().map(|r| r.cpu)
    }

    pub fn average_cpu(&self) -> f64 {
        stats::mean(self.cpu())
    }

    pub fn min_cpu(&self) -> f64 {
        stats::min(self.cpu())
    }

    pub fn peak_cpu(&self) -> f64 {
        stats::max(self.cpu())
    }

    pub fn latest_frequency(&self) -> Option<f64> {
        self.readings.latest().and_then(|r| r.frequency)
    }

    pub fn latest_load(&self) -> Option<LoadAverage> {
        self.readings.latest().and_then(|r| r.load)
    }

    pub fn latest_temperature(&self) -> Option<f64> {
        self.temperatures.latest().copied()
    }

    pub fn average_temperature(&self) -> f64 {
        stats::mean(self.temperatures.iter().copied())
    }

    pub fn min_temperature(&self) -> f64 {
        stats::min(self.temperatures.iter().copied())
    }

    pub fn peak_temperature(&self) -> f64 {
        stats::max(self.temperatures.iter().copied())
    }
}

#[cfg(test)]
impl Snapshot {
    /// a stopped session recorded from a mock source, one tick per sample interval.
    pub(crate) fn recorded(settings: &Settings, source: crate::source::MockSource, ticks: usize) -> Self {
        let clock = crate::source::MockClock::default();
        let mut sampler = Sampler::new(settings, source, clock.clone());
        sampler.begin().expect("mock source should start");
        for _ in 0..ticks {
            sampler.tick();
            clock.advance(settings.sample_interval());
        }

        let mut snapshot = sampler.snapshot();
        if let Phase::Running { started } = snapshot.phase {
            snapshot.phase = Phase::Stopped {
                started,
                ended: clock.wall(),
            };
        }
        snapshot
    }
}
