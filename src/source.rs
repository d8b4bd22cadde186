use {
    crate::sensor::{self, SensorKey, SensorReading},
    chrono::{DateTime, Local},
    std::{
        collections::VecDeque,
        sync::{Arc, Barrier, Mutex, PoisonError},
        time::{Duration, Instant},
    },
};

pub use self::{clock::*, metrics::*};

mod clock {
    use super::*;

    /// a source of monotonic and wall-clock time.
    pub trait Clock {
        /// a monotonic instant, used to schedule samples.
        fn now(&self) -> Instant;
        /// the local wall-clock time, used to label samples.
        fn wall(&self) -> DateTime<Local>;
    }

    #[derive(Clone, Debug, Default)]
    pub struct SystemClock;

    /// a clock that only moves when told to.
    #[derive(Clone, Debug)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockClock {
        inner: Arc<Mutex<(Instant, DateTime<Local>)>>,
    }

    impl Clock for SystemClock {
        fn now(&self) -> Instant {
            Instant::now()
        }

        fn wall(&self) -> DateTime<Local> {
            Local::now()
        }
    }

    // === impl MockClock ===

    impl Default for MockClock {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new((Instant::now(), Local::now()))),
            }
        }
    }

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockClock {
        /// moves both clocks forward. clones of this clock observe the change.
        pub fn advance(&self, by: Duration) {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let (now, wall) = &mut *inner;
            *now += by;
            *wall += chrono::TimeDelta::from_std(by).unwrap_or(chrono::TimeDelta::zero());
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner).0
        }

        fn wall(&self) -> DateTime<Local> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner).1
        }
    }
}

/// abstracts over providers of host metrics.
mod metrics {
    use {super::*, sysinfo::{Components, System}};

    /// a source of instantaneous host metrics.
    ///
    /// only the cpu reading is allowed to fail loudly; every other metric is best-effort, and an
    /// absent value is a normal outcome.
    pub trait MetricSource {
        /// cpu utilization, in percent, since the previous call.
        fn read_cpu_percent(&mut self) -> Result<f64, SourceError>;
        /// the current clock speed, if the platform reports one.
        fn read_frequency_mhz(&mut self) -> Option<f64>;
        /// the 1, 5 and 15 minute load averages, if the platform has them.
        fn read_load_averages(&mut self) -> Option<LoadAverage>;
        /// the number of logical and physical cores.
        fn read_core_counts(&mut self) -> CoreCounts;
        /// finds the first sensor group from `preferences` present on this host.
        fn discover_sensor(&mut self, preferences: &[String]) -> Option<SensorKey>;
        /// the current package temperature of the given sensor group, in celsius.
        fn read_temperature(&mut self, key: &SensorKey) -> Option<f64>;
    }

    /// 1, 5 and 15 minute load averages.
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct LoadAverage {
        pub one: f64,
        pub five: f64,
        pub fifteen: f64,
    }

    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct CoreCounts {
        pub logical: usize,
        pub physical: Option<usize>,
    }

    #[derive(Clone, Debug, PartialEq, thiserror::Error)]
    pub enum SourceError {
        #[error("the platform reported no cpus")]
        NoCpus,
        #[error("cpu usage is not a number: {0}")]
        InvalidUsage(f64),
        #[error("{0}")]
        Other(String),
    }

    /// metrics backed by [`sysinfo`].
    pub struct SysinfoSource {
        system: System,
        components: Option<Components>,
    }

    /// a scripted metric source.
    ///
    /// clones share their state, so a test can keep a handle while the sampler owns another.
    #[derive(Clone, Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockSource {
        inner: Arc<Mutex<MockState>>,
    }

    #[derive(Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    struct MockState {
        cpu: VecDeque<Result<f64, SourceError>>,
        frequency: Option<f64>,
        load: Option<LoadAverage>,
        groups: Vec<String>,
        temperatures: VecDeque<Option<f64>>,
        /// met twice by the next cpu read: once on the way in, once on the way out.
        gate: Option<Arc<Barrier>>,
        cpu_reads: usize,
        temperature_reads: usize,
        discoveries: usize,
    }

    // === impl SysinfoSource ===

    impl SysinfoSource {
        pub fn new() -> Self {
            let mut system = System::new();
            system.refresh_cpu_all();
            Self {
                system,
                components: None,
            }
        }

        fn readings(&mut self) -> Vec<SensorReading> {
            let components = self
                .components
                .get_or_insert_with(Components::new_with_refreshed_list);
            components.refresh(false);

            components
                .list()
                .iter()
                .filter_map(|c| {
                    let celsius = c.temperature().filter(|t| t.is_finite())?;
                    Some(SensorReading::from_label(c.label(), celsius.into()))
                })
                .collect()
        }
    }

    impl Default for SysinfoSource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MetricSource for SysinfoSource {
        fn read_cpu_percent(&mut self) -> Result<f64, SourceError> {
            let Self { system, .. } = self;

            system.refresh_cpu_usage();
            if system.cpus().is_empty() {
                return Err(SourceError::NoCpus);
            }

            let usage = f64::from(system.global_cpu_usage());
            if usage.is_finite() {
                Ok(usage.clamp(0.0, 100.0))
            } else {
                Err(SourceError::InvalidUsage(usage))
            }
        }

        fn read_frequency_mhz(&mut self) -> Option<f64> {
            let Self { system, .. } = self;

            system.refresh_cpu_frequency();
            let freqs = system
                .cpus()
                .iter()
                .map(|cpu| cpu.frequency())
                .filter(|mhz| *mhz > 0)
                .collect::<Vec<_>>();

            if freqs.is_empty() {
                None
            } else {
                Some(freqs.iter().sum::<u64>() as f64 / freqs.len() as f64)
            }
        }

        fn read_load_averages(&mut self) -> Option<LoadAverage> {
            if cfg!(windows) {
                return None;
            }

            let load = System::load_average();
            Some(LoadAverage {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            })
        }

        fn read_core_counts(&mut self) -> CoreCounts {
            CoreCounts {
                logical: self.system.cpus().len(),
                physical: System::physical_core_count(),
            }
        }

        fn discover_sensor(&mut self, preferences: &[String]) -> Option<SensorKey> {
            let readings = self.readings();
            sensor::discover(preferences, readings.iter().map(|r| r.group.as_str()))
        }

        fn read_temperature(&mut self, key: &SensorKey) -> Option<f64> {
            let readings = self.readings();
            sensor::select(key, &readings)
        }
    }

    // === impl MockSource ===

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockSource {
        /// queues cpu readings. once exhausted, every read returns `0.0`.
        pub fn with_cpu(self, readings: impl IntoIterator<Item = Result<f64, SourceError>>) -> Self {
            self.state().cpu.extend(readings);
            self
        }

        pub fn with_frequency(self, mhz: Option<f64>) -> Self {
            self.state().frequency = mhz;
            self
        }

        pub fn with_load(self, load: Option<LoadAverage>) -> Self {
            self.state().load = load;
            self
        }

        /// the sensor groups present on the mock host.
        pub fn with_sensor_groups(self, groups: &[&str]) -> Self {
            self.state().groups = groups.iter().map(|g| g.to_string()).collect();
            self
        }

        /// queues temperature readings. once exhausted, every read returns `None`.
        pub fn with_temperatures(self, readings: impl IntoIterator<Item = Option<f64>>) -> Self {
            self.state().temperatures.extend(readings);
            self
        }

        /// holds the next cpu read at `gate` until the test has met it twice.
        pub fn pause_next_cpu_read(&self, gate: Arc<Barrier>) {
            self.state().gate = Some(gate);
        }

        pub fn cpu_reads(&self) -> usize {
            self.state().cpu_reads
        }

        pub fn temperature_reads(&self) -> usize {
            self.state().temperature_reads
        }

        pub fn discoveries(&self) -> usize {
            self.state().discoveries
        }

        fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl MetricSource for MockSource {
        fn read_cpu_percent(&mut self) -> Result<f64, SourceError> {
            let (gate, reading) = {
                let mut state = self.state();
                state.cpu_reads += 1;
                (state.gate.take(), state.cpu.pop_front().unwrap_or(Ok(0.0)))
            };

            if let Some(gate) = gate {
                gate.wait();
                gate.wait();
            }
            reading
        }

        fn read_frequency_mhz(&mut self) -> Option<f64> {
            self.state().frequency
        }

        fn read_load_averages(&mut self) -> Option<LoadAverage> {
            self.state().load
        }

        fn read_core_counts(&mut self) -> CoreCounts {
            CoreCounts {
                logical: 8,
                physical: Some(4),
            }
        }

        fn discover_sensor(&mut self, preferences: &[String]) -> Option<SensorKey> {
            let mut state = self.state();
            state.discoveries += 1;
            sensor::discover(preferences, state.groups.iter().map(String::as_str))
        }

        fn read_temperature(&mut self, _: &SensorKey) -> Option<f64> {
            let mut state = self.state();
            state.temperature_reads += 1;
            state.temperatures.pop_front().flatten()
        }
    }
}
