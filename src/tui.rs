use {
    crate::{
        config::{Settings, Thresholds},
        interrupt::Interrupt,
        meter::{Meter, joined},
        sampler::{Monitor, Snapshot},
        source::Clock,
        stats::{Severity, classify},
    },
    crossterm::{
        ExecutableCommand, QueueableCommand, cursor,
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        style::Stylize,
        terminal::{self, ClearType},
    },
    std::{
        io::{self, Write},
        thread,
    },
    tracing::{info, warn},
};

/// the live view.
///
/// paints the latest snapshot at its own cadence, independent of how often the sampler runs.
pub struct Tui<'a> {
    pub settings: &'a Settings,
    pub thresholds: &'a Thresholds,
}

/// restores the terminal when dropped, on every exit path.
struct Screen;

// === impl Tui ===

impl Tui<'_> {
    /// paints until the user asks to quit, an interrupt arrives, or the monitor stops.
    ///
    /// if the terminal cannot be taken over, or painting fails, this falls back to printing a
    /// status line per sample. sampling carries on either way; stopping is left to the caller.
    pub fn run<C: Clock>(&self, monitor: &Monitor<C>, interrupt: &Interrupt) -> io::Result<()> {
        match self.live(monitor, interrupt) {
            Ok(()) => Ok(()),
            Err(error) => {
                warn!(%error, "live view unavailable; falling back to plain output");
                self.plain(&mut io::stdout(), monitor, interrupt)
            }
        }
    }

    fn live<C: Clock>(&self, monitor: &Monitor<C>, interrupt: &Interrupt) -> io::Result<()> {
        let _screen = Screen::enter()?;
        let mut stdout = io::stdout();
        let refresh = self.settings.refresh_interval();

        while monitor.is_running() && !interrupt.is_raised() {
            self.paint(&mut stdout, &monitor.snapshot())?;

            if event::poll(refresh)? {
                if let Event::Key(key) = event::read()? {
                    if Self::is_quit(&key) {
                        info!("quit requested from the keyboard");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// prints the meter and rolling figures once per new cpu sample.
    fn plain<C: Clock>(
        &self,
        out: &mut impl Write,
        monitor: &Monitor<C>,
        interrupt: &Interrupt,
    ) -> io::Result<()> {
        let refresh = self.settings.refresh_interval();
        let mut last = None;

        while monitor.is_running() && !interrupt.is_raised() {
            let snapshot = monitor.snapshot();
            let at = snapshot.readings().latest().map(|r| r.at);
            if at != last {
                last = at;
                let lines = self.lines(&snapshot)?;
                writeln!(out, "{}", joined(lines.iter().take(2).map(String::as_str)))?;
                out.flush()?;
            }
            thread::sleep(refresh);
        }

        Ok(())
    }

    fn paint(&self, out: &mut impl Write, snapshot: &Snapshot) -> io::Result<()> {
        let lines = self.lines(snapshot)?;

        for (row, line) in lines.iter().enumerate() {
            out.queue(cursor::MoveTo(0, row as u16))?;
            out.write_all(line.as_bytes())?;
            out.queue(terminal::Clear(ClearType::UntilNewLine))?;
        }
        out.queue(terminal::Clear(ClearType::FromCursorDown))?;

        out.flush()
    }

    /// the rows of the live view, top to bottom.
    fn lines(&self, snapshot: &Snapshot) -> io::Result<Vec<String>> {
        let Self {
            settings,
            thresholds,
        } = self;
        let cpu = |value: f64| classify(value, thresholds.cpu_warn, thresholds.cpu_crit);
        let temp = |value: f64| classify(value, thresholds.temp_warn, thresholds.temp_crit);

        let mut lines = Vec::new();

        // the meter.
        let current = snapshot.latest_cpu().unwrap_or(0.0);
        let mut meter = Vec::new();
        Meter {
            name: "CPU Usage",
            value: current,
            width: settings.bar_width,
            severity: cpu(current),
        }
        .draw(&mut meter)?;
        lines.push(String::from_utf8_lossy(&meter).into_owned());

        // rolling cpu figures.
        let (average, peak) = (snapshot.average_cpu(), snapshot.peak_cpu());
        let load = snapshot
            .latest_load()
            .map(|load| format!("{:.2}", load.one))
            .unwrap_or_else(|| "N/A".to_owned());
        lines.push(joined([
            format!("Average CPU: {}", cpu(average).paint(format!("{average:.1}%"))).as_str(),
            format!("Peak: {}", cpu(peak).paint(format!("{peak:.1}%"))).as_str(),
            format!("1 minute load average: {load}").as_str(),
        ]));

        let cores = snapshot.cores();
        let physical = cores
            .physical
            .map(|n| n.to_string())
            .unwrap_or_else(|| "N/A".to_owned());
        lines.push(joined([
            format!("Logical CPU Cores: {}", cores.logical).as_str(),
            format!("Physical CPU Cores: {physical}").as_str(),
        ]));

        // temperature, if any was ever read.
        match snapshot.latest_temperature() {
            Some(current) => {
                let average = snapshot.average_temperature();
                lines.push(joined([
                    format!("Current Temp: {}", temp(current).paint(format!("{current:.1}°C")))
                        .as_str(),
                    format!("Average Temp: {}", temp(average).paint(format!("{average:.1}°C")))
                        .as_str(),
                ]));
            }
            None => lines.push(format!("{}", "No temperature data".yellow())),
        }

        if let Some(mhz) = snapshot.latest_frequency() {
            lines.push(format!("Current CPU Frequency: {mhz:.0} MHz"));
        }

        if let Some(notice) = snapshot.notice() {
            lines.push(format!("{}", Severity::Critical.paint(notice)));
        }

        lines.push(String::new());
        lines.push(format!("{}", "press q or ctrl-c to stop".grey()));

        Ok(lines)
    }

    fn is_quit(key: &KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }

        match key.code {
            KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
            KeyCode::Char('q') | KeyCode::Esc => true,
            _ => false,
        }
    }
}

// === impl Screen ===

impl Screen {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(error) = stdout
            .execute(terminal::EnterAlternateScreen)
            .and_then(|out| out.execute(cursor::Hide))
            .and_then(|out| out.execute(terminal::Clear(ClearType::All)))
        {
            let _ = terminal::disable_raw_mode();
            return Err(error);
        }

        Ok(Self)
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout
            .execute(cursor::Show)
            .and_then(|out| out.execute(terminal::LeaveAlternateScreen));
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            sampler::Sampler,
            source::{LoadAverage, MockSource, SystemClock},
        },
        std::time::Duration,
    };

    fn lines(snapshot: &Snapshot) -> Vec<String> {
        let settings = Settings::default();
        let thresholds = Thresholds::default();
        let tui = Tui {
            settings: &settings,
            thresholds: &thresholds,
        };
        tui.lines(snapshot).unwrap()
    }

    fn probe() -> MockSource {
        MockSource::default().with_cpu([Ok(0.0)])
    }

    #[test]
    fn shows_cpu_figures() {
        let source = probe()
            .with_cpu([Ok(50.0), Ok(75.0), Ok(95.0), Ok(60.0)])
            .with_load(Some(LoadAverage {
                one: 0.42,
                five: 0.3,
                fifteen: 0.2,
            }));
        let snapshot = Snapshot::recorded(&Settings::default(), source, 4);
        let lines = lines(&snapshot);

        assert!(lines[0].starts_with("CPU Usage: ["));
        assert!(lines[0].ends_with(" 60%"));
        assert!(lines[1].contains("70.0%"));
        assert!(lines[1].contains("95.0%"));
        assert!(lines[1].contains("1 minute load average: 0.42"));
        assert!(lines[2].contains("Logical CPU Cores: 8"));
        assert!(lines[2].contains("Physical CPU Cores: 4"));
    }

    #[test]
    fn degrades_without_temperature() {
        let snapshot = Snapshot::recorded(&Settings::default(), probe(), 3);
        let lines = lines(&snapshot);

        assert!(lines.iter().any(|l| l.contains("No temperature data")));
        assert!(!lines.iter().any(|l| l.contains("Current Temp")));
        assert!(!lines.iter().any(|l| l.contains("Frequency")));
        assert!(lines[1].contains("1 minute load average: N/A"));
    }

    #[test]
    fn shows_temperature_and_frequency() {
        let source = probe()
            .with_frequency(Some(2400.4))
            .with_sensor_groups(&["coretemp"])
            .with_temperatures([Some(61.0)]);
        let snapshot = Snapshot::recorded(&Settings::default(), source, 1);
        let lines = lines(&snapshot);

        assert!(lines.iter().any(|l| l.contains("Current Temp") && l.contains("61.0°C")));
        assert!(lines.iter().any(|l| l == "Current CPU Frequency: 2400 MHz"));
    }

    fn fast() -> Settings {
        Settings {
            sample_interval_secs: 0.01,
            refresh_interval_secs: 0.005,
            ..Settings::default()
        }
    }

    #[test]
    fn plain_output_runs_until_interrupted() {
        let settings = fast();
        let thresholds = Thresholds::default();
        let tui = Tui {
            settings: &settings,
            thresholds: &thresholds,
        };
        let monitor = Sampler::new(&settings, probe(), SystemClock).start().unwrap();

        let interrupt = Interrupt::default();
        let handler = interrupt.clone();
        let raiser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            handler.raise();
        });

        let mut out = Vec::new();
        tui.plain(&mut out, &monitor, &interrupt).unwrap();
        raiser.join().unwrap();

        // the view returns on the interrupt; the session is still the caller's to stop.
        assert!(interrupt.is_raised());
        assert!(monitor.is_running());
        assert!(monitor.stop());
        let last = monitor.join().unwrap();
        assert!(last.ended().is_some());
        assert!(!last.readings().is_empty());

        let out = String::from_utf8(out).unwrap();
        assert!(out.lines().count() >= 1);
        assert!(out.lines().all(|l| l.starts_with("CPU Usage: [") && l.contains("Average CPU")));
    }

    #[test]
    fn plain_output_ends_with_the_session() {
        let settings = fast();
        let thresholds = Thresholds::default();
        let tui = Tui {
            settings: &settings,
            thresholds: &thresholds,
        };
        let monitor = Sampler::new(&settings, probe(), SystemClock).start().unwrap();
        monitor.stop();

        let mut out = Vec::new();
        tui.plain(&mut out, &monitor, &Interrupt::default()).unwrap();
        assert!(monitor.join().is_ok());
    }

    #[test]
    fn quit_keys() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);

        assert!(Tui::is_quit(&ctrl_c));
        assert!(!Tui::is_quit(&plain_c));
        assert!(Tui::is_quit(&q));
        assert!(Tui::is_quit(&esc));
    }
}
