//! the end-of-session summary.

use {
    crate::{
        config::Thresholds,
        sampler::Snapshot,
        stats::{Severity, classify},
    },
    chrono::TimeDelta,
    crossterm::style::Stylize,
    rand::{Rng, seq::IndexedRandom},
    std::io::{self, Write},
};

pub const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// parting words, one of which closes every session.
pub const QUOTES: &[&str] = &[
    "There's no place like 127.0.0.1. - Anonymous",
    "It's not a bug, it's an undocumented feature. - Anonymous",
    "Data is the new oil. - Clive Humby",
    "Comments: the best way to tell yourself you forgot what you wrote. - Anonymous",
    "The most effective way to do it, is to do it. - Amelia Earhart",
    "Never trust a computer you can't throw out a window. - Steve Wozniak",
    "Readability counts. - Tim Peters",
    "Errors should never pass silently - Unless explicitly silenced. - Tim Peters",
    "In the face of ambiguity, refuse the temptation to guess. - Tim Peters",
    "Thermal sensors: The CPU's early warning system. - Anonymous",
    "Never let a computer know you're in a hurry. - John Carmack",
    "The problem with troubleshooting is that trouble shoots back. - Anonymous",
    "Fast, good, cheap: pick any two. - Anonymous",
    "A cool CPU is a happy CPU. - Anonymous",
    "Keep calm and cool your CPU. - Anonymous",
    "Talk is cheap. Show me the code. - Linus Torvalds",
    "Intelligence is the ability to avoid doing work, yet getting the work done. - Linus Torvalds",
    "Programming isn't about what you know; it's about what you can figure out. - Chris Pine",
    "Heat is a reminder that even machines have limits. - Anonymous",
    "Thermal throttling: When your CPU begs for mercy. - Anonymous",
    "Liquid cooling: Because sometimes air just isn't enough. - Anonymous",
    "The Cloud is just someone else's computer. - Richard Stallman",
    "Code never lies, comments sometimes do. - Ron Jeffries",
    "Hardware: The parts of a computer you can kick. - Jeff Pesis",
    "There are two ways to write error-free programs; only the third one works. - Alan J. Perlis",
    "Any sufficiently advanced bug is indistinguishable from a feature. - Rich Kulawiec",
    "Overclocking: Because faster crashes are still crashes. - Anonymous",
    "If at first you don't succeed, call it version 1.0. - Anonymous",
    "Fans: The unsung heroes keeping your CPU from becoming a toaster. - Anonymous",
    "Sometimes the best upgrade is just blowing the dust out. - Anonymous",
    "Thermal paste: The unsung hero between your CPU and sanity. - Anonymous",
    "A good CPU never sleeps, but it sure wishes it could. - Anonymous",
    "A CPU's job is simple: Think fast, don't overheat. - Anonymous",
    "The CPU obeys code, not your wishes. - Anonymous",
    "Heat is the silent enemy of performance. - Anonymous",
    "Fans spin so your CPU can think. - Anonymous",
    "Instructions speak louder than intentions to a CPU. - Anonymous",
    "A hot CPU is a slow CPU in disguise. - Anonymous",
    "DevOps: Propagating errors in automated ways. - Kai Lentit",
    "Intentions require empathy; CPUs require precision. - Anonymous",
];

/// prints start and finish times, then cpu and temperature statistics.
pub fn summary(out: &mut impl Write, snapshot: &Snapshot, thresholds: &Thresholds) -> io::Result<()> {
    let Thresholds {
        cpu_warn,
        cpu_crit,
        temp_warn,
        temp_crit,
    } = *thresholds;

    writeln!(out)?;
    writeln!(out, "{}", "Summary:".green().bold())?;

    if let (Some(started), Some(ended), Some(duration)) =
        (snapshot.started(), snapshot.ended(), snapshot.duration())
    {
        writeln!(out, "{} {}", "Monitoring started:".cyan(), started.format(TIMESTAMP))?;
        writeln!(out, "{} {}", "Monitoring finished:".cyan(), ended.format(TIMESTAMP))?;
        writeln!(out, "{} {}", "Total duration:".cyan(), hms(duration))?;
        writeln!(out)?;
    }

    if snapshot.readings().is_empty() {
        writeln!(out, "{}", "No CPU usage data collected.".yellow())?;
    } else {
        let cpu = |value: f64| colored(value, "%", classify(value, cpu_warn, cpu_crit));
        writeln!(out, "Average CPU usage: {}", cpu(snapshot.average_cpu()))?;
        writeln!(out, "Min CPU usage: {}", cpu(snapshot.min_cpu()))?;
        writeln!(out, "Max CPU usage: {}", cpu(snapshot.peak_cpu()))?;
    }

    if snapshot.temperatures().is_empty() {
        writeln!(out, "{}", "No temperature data was collected.".yellow())?;
    } else {
        let temp = |value: f64| colored(value, "°C", classify(value, temp_warn, temp_crit));
        writeln!(out, "Average temperature: {}", temp(snapshot.average_temperature()))?;
        writeln!(out, "Min temperature: {}", temp(snapshot.min_temperature()))?;
        writeln!(out, "Max temperature: {}", temp(snapshot.peak_temperature()))?;
    }

    out.flush()
}

/// formats a duration as `{h}h {m}m {s}s`, truncating fractional seconds.
pub fn hms(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, rest) = (total / 3600, total % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    format!("{hours}h {minutes}m {seconds}s")
}

/// prints one of [`QUOTES`], in magenta.
pub fn quote(out: &mut impl Write, rng: &mut impl Rng) -> io::Result<()> {
    if let Some(quote) = QUOTES.choose(rng) {
        writeln!(out)?;
        writeln!(out, "{}", quote.magenta())?;
    }
    out.flush()
}

fn colored(value: f64, unit: &str, severity: Severity) -> String {
    format!("{}", severity.paint(format!("{value:.1}{unit}")))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{config::Settings, source::MockSource},
        rand::{SeedableRng, rngs::StdRng},
    };

    fn render(snapshot: &Snapshot) -> String {
        let mut out = Vec::new();
        summary(&mut out, snapshot, &Thresholds::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn durations() {
        assert_eq!(hms(TimeDelta::seconds(0)), "0h 0m 0s");
        assert_eq!(hms(TimeDelta::milliseconds(59_900)), "0h 0m 59s");
        assert_eq!(hms(TimeDelta::seconds(3_725)), "1h 2m 5s");
        assert_eq!(hms(TimeDelta::seconds(-5)), "0h 0m 0s");
    }

    #[test]
    fn reports_cpu_and_temperature() {
        let source = MockSource::default()
            .with_cpu([Ok(0.0), Ok(50.0), Ok(75.0), Ok(95.0), Ok(60.0)])
            .with_sensor_groups(&["coretemp"])
            .with_temperatures([Some(72.0)]);
        let snapshot = Snapshot::recorded(&Settings::default(), source, 4);
        let text = render(&snapshot);

        assert!(text.contains("Monitoring started:"));
        assert!(text.contains("Total duration:"));
        assert!(text.contains("0h 0m 2s"));
        assert!(text.contains("Average CPU usage: ") && text.contains("70.0%"));
        assert!(text.contains("Min CPU usage: ") && text.contains("50.0%"));
        assert!(text.contains("Max CPU usage: ") && text.contains("95.0%"));
        assert!(text.contains("Average temperature: ") && text.contains("72.0°C"));
        assert!(!text.contains("No temperature data"));
    }

    #[test]
    fn reports_missing_temperature() {
        let source = MockSource::default().with_cpu([Ok(0.0), Ok(10.0)]);
        let snapshot = Snapshot::recorded(&Settings::default(), source, 1);
        let text = render(&snapshot);

        assert!(text.contains("No temperature data was collected."));
        assert!(!text.contains("Average temperature"));
    }

    #[test]
    fn reports_missing_cpu() {
        let source = MockSource::default().with_cpu([
            Ok(0.0),
            Err(crate::source::SourceError::Other("gone".into())),
        ]);
        let snapshot = Snapshot::recorded(&Settings::default(), source, 1);
        let text = render(&snapshot);

        assert!(text.contains("No CPU usage data collected."));
    }

    #[test]
    fn closes_with_a_quote() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut out = Vec::new();
        quote(&mut out, &mut rng).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(QUOTES.iter().filter(|q| text.contains(*q)).count(), 1);
        assert!(text.starts_with('\n'));
    }
}
