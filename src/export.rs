//! csv export of a finished session.

use {
    crate::{report::TIMESTAMP, sampler::Snapshot},
    chrono::{DateTime, Local},
    crossterm::style::Stylize,
    std::{
        fs::{self, File},
        io::{self, BufRead, BufWriter, Write},
        path::{Path, PathBuf},
    },
    tracing::{info, warn},
};

const HEADER: [&str; 8] = [
    "Sample #",
    "Timestamp",
    "CPU Usage (%)",
    "Temperature (°C)",
    "Frequency (MHz)",
    "Load1",
    "Load5",
    "Load15",
];

/// marks a row with no temperature sample at its index.
const NO_TEMPERATURE: &str = "N/A";

/// what came of offering to save the session.
#[derive(Debug)]
pub enum Outcome {
    Declined,
    Saved(PathBuf),
    Failed(ExportError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// asks whether to save the session and where, then saves it.
///
/// any answer other than `y` declines. a failed save is reported, not returned as an error; only
/// failures of the prompt itself are.
pub fn offer(
    input: &mut impl BufRead,
    output: &mut impl Write,
    snapshot: &Snapshot,
    default_dir: &Path,
    now: DateTime<Local>,
) -> io::Result<Outcome> {
    let answer = ask(
        input,
        output,
        "\nDo you want to save the collected data to CSV? [y/N]: ",
    )?;
    if !answer.eq_ignore_ascii_case("y") {
        writeln!(output, "{}", "Data was not saved.".yellow())?;
        return Ok(Outcome::Declined);
    }

    let prompt = format!("Enter directory to save log [{}]: ", default_dir.display());
    let answer = ask(input, output, &prompt)?;
    let dir = if answer.is_empty() {
        default_dir.to_owned()
    } else {
        PathBuf::from(answer)
    };

    match save(snapshot, &dir, now) {
        Ok(path) => {
            info!(path = %path.display(), "session exported");
            writeln!(
                output,
                "{}",
                format!("Data saved successfully to {}", path.display()).green()
            )?;
            Ok(Outcome::Saved(path))
        }
        Err(error) => {
            warn!(%error, "export failed");
            writeln!(output, "{}", format!("Failed to save data: {error}").red())?;
            Ok(Outcome::Failed(error))
        }
    }
}

/// writes the session to a timestamped csv file in `dir`, creating `dir` if needed.
pub fn save(snapshot: &Snapshot, dir: &Path, now: DateTime<Local>) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_owned(),
        source,
    })?;

    let path = dir.join(file_name(now));
    let write = || -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&path)?);
        write_csv(&mut out, snapshot)?;
        out.flush()
    };
    write().map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

pub fn file_name(now: DateTime<Local>) -> String {
    format!("cpu_log_{}.csv", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// writes one row per cpu sample.
///
/// the temperature window is shorter than the cpu window, so rows past its end carry `N/A`.
pub fn write_csv(out: &mut impl Write, snapshot: &Snapshot) -> io::Result<()> {
    writeln!(out, "{}", HEADER.join(","))?;

    let temperatures = snapshot.temperatures();
    for (i, reading) in snapshot.readings().iter().enumerate() {
        let temperature = temperatures
            .get(i)
            .map(|t| format!("{t:.1}"))
            .unwrap_or_else(|| NO_TEMPERATURE.to_owned());
        let frequency = reading
            .frequency
            .map(|mhz| format!("{mhz:.1}"))
            .unwrap_or_default();
        let [one, five, fifteen] = reading
            .load
            .map(|l| [l.one, l.five, l.fifteen].map(|x| format!("{x:.2}")))
            .unwrap_or_default();

        writeln!(
            out,
            "{},{},{:.1},{temperature},{frequency},{one},{five},{fifteen}",
            i + 1,
            reading.at.format(TIMESTAMP),
            reading.cpu,
        )?;
    }

    Ok(())
}

fn ask(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_owned())
}
