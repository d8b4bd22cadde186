//! a live cpu usage and temperature monitor.
//!
//! run with:  `RUST_LOG=debug cpuwatch --outdir ~/logs`

use {
    anyhow::Context,
    chrono::Local,
    clap::Parser,
    cpuwatch::{
        Config, Interrupt, Sampler, SysinfoSource, SystemClock, Tui, config, export, report,
    },
    std::{
        fs::OpenOptions,
        io,
        path::PathBuf,
        sync::Mutex,
    },
    tracing_subscriber::EnvFilter,
};

/// watch cpu usage, temperature, frequency and load until interrupted.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// default directory for the csv export (default: the current directory).
    #[arg(long, value_name = "DIR")]
    outdir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let Args { outdir } = Args::parse();
    logging();
    tracing::info!("cpuwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let path = config::default_path();
    let Config {
        settings,
        thresholds,
    } = config::load(&path).with_context(|| format!("invalid config at '{}'", path.display()))?;

    let outdir = match outdir {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };

    // raw mode swallows the keyboard's ctrl-c, so this only sees signals sent from outside.
    let interrupt = Interrupt::install().unwrap_or_else(|error| {
        tracing::warn!(%error, "cannot install an interrupt handler");
        Interrupt::default()
    });

    let monitor = Sampler::new(&settings, SysinfoSource::new(), SystemClock)
        .start()
        .context("cannot start sampling")?;

    let painted = Tui {
        settings: &settings,
        thresholds: &thresholds,
    }
    .run(&monitor, &interrupt);

    if interrupt.is_raised() {
        tracing::info!("interrupted; shutting down");
    }
    monitor.stop();
    let snapshot = monitor.join()?;

    if let Err(error) = painted {
        tracing::error!(%error, "live view failed");
        eprintln!("live view failed: {error}");
    }

    let mut stdout = io::stdout();
    report::summary(&mut stdout, &snapshot, &thresholds)?;
    report::quote(&mut stdout, &mut rand::rng())?;
    export::offer(
        &mut io::stdin().lock(),
        &mut stdout,
        &snapshot,
        &outdir,
        Local::now(),
    )?;

    Ok(())
}

/// logs to a file, since the terminal belongs to the live view.
///
/// `RUST_LOG` controls verbosity (default: info). `CPUWATCH_LOG` overrides the file's location.
fn logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let path = std::env::var_os("CPUWATCH_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("cpuwatch.log"));

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .init(),
    }
}
