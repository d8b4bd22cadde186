//! a live cpu usage and temperature monitor.
//!
//! a [`Sampler`] reads host metrics on its own thread into fixed-length sliding windows. the live
//! view and the end-of-session report only ever read [`Snapshot`]s copied out from under its lock.

pub use self::{
    config::{Config, Settings, Thresholds},
    interrupt::Interrupt,
    sampler::{Monitor, Phase, Reading, Sampler, SamplerError, Snapshot},
    sensor::SensorKey,
    source::{Clock, CoreCounts, LoadAverage, MetricSource, SourceError, SysinfoSource, SystemClock},
    stats::Severity,
    tui::Tui,
    window::Window,
};

pub mod config;
pub mod export;
pub mod interrupt;
pub mod report;
pub mod sensor;
pub mod stats;

/// a percentage meter.
mod meter;

/// the background sampler and its snapshots.
pub mod sampler;

/// sources of host metrics, and of time.
pub mod source;

/// the live terminal view.
mod tui;

/// fixed-capacity sliding windows.
pub mod window;
