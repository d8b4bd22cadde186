//! temperature sensor discovery.
//!
//! sensors are grouped by the driver that exposes them (`coretemp`, `k10temp`, ...). a group is
//! chosen once, from a preference list, and every later reading is taken from that group.

use std::fmt::{self, Display};

/// the name of a discovered temperature sensor group.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SensorKey(String);

/// a single temperature entry, as reported by the platform.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorReading {
    /// the sensor group, e.g. `coretemp`.
    pub group: String,
    /// the entry's label within its group, e.g. `Package id 0`. may be empty.
    pub label: String,
    /// degrees celsius.
    pub celsius: f64,
}

/// returns the first preferred group that is present in `available`.
pub fn discover<'a>(
    preferences: &[String],
    available: impl IntoIterator<Item = &'a str> + Clone,
) -> Option<SensorKey> {
    preferences
        .iter()
        .find(|key| available.clone().into_iter().any(|group| group == key.as_str()))
        .cloned()
        .map(SensorKey)
}

/// picks the package (or core 0) temperature of the given group.
///
/// falls back to the group's first entry if no entry carries a recognizable label.
pub fn select(key: &SensorKey, readings: &[SensorReading]) -> Option<f64> {
    let mut group = readings.iter().filter(|r| r.group == key.0);
    let first = group.clone().next();

    group
        .find(|SensorReading { label, .. }| {
            let label = label.to_lowercase();
            label.contains("package") || label.contains("core 0")
        })
        .or(first)
        .map(|r| r.celsius)
}

// === impl SensorKey ===

impl SensorKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// === impl SensorReading ===

impl SensorReading {
    /// splits a platform label such as `coretemp Package id 0` into its group and entry label.
    pub fn from_label(label: &str, celsius: f64) -> Self {
        let (group, label) = label.trim().split_once(' ').unwrap_or((label.trim(), ""));
        Self {
            group: group.to_owned(),
            label: label.trim().to_owned(),
            celsius,
        }
    }
}
