//! immutable runtime settings.
//!
//! configuration is read once at startup from a TOML file and is never mutated afterwards.
//! every field has a default, so an absent file (or an absent key) is not an error.

use {
    serde::Deserialize,
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
};

/// the complete configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub settings: Settings,
    pub thresholds: Thresholds,
}

/// warn and critical levels for the colored metrics.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub cpu_warn: f64,
    pub cpu_crit: f64,
    pub temp_warn: f64,
    pub temp_crit: f64,
}

/// sampling cadences, window length and display options.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// seconds between cpu, frequency and load samples.
    pub sample_interval_secs: f64,
    /// seconds between temperature samples.
    pub temp_sample_interval_secs: f64,
    /// seconds of history retained for every metric.
    pub window_duration_secs: f64,
    /// seconds between repaints of the live view.
    pub refresh_interval_secs: f64,
    /// width of the cpu meter, in cells.
    pub bar_width: usize,
    /// temperature sensor groups, in order of preference.
    pub sensor_keys: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// loads configuration from a TOML file.
///
/// returns [`Config::default()`] if the file doesn't exist.
pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;

    let config = raw.parse::<Config>()?;
    tracing::info!("loaded config from '{}'", path.display());
    Ok(config)
}

/// returns the config path, honouring `$CPUWATCH_CONFIG` and then `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os("CPUWATCH_CONFIG") {
        return PathBuf::from(path);
    }

    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("cpuwatch").join("cpuwatch.toml")
}

// === impl Config ===

impl std::str::FromStr for Config {
    type Err = ConfigError;
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let config = toml::from_str::<Config>(raw)?;
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            settings,
            thresholds,
        } = self;

        settings.validate()?;
        thresholds.validate()
    }
}

// === impl Thresholds ===

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_warn: 70.0,
            cpu_crit: 90.0,
            temp_warn: 70.0,
            temp_crit: 85.0,
        }
    }
}

impl Thresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            cpu_warn,
            cpu_crit,
            temp_warn,
            temp_crit,
        } = self;

        if cpu_warn > cpu_crit {
            return Err(ConfigError::Invalid(format!(
                "cpu_warn ({cpu_warn}) is above cpu_crit ({cpu_crit})"
            )));
        }
        if temp_warn > temp_crit {
            return Err(ConfigError::Invalid(format!(
                "temp_warn ({temp_warn}) is above temp_crit ({temp_crit})"
            )));
        }

        Ok(())
    }
}

// === impl Settings ===

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_interval_secs: 0.5,
            temp_sample_interval_secs: 2.0,
            window_duration_secs: 10.0,
            refresh_interval_secs: 0.25,
            bar_width: 40,
            sensor_keys: ["coretemp", "cpu_thermal", "k10temp", "acpitz"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl Settings {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs_f64(self.sample_interval_secs)
    }

    pub fn temp_sample_interval(&self) -> Duration {
        Duration::from_secs_f64(self.temp_sample_interval_secs)
    }

    pub fn window_duration(&self) -> Duration {
        Duration::from_secs_f64(self.window_duration_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("sample_interval_secs", self.sample_interval_secs),
            ("temp_sample_interval_secs", self.temp_sample_interval_secs),
            ("window_duration_secs", self.window_duration_secs),
            ("refresh_interval_secs", self.refresh_interval_secs),
        ];
        for (name, value) in positive {
            // `!(x > 0)` also rejects NaN.
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number of seconds, got {value}"
                )));
            }
        }

        if self.temp_sample_interval_secs < self.sample_interval_secs {
            return Err(ConfigError::Invalid(
                "temp_sample_interval_secs must not be shorter than sample_interval_secs".into(),
            ));
        }

        if self.bar_width == 0 {
            return Err(ConfigError::Invalid("bar_width must be non-zero".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.settings.sample_interval(), Duration::from_millis(500));
        assert_eq!(config.settings.temp_sample_interval(), Duration::from_secs(2));
        assert_eq!(config.thresholds.cpu_crit, 90.0);
    }

    #[test]
    fn empty_file_is_default() {
        let config = "".parse::<Config>().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_overrides() {
        const RAW: &str = r#"
            [settings]
            sample_interval_secs = 1.0
            sensor_keys = ["k10temp"]

            [thresholds]
            cpu_warn = 50.0
        "#;
        let config = RAW.parse::<Config>().unwrap();
        assert_eq!(config.settings.sample_interval_secs, 1.0);
        assert_eq!(config.settings.sensor_keys, ["k10temp"]);
        assert_eq!(config.settings.window_duration_secs, 10.0);
        assert_eq!(config.thresholds.cpu_warn, 50.0);
        assert_eq!(config.thresholds.cpu_crit, 90.0);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        const RAW: &str = "[thresholds]\ntemp_warn = 95.0\n";
        let err = RAW.parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_interval() {
        const RAW: &str = "[settings]\nsample_interval_secs = 0.0\n";
        let err = RAW.parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_fast_temperature_cadence() {
        const RAW: &str = "[settings]\ntemp_sample_interval_secs = 0.1\n";
        let err = RAW.parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        const RAW: &str = "[settings]\nsample_rate = 3\n";
        let err = RAW.parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpuwatch.toml");
        std::fs::write(&path, "[settings]\nbar_width = 20\n").unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.settings.bar_width, 20);
    }
}
