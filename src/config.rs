use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::predict::Observer;
use crate::steps::Resolution;
use crate::transfer::TransferSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    pub stepper: StepperConfig,
    pub predict: PredictConfig,
    pub serial: SerialConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    /// "latitude,longitude" in degrees.
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StepperConfig {
    pub azimuth_resolution_deg: f64,
    pub elevation_resolution_deg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    pub tle_file: PathBuf,
    #[serde(default = "default_sample_interval", deserialize_with = "duration")]
    pub sample_interval: Duration,
    #[serde(default)]
    pub min_elevation_deg: f64,
    #[serde(default = "default_search_window", deserialize_with = "duration")]
    pub search_window: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Read/write timeout of a single port operation.
    #[serde(default = "default_port_timeout", deserialize_with = "duration")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    #[serde(default = "default_handshake_timeout", deserialize_with = "duration")]
    pub handshake_timeout: Duration,
    #[serde(default = "default_flow_control_interval")]
    pub flow_control_interval: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: default_handshake_timeout(),
            flow_control_interval: default_flow_control_interval(),
        }
    }
}

fn default_sample_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_search_window() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_port_timeout() -> Duration {
    Duration::from_millis(500)
}

fn default_handshake_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_flow_control_interval() -> usize {
    1000
}

fn duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, message: &str| ConfigError::Invalid {
            field,
            message: message.to_string(),
        };

        for (field, value) in [
            (
                "stepper.azimuth_resolution_deg",
                self.stepper.azimuth_resolution_deg,
            ),
            (
                "stepper.elevation_resolution_deg",
                self.stepper.elevation_resolution_deg,
            ),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, "must be a positive number of degrees"));
            }
        }
        if self.predict.sample_interval.is_zero() {
            return Err(invalid("predict.sample_interval", "must not be zero"));
        }
        if self.predict.search_window.is_zero() {
            return Err(invalid("predict.search_window", "must not be zero"));
        }
        // The device takes the starting elevation as an unsigned step count.
        if !(0.0..=90.0).contains(&self.predict.min_elevation_deg) {
            return Err(invalid("predict.min_elevation_deg", "must be within [0, 90]"));
        }
        if self.transfer.flow_control_interval == 0 {
            return Err(invalid("transfer.flow_control_interval", "must not be zero"));
        }
        if self.transfer.handshake_timeout.is_zero() {
            return Err(invalid("transfer.handshake_timeout", "must not be zero"));
        }
        self.observer()?;
        Ok(())
    }

    pub fn observer(&self) -> Result<Observer, ConfigError> {
        Observer::from_coordinates(&self.station.coordinates, self.station.altitude_m).ok_or_else(
            || ConfigError::Invalid {
                field: "station.coordinates",
                message: format!("expected \"lat,lon\", got {:?}", self.station.coordinates),
            },
        )
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(
            self.stepper.azimuth_resolution_deg,
            self.stepper.elevation_resolution_deg,
        )
    }

    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            handshake_timeout: self.transfer.handshake_timeout,
            flow_control_interval: self.transfer.flow_control_interval,
        }
    }
}
