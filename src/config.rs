//! Configuration for the conversion pipeline and its collaborators.

use crate::core::timebase::{TimeBase, TimestampPolicy};
use crate::error::{BridgeError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration.
///
/// Defaults mirror the acquisition setup the pipeline was built around:
/// a BITalino-style recorder at 100 Hz with the ECG on `channel_2` and
/// sequence numbers in `nSeq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sampling rate of the recording in Hz
    pub sampling_rate_hz: f64,

    /// Device group the channel lives under (MAC-style id)
    pub device_id: String,

    /// Channel dataset to extract
    pub channel: String,

    /// Sequence-number dataset
    pub index_field: String,

    /// Subject reference stamped on every observation
    pub subject: String,

    /// How the base instant for counter 0 is chosen
    pub timestamp: TimestampPolicy,

    /// Which counter elapsed time is derived from
    pub time_base: TimeBase,

    /// Directory scanned for input recordings
    pub data_path: PathBuf,

    /// Path the observation collection is written to
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecg-fhir-bridge");

        Self {
            sampling_rate_hz: 100.0,
            device_id: "98:D3:21:FC:8B:12".to_string(),
            channel: "channel_2".to_string(),
            index_field: "nSeq".to_string(),
            subject: "Patient/1".to_string(),
            timestamp: TimestampPolicy::FixedDate {
                date: NaiveDate::from_ymd_opt(2024, 12, 23).expect("valid date"),
            },
            time_base: TimeBase::default(),
            data_path: base_dir.join("data"),
            output_path: base_dir.join("output").join("fhir_observations.json"),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to the
    /// defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| BridgeError::Io(format!("reading {config_path:?}: {e}")))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| BridgeError::Format(format!("{config_path:?}: {e}")))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BridgeError::Io(format!("creating {parent:?}: {e}")))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BridgeError::Serialize(e.to_string()))?;
        std::fs::write(&config_path, content)
            .map_err(|e| BridgeError::Io(format!("writing {config_path:?}: {e}")))?;

        Ok(())
    }

    /// Path of the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecg-fhir-bridge")
            .join("config.json")
    }

    /// Ensure the data directory and the output parent directory exist.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| BridgeError::Io(format!("creating {:?}: {e}", self.data_path)))?;
        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BridgeError::Io(format!("creating {parent:?}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sampling_rate_hz, 100.0);
        assert_eq!(config.channel, "channel_2");
        assert_eq!(config.index_field, "nSeq");
        assert_eq!(config.subject, "Patient/1");
        assert_eq!(config.time_base, TimeBase::DeviceSequence);
        assert!(matches!(config.timestamp, TimestampPolicy::FixedDate { .. }));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.device_id, config.device_id);
        assert_eq!(back.timestamp, config.timestamp);
        assert_eq!(back.time_base, config.time_base);
    }
}
