use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::Channel;
use crate::error::Result;

/// Tunables for the heuristic labeller.
///
/// Every field is optional in a config file; missing fields keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Channel whose mean anchors the normal band.
    pub reference_channel: Channel,

    /// Upper bound = trunc(mean * upper_factor).
    pub upper_factor: f64,

    /// Lower bound = trunc(mean * lower_factor).
    pub lower_factor: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            reference_channel: Channel::Vp1,
            upper_factor: 1.09,
            lower_factor: 0.91,
        }
    }
}

impl DetectorConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_band_nine_percent_around_vp1() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.reference_channel, Channel::Vp1);
        assert_eq!(cfg.upper_factor, 1.09);
        assert_eq!(cfg.lower_factor, 0.91);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: DetectorConfig =
            serde_json::from_str(r#"{ "reference_channel": "vp2" }"#).unwrap();
        assert_eq!(cfg.reference_channel, Channel::Vp2);
        assert_eq!(cfg.upper_factor, 1.09);
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector.json");
        std::fs::write(&path, r#"{ "upper_factor": 1.2, "lower_factor": 0.8 }"#).unwrap();

        let cfg = DetectorConfig::from_file(&path).unwrap();
        assert_eq!(cfg.upper_factor, 1.2);
        assert_eq!(cfg.lower_factor, 0.8);
    }
}
