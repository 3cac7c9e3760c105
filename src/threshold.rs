use serde::Serialize;

use crate::config::DetectorConfig;
use crate::data::Dataset;

// ---------------------------------------------------------------------------
// Threshold pair – the "normal" band around the reference mean
// ---------------------------------------------------------------------------

/// Bounds of the normal band. Values at or beyond either bound are faults.
///
/// Degenerate data is not guarded: an empty dataset gives NaN bounds (every
/// value labels 0), a zero mean gives `(0, 0)` and a negative mean gives
/// `upper < lower`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdPair {
    pub upper: f64,
    pub lower: f64,
}

impl ThresholdPair {
    /// Derive the band from the current data. Nothing is cached.
    pub fn derive(dataset: &Dataset, config: &DetectorConfig) -> Self {
        let mean = dataset.mean(config.reference_channel);
        Self::from_mean(mean, config)
    }

    /// Bounds for a given mean, truncated toward zero.
    pub fn from_mean(mean: f64, config: &DetectorConfig) -> Self {
        ThresholdPair {
            upper: (mean * config.upper_factor).trunc(),
            lower: (mean * config.lower_factor).trunc(),
        }
    }

    /// 1 when `value` is outside the band (bounds inclusive), else 0.
    pub fn label(&self, value: f64) -> u8 {
        u8::from(value >= self.upper || value <= self.lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;

    fn dataset(vp1: &[f64]) -> Dataset {
        Dataset::from_rows(vp1.iter().map(|&v| -> Row { [v, 0.0, 0.0] }).collect())
    }

    #[test]
    fn band_around_mean_105() {
        let ds = dataset(&[90.0, 100.0, 110.0, 120.0]);
        let pair = ThresholdPair::derive(&ds, &DetectorConfig::default());
        assert_eq!(pair, ThresholdPair { upper: 114.0, lower: 95.0 });

        assert_eq!(pair.label(120.0), 1);
        assert_eq!(pair.label(110.0), 0);
        assert_eq!(pair.label(100.0), 0);
        assert_eq!(pair.label(90.0), 1);
    }

    #[test]
    fn bounds_are_inclusive() {
        let pair = ThresholdPair { upper: 114.0, lower: 95.0 };
        assert_eq!(pair.label(114.0), 1);
        assert_eq!(pair.label(95.0), 1);
        assert_eq!(pair.label(113.9), 0);
        assert_eq!(pair.label(95.1), 0);
    }

    #[test]
    fn empty_dataset_labels_nothing() {
        let pair = ThresholdPair::derive(&Dataset::default(), &DetectorConfig::default());
        assert!(pair.upper.is_nan() && pair.lower.is_nan());
        assert_eq!(pair.label(0.0), 0);
    }

    #[test]
    fn zero_mean_flags_everything() {
        let pair = ThresholdPair::from_mean(0.0, &DetectorConfig::default());
        assert_eq!(pair, ThresholdPair { upper: 0.0, lower: 0.0 });
        assert_eq!(pair.label(5.0), 1);
        assert_eq!(pair.label(-5.0), 1);
    }

    #[test]
    fn negative_mean_inverts_band() {
        let pair = ThresholdPair::from_mean(-100.0, &DetectorConfig::default());
        assert_eq!(pair, ThresholdPair { upper: -109.0, lower: -91.0 });
        assert!(pair.upper < pair.lower);
        assert_eq!(pair.label(-100.0), 1);
    }

    #[test]
    fn truncation_goes_toward_zero() {
        let pair = ThresholdPair::from_mean(-105.0, &DetectorConfig::default());
        assert_eq!(pair.upper, -114.0);
        assert_eq!(pair.lower, -95.0);
    }
}
