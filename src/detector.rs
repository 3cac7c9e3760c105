use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::classifier::{load_model, Classifier};
use crate::config::DetectorConfig;
use crate::data::{self, Channel, DataSource, Dataset};
use crate::error::{FaultError, Result};
use crate::format::format_predictions;
use crate::threshold::ThresholdPair;

// ---------------------------------------------------------------------------
// LabelComparison – the two parallel outputs
// ---------------------------------------------------------------------------

/// Heuristic and model labels, one entry per loaded row.
///
/// The two sequences are produced independently; nothing checks one
/// against the other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelComparison {
    /// Three `0`/`1` flags per row, in `vp1 vp2 vp3` order.
    pub heuristic: Vec<String>,
    /// Zero-padded model predictions.
    pub predicted: Vec<String>,
}

impl LabelComparison {
    pub fn len(&self) -> usize {
        self.heuristic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristic.is_empty()
    }

    /// Rows where both strings are equal.
    pub fn agreement(&self) -> usize {
        self.heuristic
            .iter()
            .zip(&self.predicted)
            .filter(|(h, p)| h == p)
            .count()
    }

    /// Fraction of agreeing rows; `None` when there are no rows.
    pub fn agreement_ratio(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.agreement() as f64 / self.len() as f64)
        }
    }

    /// Iterate `(heuristic, predicted)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.heuristic
            .iter()
            .zip(&self.predicted)
            .map(|(h, p)| (h.as_str(), p.as_str()))
    }
}

// ---------------------------------------------------------------------------
// FaultDetector
// ---------------------------------------------------------------------------

/// A loaded model plus the normalized sensor table it is applied to.
#[derive(Debug)]
pub struct FaultDetector {
    model: Box<dyn Classifier>,
    data: Dataset,
    config: DetectorConfig,
}

impl FaultDetector {
    /// Load the model artifact and the data, failing on the first error.
    pub fn new(model_path: &Path, source: DataSource, config: DetectorConfig) -> Result<Self> {
        let model = load_model(model_path)?;
        Self::with_classifier(model, source, config)
    }

    /// Use an already constructed classifier.
    pub fn with_classifier(
        model: Box<dyn Classifier>,
        source: DataSource,
        config: DetectorConfig,
    ) -> Result<Self> {
        let data = data::load(source)?;
        info!("Detector ready with {} rows", data.len());
        Ok(FaultDetector {
            model,
            data,
            config,
        })
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Fresh bounds from the current data.
    pub fn thresholds(&self) -> ThresholdPair {
        ThresholdPair::derive(&self.data, &self.config)
    }

    /// Label a single value against freshly derived bounds.
    pub fn assign_label(&self, value: f64) -> u8 {
        self.thresholds().label(value)
    }

    /// Heuristic label string for every row.
    pub fn heuristic_labels(&self) -> Vec<String> {
        let pair = self.thresholds();
        debug!(
            "Thresholds from {} mean: upper {} lower {}",
            self.config.reference_channel, pair.upper, pair.lower
        );
        self.data
            .rows()
            .iter()
            .map(|row| {
                Channel::ALL
                    .iter()
                    .map(|ch| char::from(b'0' + pair.label(row[ch.index()])))
                    .collect()
            })
            .collect()
    }

    /// Run both labellers over every row.
    pub fn predict_labels(&self) -> Result<LabelComparison> {
        let heuristic = self.heuristic_labels();

        let raw = self.model.predict(self.data.rows())?;
        if raw.len() != self.data.len() {
            return Err(FaultError::PredictionCountMismatch {
                got: raw.len(),
                expected: self.data.len(),
            });
        }
        let predicted = format_predictions(&raw)?;

        let comparison = LabelComparison {
            heuristic,
            predicted,
        };
        info!(
            "Labelled {} rows, {} agree",
            comparison.len(),
            comparison.agreement()
        );
        Ok(comparison)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::data::Row;

    /// Echoes the first channel back as the label.
    #[derive(Debug)]
    struct EchoVp1;

    impl Classifier for EchoVp1 {
        fn predict(&self, rows: &[Row]) -> Result<Vec<f64>> {
            Ok(rows.iter().map(|r| r[0]).collect())
        }
    }

    /// Returns one prediction too few.
    #[derive(Debug)]
    struct ShortModel;

    impl Classifier for ShortModel {
        fn predict(&self, rows: &[Row]) -> Result<Vec<f64>> {
            Ok(vec![0.0; rows.len().saturating_sub(1)])
        }
    }

    fn detector(rows: &[Row]) -> FaultDetector {
        FaultDetector::with_classifier(
            Box::new(EchoVp1),
            DataSource::from_rows(rows),
            DetectorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn labels_follow_vp1_band() {
        let det = detector(&[
            [90.0, 100.0, 120.0],
            [100.0, 100.0, 100.0],
            [110.0, 90.0, 114.0],
            [120.0, 95.0, 96.0],
        ]);

        assert_eq!(det.thresholds(), ThresholdPair { upper: 114.0, lower: 95.0 });
        assert_eq!(det.assign_label(120.0), 1);
        assert_eq!(det.assign_label(100.0), 0);
        assert_eq!(det.assign_label(90.0), 1);

        let out = det.predict_labels().unwrap();
        assert_eq!(out.heuristic, vec!["101", "000", "011", "110"]);
        assert_eq!(out.predicted, vec!["090", "100", "110", "120"]);
    }

    #[test]
    fn outputs_have_one_entry_per_row() {
        let det = detector(&[[1.0, 1.0, 1.0], [2.0, 2.0, 2.0], [3.0, 3.0, 3.0]]);
        let out = det.predict_labels().unwrap();
        assert_eq!(out.heuristic.len(), 3);
        assert_eq!(out.predicted.len(), 3);
    }

    #[test]
    fn complete_data_keeps_every_row() {
        let mut cols = BTreeMap::new();
        cols.insert("vp1".to_string(), vec![Some(1.0), Some(2.0)]);
        cols.insert("vp2".to_string(), vec![Some(3.0), Some(4.0)]);
        cols.insert("vp3".to_string(), vec![Some(5.0), Some(6.0)]);
        let det = FaultDetector::with_classifier(
            Box::new(EchoVp1),
            DataSource::Mapping(cols),
            DetectorConfig::default(),
        )
        .unwrap();
        assert_eq!(det.data().len(), 2);
    }

    #[test]
    fn unsupported_source_fails_construction() {
        let err = DataSource::try_from(json!(3.5)).unwrap_err();
        assert!(matches!(err, FaultError::UnsupportedSource(_)));
    }

    #[test]
    fn short_model_output_is_an_error() {
        let det = FaultDetector::with_classifier(
            Box::new(ShortModel),
            DataSource::from_rows(&[[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]),
            DetectorConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            det.predict_labels(),
            Err(FaultError::PredictionCountMismatch { got: 1, expected: 2 })
        ));
    }

    #[test]
    fn reference_channel_is_configurable() {
        let det = FaultDetector::with_classifier(
            Box::new(EchoVp1),
            DataSource::from_rows(&[[0.0, 100.0, 0.0], [0.0, 100.0, 0.0]]),
            DetectorConfig {
                reference_channel: Channel::Vp2,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(det.thresholds(), ThresholdPair { upper: 109.0, lower: 91.0 });
    }

    #[test]
    fn agreement_counts_equal_rows() {
        let cmp = LabelComparison {
            heuristic: vec!["101".into(), "000".into(), "010".into()],
            predicted: vec!["101".into(), "001".into(), "010".into()],
        };
        assert_eq!(cmp.agreement(), 2);
        assert_eq!(cmp.agreement_ratio(), Some(2.0 / 3.0));

        let empty = LabelComparison {
            heuristic: vec![],
            predicted: vec![],
        };
        assert_eq!(empty.agreement_ratio(), None);
    }
}
