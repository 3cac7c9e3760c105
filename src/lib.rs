//! Fault labelling for three-channel sensor tables.
//!
//! A [`FaultDetector`] loads a pretrained classifier and a `vp1`/`vp2`/`vp3`
//! table, flags each channel value that falls outside a band around the
//! reference channel's mean, and lines those flags up against the model's
//! own predictions.

pub mod classifier;
pub mod config;
pub mod data;
pub mod detector;
pub mod error;
pub mod format;
pub mod threshold;

pub use classifier::{load_model, Classifier, ModelArtifact};
pub use config::DetectorConfig;
pub use data::{Channel, DataSource, Dataset};
pub use detector::{FaultDetector, LabelComparison};
pub use error::{FaultError, Result};
pub use format::format_predictions;
pub use threshold::ThresholdPair;
