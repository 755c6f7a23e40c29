// Classifier - boundary to an externally trained music/speech model
//
// The pipeline's contract ends at the feature triple. A classifier maps the
// three features to a label from the "is music" vocabulary ("yes"/"no").
// Its internals are opaque to this crate; `LinearModel` only evaluates
// weights that were fitted elsewhere and shipped as JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::features::FeatureVector;
use crate::error::ExtractionError;

/// Classifier verdict: is the clip music?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    /// Music ("yes")
    #[serde(rename = "yes")]
    Music,
    /// Speech ("no")
    #[serde(rename = "no")]
    Speech,
}

impl Label {
    pub fn from_is_music(is_music: bool) -> Self {
        if is_music {
            Label::Music
        } else {
            Label::Speech
        }
    }

    /// Vocabulary string used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Music => "yes",
            Label::Speech => "no",
        }
    }
}

/// Maps a feature vector to a label
///
/// Implementations must be safe to call from several worker threads.
/// Degenerate features (NaN energy distribution) should be rejected with
/// `ExtractionError::DegenerateSpectrum` rather than guessed at.
pub trait ClipClassifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> Result<Label, ExtractionError>;
}

/// Per-feature weights of a [`LinearModel`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub energy_distribution: f64,
    pub zero_crossing_rate: f64,
    pub average_energy: f64,
}

/// Logistic model over the three features
///
/// p(music) = 1 / (1 + e^-(w·x + bias)); label is Music when p >= threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: FeatureWeights,
    pub bias: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl LinearModel {
    /// Parse and validate a model from JSON text
    pub fn from_json(json: &str) -> Result<Self, ExtractionError> {
        let model: LinearModel =
            serde_json::from_str(json).map_err(|err| ExtractionError::InvalidModel {
                reason: err.to_string(),
            })?;
        model.validate()?;
        Ok(model)
    }

    /// Load a model from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| ExtractionError::InvalidModel {
            reason: format!("reading {}: {}", path.display(), err),
        })?;
        let model = Self::from_json(&json)?;
        log::info!("[Classifier] Loaded linear model from {:?}", path);
        Ok(model)
    }

    fn validate(&self) -> Result<(), ExtractionError> {
        let w = &self.weights;
        let finite = [
            w.energy_distribution,
            w.zero_crossing_rate,
            w.average_energy,
            self.bias,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite {
            return Err(ExtractionError::InvalidModel {
                reason: "weights and bias must be finite".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ExtractionError::InvalidModel {
                reason: format!("threshold {} outside [0, 1]", self.threshold),
            });
        }
        Ok(())
    }

    /// Probability that the clip is music
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let w = &self.weights;
        let z = w.energy_distribution * features.energy_distribution as f64
            + w.zero_crossing_rate * features.zero_crossing_rate
            + w.average_energy * features.average_energy
            + self.bias;
        1.0 / (1.0 + (-z).exp())
    }
}

impl ClipClassifier for LinearModel {
    fn classify(&self, features: &FeatureVector) -> Result<Label, ExtractionError> {
        if features.is_degenerate() {
            return Err(ExtractionError::DegenerateSpectrum);
        }
        Ok(Label::from_is_music(
            self.probability(features) >= self.threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LinearModel {
        // Low ZCR and high energy lean towards music
        LinearModel {
            weights: FeatureWeights {
                energy_distribution: 0.0,
                zero_crossing_rate: -40.0,
                average_energy: 20.0,
            },
            bias: 2.0,
            threshold: 0.5,
        }
    }

    fn features(energy_distribution: f32, zcr: f64, energy: f64) -> FeatureVector {
        FeatureVector {
            energy_distribution,
            zero_crossing_rate: zcr,
            average_energy: energy,
        }
    }

    #[test]
    fn test_classify_music_and_speech() {
        let model = model();
        assert_eq!(
            model.classify(&features(900.0, 0.02, 0.2)).unwrap(),
            Label::Music
        );
        assert_eq!(
            model.classify(&features(2500.0, 0.3, 0.01)).unwrap(),
            Label::Speech
        );
    }

    #[test]
    fn test_degenerate_features_are_rejected() {
        let err = model().classify(&features(f32::NAN, 0.0, 0.0)).unwrap_err();
        assert_eq!(err, ExtractionError::DegenerateSpectrum);
    }

    #[test]
    fn test_probability_bounds() {
        let model = model();
        let p = model.probability(&features(0.0, 0.0, 0.0));
        assert!((p - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
        let p = model.probability(&features(0.0, 1.0, 0.0));
        assert!((0.0..0.01).contains(&p));
    }

    #[test]
    fn test_from_json_defaults_threshold() {
        let json = r#"{
            "weights": {"energy_distribution": 0.001, "zero_crossing_rate": -10.0, "average_energy": 5.0},
            "bias": 0.5
        }"#;
        let model = LinearModel::from_json(json).unwrap();
        assert_eq!(model.threshold, 0.5);
        assert_eq!(model.weights.zero_crossing_rate, -10.0);
    }

    #[test]
    fn test_from_json_rejects_bad_models() {
        let missing = r#"{"bias": 0.5}"#;
        assert!(matches!(
            LinearModel::from_json(missing),
            Err(ExtractionError::InvalidModel { .. })
        ));

        let bad_threshold = r#"{
            "weights": {"energy_distribution": 0.0, "zero_crossing_rate": 0.0, "average_energy": 0.0},
            "bias": 0.0,
            "threshold": 1.5
        }"#;
        assert!(matches!(
            LinearModel::from_json(bad_threshold),
            Err(ExtractionError::InvalidModel { .. })
        ));
    }

    #[test]
    fn test_label_vocabulary() {
        assert_eq!(Label::Music.as_str(), "yes");
        assert_eq!(Label::Speech.as_str(), "no");
        assert_eq!(serde_json::to_string(&Label::Music).unwrap(), "\"yes\"");
        let parsed: Label = serde_json::from_str("\"no\"").unwrap();
        assert_eq!(parsed, Label::Speech);
    }
}
