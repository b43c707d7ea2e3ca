//! Single-layer form model: `sigmoid(w · x + b)`.
//!
//! Weights are stored as JSON: `{"weights": [...], "bias": 0.0}`.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoachError;

use super::FormClassifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticClassifier {
    weights: Vec<f32>,
    bias: f32,
}

impl LogisticClassifier {
    pub fn new(weights: Vec<f32>, bias: f32) -> Result<Self, CoachError> {
        if weights.is_empty() {
            return Err(CoachError::InvalidModel("weight vector is empty".into()));
        }
        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(CoachError::InvalidModel("weights must be finite".into()));
        }
        Ok(Self { weights, bias })
    }

    /// Reads weights from disk. A missing or unreadable file is reported as
    /// [`CoachError::ResourceUnavailable`]; sessions cannot start without it.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|err| CoachError::unavailable("classifier weights", path, err))?;
        let raw: LogisticClassifier = serde_json::from_str(&contents)
            .map_err(|err| CoachError::InvalidModel(format!("{}: {err}", path.display())))?;
        let model = Self::new(raw.weights, raw.bias)?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write classifier weights to {}", path.display()))
    }
}

impl FormClassifier for LogisticClassifier {
    fn predict(&self, features: &[f32]) -> Result<f32> {
        if features.len() != self.weights.len() {
            bail!(
                "feature vector has {} values, model expects {}",
                features.len(),
                self.weights.len()
            );
        }

        let logit = self
            .weights
            .iter()
            .zip(features)
            .fold(self.bias, |acc, (w, x)| acc + w * x);
        Ok(1.0 / (1.0 + (-logit).exp()))
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.weights.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn zero_model_is_undecided() {
        let model = LogisticClassifier::new(vec![0.0; 4], 0.0).unwrap();
        let p = model.predict(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((p - 0.5).abs() < 1e-6);
    }

    #[test]
    fn weights_push_probability() {
        let model = LogisticClassifier::new(vec![4.0, -4.0], 0.0).unwrap();
        assert!(model.predict(&[1.0, 0.0]).unwrap() > 0.9);
        assert!(model.predict(&[0.0, 1.0]).unwrap() < 0.1);
    }

    #[test]
    fn rejects_wrong_input_length() {
        let model = LogisticClassifier::new(vec![1.0; 36], 0.0).unwrap();
        assert!(model.predict(&[0.0; 35]).is_err());
        assert_eq!(model.input_len(), Some(36));
    }

    #[test]
    fn missing_file_is_resource_unavailable() {
        let dir = tempdir().unwrap();
        let err = LogisticClassifier::load(&dir.path().join("bicep_model.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoachError>(),
            Some(CoachError::ResourceUnavailable { .. })
        ));
    }

    #[test]
    fn malformed_file_is_invalid_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{"weights": [], "bias": 0.0}"#).unwrap();
        let err = LogisticClassifier::load(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<CoachError>(), Some(CoachError::InvalidModel(_))));

        fs::write(&path, "not json").unwrap();
        assert!(LogisticClassifier::load(&path).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = LogisticClassifier::new(vec![0.5, -0.25, 1.0], 0.1).unwrap();
        model.save(&path).unwrap();

        let loaded = LogisticClassifier::load(&path).unwrap();
        let x = [0.2, 0.4, 0.6];
        assert_eq!(model.predict(&x).unwrap(), loaded.predict(&x).unwrap());
    }
}
