use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Feature order the classifier was trained on. The evaluator builds its
/// input vector in exactly this order; artifacts declaring any other order
/// are rejected at load time.
pub const FEATURE_NAMES: [&str; 13] = [
    "Age",
    "Sex",
    "Weight_kg",
    "Height_cm",
    "BMI",
    "Cohort",
    "ALT",
    "Creatinine",
    "SBP",
    "DBP",
    "HR",
    "Temp_C",
    "AdverseEvent",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),
}

/// Pre-trained binary classifier: a standardized logistic regression
/// exported as JSON (feature names, coefficients, intercept, scaler
/// mean/scale, decision threshold).
///
/// Loaded once at startup and treated as an immutable pure function from a
/// fixed-length feature vector to a 0/1 label for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityModel {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    scaler_mean: Vec<f64>,
    scaler_scale: Vec<f64>,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

const fn default_threshold() -> f64 {
    0.5
}

impl EligibilityModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;

        info!(
            "Eligibility model loaded from {} ({} features)",
            path.display(),
            model.coefficients.len()
        );

        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.len() != FEATURE_COUNT {
            return Err(ModelError::Invalid(format!(
                "expected {} feature names, got {}",
                FEATURE_COUNT,
                self.feature_names.len()
            )));
        }

        for (declared, expected) in self.feature_names.iter().zip(FEATURE_NAMES) {
            if declared != expected {
                return Err(ModelError::Invalid(format!(
                    "feature order mismatch: expected {expected}, artifact declares {declared}"
                )));
            }
        }

        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::Invalid(format!(
                "expected {} coefficients, got {}",
                FEATURE_COUNT,
                self.coefficients.len()
            )));
        }

        if self.scaler_mean.len() != FEATURE_COUNT || self.scaler_scale.len() != FEATURE_COUNT {
            return Err(ModelError::Invalid(
                "scaler mean/scale length must match the feature count".to_string(),
            ));
        }

        if self.scaler_scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(ModelError::Invalid(
                "scaler scale entries must be finite and non-zero".to_string(),
            ));
        }

        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Invalid(
                "coefficients and intercept must be finite".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelError::Invalid(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }

        Ok(())
    }

    /// Probability of the positive ("Accepted") class.
    #[must_use]
    pub fn probability(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let z = features
            .iter()
            .zip(&self.scaler_mean)
            .zip(&self.scaler_scale)
            .zip(&self.coefficients)
            .fold(self.intercept, |acc, (((x, mean), scale), coef)| {
                acc + coef * ((x - mean) / scale)
            });

        sigmoid(z)
    }

    /// Binary label for one feature vector: 1 for the positive class,
    /// 0 otherwise.
    #[must_use]
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> i32 {
        i32::from(self.probability(features) >= self.threshold)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
