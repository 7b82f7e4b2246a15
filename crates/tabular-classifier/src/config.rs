use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    /// L2-regularized logistic regression fit with L-BFGS.
    Logistic {
        alpha: f64,
        max_iterations: u64,
        gradient_tolerance: f64,
        fit_intercept: bool,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Logistic {
            alpha: 1.0,
            max_iterations: 100,
            gradient_tolerance: 1e-4,
            fit_intercept: true,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" | "logreg" => Ok(ModelType::default()),
            _ => Err(format!("Unknown model type: {}. Valid options are: logistic", s)),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self { model_type }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_type: ModelType::default(),
        }
    }
}

/// How categorical columns are encoded across the train/test/validation tables.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// One encoder per column, fit on the union of all three tables.
    #[default]
    Shared,
    /// Separate encoders per table; a category may map to different codes in different tables.
    PerSplit,
}

impl FromStr for EncodingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "shared" => Ok(EncodingMode::Shared),
            "per_split" => Ok(EncodingMode::PerSplit),
            _ => Err(format!(
                "Unknown encoding mode: {}. Valid options are: shared, per_split",
                s
            )),
        }
    }
}

/// Parameters for a classifier session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub model: ModelConfig,
    pub encoding: EncodingMode,
    /// Fraction of the test table held out when fitting the ROC classifier.
    pub roc_test_size: f64,
    pub roc_seed: u64,
    /// Decimal places kept for the stored train/test/validation accuracies.
    pub score_decimals: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            encoding: EncodingMode::default(),
            roc_test_size: 0.33,
            roc_seed: 0,
            score_decimals: 2,
        }
    }
}

/// Load a session configuration from a JSON file.
pub fn load_session_config<P: AsRef<Path>>(path: P) -> Result<SessionConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: SessionConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
