use serde::{Deserialize, Serialize};
use shared::{IntoEnumIterator, WasteCategory};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::progression::TierSchedule;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    pub model: ModelConfig,
    pub classification: ClassificationConfig,
    pub points: PointsConfig,
    pub tiers: Vec<TierConfig>,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub input_size: u32,
    pub apply_softmax: bool,
    pub placeholder_seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub confidence_threshold: f32,
    pub labels: Vec<WasteCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub scan: u64,
    pub correct_sort: u64,
    pub diy_project: u64,
    /// Points per currency unit spent; fractional results are truncated.
    pub purchase_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub name: String,
    pub threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_image_bytes: usize,
    pub allowed_mime_types: Vec<String>,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            classification: ClassificationConfig::default(),
            points: PointsConfig::default(),
            tiers: default_tiers(),
            upload: UploadConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./models/waste_classifier.pt"),
            input_size: 224,
            apply_softmax: true,
            placeholder_seed: 42,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            labels: WasteCategory::iter().collect(),
        }
    }
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            scan: 10,
            correct_sort: 25,
            diy_project: 50,
            purchase_per_unit: 5.0,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * 1024 * 1024,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/jpg".to_string(),
            ],
        }
    }
}

fn default_tiers() -> Vec<TierConfig> {
    [
        ("Eco Beginner", 0),
        ("Eco Enthusiast", 500),
        ("Eco Warrior", 1500),
        ("Eco Champion", 3000),
        ("Eco Master", 5000),
    ]
    .into_iter()
    .map(|(name, threshold)| TierConfig {
        name: name.to_string(),
        threshold,
    })
    .collect()
}

impl SorterConfig {
    /// Loads `config/sorter.yaml` (or `$ECOSORT_CONFIG`), then applies the
    /// `MODEL_PATH` override. A missing file falls back to the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var("ECOSORT_CONFIG") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_config_path(),
        };

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            log::warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Self::default()
        };

        if let Ok(model_path) = std::env::var("MODEL_PATH") {
            config.model.path = PathBuf::from(model_path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        let config: SorterConfig = serde_yaml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.classification.confidence_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        let labels = &self.classification.labels;
        if labels.is_empty() {
            return Err(ConfigError::Invalid("labels must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for label in labels {
            if !seen.insert(label) {
                return Err(ConfigError::Invalid(format!("duplicate label '{}'", label)));
            }
        }

        if self.model.input_size == 0 {
            return Err(ConfigError::Invalid("model.input_size must be positive".into()));
        }

        let rate = self.points.purchase_per_unit;
        if !rate.is_finite() || rate < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "points.purchase_per_unit must be a non-negative number, got {}",
                rate
            )));
        }

        if self.upload.max_image_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_image_bytes must be positive".into()));
        }

        TierSchedule::new(&self.tiers).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }
}

fn default_config_path() -> PathBuf {
    match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(manifest_dir) => PathBuf::from(format!("{}/../config/sorter.yaml", manifest_dir)),
        Err(_) => PathBuf::from("config/sorter.yaml"),
    }
}
