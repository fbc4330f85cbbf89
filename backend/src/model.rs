use ndarray::{Array1, Array2, Array4, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::ModelConfig;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Expected input tensor of shape [1, 3, {expected}, {expected}], got {actual:?}")]
    InvalidShape { expected: usize, actual: Vec<usize> },
    #[error("Input tensor contains values outside [0, 1]")]
    OutOfRange,
    #[error("Model returned {actual} scores, expected {expected}")]
    OutputLength { expected: usize, actual: usize },
    #[error("Model lock poisoned")]
    Poisoned,
    #[error("Model error: {0}")]
    Backend(String),
}

/// Anything that maps a normalised `[1, 3, S, S]` tensor to one score per label.
pub trait ClassifierModel: Send {
    fn forward(&self, tensor: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Trained(PathBuf),
    Placeholder { reason: String },
    Injected,
}

/// Shared handle to the loaded classifier. Cloning is cheap; every clone
/// serialises access to the same instance.
#[derive(Clone)]
pub struct Model {
    model: Arc<Mutex<Box<dyn ClassifierModel>>>,
    source: ModelSource,
    input_size: u32,
    num_labels: usize,
}

impl Model {
    /// Loads the trained artifact at `config.path`, or falls back to the
    /// deterministic placeholder when the artifact is missing or unusable.
    pub fn load(config: &ModelConfig, num_labels: usize) -> Self {
        if !config.path.exists() {
            return Self::placeholder(
                config,
                num_labels,
                format!("no model artifact at {}", config.path.display()),
            );
        }

        match load_trained(config) {
            Ok(model) => {
                log::info!("Model loaded successfully from {}", config.path.display());
                Self {
                    model: Arc::new(Mutex::new(model)),
                    source: ModelSource::Trained(config.path.clone()),
                    input_size: config.input_size,
                    num_labels,
                }
            }
            Err(e) => {
                log::error!("Failed to load model from {}: {}", config.path.display(), e);
                Self::placeholder(config, num_labels, e.to_string())
            }
        }
    }

    pub fn placeholder(config: &ModelConfig, num_labels: usize, reason: String) -> Self {
        log::warn!(
            "Using placeholder model ({}); predictions are untrained",
            reason
        );
        Self {
            model: Arc::new(Mutex::new(Box::new(PlaceholderModel::new(
                num_labels,
                config.placeholder_seed,
            )))),
            source: ModelSource::Placeholder { reason },
            input_size: config.input_size,
            num_labels,
        }
    }

    pub fn from_backend(model: Box<dyn ClassifierModel>, input_size: u32, num_labels: usize) -> Self {
        Self {
            model: Arc::new(Mutex::new(model)),
            source: ModelSource::Injected,
            input_size,
            num_labels,
        }
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, ModelSource::Placeholder { .. })
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn classify(&self, tensor: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        self.validate_input(tensor)?;

        let output = {
            let model = self.model.lock().map_err(|_| InferenceError::Poisoned)?;
            model.forward(tensor)?
        };

        if output.len() != self.num_labels {
            return Err(InferenceError::OutputLength {
                expected: self.num_labels,
                actual: output.len(),
            });
        }
        Ok(output)
    }

    fn validate_input(&self, tensor: &Array4<f32>) -> Result<(), InferenceError> {
        let size = self.input_size as usize;
        if tensor.shape() != [1, 3, size, size] {
            return Err(InferenceError::InvalidShape {
                expected: size,
                actual: tensor.shape().to_vec(),
            });
        }
        if tensor
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0)
        {
            return Err(InferenceError::OutOfRange);
        }
        Ok(())
    }
}

#[cfg(feature = "torch")]
fn load_trained(config: &ModelConfig) -> Result<Box<dyn ClassifierModel>, InferenceError> {
    let model = torch_backend::TorchModel::load(&config.path, config.apply_softmax)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "torch"))]
fn load_trained(_config: &ModelConfig) -> Result<Box<dyn ClassifierModel>, InferenceError> {
    Err(InferenceError::Backend(
        "built without the `torch` feature".to_string(),
    ))
}

const HIDDEN_UNITS: usize = 128;

/// Untrained stand-in: per-channel global average pool, a ReLU hidden layer
/// and a softmax head, with weights drawn from a seeded RNG.
pub struct PlaceholderModel {
    hidden_weights: Array2<f32>,
    hidden_bias: Array1<f32>,
    output_weights: Array2<f32>,
    output_bias: Array1<f32>,
}

impl PlaceholderModel {
    pub fn new(num_labels: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        // Glorot-uniform limits
        let hidden_limit = (6.0 / (3 + HIDDEN_UNITS) as f32).sqrt();
        let hidden_weights = Array2::from_shape_fn((3, HIDDEN_UNITS), |_| {
            rng.random_range(-hidden_limit..hidden_limit)
        });
        let output_limit = (6.0 / (HIDDEN_UNITS + num_labels.max(1)) as f32).sqrt();
        let output_weights = Array2::from_shape_fn((HIDDEN_UNITS, num_labels), |_| {
            rng.random_range(-output_limit..output_limit)
        });

        Self {
            hidden_weights,
            hidden_bias: Array1::zeros(HIDDEN_UNITS),
            output_weights,
            output_bias: Array1::zeros(num_labels),
        }
    }
}

impl ClassifierModel for PlaceholderModel {
    fn forward(&self, tensor: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let pooled = tensor
            .index_axis(Axis(0), 0)
            .mean_axis(Axis(2))
            .and_then(|rows| rows.mean_axis(Axis(1)))
            .ok_or_else(|| InferenceError::Backend("cannot pool an empty tensor".to_string()))?;

        let hidden = (pooled.dot(&self.hidden_weights) + &self.hidden_bias).mapv(|v| v.max(0.0));
        let logits = hidden.dot(&self.output_weights) + &self.output_bias;
        Ok(softmax(&logits.to_vec()))
    }
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.iter().map(|v| v / sum).collect()
    } else {
        vec![1.0 / logits.len().max(1) as f32; logits.len()]
    }
}

#[cfg(feature = "torch")]
mod torch_backend {
    use super::{ClassifierModel, InferenceError};
    use ndarray::Array4;
    use std::path::Path;
    use tch::{CModule, Device, Kind, Tensor, nn::ModuleT};

    pub struct TorchModel {
        module: CModule,
        device: Device,
        apply_softmax: bool,
    }

    impl TorchModel {
        pub fn load(path: &Path, apply_softmax: bool) -> Result<Self, InferenceError> {
            let device = Device::cuda_if_available();
            let module = CModule::load_on_device(path, device)
                .map_err(|e| InferenceError::Backend(e.to_string()))?;
            Ok(Self {
                module,
                device,
                apply_softmax,
            })
        }
    }

    impl ClassifierModel for TorchModel {
        fn forward(&self, tensor: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            let (n, c, h, w) = tensor.dim();
            let data: Vec<f32> = tensor.iter().copied().collect();
            let input = Tensor::from_slice(&data)
                .view([n as i64, c as i64, h as i64, w as i64])
                .to_device(self.device);

            let output = self.module.forward_t(&input, false);
            let output = if self.apply_softmax {
                output.softmax(-1, Kind::Float)
            } else {
                output
            };
            let output_flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
            let num_elements = output_flat.size()[0] as usize;
            let mut output_vec = vec![0.0f32; num_elements];
            output_flat.copy_data(&mut output_vec, num_elements);
            Ok(output_vec)
        }
    }
}
