use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use shared::{
    CategoryListing, DetectionResult, FeedbackRequest, FeedbackResponse, ScanRequest,
    ScanResponse, ScanStats, UserProgress, WasteCategory,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::CategoryCatalog;
use crate::config::{ConfigError, SorterConfig};
use crate::model::{InferenceError, Model};
use crate::preprocess::{self, PreprocessError};
use crate::progression::{EcoEvent, EcoProgressionEngine, FeedbackLedger, ProgressionError};
use crate::quality::ImageQualityAnalyzer;
use crate::ranking::{ClassificationRanker, RankingError};
use crate::records::{ScanLocation, ScanRecord};
use crate::stats;

pub const FEEDBACK_MESSAGE: &str = "Feedback submitted successfully";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Ranking(#[from] RankingError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Image is empty")]
    EmptyImage,
    #[error("File too large: {size} bytes exceeds the {max} byte limit")]
    ImageTooLarge { size: usize, max: usize },
    #[error("Invalid file type '{0}'. Only JPEG and PNG images are allowed.")]
    UnsupportedMimeType(String),
    #[error("Latitude must be within [-90, 90] and longitude within [-180, 180]")]
    InvalidLocation,
    #[error("Model produces {model} scores but {labels} labels are configured")]
    LabelCountMismatch { model: usize, labels: usize },
    #[error("Scan not found")]
    ScanMismatch,
    #[error("Feedback already recorded for scan {0}")]
    FeedbackAlreadyRecorded(Uuid),
    #[error("Unknown waste category '{0}'")]
    UnknownCategory(String),
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub detection: DetectionResult,
    pub record: ScanRecord,
    pub progress: UserProgress,
    pub eco_points_earned: u64,
}

impl ScanOutcome {
    pub fn to_response(&self) -> ScanResponse {
        ScanResponse {
            detection: self.detection.clone(),
            scan_id: self.record.id,
            eco_points_earned: self.eco_points_earned,
            progress: self.progress.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackOutcome {
    pub record: ScanRecord,
    pub progress: UserProgress,
    pub eco_points_earned: u64,
}

impl FeedbackOutcome {
    pub fn to_response(&self) -> FeedbackResponse {
        FeedbackResponse {
            message: FEEDBACK_MESSAGE.to_string(),
            eco_points_earned: self.eco_points_earned,
            progress: self.progress.clone(),
        }
    }
}

/// Everything a scan needs, built once at startup and shared by clones.
#[derive(Clone)]
pub struct ScanPipeline {
    config: Arc<SorterConfig>,
    catalog: Arc<CategoryCatalog>,
    analyzer: ImageQualityAnalyzer,
    model: Model,
    ranker: ClassificationRanker,
    engine: EcoProgressionEngine,
}

impl ScanPipeline {
    pub fn new(
        config: SorterConfig,
        catalog: Arc<CategoryCatalog>,
        model: Model,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let labels = config.classification.labels.len();
        if model.num_labels() != labels {
            return Err(PipelineError::LabelCountMismatch {
                model: model.num_labels(),
                labels,
            });
        }

        let ranker = ClassificationRanker::from_config(&config.classification, catalog.clone());
        let engine = EcoProgressionEngine::from_config(&config)?;

        Ok(Self {
            config: Arc::new(config),
            catalog,
            analyzer: ImageQualityAnalyzer::new(),
            model,
            ranker,
            engine,
        })
    }

    /// Builds the built-in catalog and loads the configured model.
    pub fn from_config(config: SorterConfig) -> Result<Self, PipelineError> {
        let model = Model::load(&config.model, config.classification.labels.len());
        Self::new(config, Arc::new(CategoryCatalog::builtin()), model)
    }

    pub fn config(&self) -> &SorterConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn engine(&self) -> &EcoProgressionEngine {
        &self.engine
    }

    /// Quality analysis and inference run side by side; only inference can fail.
    pub fn detect(&self, image_data: &[u8]) -> Result<DetectionResult, PipelineError> {
        let (quality, probabilities) = rayon::join(
            || self.analyzer.analyze(image_data),
            || -> Result<Vec<f32>, PipelineError> {
                let tensor = preprocess::preprocess(image_data, self.model.input_size())?;
                Ok(self.model.classify(&tensor)?)
            },
        );
        let probabilities = probabilities?;
        Ok(self.ranker.classify_and_enrich(&probabilities, quality)?)
    }

    pub fn scan(
        &self,
        user_id: Uuid,
        image_data: &[u8],
        mime_type: Option<&str>,
        progress: &UserProgress,
        location: Option<ScanLocation>,
    ) -> Result<ScanOutcome, PipelineError> {
        self.validate_upload(image_data, mime_type)?;
        if let Some(location) = &location {
            if !location.is_valid() {
                return Err(PipelineError::InvalidLocation);
            }
        }

        let detection = self.detect(image_data)?;
        let (progress, eco_points_earned) = self.engine.award(progress, &EcoEvent::Scan)?;
        let record = ScanRecord::from_detection(user_id, image_data, &detection, location);

        log::info!(
            "Scan {} for user {}: {} ({:.2}, confident: {})",
            record.id,
            user_id,
            detection.detected_category,
            detection.confidence_score,
            detection.is_confident
        );

        Ok(ScanOutcome {
            detection,
            record,
            progress,
            eco_points_earned,
        })
    }

    pub fn scan_request(
        &self,
        user_id: Uuid,
        request: &ScanRequest,
        progress: &UserProgress,
    ) -> Result<ScanOutcome, PipelineError> {
        let image_data = STANDARD.decode(request.image_data.trim())?;
        let location = ScanLocation {
            label: request.location.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
        };
        self.scan(
            user_id,
            &image_data,
            request.mime_type.as_deref(),
            progress,
            Some(location),
        )
    }

    pub fn submit_feedback(
        &self,
        user_id: Uuid,
        record: &ScanRecord,
        progress: &UserProgress,
        request: &FeedbackRequest,
    ) -> Result<FeedbackOutcome, PipelineError> {
        if record.id != request.scan_id || record.user_id != user_id {
            return Err(PipelineError::ScanMismatch);
        }
        if record.has_feedback() {
            return Err(PipelineError::FeedbackAlreadyRecorded(record.id));
        }

        let correction = match request.user_correction.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(
                WasteCategory::from_str(name)
                    .map_err(|_| PipelineError::UnknownCategory(name.to_string()))?,
            ),
        };

        let (progress, eco_points_earned) =
            FeedbackLedger::new(&self.engine).apply(progress, request.user_confirmed)?;

        let mut record = record.clone();
        record.record_feedback(
            request.user_confirmed,
            correction,
            request.feedback_notes.clone(),
        );

        log::info!(
            "Feedback on scan {}: confirmed={}, {} points",
            record.id,
            request.user_confirmed,
            eco_points_earned
        );

        Ok(FeedbackOutcome {
            record,
            progress,
            eco_points_earned,
        })
    }

    pub fn stats(&self, records: &[ScanRecord]) -> ScanStats {
        stats::scan_stats(records, &self.catalog)
    }

    pub fn categories(&self) -> Vec<CategoryListing> {
        self.catalog.listing(self.ranker.labels())
    }

    fn validate_upload(&self, image_data: &[u8], mime_type: Option<&str>) -> Result<(), PipelineError> {
        if image_data.is_empty() {
            return Err(PipelineError::EmptyImage);
        }
        let max = self.config.upload.max_image_bytes;
        if image_data.len() > max {
            return Err(PipelineError::ImageTooLarge {
                size: image_data.len(),
                max,
            });
        }
        if let Some(mime_type) = mime_type {
            let allowed = self
                .config
                .upload
                .allowed_mime_types
                .iter()
                .any(|m| m.eq_ignore_ascii_case(mime_type.trim()));
            if !allowed {
                return Err(PipelineError::UnsupportedMimeType(mime_type.to_string()));
            }
        }
        Ok(())
    }
}
