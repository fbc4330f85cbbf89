pub mod catalog;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod progression;
pub mod quality;
pub mod ranking;
pub mod records;
pub mod stats;

pub use catalog::CategoryCatalog;
pub use config::SorterConfig;
pub use model::{ClassifierModel, Model, ModelSource};
pub use pipeline::{PipelineError, ScanOutcome, ScanPipeline};
pub use progression::{EcoEvent, EcoProgressionEngine};
pub use quality::ImageQualityAnalyzer;
pub use ranking::ClassificationRanker;
pub use records::{ScanLocation, ScanRecord};
