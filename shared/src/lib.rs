use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

pub use strum::IntoEnumIterator;

/// Closed set of material classes the classifier can emit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WasteCategory {
    Plastic,
    Paper,
    Glass,
    Metal,
    Organic,
    Electronic,
    Hazardous,
    Textile,
    Other,
}

impl WasteCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            WasteCategory::Plastic => "Plastic",
            WasteCategory::Paper => "Paper",
            WasteCategory::Glass => "Glass",
            WasteCategory::Metal => "Metal",
            WasteCategory::Organic => "Organic",
            WasteCategory::Electronic => "Electronic",
            WasteCategory::Hazardous => "Hazardous",
            WasteCategory::Textile => "Textile",
            WasteCategory::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub category: WasteCategory,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub is_recyclable: bool,
    pub disposal_method: String,
    pub environmental_impact: String,
    pub recycling_tips: String,
    pub color_code: String,
    pub preparation_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryListing {
    pub name: WasteCategory,
    pub display_name: String,
    #[serde(flatten)]
    pub info: CategoryInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub blur_score: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub quality_score: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detected_category: WasteCategory,
    pub confidence_score: f32,
    pub alternatives: Vec<Candidate>,
    pub category_info: CategoryInfo,
    pub is_confident: bool,
    pub quality_analysis: QualityReport,
}

/// Persisted eco metrics of one user. `eco_level` is always derived from
/// `eco_points` by the progression engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub eco_points: u64,
    pub eco_level: String,
    pub total_scans: u64,
    pub correct_sorts: u64,
}

impl UserProgress {
    pub fn accuracy_rate(&self) -> f64 {
        self.correct_sorts as f64 / self.total_scans.max(1) as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub current_level: String,
    pub next_level: Option<String>,
    pub progress_percentage: f64,
    pub points_to_next: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unlocked: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScanRequest {
    /// Base64-encoded image bytes.
    pub image_data: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScanResponse {
    #[serde(flatten)]
    pub detection: DetectionResult,
    pub scan_id: Uuid,
    pub eco_points_earned: u64,
    pub progress: UserProgress,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FeedbackRequest {
    pub scan_id: Uuid,
    pub user_confirmed: bool,
    #[serde(default)]
    pub user_correction: Option<String>,
    #[serde(default)]
    pub feedback_notes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FeedbackResponse {
    pub message: String,
    pub eco_points_earned: u64,
    pub progress: UserProgress,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub plastic_items_recycled: u64,
    pub trees_saved: f64,
    pub water_saved_liters: f64,
    pub co2_reduced_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: WasteCategory,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_scans: u64,
    pub category_breakdown: Vec<CategoryCount>,
    pub accuracy_percentage: f64,
    pub impact: ImpactSummary,
}
