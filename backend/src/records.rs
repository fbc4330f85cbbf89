use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{Candidate, DetectionResult, WasteCategory};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanLocation {
    pub label: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ScanLocation {
    /// Coordinates, when present, must be finite and on the globe.
    pub fn is_valid(&self) -> bool {
        let latitude_ok = self
            .latitude
            .is_none_or(|lat| lat.is_finite() && (-90.0..=90.0).contains(&lat));
        let longitude_ok = self
            .longitude
            .is_none_or(|lon| lon.is_finite() && (-180.0..=180.0).contains(&lon));
        latitude_ok && longitude_ok
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.latitude.is_none() && self.longitude.is_none()
    }
}

/// One classified upload as handed to the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_hash: String,
    pub image_size: usize,
    // Detection
    pub detected_category: WasteCategory,
    pub confidence_score: f32,
    pub alternative_categories: Vec<Candidate>,
    // Guidance snapshot
    pub is_recyclable: bool,
    pub disposal_method: String,
    pub environmental_impact: String,
    pub recycling_tips: String,
    // Feedback
    pub user_confirmed: Option<bool>,
    pub user_correction: Option<WasteCategory>,
    pub feedback_notes: Option<String>,
    pub location: Option<ScanLocation>,
    pub scanned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn from_detection(
        user_id: Uuid,
        image_data: &[u8],
        detection: &DetectionResult,
        location: Option<ScanLocation>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            image_hash: Self::calculate_image_hash(image_data),
            image_size: image_data.len(),
            detected_category: detection.detected_category,
            confidence_score: detection.confidence_score,
            alternative_categories: detection.alternatives.clone(),
            is_recyclable: detection.category_info.is_recyclable,
            disposal_method: detection.category_info.disposal_method.clone(),
            environmental_impact: detection.category_info.environmental_impact.clone(),
            recycling_tips: detection.category_info.recycling_tips.clone(),
            user_confirmed: None,
            user_correction: None,
            feedback_notes: None,
            location: location.filter(|l| !l.is_empty()),
            scanned_at: now,
            updated_at: now,
        }
    }

    pub fn calculate_image_hash(image_data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_data);
        hex::encode(hasher.finalize())
    }

    pub fn has_feedback(&self) -> bool {
        self.user_confirmed.is_some()
    }

    /// The category the user says the item really is, if they corrected us.
    pub fn effective_category(&self) -> WasteCategory {
        self.user_correction.unwrap_or(self.detected_category)
    }

    pub fn record_feedback(
        &mut self,
        confirmed: bool,
        correction: Option<WasteCategory>,
        notes: Option<String>,
    ) {
        self.user_confirmed = Some(confirmed);
        self.user_correction = correction;
        self.feedback_notes = notes;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CategoryCatalog;
    use shared::QualityReport;

    fn detection() -> DetectionResult {
        DetectionResult {
            detected_category: WasteCategory::Glass,
            confidence_score: 0.81,
            alternatives: vec![Candidate {
                category: WasteCategory::Plastic,
                confidence: 0.1,
            }],
            category_info: CategoryCatalog::builtin().get(WasteCategory::Glass).clone(),
            is_confident: true,
            quality_analysis: QualityReport {
                blur_score: 0.0,
                brightness: 0.0,
                contrast: 0.0,
                quality_score: 0.0,
                recommendations: vec![],
            },
        }
    }

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            ScanRecord::calculate_image_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn record_snapshots_detection() {
        let user = Uuid::new_v4();
        let record = ScanRecord::from_detection(user, b"image-bytes", &detection(), None);
        assert_eq!(record.user_id, user);
        assert_eq!(record.image_size, 11);
        assert_eq!(record.detected_category, WasteCategory::Glass);
        assert!(record.is_recyclable);
        assert_eq!(record.alternative_categories.len(), 1);
        assert!(!record.has_feedback());
        assert_eq!(record.scanned_at, record.updated_at);
    }

    #[test]
    fn feedback_updates_record() {
        let mut record = ScanRecord::from_detection(Uuid::new_v4(), b"x", &detection(), None);
        record.record_feedback(false, Some(WasteCategory::Plastic), Some("bottle".into()));
        assert!(record.has_feedback());
        assert_eq!(record.user_confirmed, Some(false));
        assert_eq!(record.effective_category(), WasteCategory::Plastic);
        assert!(record.updated_at >= record.scanned_at);
    }

    #[test]
    fn location_bounds() {
        let mut location = ScanLocation {
            label: Some("Kitchen".into()),
            latitude: Some(52.52),
            longitude: Some(13.405),
        };
        assert!(location.is_valid());
        location.latitude = Some(91.0);
        assert!(!location.is_valid());
        location.latitude = None;
        location.longitude = Some(f64::INFINITY);
        assert!(!location.is_valid());

        let empty = ScanLocation {
            label: None,
            latitude: None,
            longitude: None,
        };
        let record = ScanRecord::from_detection(Uuid::new_v4(), b"x", &detection(), Some(empty));
        assert!(record.location.is_none());
    }
}
