use shared::{Candidate, DetectionResult, QualityReport, WasteCategory};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::catalog::CategoryCatalog;
use crate::config::ClassificationConfig;

pub const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("Probability vector is empty")]
    Empty,
    #[error("Expected {expected} probabilities, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Probability {value} at index {index} is not within [0, 1]")]
    InvalidProbability { index: usize, value: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub chosen: Candidate,
    pub alternatives: Vec<Candidate>,
}

/// Turns a model's probability vector into a chosen label plus runners-up.
/// Ties always resolve to the lower label index.
#[derive(Debug, Clone)]
pub struct ClassificationRanker {
    labels: Vec<WasteCategory>,
    confidence_threshold: f32,
    catalog: Arc<CategoryCatalog>,
}

impl ClassificationRanker {
    pub fn new(
        labels: Vec<WasteCategory>,
        confidence_threshold: f32,
        catalog: Arc<CategoryCatalog>,
    ) -> Self {
        Self {
            labels,
            confidence_threshold,
            catalog,
        }
    }

    pub fn from_config(config: &ClassificationConfig, catalog: Arc<CategoryCatalog>) -> Self {
        Self::new(config.labels.clone(), config.confidence_threshold, catalog)
    }

    pub fn labels(&self) -> &[WasteCategory] {
        &self.labels
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn rank(&self, probabilities: &[f32]) -> Result<Ranking, RankingError> {
        if probabilities.is_empty() {
            return Err(RankingError::Empty);
        }
        if probabilities.len() != self.labels.len() {
            return Err(RankingError::LengthMismatch {
                expected: self.labels.len(),
                actual: probabilities.len(),
            });
        }
        if let Some((index, &value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0 || **p > 1.0)
        {
            return Err(RankingError::InvalidProbability { index, value });
        }

        // stable sort keeps ascending index order among equal probabilities
        let mut order: Vec<usize> = (0..probabilities.len()).collect();
        order.sort_by(|&a, &b| {
            probabilities[b]
                .partial_cmp(&probabilities[a])
                .unwrap_or(Ordering::Equal)
        });

        let candidate = |index: usize| Candidate {
            category: self.labels[index],
            confidence: probabilities[index],
        };

        Ok(Ranking {
            chosen: candidate(order[0]),
            alternatives: order
                .iter()
                .skip(1)
                .take(MAX_ALTERNATIVES)
                .map(|&index| candidate(index))
                .collect(),
        })
    }

    pub fn is_confident(&self, confidence: f32) -> bool {
        confidence >= self.confidence_threshold
    }

    pub fn classify_and_enrich(
        &self,
        probabilities: &[f32],
        quality: QualityReport,
    ) -> Result<DetectionResult, RankingError> {
        let Ranking {
            chosen,
            alternatives,
        } = self.rank(probabilities)?;

        Ok(DetectionResult {
            detected_category: chosen.category,
            confidence_score: chosen.confidence,
            alternatives,
            category_info: self.catalog.get(chosen.category).clone(),
            is_confident: self.is_confident(chosen.confidence),
            quality_analysis: quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared::IntoEnumIterator;

    fn ranker() -> ClassificationRanker {
        ClassificationRanker::new(
            WasteCategory::iter().collect(),
            0.7,
            Arc::new(CategoryCatalog::builtin()),
        )
    }

    fn quality() -> QualityReport {
        QualityReport {
            blur_score: 250.0,
            brightness: 120.0,
            contrast: 60.0,
            quality_score: 97.0,
            recommendations: vec!["Image quality is good for detection.".to_string()],
        }
    }

    #[test]
    fn uniform_vector_picks_lowest_indices() {
        let ranking = ranker().rank(&[1.0 / 9.0; 9]).unwrap();
        assert_eq!(ranking.chosen.category, WasteCategory::Plastic);
        let alternatives: Vec<WasteCategory> =
            ranking.alternatives.iter().map(|c| c.category).collect();
        assert_eq!(
            alternatives,
            vec![WasteCategory::Paper, WasteCategory::Glass, WasteCategory::Metal]
        );
    }

    #[test]
    fn tied_maximum_resolves_to_lower_index() {
        let probs = [0.05, 0.05, 0.3, 0.05, 0.3, 0.05, 0.1, 0.05, 0.05];
        let ranking = ranker().rank(&probs).unwrap();
        assert_eq!(ranking.chosen.category, WasteCategory::Glass);
        assert_eq!(ranking.alternatives[0].category, WasteCategory::Organic);
        assert_eq!(ranking.alternatives[1].category, WasteCategory::Hazardous);
        assert_eq!(ranking.alternatives[2].category, WasteCategory::Plastic);
    }

    #[test]
    fn confidence_threshold_is_inclusive() {
        let ranker = ranker();
        let mut probs = [0.0375f32; 9];
        probs[3] = 0.7;
        let result = ranker.classify_and_enrich(&probs, quality()).unwrap();
        assert_eq!(result.detected_category, WasteCategory::Metal);
        assert!(result.is_confident);

        probs[3] = 0.69;
        let result = ranker.classify_and_enrich(&probs, quality()).unwrap();
        assert!(!result.is_confident);
    }

    #[test]
    fn result_is_enriched_from_catalog() {
        let mut probs = [0.01f32; 9];
        probs[5] = 0.92;
        let result = ranker().classify_and_enrich(&probs, quality()).unwrap();
        assert_eq!(result.detected_category, WasteCategory::Electronic);
        assert_eq!(result.category_info.disposal_method, "E-waste collection center");
        assert_eq!(result.quality_analysis, quality());
    }

    #[test]
    fn small_label_sets_yield_fewer_alternatives() {
        let ranker = ClassificationRanker::new(
            vec![WasteCategory::Organic, WasteCategory::Other],
            0.7,
            Arc::new(CategoryCatalog::builtin()),
        );
        let ranking = ranker.rank(&[0.2, 0.8]).unwrap();
        assert_eq!(ranking.chosen.category, WasteCategory::Other);
        assert_eq!(ranking.alternatives.len(), 1);
        assert_eq!(ranking.alternatives[0].category, WasteCategory::Organic);
    }

    #[test]
    fn malformed_vectors_are_rejected() {
        let ranker = ranker();
        assert!(matches!(ranker.rank(&[]), Err(RankingError::Empty)));
        assert!(matches!(
            ranker.rank(&[0.5, 0.5]),
            Err(RankingError::LengthMismatch { expected: 9, actual: 2 })
        ));
        let mut probs = [0.1f32; 9];
        probs[4] = f32::NAN;
        assert!(matches!(
            ranker.rank(&probs),
            Err(RankingError::InvalidProbability { index: 4, .. })
        ));
        probs[4] = 1.5;
        assert!(matches!(
            ranker.rank(&probs),
            Err(RankingError::InvalidProbability { index: 4, .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn alternatives_exclude_chosen_and_are_ordered(
            probs in prop::collection::vec(0.0f32..=1.0, 9)
        ) {
            let ranking = ranker().rank(&probs).unwrap();
            prop_assert!(ranking.alternatives.len() <= MAX_ALTERNATIVES);
            prop_assert_eq!(ranking.alternatives.len(), 3);
            for alternative in &ranking.alternatives {
                prop_assert_ne!(alternative.category, ranking.chosen.category);
                prop_assert!(ranking.chosen.confidence >= alternative.confidence);
            }
            for pair in ranking.alternatives.windows(2) {
                prop_assert!(pair[0].confidence >= pair[1].confidence);
            }
        }

        #[test]
        fn unique_maximum_is_always_chosen(
            probs in prop::collection::vec(0.0f32..0.5, 9),
            winner in 0usize..9,
        ) {
            let mut probs = probs;
            probs[winner] = 0.9;
            let ranking = ranker().rank(&probs).unwrap();
            let labels: Vec<WasteCategory> = WasteCategory::iter().collect();
            prop_assert_eq!(ranking.chosen.category, labels[winner]);
            prop_assert_eq!(ranking.chosen.confidence, 0.9);
        }
    }
}
