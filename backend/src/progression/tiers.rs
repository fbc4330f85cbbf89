use shared::LevelProgress;
use std::collections::HashSet;

use super::ProgressionError;
use crate::config::TierConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub name: String,
    pub threshold: u64,
}

/// Ordered tiers with strictly ascending thresholds, the first at 0.
#[derive(Debug, Clone)]
pub struct TierSchedule {
    tiers: Vec<Tier>,
}

impl TierSchedule {
    pub fn new(tiers: &[TierConfig]) -> Result<Self, ProgressionError> {
        let first = tiers.first().ok_or(ProgressionError::EmptySchedule)?;
        if first.threshold != 0 {
            return Err(ProgressionError::NonZeroBase(first.threshold));
        }

        let mut names = HashSet::new();
        for tier in tiers {
            if tier.name.trim().is_empty() {
                return Err(ProgressionError::EmptyTierName);
            }
            if !names.insert(tier.name.as_str()) {
                return Err(ProgressionError::DuplicateTier(tier.name.clone()));
            }
        }

        for pair in tiers.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(ProgressionError::NotAscending {
                    previous: pair[0].name.clone(),
                    previous_threshold: pair[0].threshold,
                    name: pair[1].name.clone(),
                    threshold: pair[1].threshold,
                });
            }
        }

        Ok(Self {
            tiers: tiers
                .iter()
                .map(|t| Tier {
                    name: t.name.clone(),
                    threshold: t.threshold,
                })
                .collect(),
        })
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn initial(&self) -> &Tier {
        &self.tiers[0]
    }

    /// Index of the highest tier whose threshold is at most `points`.
    pub fn index_for(&self, points: u64) -> usize {
        self.tiers
            .iter()
            .rposition(|t| t.threshold <= points)
            .unwrap_or(0)
    }

    pub fn tier_for(&self, points: u64) -> &Tier {
        &self.tiers[self.index_for(points)]
    }

    pub fn level_progress(&self, points: u64) -> LevelProgress {
        let index = self.index_for(points);
        let current = &self.tiers[index];

        match self.tiers.get(index + 1) {
            Some(next) => {
                let span = (next.threshold - current.threshold) as f64;
                let progress = (points - current.threshold) as f64 / span * 100.0;
                LevelProgress {
                    current_level: current.name.clone(),
                    next_level: Some(next.name.clone()),
                    progress_percentage: progress.clamp(0.0, 100.0),
                    points_to_next: next.threshold - points,
                }
            }
            None => LevelProgress {
                current_level: current.name.clone(),
                next_level: None,
                progress_percentage: 100.0,
                points_to_next: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SorterConfig;

    fn schedule() -> TierSchedule {
        TierSchedule::new(&SorterConfig::default().tiers).unwrap()
    }

    fn tier(name: &str, threshold: u64) -> TierConfig {
        TierConfig {
            name: name.to_string(),
            threshold,
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        let schedule = schedule();
        assert_eq!(schedule.tier_for(0).name, "Eco Beginner");
        assert_eq!(schedule.tier_for(499).name, "Eco Beginner");
        assert_eq!(schedule.tier_for(500).name, "Eco Enthusiast");
        assert_eq!(schedule.tier_for(1499).name, "Eco Enthusiast");
        assert_eq!(schedule.tier_for(1500).name, "Eco Warrior");
        assert_eq!(schedule.tier_for(3000).name, "Eco Champion");
        assert_eq!(schedule.tier_for(5000).name, "Eco Master");
        assert_eq!(schedule.tier_for(u64::MAX).name, "Eco Master");
    }

    #[test]
    fn progress_within_a_tier() {
        let progress = schedule().level_progress(1000);
        assert_eq!(progress.current_level, "Eco Enthusiast");
        assert_eq!(progress.next_level.as_deref(), Some("Eco Warrior"));
        assert!((progress.progress_percentage - 50.0).abs() < 1e-9);
        assert_eq!(progress.points_to_next, 500);
    }

    #[test]
    fn progress_at_tier_boundary_starts_from_zero() {
        let progress = schedule().level_progress(500);
        assert_eq!(progress.current_level, "Eco Enthusiast");
        assert_eq!(progress.progress_percentage, 0.0);
        assert_eq!(progress.points_to_next, 1000);
    }

    #[test]
    fn top_tier_is_terminal() {
        for points in [5000, 12_345] {
            let progress = schedule().level_progress(points);
            assert_eq!(progress.current_level, "Eco Master");
            assert_eq!(progress.next_level, None);
            assert_eq!(progress.progress_percentage, 100.0);
            assert_eq!(progress.points_to_next, 0);
        }
    }

    #[test]
    fn rejects_misconfigured_schedules() {
        assert!(matches!(TierSchedule::new(&[]), Err(ProgressionError::EmptySchedule)));
        assert!(matches!(
            TierSchedule::new(&[tier("Start", 10)]),
            Err(ProgressionError::NonZeroBase(10))
        ));
        assert!(matches!(
            TierSchedule::new(&[tier("A", 0), tier("B", 100), tier("C", 100)]),
            Err(ProgressionError::NotAscending { .. })
        ));
        assert!(matches!(
            TierSchedule::new(&[tier("A", 0), tier("A", 100)]),
            Err(ProgressionError::DuplicateTier(_))
        ));
        assert!(matches!(
            TierSchedule::new(&[tier(" ", 0)]),
            Err(ProgressionError::EmptyTierName)
        ));
    }

    #[test]
    fn single_tier_schedule_is_always_complete() {
        let schedule = TierSchedule::new(&[tier("Member", 0)]).unwrap();
        let progress = schedule.level_progress(42);
        assert_eq!(progress.current_level, "Member");
        assert_eq!(progress.progress_percentage, 100.0);
    }
}
