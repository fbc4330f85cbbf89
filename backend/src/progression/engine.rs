use shared::{LevelProgress, UserProgress};
use std::str::FromStr;
use strum::{Display, EnumString};

use super::ProgressionError;
use super::tiers::TierSchedule;
use crate::config::{PointsConfig, SorterConfig};

/// Names accepted by [`EcoProgressionEngine::award_named`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EventKind {
    Scan,
    #[strum(to_string = "correct_sort", serialize = "confirmed_sort")]
    CorrectSort,
    #[strum(to_string = "diy_project", serialize = "content_creation")]
    DiyProject,
    Purchase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EcoEvent {
    Scan,
    CorrectSort,
    DiyProject,
    Purchase { amount: f64 },
}

impl EcoEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EcoEvent::Scan => EventKind::Scan,
            EcoEvent::CorrectSort => EventKind::CorrectSort,
            EcoEvent::DiyProject => EventKind::DiyProject,
            EcoEvent::Purchase { .. } => EventKind::Purchase,
        }
    }

    /// Builds an event from its wire name. `amount` is only read for purchases.
    pub fn parse(kind: &str, amount: Option<f64>) -> Result<Self, ProgressionError> {
        let kind = EventKind::from_str(kind.trim())
            .map_err(|_| ProgressionError::UnknownEvent(kind.to_string()))?;
        Ok(match kind {
            EventKind::Scan => EcoEvent::Scan,
            EventKind::CorrectSort => EcoEvent::CorrectSort,
            EventKind::DiyProject => EcoEvent::DiyProject,
            EventKind::Purchase => EcoEvent::Purchase {
                amount: amount.ok_or(ProgressionError::MissingAmount)?,
            },
        })
    }
}

/// Point awards and tier bookkeeping for one configured schedule.
#[derive(Debug, Clone)]
pub struct EcoProgressionEngine {
    points: PointsConfig,
    tiers: TierSchedule,
}

impl EcoProgressionEngine {
    pub fn new(points: PointsConfig, tiers: TierSchedule) -> Self {
        Self { points, tiers }
    }

    pub fn from_config(config: &SorterConfig) -> Result<Self, ProgressionError> {
        Ok(Self::new(
            config.points.clone(),
            TierSchedule::new(&config.tiers)?,
        ))
    }

    pub fn tiers(&self) -> &TierSchedule {
        &self.tiers
    }

    /// Progress record for a user who has never earned anything.
    pub fn starting_progress(&self) -> UserProgress {
        UserProgress {
            eco_points: 0,
            eco_level: self.tiers.initial().name.clone(),
            total_scans: 0,
            correct_sorts: 0,
        }
    }

    pub fn points_for(&self, event: &EcoEvent) -> Result<u64, ProgressionError> {
        match *event {
            EcoEvent::Scan => Ok(self.points.scan),
            EcoEvent::CorrectSort => Ok(self.points.correct_sort),
            EcoEvent::DiyProject => Ok(self.points.diy_project),
            EcoEvent::Purchase { amount } => {
                if !amount.is_finite() || amount < 0.0 {
                    return Err(ProgressionError::InvalidAmount(amount));
                }
                let points = (amount * self.points.purchase_per_unit).floor();
                if points >= u64::MAX as f64 {
                    return Err(ProgressionError::Overflow);
                }
                Ok(points as u64)
            }
        }
    }

    /// Applies `event` and returns the new progress with the points earned.
    /// On error `progress` is untouched.
    pub fn award(
        &self,
        progress: &UserProgress,
        event: &EcoEvent,
    ) -> Result<(UserProgress, u64), ProgressionError> {
        let delta = self.points_for(event)?;

        let mut next = progress.clone();
        next.eco_points = next
            .eco_points
            .checked_add(delta)
            .ok_or(ProgressionError::Overflow)?;
        match event {
            EcoEvent::Scan => {
                next.total_scans = next
                    .total_scans
                    .checked_add(1)
                    .ok_or(ProgressionError::Overflow)?;
            }
            EcoEvent::CorrectSort => {
                next.correct_sorts = next
                    .correct_sorts
                    .checked_add(1)
                    .ok_or(ProgressionError::Overflow)?;
            }
            EcoEvent::DiyProject | EcoEvent::Purchase { .. } => {}
        }

        let next = self.recompute_level(&next);
        if next.eco_level != progress.eco_level {
            log::info!(
                "Promoted from '{}' to '{}' at {} points",
                progress.eco_level,
                next.eco_level,
                next.eco_points
            );
        }
        log::debug!(
            "Awarded {} points for {}; total {} ({})",
            delta,
            event.kind(),
            next.eco_points,
            next.eco_level
        );

        Ok((next, delta))
    }

    pub fn award_named(
        &self,
        progress: &UserProgress,
        kind: &str,
        amount: Option<f64>,
    ) -> Result<(UserProgress, u64), ProgressionError> {
        let event = EcoEvent::parse(kind, amount)?;
        self.award(progress, &event)
    }

    /// Derives `eco_level` from `eco_points`; stored levels are never trusted.
    pub fn recompute_level(&self, progress: &UserProgress) -> UserProgress {
        UserProgress {
            eco_level: self.tiers.tier_for(progress.eco_points).name.clone(),
            ..progress.clone()
        }
    }

    pub fn level_progress(&self, progress: &UserProgress) -> LevelProgress {
        self.tiers.level_progress(progress.eco_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine() -> EcoProgressionEngine {
        EcoProgressionEngine::from_config(&SorterConfig::default()).unwrap()
    }

    fn progress(points: u64) -> UserProgress {
        engine().recompute_level(&UserProgress {
            eco_points: points,
            eco_level: String::new(),
            total_scans: 3,
            correct_sorts: 1,
        })
    }

    #[test]
    fn scan_adds_ten_points_and_one_scan() {
        let before = progress(120);
        let (after, delta) = engine().award(&before, &EcoEvent::Scan).unwrap();
        assert_eq!(delta, 10);
        assert_eq!(after.eco_points, 130);
        assert_eq!(after.total_scans, 4);
        assert_eq!(after.correct_sorts, 1);
    }

    #[test]
    fn confirmed_sort_crosses_into_next_tier() {
        let before = progress(490);
        assert_eq!(before.eco_level, "Eco Beginner");
        let (after, delta) = engine().award_named(&before, "correct_sort", None).unwrap();
        assert_eq!(delta, 25);
        assert_eq!(after.eco_points, 515);
        assert_eq!(after.eco_level, "Eco Enthusiast");
        assert_eq!(after.correct_sorts, 2);
        assert_eq!(after.total_scans, 3);
    }

    #[test]
    fn content_creation_and_purchase_only_add_points() {
        let engine = engine();
        let before = progress(0);
        let (after, delta) = engine.award_named(&before, "content_creation", None).unwrap();
        assert_eq!(delta, 50);
        assert_eq!(after.total_scans, before.total_scans);
        assert_eq!(after.correct_sorts, before.correct_sorts);

        let (after, delta) = engine.award_named(&after, "purchase", Some(12.99)).unwrap();
        assert_eq!(delta, 64);
        assert_eq!(after.eco_points, 114);
    }

    #[test]
    fn event_names_parse_case_insensitively() {
        assert_eq!(EcoEvent::parse("SCAN", None).unwrap(), EcoEvent::Scan);
        assert_eq!(EcoEvent::parse(" confirmed_sort ", None).unwrap(), EcoEvent::CorrectSort);
        assert_eq!(EventKind::DiyProject.to_string(), "diy_project");
        assert_eq!(EventKind::CorrectSort.to_string(), "correct_sort");
    }

    #[test]
    fn unknown_event_is_rejected() {
        let err = engine().award_named(&progress(10), "recycle_everything", None).unwrap_err();
        assert!(matches!(err, ProgressionError::UnknownEvent(name) if name == "recycle_everything"));
    }

    #[test]
    fn purchase_amount_is_validated() {
        let engine = engine();
        let before = progress(10);
        assert!(matches!(
            engine.award_named(&before, "purchase", None),
            Err(ProgressionError::MissingAmount)
        ));
        assert!(matches!(
            engine.award(&before, &EcoEvent::Purchase { amount: -1.0 }),
            Err(ProgressionError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.award(&before, &EcoEvent::Purchase { amount: f64::NAN }),
            Err(ProgressionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn overflow_is_an_error() {
        let before = UserProgress {
            eco_points: u64::MAX - 5,
            eco_level: "Eco Master".to_string(),
            total_scans: 0,
            correct_sorts: 0,
        };
        assert!(matches!(
            engine().award(&before, &EcoEvent::Scan),
            Err(ProgressionError::Overflow)
        ));
    }

    #[test]
    fn stale_level_is_corrected_on_award() {
        let before = UserProgress {
            eco_points: 3100,
            eco_level: "Eco Beginner".to_string(),
            total_scans: 0,
            correct_sorts: 0,
        };
        let (after, _) = engine().award(&before, &EcoEvent::DiyProject).unwrap();
        assert_eq!(after.eco_level, "Eco Champion");
    }

    #[test]
    fn starting_progress_is_lowest_tier() {
        let start = engine().starting_progress();
        assert_eq!(start.eco_points, 0);
        assert_eq!(start.eco_level, "Eco Beginner");
        assert_eq!(engine().level_progress(&start).points_to_next, 500);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn recompute_is_idempotent(points in 0u64..20_000) {
            let engine = engine();
            let once = engine.recompute_level(&progress(points));
            let twice = engine.recompute_level(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn awards_never_lower_points_or_tier(
            points in 0u64..10_000,
            kind in prop::sample::select(vec!["scan", "correct_sort", "diy_project", "purchase"]),
            amount in 0.0f64..500.0,
        ) {
            let engine = engine();
            let before = progress(points);
            let (after, delta) = engine.award_named(&before, kind, Some(amount)).unwrap();
            prop_assert_eq!(after.eco_points, before.eco_points + delta);
            prop_assert!(
                engine.tiers().index_for(after.eco_points) >= engine.tiers().index_for(before.eco_points)
            );
        }
    }
}
