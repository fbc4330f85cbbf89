use shared::UserProgress;

use super::ProgressionError;
use super::engine::{EcoEvent, EcoProgressionEngine};

/// Turns a user's verdict on a scan into a progress update.
pub struct FeedbackLedger<'a> {
    engine: &'a EcoProgressionEngine,
}

impl<'a> FeedbackLedger<'a> {
    pub fn new(engine: &'a EcoProgressionEngine) -> Self {
        Self { engine }
    }

    /// A confirmation counts as a correct sort. A rejection earns nothing
    /// and leaves the counters alone.
    pub fn apply(
        &self,
        progress: &UserProgress,
        confirmed: bool,
    ) -> Result<(UserProgress, u64), ProgressionError> {
        if confirmed {
            self.engine.award(progress, &EcoEvent::CorrectSort)
        } else {
            log::debug!("Scan rejected by user; no points awarded");
            Ok((self.engine.recompute_level(progress), 0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SorterConfig;

    fn engine() -> EcoProgressionEngine {
        EcoProgressionEngine::from_config(&SorterConfig::default()).unwrap()
    }

    #[test]
    fn confirmation_awards_correct_sort() {
        let engine = engine();
        let ledger = FeedbackLedger::new(&engine);
        let mut before = engine.starting_progress();
        before.eco_points = 490;
        before.total_scans = 5;

        let (after, delta) = ledger.apply(&before, true).unwrap();
        assert_eq!(delta, 25);
        assert_eq!(after.correct_sorts, 1);
        assert_eq!(after.total_scans, 5);
        assert_eq!(after.eco_level, "Eco Enthusiast");
    }

    #[test]
    fn rejection_earns_nothing() {
        let engine = engine();
        let ledger = FeedbackLedger::new(&engine);
        let mut before = engine.starting_progress();
        before.eco_points = 40;
        before.total_scans = 4;

        let (after, delta) = ledger.apply(&before, false).unwrap();
        assert_eq!(delta, 0);
        assert_eq!(after, before);
    }
}
