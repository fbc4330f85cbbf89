//! Eco points and tiers.
//!
//! Every function here is pure: it takes the current [`shared::UserProgress`]
//! by reference and hands back a new one, so a failed award never leaves a
//! half-updated record behind. Callers own persistence and must apply events
//! for one user sequentially.

pub mod achievements;
pub mod engine;
pub mod feedback;
pub mod tiers;

pub use achievements::achievements;
pub use engine::{EcoEvent, EcoProgressionEngine, EventKind};
pub use feedback::FeedbackLedger;
pub use tiers::{Tier, TierSchedule};

#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("Tier schedule must not be empty")]
    EmptySchedule,
    #[error("First tier must start at 0 points, got {0}")]
    NonZeroBase(u64),
    #[error("Tier name must not be empty")]
    EmptyTierName,
    #[error("Duplicate tier name '{0}'")]
    DuplicateTier(String),
    #[error(
        "Tier thresholds must be strictly ascending: '{previous}' at {previous_threshold} is followed by '{name}' at {threshold}"
    )]
    NotAscending {
        previous: String,
        previous_threshold: u64,
        name: String,
        threshold: u64,
    },
    #[error("Unknown event kind '{0}'")]
    UnknownEvent(String),
    #[error("Purchase events require a spend amount")]
    MissingAmount,
    #[error("Invalid purchase amount {0}")]
    InvalidAmount(f64),
    #[error("Point total would overflow")]
    Overflow,
}
