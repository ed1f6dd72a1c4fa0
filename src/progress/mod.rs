//! Durable user progression: the progress snapshot, its store, energy
//! regeneration, and experience/leveling rules.

pub mod energy;
pub mod store;
pub mod types;
pub mod xp;

pub use store::ProgressStore;
pub use types::{
    PracticeSettings, SavedPhrase, SubscriptionTier, UserProgress, INITIAL_FREE_LESSONS,
};
