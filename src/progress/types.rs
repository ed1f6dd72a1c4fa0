//! Durable user-progress data model.
//!
//! `UserProgress` is the single persisted snapshot of everything the player
//! has earned: level, experience, energy, streak, unlocks, completions,
//! subscription tier, saved phrases, and practice settings. It is owned by
//! the `ProgressStore` and mutated only through its `mutate()` contract.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lesson ids that are unlocked on first run and can never be locked again.
pub const INITIAL_FREE_LESSONS: [u32; 5] = [1, 2, 3, 4, 5];

/// Subscription level controlling energy cap, regeneration rate, and
/// content gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionTier {
    /// Ad-supported tier: small energy cap, slow regeneration.
    #[default]
    Free,
    /// Pay-per-use tier: the user supplies their own provider API key.
    ApiLicense,
    /// Full access: unlimited energy, all content unlocked.
    ProAccess,
}

impl SubscriptionTier {
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::ApiLicense => "API License",
            SubscriptionTier::ProAccess => "Pro Access",
        }
    }

    /// Whether this tier grants blanket access to locked and
    /// premium-instructor lessons.
    pub fn has_blanket_access(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }

    /// The tier name as sent in gateway form fields.
    pub fn wire_name(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::ApiLicense => "api-license",
            SubscriptionTier::ProAccess => "pro-access",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A user-curated phrase saved for later review. Deduplicated by `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPhrase {
    pub text: String,
    pub translation: String,
}

/// Per-user practice preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeSettings {
    /// Reference audio playback speed ("0.75", "1.0", "1.25").
    pub tts_speed: String,
    /// Reference voice selection.
    pub voice: String,
    /// Who leads roleplay conversations ("ai" or "user").
    pub leader_mode: String,
    /// Wall-clock budget for a chat/roleplay session, in minutes.
    pub session_minutes: u32,
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            tts_speed: "1.0".to_string(),
            voice: "male".to_string(),
            leader_mode: "ai".to_string(),
            session_minutes: 30,
        }
    }
}

/// Durable user progress. Merged over these defaults on load; unknown or
/// corrupt fields fall back silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    pub level: u32,
    /// Experience toward the next level. Resets toward zero on level-up.
    pub experience: u32,
    /// Consumable resource; one unit is spent per session start.
    pub energy: u32,
    /// Anchor for regeneration math. Never reset to `now` on partial gain.
    pub last_energy_update: DateTime<Utc>,
    /// Lifetime experience counter. Monotone, never decreases.
    pub total_xp: u64,
    /// Consecutive-day counter.
    pub streak: u32,
    pub last_active_day: Option<NaiveDate>,
    pub unlocked_lessons: BTreeSet<u32>,
    pub completed_lessons: BTreeSet<u32>,
    pub subscription_tier: SubscriptionTier,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub saved_phrases: Vec<SavedPhrase>,
    pub settings: PracticeSettings,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            energy: 5,
            last_energy_update: Utc::now(),
            total_xp: 0,
            streak: 0,
            last_active_day: None,
            unlocked_lessons: INITIAL_FREE_LESSONS.iter().copied().collect(),
            completed_lessons: BTreeSet::new(),
            subscription_tier: SubscriptionTier::Free,
            subscription_expiry: None,
            saved_phrases: Vec::new(),
            settings: PracticeSettings::default(),
        }
    }
}

impl UserProgress {
    /// Restore the invariants a loaded (possibly hand-edited or stale)
    /// snapshot must satisfy: the initial free set is always unlocked, the
    /// level floor is 1, an expired subscription reverts to Free, and energy
    /// never exceeds the active tier's cap.
    pub fn normalize(&mut self, now: DateTime<Utc>) {
        self.unlocked_lessons.extend(INITIAL_FREE_LESSONS);
        if self.level == 0 {
            self.level = 1;
        }
        self.revert_expired_subscription(now);
        let cap = crate::progress::energy::tier_params(self.subscription_tier).cap;
        if self.energy > cap {
            self.energy = cap;
        }
    }

    /// Drop an expired paid subscription back to Free and clamp energy to the
    /// Free cap. Checked at load, at the lesson gate, and on every energy
    /// tick, so blanket access ends mid-run, not at the next restart.
    /// Returns true if a revert happened.
    pub fn revert_expired_subscription(&mut self, now: DateTime<Utc>) -> bool {
        let Some(expiry) = self.subscription_expiry else {
            return false;
        };
        if now <= expiry || self.subscription_tier == SubscriptionTier::Free {
            return false;
        }
        log::info!(
            "Subscription {} expired at {}, reverting to Free",
            self.subscription_tier,
            expiry
        );
        self.subscription_tier = SubscriptionTier::Free;
        self.subscription_expiry = None;
        let cap = crate::progress::energy::tier_params(self.subscription_tier).cap;
        if self.energy > cap {
            self.energy = cap;
        }
        true
    }

    /// Add a phrase to the review list. Duplicates (by text) are ignored.
    /// Returns true if the phrase was actually added.
    pub fn save_phrase(&mut self, text: &str, translation: &str) -> bool {
        if self.saved_phrases.iter().any(|p| p.text == text) {
            return false;
        }
        self.saved_phrases.push(SavedPhrase {
            text: text.to_string(),
            translation: translation.to_string(),
        });
        true
    }
}
