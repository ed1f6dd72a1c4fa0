//! Energy regeneration.
//!
//! Energy is a capped resource that refills over wall-clock time at a
//! tier-specific rate. The regeneration anchor (`last_energy_update`) keeps
//! fractional progress: after granting whole units we move the anchor forward
//! by exactly the time those units took, rather than resetting it to `now`.

use chrono::{DateTime, Duration, Utc};

use super::types::{SubscriptionTier, UserProgress};

/// Sentinel cap for the unlimited tier.
pub const UNLIMITED_CAP: u32 = u32::MAX;

/// Energy cap and regeneration rate for a subscription tier.
#[derive(Debug, Clone, Copy)]
pub struct TierParams {
    pub cap: u32,
    /// Time to regenerate one unit. `None` short-circuits regeneration:
    /// energy is pinned to the cap.
    pub regen_interval: Option<Duration>,
}

pub fn tier_params(tier: SubscriptionTier) -> TierParams {
    match tier {
        SubscriptionTier::Free => TierParams {
            cap: 5,
            regen_interval: Some(Duration::minutes(10)),
        },
        SubscriptionTier::ApiLicense => TierParams {
            cap: 10,
            regen_interval: Some(Duration::minutes(5)),
        },
        SubscriptionTier::ProAccess => TierParams {
            cap: UNLIMITED_CAP,
            regen_interval: None,
        },
    }
}

/// Apply regeneration up to `now`. Returns true if any energy was gained
/// (the caller persists and refreshes the HUD on gain).
pub fn regenerate(progress: &mut UserProgress, now: DateTime<Utc>) -> bool {
    let params = tier_params(progress.subscription_tier);

    let interval = match params.regen_interval {
        Some(interval) => interval,
        None => {
            // Unlimited tier: pin to cap, no anchor math needed.
            if progress.energy < params.cap {
                progress.energy = params.cap;
                return true;
            }
            return false;
        }
    };

    if progress.energy >= params.cap {
        return false;
    }

    let elapsed = now - progress.last_energy_update;
    if elapsed < interval {
        return false;
    }

    let interval_ms = interval.num_milliseconds();
    let elapsed_ms = elapsed.num_milliseconds();
    let gained = (elapsed_ms / interval_ms) as u32;
    if gained == 0 {
        return false;
    }

    progress.energy = progress.energy.saturating_add(gained).min(params.cap);
    // Keep the remainder so partial progress toward the next unit survives.
    progress.last_energy_update = now - Duration::milliseconds(elapsed_ms % interval_ms);
    log::debug!(
        "Energy regenerated +{} to {} (anchor {})",
        gained,
        progress.energy,
        progress.last_energy_update
    );
    true
}

/// Spend one unit of energy for a session start. Returns false (and changes
/// nothing) if no energy is available.
pub fn spend_one(progress: &mut UserProgress, now: DateTime<Utc>) -> bool {
    if progress.energy < 1 {
        return false;
    }
    progress.energy -= 1;
    progress.last_energy_update = now;
    true
}

/// Refill energy to the tier cap. Level-up reward side effect, not regular
/// regeneration.
pub fn refill(progress: &mut UserProgress) {
    progress.energy = tier_params(progress.subscription_tier).cap;
}
