//! Experience awards, leveling, and the daily streak.

use chrono::NaiveDate;

use super::energy;
use super::types::UserProgress;

/// Experience awarded per passed practice step.
pub const STEP_XP: u32 = 15;
/// Experience awarded per correct quiz question.
pub const QUIZ_XP: u32 = 10;
/// Bonus awarded on lesson completion.
pub const COMPLETION_XP: u32 = 100;

/// Level-up threshold multiplier: next level at `level * LEVEL_THRESHOLD`.
pub const LEVEL_THRESHOLD: u32 = 200;

/// Experience required to reach the next level from the current one.
pub fn level_threshold(level: u32) -> u32 {
    level.max(1) * LEVEL_THRESHOLD
}

/// Award experience and resolve any resulting level-ups. Returns the number
/// of levels gained. Each level-up subtracts the threshold from `experience`
/// (never going negative) and refills energy to the tier cap as a reward.
pub fn award(progress: &mut UserProgress, amount: u32) -> u32 {
    progress.experience = progress.experience.saturating_add(amount);
    progress.total_xp = progress.total_xp.saturating_add(amount as u64);

    let mut levels_gained = 0;
    while progress.experience >= level_threshold(progress.level) {
        progress.experience -= level_threshold(progress.level);
        progress.level += 1;
        levels_gained += 1;
    }
    if levels_gained > 0 {
        energy::refill(progress);
        log::info!(
            "Level up! now level {} ({} xp toward next)",
            progress.level,
            progress.experience
        );
    }
    levels_gained
}

/// Record activity for `today` and update the streak. More than one full day
/// since the last active day resets the streak before counting today.
pub fn touch_active_day(progress: &mut UserProgress, today: NaiveDate) {
    match progress.last_active_day {
        Some(last) if last == today => return,
        Some(last) if today - last == chrono::Duration::days(1) => {
            progress.streak += 1;
        }
        _ => {
            // First activity ever, or a gap: streak restarts at 1 for today.
            progress.streak = 1;
        }
    }
    progress.last_active_day = Some(today);
}
