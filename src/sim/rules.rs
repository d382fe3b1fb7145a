//! Scoring and achievement rules
//!
//! Pure functions: no clock, no storage. The engine feeds them the relevant
//! counters and announces whatever they report as newly unlocked.

use crate::achievements::{
    Achievement, BLOCKS_10, BLOCKS_100, BLOCKS_50, FIRST_BLOCK, LEVEL_3, LEVEL_5, LEVEL_8,
    NO_MISTAKES, SPEED_DEMON, STREAK_5,
};
use crate::consts::{BASE_BLOCK_SCORE, LAYER_SCORE_BONUS, SPEED_BONUS_THRESHOLD};
use crate::levels::Difficulty;

/// Block-count family: (id, all-time blocks removed)
pub const BLOCK_MILESTONES: [(&str, u64); 4] = [
    (FIRST_BLOCK, 1),
    (BLOCKS_10, 10),
    (BLOCKS_50, 50),
    (BLOCKS_100, 100),
];

/// Level-count family: (id, levels completed)
pub const LEVEL_MILESTONES: [(&str, u32); 3] = [(LEVEL_3, 3), (LEVEL_5, 5), (LEVEL_8, 8)];

/// Consecutive completions needed for the streak achievement
pub const STREAK_TARGET: u32 = 5;

/// `(10 + 5 * layer) * multiplier`
pub fn block_score(layer: u32, difficulty: Difficulty) -> u64 {
    (BASE_BLOCK_SCORE + LAYER_SCORE_BONUS * layer as u64) * difficulty.score_multiplier()
}

/// Outcome of the completion-time bonus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBonus {
    pub multiplier: f64,
    /// More than 70% of the limit was left
    pub speed_run: bool,
}

/// Bonus for finishing a timed level with time to spare.
/// `1 + remaining / limit` while inside the limit, otherwise 1.
pub fn time_bonus(time_limit: Option<u32>, elapsed_secs: f64) -> TimeBonus {
    let none = TimeBonus {
        multiplier: 1.0,
        speed_run: false,
    };
    let Some(limit) = time_limit.filter(|l| *l > 0) else {
        return none;
    };
    let limit = limit as f64;
    let remaining = limit - elapsed_secs;
    if remaining <= 0.0 {
        return none;
    }
    TimeBonus {
        multiplier: 1.0 + remaining / limit,
        speed_run: remaining > limit * SPEED_BONUS_THRESHOLD,
    }
}

/// Running score scaled by the bonus, rounded down
pub fn final_score(running: u64, bonus: &TimeBonus) -> u64 {
    (running as f64 * bonus.multiplier).floor() as u64
}

fn counter(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}

/// Mirror `value` into each listed achievement's progress and unlock the ones
/// that reached their threshold
fn evaluate_family<'a>(
    achievements: &mut [Achievement],
    family: impl IntoIterator<Item = (&'a str, u64)>,
    value: u64,
) -> Vec<String> {
    let mut unlocked = Vec::new();
    for (id, threshold) in family {
        let Some(a) = achievements.iter_mut().find(|a| a.id == id) else {
            continue;
        };
        a.progress = counter(value);
        if !a.unlocked && value >= threshold {
            a.unlocked = true;
            unlocked.push(a.id.clone());
        }
    }
    unlocked
}

/// Run after every successful block removal
pub fn evaluate_blocks(achievements: &mut [Achievement], total_blocks_removed: u64) -> Vec<String> {
    evaluate_family(achievements, BLOCK_MILESTONES, total_blocks_removed)
}

/// Run after a level completes: level-count family then the streak
pub fn evaluate_levels(
    achievements: &mut [Achievement],
    levels_completed: u32,
    streak: u32,
) -> Vec<String> {
    let mut unlocked = evaluate_family(
        achievements,
        LEVEL_MILESTONES.map(|(id, n)| (id, n as u64)),
        levels_completed as u64,
    );
    unlocked.extend(evaluate_family(
        achievements,
        [(STREAK_5, STREAK_TARGET as u64)],
        streak as u64,
    ));
    unlocked
}

/// Single-shot unlock (perfect run, speed run). Progress jumps to 1.
pub fn unlock_once(achievements: &mut [Achievement], id: &str) -> Option<String> {
    let a = achievements.iter_mut().find(|a| a.id == id)?;
    if a.unlocked {
        return None;
    }
    a.progress = 1;
    a.unlocked = true;
    Some(a.id.clone())
}

/// Eligibility flags raised while completing a level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionFlags {
    pub speed_run: bool,
    pub perfect_run: bool,
}

/// Speed first, then perfect run
pub fn evaluate_completion(
    achievements: &mut [Achievement],
    flags: CompletionFlags,
) -> Vec<String> {
    let mut unlocked = Vec::new();
    if flags.speed_run {
        unlocked.extend(unlock_once(achievements, SPEED_DEMON));
    }
    if flags.perfect_run {
        unlocked.extend(unlock_once(achievements, NO_MISTAKES));
    }
    unlocked
}
