use std::time::Duration;

use super::settings::{Difficulty, MapType, Mode};

/// Boundary, self and obstacle deaths are suppressed while the step counter is at or below this.
pub const GRACE_PERIOD_TICKS: u64 = 5;
pub const POISON_PENALTY: u32 = 25;
pub const CAMPAIGN_MILESTONE: u32 = 50;
pub const CAMPAIGN_SPEEDUP_MS: u64 = 5;
pub const MIN_TICK_INTERVAL_MS: u64 = 30;

const SPEED_MODE_MULTIPLIER: f64 = 0.7;

/// What a (mode, map) pair does to the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RulePolicy {
    pub wraps: bool,
    pub obstacles_grow_on_eat: bool,
    pub has_poison_item: bool,
    /// `false` when the run starts with no obstacles regardless of map.
    pub uses_map_layout: bool,
    pub tick_multiplier: f64,
    pub speeds_up_on_milestones: bool,
}

impl RulePolicy {
    pub fn points_per_food(&self, difficulty: Difficulty) -> u32 {
        RuleTable::points_per_food(difficulty)
    }
}

pub struct RuleTable;

impl RuleTable {
    pub fn policy(mode: Mode, map: MapType) -> RulePolicy {
        RulePolicy {
            wraps: mode == Mode::Portal || map == MapType::Infinite,
            obstacles_grow_on_eat: mode == Mode::Survival,
            has_poison_item: mode == Mode::Poison,
            uses_map_layout: mode != Mode::Survival,
            tick_multiplier: if mode == Mode::Speed { SPEED_MODE_MULTIPLIER } else { 1.0 },
            speeds_up_on_milestones: mode == Mode::Campaign,
        }
    }

    pub fn base_tick_interval_ms(difficulty: Difficulty) -> u64 {
        match difficulty {
            Difficulty::Easy => 130,
            Difficulty::Medium => 100,
            Difficulty::Hard => 70,
            Difficulty::Extreme => 40,
        }
    }

    pub fn points_per_food(difficulty: Difficulty) -> u32 {
        (difficulty.index() as u32 + 1) * 10
    }

    pub fn initial_tick_interval(mode: Mode, map: MapType, difficulty: Difficulty) -> Duration {
        let base = Self::base_tick_interval_ms(difficulty) as f64;
        let scaled = base * Self::policy(mode, map).tick_multiplier;
        Duration::from_millis(scaled.round() as u64)
    }

    /// `max(30ms, base - milestones * 5ms)` where a milestone is every 50 points.
    pub fn campaign_tick_interval(difficulty: Difficulty, score: u32) -> Duration {
        let milestones = u64::from(score / CAMPAIGN_MILESTONE);
        let base = Self::base_tick_interval_ms(difficulty);
        let interval = base
            .saturating_sub(milestones * CAMPAIGN_SPEEDUP_MS)
            .max(MIN_TICK_INTERVAL_MS);
        Duration::from_millis(interval)
    }

    pub fn crossed_milestone(previous_score: u32, score: u32) -> bool {
        score / CAMPAIGN_MILESTONE > previous_score / CAMPAIGN_MILESTONE
    }

    /// Walls share the window with self and obstacle hits, so an edge crossing
    /// on tick 5 is still clamped rather than fatal.
    pub fn in_grace_period(steps: u64) -> bool {
        steps <= GRACE_PERIOD_TICKS
    }
}
