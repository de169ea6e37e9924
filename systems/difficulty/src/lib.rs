#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic difficulty engine that periodically re-derives multipliers.

use std::time::Duration;

use adaptive_runner_core::{
    duration_from_seconds, lerp, Command, DifficultyMultipliers, DifficultySnapshot, Event,
};
use serde::{Deserialize, Serialize};

/// Aggregated tuning knobs controlling how difficulty evolves over a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Simulated seconds between two adjustments, measured since the previous one.
    pub adjustment_interval_secs: f32,
    /// Keyframes mapping session seconds to a base difficulty.
    pub progression: Vec<CurveKey>,
    /// Factor range applied to the base difficulty according to skill level.
    pub skill_scale: LerpRange,
    /// Obstacle frequency multiplier range across adjusted difficulty `[0, 1]`.
    pub obstacle_frequency: LerpRange,
    /// Enemy health multiplier range across adjusted difficulty `[0, 1]`.
    pub enemy_health: LerpRange,
    /// Reward frequency multiplier range; descending so rewards thin out as play gets harder.
    pub reward_frequency: LerpRange,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            adjustment_interval_secs: 15.0,
            progression: vec![
                CurveKey::new(0.0, 0.3),
                CurveKey::new(300.0, 0.7),
                CurveKey::new(600.0, 1.0),
            ],
            skill_scale: LerpRange::new(0.7, 1.3),
            obstacle_frequency: LerpRange::new(0.8, 1.5),
            enemy_health: LerpRange::new(0.7, 1.4),
            reward_frequency: LerpRange::new(1.3, 0.8),
        }
    }
}

/// Endpoints of a clamped linear interpolation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LerpRange {
    /// Value produced at `t = 0`.
    pub from: f32,
    /// Value produced at `t = 1`.
    pub to: f32,
}

impl LerpRange {
    /// Creates a new interpolation range.
    #[must_use]
    pub const fn new(from: f32, to: f32) -> Self {
        Self { from, to }
    }

    /// Interpolates across the range with `t` clamped into `[0, 1]`.
    #[must_use]
    pub fn sample(&self, t: f32) -> f32 {
        lerp(self.from, self.to, t)
    }

    /// Smallest value the range can produce.
    #[must_use]
    pub fn min(&self) -> f32 {
        self.from.min(self.to)
    }

    /// Largest value the range can produce.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.from.max(self.to)
    }
}

/// Single keyframe of the progression curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Session time in seconds.
    pub time_secs: f32,
    /// Base difficulty reached at that time.
    pub value: f32,
}

impl CurveKey {
    /// Creates a new keyframe.
    #[must_use]
    pub const fn new(time_secs: f32, value: f32) -> Self {
        Self { time_secs, value }
    }
}

/// Piecewise-linear mapping from session time to base difficulty.
///
/// Values are held flat before the first key and after the last one. Keys with
/// non-finite components are dropped and the remainder is sorted by time.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressionCurve {
    keys: Vec<CurveKey>,
}

impl ProgressionCurve {
    /// Builds a curve from the provided keyframes.
    #[must_use]
    pub fn new(keys: &[CurveKey]) -> Self {
        let mut keys: Vec<CurveKey> = keys
            .iter()
            .copied()
            .filter(|key| key.time_secs.is_finite() && key.value.is_finite())
            .collect();
        keys.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));
        Self { keys }
    }

    /// Evaluates the curve at `seconds`. An empty curve evaluates to zero.
    #[must_use]
    pub fn evaluate(&self, seconds: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if seconds <= first.time_secs {
            return first.value;
        }
        if seconds >= last.time_secs {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            if seconds <= right.time_secs {
                let span = right.time_secs - left.time_secs;
                if span <= 0.0 {
                    return right.value;
                }
                let t = (seconds - left.time_secs) / span;
                return lerp(left.value, right.value, t);
            }
        }
        last.value
    }
}

/// Pure system that re-derives difficulty multipliers on a fixed cadence.
#[derive(Debug)]
pub struct DifficultyEngine {
    tuning: DifficultyTuning,
    curve: ProgressionCurve,
    interval: Duration,
    since_adjustment: Duration,
}

impl Default for DifficultyEngine {
    fn default() -> Self {
        Self::new(DifficultyTuning::default())
    }
}

impl DifficultyEngine {
    /// Creates a new engine with the provided tuning surface.
    #[must_use]
    pub fn new(tuning: DifficultyTuning) -> Self {
        let curve = ProgressionCurve::new(&tuning.progression);
        let interval = duration_from_seconds(tuning.adjustment_interval_secs);
        Self {
            tuning,
            curve,
            interval,
            since_adjustment: Duration::ZERO,
        }
    }

    /// Simulated time accumulated since the previous adjustment.
    #[must_use]
    pub fn since_adjustment(&self) -> Duration {
        self.since_adjustment
    }

    /// Consumes world events and the current snapshot to emit difficulty commands.
    ///
    /// At most one [`Command::ApplyDifficulty`] is emitted per call, and only once
    /// the interval has elapsed since the previous adjustment.
    pub fn handle(
        &mut self,
        events: &[Event],
        snapshot: &DifficultySnapshot,
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.since_adjustment = self.since_adjustment.saturating_add(accumulated);
        if self.since_adjustment < self.interval {
            return;
        }
        self.since_adjustment = Duration::ZERO;

        let multipliers = self.derive_multipliers(snapshot);
        log::info!(
            "difficulty adjusted at {:.1}s: obstacles {:.3}, enemy health {:.3}, rewards {:.3}",
            snapshot.session_length.as_secs_f32(),
            multipliers.obstacle_frequency,
            multipliers.enemy_health,
            multipliers.reward_frequency
        );
        out.push(Command::ApplyDifficulty { multipliers });
    }

    /// Base difficulty from the progression curve for the given session length.
    #[must_use]
    pub fn base_difficulty(&self, session_length: Duration) -> f32 {
        self.curve.evaluate(session_length.as_secs_f32())
    }

    /// Derives the multipliers for the provided difficulty state.
    #[must_use]
    pub fn derive_multipliers(&self, snapshot: &DifficultySnapshot) -> DifficultyMultipliers {
        let base = self.base_difficulty(snapshot.session_length);
        let adjusted = base * self.tuning.skill_scale.sample(snapshot.skill_level);

        DifficultyMultipliers {
            obstacle_frequency: self.tuning.obstacle_frequency.sample(adjusted),
            enemy_health: self.tuning.enemy_health.sample(adjusted),
            reward_frequency: self.tuning.reward_frequency.sample(adjusted),
        }
    }
}
