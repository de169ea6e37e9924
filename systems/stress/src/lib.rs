#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure estimator deriving an instantaneous player stress scalar.
//!
//! Stress blends three signals: how poorly the player performed recently, how
//! slow their reactions have become, and whether a long success streak shows
//! mastery. The result steers chunk generation toward recovery or challenge.

use adaptive_runner_core::{clamp_unit, inverse_lerp, DifficultySnapshot};
use serde::{Deserialize, Serialize};

/// Weights and thresholds used by the stress blend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressTuning {
    /// Weight of the inverted recent performance mean.
    pub performance_weight: f32,
    /// Weight of the reaction-time stress term.
    pub reaction_weight: f32,
    /// Weight of the streak stress term.
    pub streak_weight: f32,
    /// Performance mean assumed while no samples exist.
    pub neutral_performance: f32,
    /// Reaction time in seconds that carries no stress.
    pub relaxed_reaction_time: f32,
    /// Reaction time in seconds that carries full stress.
    pub stressed_reaction_time: f32,
    /// Streak length that must be exceeded to count as mastery.
    pub mastery_streak: u32,
    /// Streak stress reported once mastery is reached.
    pub mastered_streak_stress: f32,
    /// Streak stress reported otherwise.
    pub default_streak_stress: f32,
    /// Stress reported when no difficulty state is available.
    pub neutral_stress: f32,
}

impl Default for StressTuning {
    fn default() -> Self {
        Self {
            performance_weight: 0.5,
            reaction_weight: 0.3,
            streak_weight: 0.2,
            neutral_performance: 0.5,
            relaxed_reaction_time: 0.5,
            stressed_reaction_time: 2.0,
            mastery_streak: 10,
            mastered_streak_stress: 0.2,
            default_streak_stress: 0.8,
            neutral_stress: 0.5,
        }
    }
}

/// Deterministic stress estimator.
#[derive(Clone, Debug, Default)]
pub struct StressEstimator {
    tuning: StressTuning,
}

impl StressEstimator {
    /// Creates a new estimator using the provided tuning.
    #[must_use]
    pub fn new(tuning: StressTuning) -> Self {
        Self { tuning }
    }

    /// Estimates stress for an optional difficulty state.
    ///
    /// Without a state the neutral stress is returned so generation falls back to
    /// balanced content.
    #[must_use]
    pub fn estimate(&self, snapshot: Option<&DifficultySnapshot>) -> f32 {
        match snapshot {
            Some(snapshot) => self.estimate_snapshot(snapshot),
            None => clamp_unit(self.tuning.neutral_stress),
        }
    }

    /// Estimates stress for the provided difficulty state. Always within `[0, 1]`.
    #[must_use]
    pub fn estimate_snapshot(&self, snapshot: &DifficultySnapshot) -> f32 {
        let tuning = &self.tuning;
        let performance = clamp_unit(
            snapshot
                .mean_recent_performance
                .unwrap_or(tuning.neutral_performance),
        );
        let reaction_stress = inverse_lerp(
            tuning.relaxed_reaction_time,
            tuning.stressed_reaction_time,
            snapshot.average_reaction_time,
        );
        let streak_stress = if snapshot.current_streak > tuning.mastery_streak {
            tuning.mastered_streak_stress
        } else {
            tuning.default_streak_stress
        };

        clamp_unit(
            (1.0 - performance) * tuning.performance_weight
                + reaction_stress * tuning.reaction_weight
                + clamp_unit(streak_stress) * tuning.streak_weight,
        )
    }
}
