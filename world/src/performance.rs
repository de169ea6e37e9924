//! Performance tracking rules applied by the world.
//!
//! Every discrete player event is converted into a sample in `[0, 1]` and pushed
//! into a bounded FIFO window. Once the window holds enough samples the skill
//! estimate drifts toward the window mean.

use std::collections::VecDeque;

use adaptive_runner_core::{clamp_unit, inverse_lerp, lerp, Event, RejectedInput};
use serde::{Deserialize, Serialize};

use crate::World;

/// Tuning knobs for performance sampling and smoothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceTuning {
    /// Maximum number of samples retained in the sliding window.
    pub sample_size: usize,
    /// Minimum window length before the skill estimate starts moving.
    pub min_samples_for_skill: usize,
    /// Fraction of the gap to the window mean closed per recorded sample.
    pub skill_smoothing: f32,
    /// Fraction of the gap to a new reaction time closed per avoided obstacle.
    pub reaction_smoothing: f32,
    /// Sample recorded when the player dies.
    pub death_score: f32,
    /// Sample recorded when the player succeeds.
    pub success_score: f32,
    /// Reaction time in seconds that maps to a perfect sample.
    pub best_reaction_time: f32,
    /// Reaction time in seconds that maps to a zero sample.
    pub worst_reaction_time: f32,
    /// Lower clamp applied to reported reaction times.
    pub min_reaction_time: f32,
    /// Upper clamp applied to reported reaction times.
    pub max_reaction_time: f32,
    /// Skill level used before any persisted value is restored.
    pub initial_skill_level: f32,
    /// Reaction time average used before any obstacle is avoided.
    pub initial_reaction_time: f32,
}

impl Default for PerformanceTuning {
    fn default() -> Self {
        Self {
            sample_size: 10,
            min_samples_for_skill: 3,
            skill_smoothing: 0.1,
            reaction_smoothing: 0.2,
            death_score: 0.1,
            success_score: 0.9,
            best_reaction_time: 0.5,
            worst_reaction_time: 2.0,
            min_reaction_time: 0.05,
            max_reaction_time: 10.0,
            initial_skill_level: 0.5,
            initial_reaction_time: 1.0,
        }
    }
}

impl PerformanceTuning {
    /// Returns a copy whose reaction bounds are positive, finite and ordered.
    ///
    /// Reversed bounds are swapped; unusable bounds fall back to the defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let (min, max) = (self.min_reaction_time, self.max_reaction_time);
        if min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 {
            self.min_reaction_time = min.min(max);
            self.max_reaction_time = min.max(max);
        } else {
            log::warn!("reaction bounds [{min}, {max}] are unusable, using defaults");
            let defaults = Self::default();
            self.min_reaction_time = defaults.min_reaction_time;
            self.max_reaction_time = defaults.max_reaction_time;
        }
        self
    }
}

/// Size-bounded FIFO of performance samples.
#[derive(Clone, Debug)]
pub(crate) struct PerformanceWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl PerformanceWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, sample: f32) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            let _ = self.samples.pop_front();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    pub(crate) fn mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f32 = self.samples.iter().sum();
        Some(total / self.samples.len() as f32)
    }
}

/// Sanitises and records a raw performance sample.
pub(crate) fn record_score(world: &mut World, score: f32, out_events: &mut Vec<Event>) {
    if !score.is_finite() {
        log::warn!("discarding non-finite performance score {score}");
        out_events.push(Event::InputRejected {
            input: RejectedInput::PerformanceScore,
        });
        return;
    }

    let score = clamp_unit(score);
    world.performance.push(score);
    out_events.push(Event::PerformanceRecorded { score });

    if world.performance.len() < world.tuning.min_samples_for_skill {
        return;
    }

    let Some(mean) = world.performance.mean() else {
        return;
    };
    world.skill_level = clamp_unit(lerp(world.skill_level, mean, world.tuning.skill_smoothing));
    log::debug!(
        "skill level smoothed to {:.3} (window mean {mean:.3})",
        world.skill_level
    );
    out_events.push(Event::SkillLevelChanged {
        skill: world.skill_level,
    });
}

/// Records a death: a poor sample followed by a streak reset.
pub(crate) fn record_death(world: &mut World, out_events: &mut Vec<Event>) {
    let score = world.tuning.death_score;
    record_score(world, score, out_events);
    world.current_streak = 0;
    out_events.push(Event::StreakChanged { streak: 0 });
    out_events.push(Event::PlayerDied);
}

/// Records a success: a good sample followed by a streak increment.
pub(crate) fn record_success(world: &mut World, out_events: &mut Vec<Event>) {
    let score = world.tuning.success_score;
    record_score(world, score, out_events);
    world.current_streak = world.current_streak.saturating_add(1);
    out_events.push(Event::StreakChanged {
        streak: world.current_streak,
    });
}

/// Folds a reaction time into the running average and records its score.
pub(crate) fn record_obstacle_avoided(
    world: &mut World,
    reaction_time: f32,
    out_events: &mut Vec<Event>,
) {
    if !reaction_time.is_finite() {
        log::warn!("discarding non-finite reaction time {reaction_time}");
        out_events.push(Event::InputRejected {
            input: RejectedInput::ReactionTime,
        });
        return;
    }

    let tuning = &world.tuning;
    let reaction_time = reaction_time.clamp(tuning.min_reaction_time, tuning.max_reaction_time);
    world.average_reaction_time = lerp(
        world.average_reaction_time,
        reaction_time,
        tuning.reaction_smoothing,
    )
    .max(tuning.min_reaction_time);

    let score = inverse_lerp(
        tuning.worst_reaction_time,
        tuning.best_reaction_time,
        reaction_time,
    );
    record_score(world, score, out_events);
}

/// Restores a persisted skill level.
pub(crate) fn restore_skill(world: &mut World, skill: f32, out_events: &mut Vec<Event>) {
    if !skill.is_finite() {
        log::warn!("ignoring non-finite persisted skill level {skill}");
        out_events.push(Event::InputRejected {
            input: RejectedInput::SkillLevel,
        });
        return;
    }

    world.skill_level = clamp_unit(skill);
    out_events.push(Event::SkillLevelChanged {
        skill: world.skill_level,
    });
}

#[cfg(test)]
mod tests {
    use super::{PerformanceTuning, PerformanceWindow};

    #[test]
    fn window_evicts_oldest_first() {
        let mut window = PerformanceWindow::new(3);
        for sample in [0.1, 0.2, 0.3, 0.4] {
            window.push(sample);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![0.2, 0.3, 0.4]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut window = PerformanceWindow::new(0);
        window.push(0.5);
        window.push(0.7);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![0.7]);
    }

    #[test]
    fn reversed_reaction_bounds_are_swapped() {
        let tuning = PerformanceTuning {
            min_reaction_time: 3.0,
            max_reaction_time: 1.0,
            ..PerformanceTuning::default()
        }
        .sanitized();
        assert_eq!(tuning.min_reaction_time, 1.0);
        assert_eq!(tuning.max_reaction_time, 3.0);
    }

    #[test]
    fn unusable_reaction_bounds_fall_back_to_defaults() {
        let defaults = PerformanceTuning::default();
        let tuning = PerformanceTuning {
            min_reaction_time: f32::NAN,
            max_reaction_time: 1.0,
            ..PerformanceTuning::default()
        }
        .sanitized();
        assert_eq!(tuning.min_reaction_time, defaults.min_reaction_time);
        assert_eq!(tuning.max_reaction_time, defaults.max_reaction_time);
    }

    #[test]
    fn empty_window_has_no_mean() {
        let window = PerformanceWindow::new(4);
        assert!(window.mean().is_none());
    }
}
