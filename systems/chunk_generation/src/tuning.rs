//! Tuning surface and variant pools for the chunk generator.

use adaptive_runner_core::ElementKind;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Half-open `[min, max)` interval sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpanRange {
    /// Inclusive lower bound.
    pub min: f32,
    /// Exclusive upper bound.
    pub max: f32,
}

impl SpanRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Reports whether both bounds are finite and ordered.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Draws a value from the range. Degenerate ranges yield `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.is_well_formed() && self.max > self.min && (self.max - self.min).is_finite() {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Inclusive `[min, max]` count range sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    /// Smallest count.
    pub min: u32,
    /// Largest count.
    pub max: u32,
}

impl CountRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Draws a count from the range. An inverted range yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// Probabilities, extents and spacing rules used when filling chunks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationTuning {
    /// Stress that must be exceeded before a recovery chunk is considered.
    pub recovery_stress: f32,
    /// Chance of a recovery chunk once the stress threshold is exceeded.
    pub recovery_probability: f32,
    /// Stress that must be undercut before a challenge chunk is considered.
    pub challenge_stress: f32,
    /// Chance of a challenge chunk once stress is low enough.
    pub challenge_probability: f32,
    /// Length of recovery chunks.
    pub recovery_length: SpanRange,
    /// Number of boosters placed in a recovery chunk.
    pub recovery_boosters: CountRange,
    /// Longitudinal gap between recovery boosters.
    pub recovery_booster_gap: f32,
    /// Lateral placement of recovery boosters.
    pub recovery_lateral: SpanRange,
    /// Length of challenge chunks.
    pub challenge_length: SpanRange,
    /// Obstacle chance per step before scaling by the obstacle multiplier.
    pub challenge_density: f32,
    /// Longitudinal step between challenge placements.
    pub challenge_step: SpanRange,
    /// Length of balanced chunks.
    pub balanced_length: SpanRange,
    /// Obstacle spacing reached at the highest obstacle multiplier.
    pub min_obstacle_spacing: f32,
    /// Obstacle spacing used at the lowest obstacle multiplier.
    pub max_obstacle_spacing: f32,
    /// Random factor applied to each balanced step.
    pub spacing_jitter: SpanRange,
    /// Chance of an obstacle per balanced step.
    pub obstacle_probability: f32,
    /// Chance of a booster per balanced step.
    pub booster_probability: f32,
    /// Longitudinal lead of a balanced booster over its step.
    pub booster_lead: f32,
    /// Height at which boosters float.
    pub booster_height: f32,
    /// Lateral placement of obstacles and balanced boosters.
    pub lateral: SpanRange,
    /// Obstacles closer than this to the previous one use the easiest variant.
    pub safe_obstacle_distance: f32,
    /// Number of recent obstacle positions remembered.
    pub obstacle_history: usize,
    /// Smallest longitudinal advance of any step or chunk.
    pub min_step: f32,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            recovery_stress: 0.8,
            recovery_probability: 0.15,
            challenge_stress: 0.3,
            challenge_probability: 0.1,
            recovery_length: SpanRange::new(15.0, 25.0),
            recovery_boosters: CountRange::new(2, 3),
            recovery_booster_gap: 8.0,
            recovery_lateral: SpanRange::new(-3.0, 3.0),
            challenge_length: SpanRange::new(20.0, 35.0),
            challenge_density: 0.8,
            challenge_step: SpanRange::new(3.0, 8.0),
            balanced_length: SpanRange::new(25.0, 40.0),
            min_obstacle_spacing: 5.0,
            max_obstacle_spacing: 15.0,
            spacing_jitter: SpanRange::new(0.8, 1.2),
            obstacle_probability: 0.7,
            booster_probability: 0.3,
            booster_lead: 2.0,
            booster_height: 0.5,
            lateral: SpanRange::new(-2.0, 2.0),
            safe_obstacle_distance: 10.0,
            obstacle_history: 10,
            min_step: 0.5,
        }
    }
}

/// Number of variants available for each element kind.
///
/// A kind with zero variants is an empty pool and is never placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementCatalog {
    /// Obstacle variants, easiest first.
    pub obstacles: u16,
    /// Enemy variants.
    pub enemies: u16,
    /// Booster variants.
    pub boosters: u16,
    /// Scenery variants.
    pub environment: u16,
}

impl Default for ElementCatalog {
    fn default() -> Self {
        Self {
            obstacles: 4,
            enemies: 2,
            boosters: 3,
            environment: 3,
        }
    }
}

impl ElementCatalog {
    /// Number of variants configured for `kind`.
    #[must_use]
    pub fn variants(&self, kind: ElementKind) -> u16 {
        match kind {
            ElementKind::Obstacle => self.obstacles,
            ElementKind::Enemy => self.enemies,
            ElementKind::Booster => self.boosters,
            ElementKind::Environment => self.environment,
        }
    }
}
