#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Adaptive Runner engine.
//!
//! This crate defines the message surface that connects the session host, the
//! authoritative world, and pure systems. The host submits [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots such as [`DifficultySnapshot`], and respond exclusively with new
//! command batches or generated content.

mod math;

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use math::{clamp_unit, duration_from_seconds, inverse_lerp, lerp};

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Pushes a raw performance sample into the sliding window.
    RecordPerformance {
        /// Outcome quality in `[0, 1]`; out-of-range values are clamped.
        score: f32,
    },
    /// Reports that the player died.
    ReportDeath,
    /// Reports that the player cleared a scored section.
    ReportSuccess,
    /// Reports that the player dodged an obstacle after the given reaction time.
    ReportObstacleAvoided {
        /// Reaction time measured in seconds.
        reaction_time: f32,
    },
    /// Restores a skill level persisted by a previous session.
    RestoreSkillLevel {
        /// Persisted skill estimate in `[0, 1]`.
        skill: f32,
    },
    /// Replaces the active difficulty multipliers.
    ApplyDifficulty {
        /// Multipliers derived by the difficulty engine.
        multipliers: DifficultyMultipliers,
    },
    /// Requests procedural content for a stretch of track.
    GenerateSegment {
        /// Longitudinal coordinate where the segment begins.
        start: f32,
        /// Minimum longitudinal length the generated chunks must cover.
        length: f32,
    },
}

/// Events broadcast after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a sanitised sample entered the performance window.
    PerformanceRecorded {
        /// Sample that was stored.
        score: f32,
    },
    /// Announces a new smoothed skill estimate.
    SkillLevelChanged {
        /// Skill level after smoothing.
        skill: f32,
    },
    /// Announces that the success streak changed.
    StreakChanged {
        /// Streak length after the change.
        streak: u32,
    },
    /// Confirms that a player death was processed.
    PlayerDied,
    /// Broadcasts freshly applied difficulty multipliers.
    DifficultyChanged {
        /// Multipliers that became active.
        multipliers: DifficultyMultipliers,
    },
    /// Announces that a validated stretch of track awaits content.
    SegmentRequested {
        /// Longitudinal coordinate where the segment begins.
        start: f32,
        /// Minimum longitudinal length the generated chunks must cover.
        length: f32,
    },
    /// Publishes a chunk produced by the chunk generator.
    ChunkGenerated {
        /// Generated chunk, ownership passes to the consumer.
        chunk: LevelChunk,
    },
    /// Reports that a numeric input was discarded during sanitisation.
    InputRejected {
        /// Input that could not be used.
        input: RejectedInput,
    },
}

/// Inputs that may be discarded when they carry non-finite values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectedInput {
    /// A performance score passed to `RecordPerformance`.
    PerformanceScore,
    /// A reaction time passed to `ReportObstacleAvoided`.
    ReactionTime,
    /// A persisted skill level passed to `RestoreSkillLevel`.
    SkillLevel,
    /// Segment bounds passed to `GenerateSegment`.
    SegmentBounds,
}

/// Scaling factors applied to base generation and behaviour rates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyMultipliers {
    /// Scales how densely obstacles are placed.
    pub obstacle_frequency: f32,
    /// Scales enemy durability.
    pub enemy_health: f32,
    /// Scales how often rewards appear. Falls as difficulty rises.
    pub reward_frequency: f32,
}

impl Default for DifficultyMultipliers {
    fn default() -> Self {
        Self {
            obstacle_frequency: 1.0,
            enemy_health: 1.0,
            reward_frequency: 1.0,
        }
    }
}

/// Immutable view of the session's difficulty state used by systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultySnapshot {
    /// Slowly smoothed skill estimate in `[0, 1]`.
    pub skill_level: f32,
    /// Simulated time elapsed since the session started.
    pub session_length: Duration,
    /// Number of consecutive successes since the last death.
    pub current_streak: u32,
    /// Smoothed reaction time in seconds, always positive.
    pub average_reaction_time: f32,
    /// Mean of the performance window, `None` while the window is empty.
    pub mean_recent_performance: Option<f32>,
    /// Currently active multipliers.
    pub multipliers: DifficultyMultipliers,
}

impl Default for DifficultySnapshot {
    fn default() -> Self {
        Self {
            skill_level: 0.5,
            session_length: Duration::ZERO,
            current_streak: 0,
            average_reaction_time: 1.0,
            mean_recent_performance: None,
            multipliers: DifficultyMultipliers::default(),
        }
    }
}

/// Category of an element placed on the track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    /// Something the player must dodge.
    Obstacle,
    /// A hostile actor.
    Enemy,
    /// A pickup that helps the player.
    Booster,
    /// Decorative scenery.
    Environment,
}

impl ElementKind {
    /// Lowercase label used in logs and serialized reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Obstacle => "obstacle",
            Self::Enemy => "enemy",
            Self::Booster => "booster",
            Self::Environment => "environment",
        }
    }
}

/// Index into the pool of variants configured for an [`ElementKind`].
///
/// Variant zero is the easiest variant of its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantId(u16);

impl VariantId {
    /// Easiest variant of any kind.
    pub const EASIEST: VariantId = VariantId(0);

    /// Creates a new variant identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Single placement produced by the chunk generator.
///
/// Positions use `x` for the lateral offset, `y` for height and `z` for the
/// longitudinal track coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkElement {
    kind: ElementKind,
    variant: VariantId,
    position: Vec3,
}

impl ChunkElement {
    /// Creates a new element placement.
    #[must_use]
    pub const fn new(kind: ElementKind, variant: VariantId, position: Vec3) -> Self {
        Self {
            kind,
            variant,
            position,
        }
    }

    /// Category of the placed element.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Variant chosen from the kind's pool.
    #[must_use]
    pub const fn variant(&self) -> VariantId {
        self.variant
    }

    /// World-space placement.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Longitudinal coordinate of the placement.
    #[must_use]
    pub fn longitudinal(&self) -> f32 {
        self.position.z
    }
}

/// Strategy the generator used to fill a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkStrategy {
    /// Booster-only breather offered to stressed players.
    Recovery,
    /// Dense obstacle run offered to relaxed players.
    Challenge,
    /// Default spacing-aware mix of obstacles and boosters.
    Balanced,
}

impl ChunkStrategy {
    /// Lowercase label used in logs and serialized reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recovery => "recovery",
            Self::Challenge => "challenge",
            Self::Balanced => "balanced",
        }
    }
}

/// Contiguous longitudinal slice of track populated with placements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelChunk {
    start: f32,
    length: f32,
    strategy: ChunkStrategy,
    elements: Vec<ChunkElement>,
}

impl LevelChunk {
    /// Creates an empty chunk covering `[start, start + length)`.
    #[must_use]
    pub fn new(start: f32, length: f32, strategy: ChunkStrategy) -> Self {
        Self {
            start,
            length,
            strategy,
            elements: Vec::new(),
        }
    }

    /// Appends a placement to the chunk.
    pub fn push(&mut self, element: ChunkElement) {
        self.elements.push(element);
    }

    /// Longitudinal coordinate where the chunk begins.
    #[must_use]
    pub const fn start(&self) -> f32 {
        self.start
    }

    /// Longitudinal extent of the chunk.
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }

    /// Longitudinal coordinate where the chunk ends.
    #[must_use]
    pub fn end(&self) -> f32 {
        self.start + self.length
    }

    /// Strategy used to populate the chunk.
    #[must_use]
    pub const fn strategy(&self) -> ChunkStrategy {
        self.strategy
    }

    /// Placements in generation order.
    #[must_use]
    pub fn elements(&self) -> &[ChunkElement] {
        &self.elements
    }

    /// Counts placements of the provided kind.
    #[must_use]
    pub fn count_of(&self, kind: ElementKind) -> usize {
        self.elements
            .iter()
            .filter(|element| element.kind() == kind)
            .count()
    }

    /// Consumes the chunk, yielding its placements.
    #[must_use]
    pub fn into_elements(self) -> Vec<ChunkElement> {
        self.elements
    }
}

/// Unique identifier assigned to a recorded pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternId(u64);

impl PatternId {
    /// Creates a new pattern identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Shape signature of a generated chunk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelPattern {
    /// Identifier allocated by the recorder.
    pub id: PatternId,
    /// Number of placements in the chunk.
    pub element_count: u32,
    /// Mean longitudinal gap between consecutive placements.
    pub average_spacing: f32,
}

#[cfg(test)]
mod tests {
    use super::{
        ChunkElement, ChunkStrategy, DifficultyMultipliers, ElementKind, LevelChunk,
        LevelPattern, PatternId, VariantId,
    };
    use glam::Vec3;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn level_chunk_round_trips_through_bincode() {
        let mut chunk = LevelChunk::new(40.0, 22.5, ChunkStrategy::Recovery);
        chunk.push(ChunkElement::new(
            ElementKind::Booster,
            VariantId::new(2),
            Vec3::new(-1.5, 0.5, 40.0),
        ));
        assert_round_trip(&chunk);
    }

    #[test]
    fn level_pattern_round_trips_through_bincode() {
        assert_round_trip(&LevelPattern {
            id: PatternId::new(7),
            element_count: 3,
            average_spacing: 8.0,
        });
    }

    #[test]
    fn chunk_reports_end_and_kind_counts() {
        let mut chunk = LevelChunk::new(10.0, 30.0, ChunkStrategy::Balanced);
        chunk.push(ChunkElement::new(
            ElementKind::Obstacle,
            VariantId::EASIEST,
            Vec3::new(0.0, 0.0, 10.0),
        ));
        chunk.push(ChunkElement::new(
            ElementKind::Booster,
            VariantId::new(1),
            Vec3::new(1.0, 0.5, 12.0),
        ));

        assert!((chunk.end() - 40.0).abs() < f32::EPSILON);
        assert_eq!(chunk.count_of(ElementKind::Obstacle), 1);
        assert_eq!(chunk.count_of(ElementKind::Booster), 1);
        assert_eq!(chunk.count_of(ElementKind::Enemy), 0);
        assert!((chunk.elements()[1].longitudinal() - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn default_multipliers_are_neutral() {
        let multipliers = DifficultyMultipliers::default();
        assert_eq!(multipliers.obstacle_frequency, 1.0);
        assert_eq!(multipliers.enemy_health, 1.0);
        assert_eq!(multipliers.reward_frequency, 1.0);
    }
}
