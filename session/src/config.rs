//! TOML configuration for a whole session.

use std::{
    fs,
    path::{Path, PathBuf},
};

use adaptive_runner_system_analytics::AnalyticsTuning;
use adaptive_runner_system_chunk_generation::{ElementCatalog, GenerationTuning, SpanRange};
use adaptive_runner_system_difficulty::DifficultyTuning;
use adaptive_runner_system_pattern_recording::DEFAULT_CAPACITY;
use adaptive_runner_system_stress::StressTuning;
use adaptive_runner_world::PerformanceTuning;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seed used when the configuration does not provide one.
pub const DEFAULT_SEED: u64 = 0x5EED_CAFE;

/// Errors raised while loading or validating a [`SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {}", path.display())]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid TOML or does not match the schema.
    #[error("malformed configuration")]
    Parse(#[from] toml::de::Error),
    /// A value parsed correctly but is outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Pattern history settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    /// Number of chunk patterns retained.
    pub capacity: usize,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Complete tuning surface of a session. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Seed of the chunk generator's random stream.
    pub seed: u64,
    /// Performance sampling and skill smoothing.
    pub performance: PerformanceTuning,
    /// Difficulty cadence, progression curve and multiplier ranges.
    pub difficulty: DifficultyTuning,
    /// Stress blend weights.
    pub stress: StressTuning,
    /// Chunk placement rules.
    pub generation: GenerationTuning,
    /// Variant pools per element kind.
    pub catalog: ElementCatalog,
    /// Pattern history settings.
    pub patterns: PatternSettings,
    /// Player analytics thresholds.
    pub analytics: AnalyticsTuning,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            performance: PerformanceTuning::default(),
            difficulty: DifficultyTuning::default(),
            stress: StressTuning::default(),
            generation: GenerationTuning::default(),
            catalog: ElementCatalog::default(),
            patterns: PatternSettings::default(),
            analytics: AnalyticsTuning::default(),
        }
    }
}

impl SessionConfig {
    /// Reads, parses and validates the configuration stored at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_performance()?;
        self.validate_difficulty()?;
        self.validate_stress()?;
        self.validate_generation()?;
        if self.patterns.capacity == 0 {
            return Err(invalid("patterns.capacity", "must be at least 1"));
        }
        Ok(())
    }

    fn validate_performance(&self) -> Result<(), ConfigError> {
        let performance = &self.performance;
        if performance.sample_size == 0 {
            return Err(invalid("performance.sample_size", "must be at least 1"));
        }
        unit("performance.skill_smoothing", performance.skill_smoothing)?;
        unit("performance.reaction_smoothing", performance.reaction_smoothing)?;
        unit("performance.death_score", performance.death_score)?;
        unit("performance.success_score", performance.success_score)?;
        unit("performance.initial_skill_level", performance.initial_skill_level)?;
        positive("performance.min_reaction_time", performance.min_reaction_time)?;
        positive("performance.initial_reaction_time", performance.initial_reaction_time)?;
        if !(performance.max_reaction_time.is_finite()
            && performance.max_reaction_time > performance.min_reaction_time)
        {
            return Err(invalid(
                "performance.max_reaction_time",
                "must exceed performance.min_reaction_time",
            ));
        }
        if !(performance.best_reaction_time.is_finite()
            && performance.worst_reaction_time.is_finite()
            && performance.best_reaction_time != performance.worst_reaction_time)
        {
            return Err(invalid(
                "performance.worst_reaction_time",
                "must be finite and differ from performance.best_reaction_time",
            ));
        }
        Ok(())
    }

    fn validate_difficulty(&self) -> Result<(), ConfigError> {
        let difficulty = &self.difficulty;
        positive(
            "difficulty.adjustment_interval_secs",
            difficulty.adjustment_interval_secs,
        )?;
        if difficulty.progression.is_empty() {
            return Err(invalid("difficulty.progression", "needs at least one key"));
        }
        for key in &difficulty.progression {
            if !(key.time_secs.is_finite() && key.value.is_finite()) {
                return Err(invalid("difficulty.progression", "keys must be finite"));
            }
        }
        if difficulty
            .progression
            .windows(2)
            .any(|pair| pair[1].time_secs <= pair[0].time_secs)
        {
            return Err(invalid(
                "difficulty.progression",
                "key times must be strictly increasing",
            ));
        }
        for (field, range) in [
            ("difficulty.skill_scale", difficulty.skill_scale),
            ("difficulty.obstacle_frequency", difficulty.obstacle_frequency),
            ("difficulty.enemy_health", difficulty.enemy_health),
            ("difficulty.reward_frequency", difficulty.reward_frequency),
        ] {
            if !(range.from.is_finite() && range.to.is_finite()) {
                return Err(invalid(field, "range ends must be finite"));
            }
        }
        Ok(())
    }

    fn validate_stress(&self) -> Result<(), ConfigError> {
        let stress = &self.stress;
        for (field, value) in [
            ("stress.performance_weight", stress.performance_weight),
            ("stress.reaction_weight", stress.reaction_weight),
            ("stress.streak_weight", stress.streak_weight),
            ("stress.relaxed_reaction_time", stress.relaxed_reaction_time),
            ("stress.stressed_reaction_time", stress.stressed_reaction_time),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }
        unit("stress.neutral_performance", stress.neutral_performance)?;
        unit("stress.mastered_streak_stress", stress.mastered_streak_stress)?;
        unit("stress.default_streak_stress", stress.default_streak_stress)?;
        unit("stress.neutral_stress", stress.neutral_stress)
    }

    fn validate_generation(&self) -> Result<(), ConfigError> {
        let generation = &self.generation;
        unit("generation.recovery_probability", generation.recovery_probability)?;
        unit(
            "generation.challenge_probability",
            generation.challenge_probability,
        )?;
        unit("generation.obstacle_probability", generation.obstacle_probability)?;
        unit("generation.booster_probability", generation.booster_probability)?;
        unit("generation.recovery_stress", generation.recovery_stress)?;
        unit("generation.challenge_stress", generation.challenge_stress)?;

        positive_span("generation.recovery_length", generation.recovery_length)?;
        positive_span("generation.challenge_length", generation.challenge_length)?;
        positive_span("generation.balanced_length", generation.balanced_length)?;
        positive_span("generation.challenge_step", generation.challenge_step)?;
        positive_span("generation.spacing_jitter", generation.spacing_jitter)?;
        for (field, range) in [
            ("generation.recovery_lateral", generation.recovery_lateral),
            ("generation.lateral", generation.lateral),
        ] {
            if !range.is_well_formed() {
                return Err(invalid(field, "bounds must be finite and ordered"));
            }
        }
        if generation.recovery_boosters.min > generation.recovery_boosters.max {
            return Err(invalid(
                "generation.recovery_boosters",
                "min must not exceed max",
            ));
        }

        positive("generation.min_step", generation.min_step)?;
        positive(
            "generation.min_obstacle_spacing",
            generation.min_obstacle_spacing,
        )?;
        positive(
            "generation.max_obstacle_spacing",
            generation.max_obstacle_spacing,
        )?;
        for (field, value) in [
            ("generation.challenge_density", generation.challenge_density),
            ("generation.recovery_booster_gap", generation.recovery_booster_gap),
            ("generation.booster_lead", generation.booster_lead),
            ("generation.booster_height", generation.booster_height),
            (
                "generation.safe_obstacle_distance",
                generation.safe_obstacle_distance,
            ),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be positive")))
    }
}

fn positive_span(field: &'static str, range: SpanRange) -> Result<(), ConfigError> {
    if range.is_well_formed() && range.min > 0.0 {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("[{}, {}) must be positive and ordered", range.min, range.max),
        ))
    }
}
