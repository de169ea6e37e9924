//! Key/value persistence for player preferences.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use adaptive_runner_system_analytics::{PlayerProfile, PreferenceWeights};
use thiserror::Error;

/// Keys under which session state is persisted.
pub mod keys {
    /// Smoothed skill estimate.
    pub const PLAYER_SKILL_LEVEL: &str = "PlayerSkillLevel";
    /// Cautious-to-aggressive playstyle score.
    pub const PLAYSTYLE_SCORE: &str = "PlaystyleScore";
    /// Accumulated skill progression.
    pub const SKILL_PROGRESSION: &str = "SkillProgression";
    /// Total play time in minutes.
    pub const TOTAL_PLAY_TIME: &str = "TotalPlayTime";
    /// Best score achieved.
    pub const HIGH_SCORE: &str = "HighScore";
    /// Preference weight for speed.
    pub const PREF_SPEED: &str = "Pref_speed";
    /// Preference weight for obstacles.
    pub const PREF_OBSTACLES: &str = "Pref_obstacles";
    /// Preference weight for collectibles.
    pub const PREF_COLLECTIBLES: &str = "Pref_collectibles";
    /// Preference weight for combat.
    pub const PREF_COMBAT: &str = "Pref_combat";
}

/// Errors raised by persistent stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file exists but could not be read.
    #[error("failed to read preference store at {}", path.display())]
    Read {
        /// Location of the store.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file could not be written.
    #[error("failed to write preference store at {}", path.display())]
    Write {
        /// Location of the store.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file is not a flat JSON object of numbers.
    #[error("preference store at {} is malformed", path.display())]
    Malformed {
        /// Location of the store.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Minimal key/value store for `f32` preferences.
pub trait PreferenceStore {
    /// Returns the value stored under `key`, if any.
    fn load_f32(&self, key: &str) -> Option<f32>;

    /// Stores `value` under `key`. Non-finite values are ignored.
    fn store_f32(&mut self, key: &str, value: f32);

    /// Makes previously stored values durable.
    fn flush(&mut self) -> Result<(), StoreError>;
}

/// In-memory store, useful for tests and hosts without storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, f32>,
    flushes: usize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times [`PreferenceStore::flush`] was called.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl PreferenceStore for MemoryStore {
    fn load_f32(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn store_f32(&mut self, key: &str, value: f32) {
        if value.is_finite() {
            let _ = self.values.insert(key.to_owned(), value);
        }
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.flushes += 1;
        Ok(())
    }
}

/// Store persisted as a flat JSON object of numbers.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, f32>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file starts an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                StoreError::Malformed {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self { path, values })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn load_f32(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn store_f32(&mut self, key: &str, value: f32) {
        if value.is_finite() {
            let _ = self.values.insert(key.to_owned(), value);
        }
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(&self.values).map_err(|source| {
            StoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, contents).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Reads the analytics profile, falling back to defaults for missing keys.
#[must_use]
pub fn load_profile(store: &dyn PreferenceStore) -> PlayerProfile {
    let defaults = PlayerProfile::default();
    let weights = PreferenceWeights::default();
    let load = |key: &str, fallback: f32| store.load_f32(key).unwrap_or(fallback);

    PlayerProfile {
        playstyle: load(keys::PLAYSTYLE_SCORE, defaults.playstyle),
        skill_progression: load(keys::SKILL_PROGRESSION, defaults.skill_progression),
        preferences: PreferenceWeights {
            speed: load(keys::PREF_SPEED, weights.speed),
            obstacles: load(keys::PREF_OBSTACLES, weights.obstacles),
            collectibles: load(keys::PREF_COLLECTIBLES, weights.collectibles),
            combat: load(keys::PREF_COMBAT, weights.combat),
        },
        total_play_time_minutes: load(keys::TOTAL_PLAY_TIME, defaults.total_play_time_minutes),
        // Saturating cast; negative values become zero.
        high_score: load(keys::HIGH_SCORE, 0.0) as u32,
    }
    .sanitized()
}

/// Writes the analytics profile without flushing.
pub fn save_profile(store: &mut dyn PreferenceStore, profile: &PlayerProfile) {
    store.store_f32(keys::PLAYSTYLE_SCORE, profile.playstyle);
    store.store_f32(keys::SKILL_PROGRESSION, profile.skill_progression);
    store.store_f32(keys::TOTAL_PLAY_TIME, profile.total_play_time_minutes);
    store.store_f32(keys::HIGH_SCORE, profile.high_score as f32);
    store.store_f32(keys::PREF_SPEED, profile.preferences.speed);
    store.store_f32(keys::PREF_OBSTACLES, profile.preferences.obstacles);
    store.store_f32(keys::PREF_COLLECTIBLES, profile.preferences.collectibles);
    store.store_f32(keys::PREF_COMBAT, profile.preferences.combat);
}
