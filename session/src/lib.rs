#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestrator wiring the world and every system together.
//!
//! A [`Session`] is the single value a host owns. Gameplay collaborators report
//! player events and advance time through it, ask it for track content, and
//! subscribe to difficulty changes. Internally every request becomes a
//! [`Command`] applied to the authoritative world, and the resulting events are
//! pumped through the pure systems until no further commands are produced.

pub mod config;
pub mod store;

use adaptive_runner_core::{
    duration_from_seconds, ChunkElement, Command, DifficultyMultipliers, DifficultySnapshot, Event,
    LevelChunk, LevelPattern,
};
use adaptive_runner_system_analytics::{PlayerAction, PlayerAnalytics, SessionRecord};
use adaptive_runner_system_chunk_generation::ChunkGeneration;
use adaptive_runner_system_difficulty::DifficultyEngine;
use adaptive_runner_system_pattern_recording::PatternRecorder;
use adaptive_runner_system_stress::StressEstimator;
use adaptive_runner_world::{self as world, query, World};
use glam::Vec3;

pub use config::{ConfigError, PatternSettings, SessionConfig};
pub use store::{JsonFileStore, MemoryStore, PreferenceStore, StoreError};

/// Receives every change of the active difficulty multipliers.
pub trait DifficultyObserver {
    /// Called after new multipliers became active.
    fn on_difficulty_changed(&mut self, multipliers: &DifficultyMultipliers);
}

impl<F> DifficultyObserver for F
where
    F: FnMut(&DifficultyMultipliers),
{
    fn on_difficulty_changed(&mut self, multipliers: &DifficultyMultipliers) {
        self(multipliers);
    }
}

/// One running game session.
pub struct Session {
    world: World,
    difficulty: DifficultyEngine,
    stress: StressEstimator,
    generation: ChunkGeneration,
    patterns: PatternRecorder,
    analytics: PlayerAnalytics,
    observers: Vec<Box<dyn DifficultyObserver>>,
    store: Option<Box<dyn PreferenceStore>>,
    elapsed_secs: f64,
    generated: Vec<LevelChunk>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("world", &self.world)
            .field("difficulty", &self.difficulty)
            .field("patterns", &self.patterns)
            .field("observers", &self.observers.len())
            .field("has_store", &self.store.is_some())
            .field("elapsed_secs", &self.elapsed_secs)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Creates a session from the provided configuration and opens an analytics session.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let SessionConfig {
            seed,
            performance,
            difficulty,
            stress,
            generation,
            catalog,
            patterns,
            analytics,
        } = config;

        let stress = StressEstimator::new(stress);
        let mut analytics = PlayerAnalytics::new(analytics);
        let _ = analytics.start_session(0.0);

        Self {
            world: World::with_tuning(performance),
            difficulty: DifficultyEngine::new(difficulty),
            generation: ChunkGeneration::from_seed(generation, catalog, stress.clone(), seed),
            stress,
            patterns: PatternRecorder::new(patterns.capacity),
            analytics,
            observers: Vec::new(),
            store: None,
            elapsed_secs: 0.0,
            generated: Vec::new(),
        }
    }

    /// Attaches a preference store used by [`Session::load_profile`] and the save points.
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn PreferenceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Restores the persisted skill level and analytics profile from the attached store.
    pub fn load_profile(&mut self) {
        let Some(prefs) = self.store.as_deref() else {
            return;
        };
        let skill = prefs.load_f32(store::keys::PLAYER_SKILL_LEVEL);
        let profile = store::load_profile(prefs);

        self.analytics.restore_profile(profile);
        if let Some(skill) = skill {
            self.submit(Command::RestoreSkillLevel { skill });
        }
        log::info!(
            "profile loaded: skill {:.2}, playstyle {:.2}",
            query::skill_level(&self.world),
            self.analytics.profile().playstyle
        );
    }

    /// Registers an observer notified on every difficulty change.
    pub fn subscribe(&mut self, observer: Box<dyn DifficultyObserver>) {
        self.observers.push(observer);
    }

    /// Records a raw performance sample in `[0, 1]`.
    pub fn record_performance(&mut self, score: f32) {
        self.submit(Command::RecordPerformance { score });
    }

    /// Reports a player death and persists the skill level.
    pub fn on_death(&mut self) {
        self.submit(Command::ReportDeath);
        if let Err(error) = self.save_skill() {
            log::warn!("failed to persist skill level after death: {error}");
        }
    }

    /// Reports that the player cleared a scored section.
    pub fn on_success(&mut self) {
        self.submit(Command::ReportSuccess);
    }

    /// Reports an avoided obstacle and its reaction time in seconds.
    pub fn on_obstacle_avoid(&mut self, reaction_time: f32) {
        self.submit(Command::ReportObstacleAvoided { reaction_time });
    }

    /// Records a behavioural action for analytics.
    ///
    /// Obstacle avoids are also fed to the performance tracker.
    pub fn record_action(&mut self, action: PlayerAction, position: Vec3) {
        if let PlayerAction::ObstacleAvoid { reaction_time } = action {
            self.on_obstacle_avoid(reaction_time);
        }
        self.analytics.record_action(action, position, self.elapsed_secs);
    }

    /// Submits a final score for high score tracking.
    pub fn submit_score(&mut self, score: u32) {
        self.analytics.submit_score(score);
    }

    /// Advances simulated time by `dt_seconds`.
    ///
    /// Negative and non-finite deltas are treated as zero.
    pub fn tick(&mut self, dt_seconds: f32) {
        let dt = duration_from_seconds(dt_seconds);
        self.elapsed_secs += dt.as_secs_f64();
        self.submit(Command::Tick { dt });
    }

    /// Generates content covering `[start, start + length)` and returns its placements.
    pub fn generate_segment(&mut self, start: f32, length: f32) -> Vec<ChunkElement> {
        self.generate_chunks(start, length)
            .into_iter()
            .flat_map(LevelChunk::into_elements)
            .collect()
    }

    /// Generates chunks covering `[start, start + length)`, recording their patterns.
    pub fn generate_chunks(&mut self, start: f32, length: f32) -> Vec<LevelChunk> {
        self.submit(Command::GenerateSegment { start, length });
        std::mem::take(&mut self.generated)
    }

    /// Current difficulty state.
    #[must_use]
    pub fn snapshot(&self) -> DifficultySnapshot {
        query::difficulty_snapshot(&self.world)
    }

    /// Current stress estimate in `[0, 1]`.
    #[must_use]
    pub fn stress(&self) -> f32 {
        self.stress.estimate(Some(&self.snapshot()))
    }

    /// Recorded chunk patterns, oldest first.
    #[must_use]
    pub fn pattern_history(&self) -> Vec<LevelPattern> {
        self.patterns.history().copied().collect()
    }

    /// Behavioural analytics of the player.
    #[must_use]
    pub fn analytics(&self) -> &PlayerAnalytics {
        &self.analytics
    }

    /// Seconds of simulated time since the session started.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Persists state when the host is backgrounded.
    pub fn suspend(&mut self) -> Result<(), StoreError> {
        self.save_all()
    }

    /// Closes the analytics session and persists everything.
    pub fn end_session(&mut self) -> Result<Option<SessionRecord>, StoreError> {
        let record = self.analytics.end_session(self.elapsed_secs);
        self.save_all()?;
        Ok(record)
    }

    fn save_skill(&mut self) -> Result<(), StoreError> {
        let skill = query::skill_level(&self.world);
        let Some(prefs) = self.store.as_deref_mut() else {
            return Ok(());
        };
        prefs.store_f32(store::keys::PLAYER_SKILL_LEVEL, skill);
        prefs.flush()
    }

    fn save_all(&mut self) -> Result<(), StoreError> {
        let skill = query::skill_level(&self.world);
        let Some(prefs) = self.store.as_deref_mut() else {
            return Ok(());
        };
        prefs.store_f32(store::keys::PLAYER_SKILL_LEVEL, skill);
        store::save_profile(prefs, self.analytics.profile());
        prefs.flush()
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.pump(events);
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        while !events.is_empty() {
            let snapshot = query::difficulty_snapshot(&self.world);

            let mut chunk_events = Vec::new();
            self.generation.handle(&events, Some(&snapshot), &mut chunk_events);
            self.patterns.handle(&chunk_events);

            for event in events.iter().chain(&chunk_events) {
                match event {
                    Event::DifficultyChanged { multipliers } => {
                        for observer in &mut self.observers {
                            observer.on_difficulty_changed(multipliers);
                        }
                    }
                    Event::SkillLevelChanged { skill } => {
                        // Stored on every change, flushed only at the save points.
                        if let Some(prefs) = self.store.as_deref_mut() {
                            prefs.store_f32(store::keys::PLAYER_SKILL_LEVEL, *skill);
                        }
                    }
                    Event::ChunkGenerated { chunk } => self.generated.push(chunk.clone()),
                    _ => {}
                }
            }

            let mut commands = Vec::new();
            self.difficulty.handle(&events, &snapshot, &mut commands);

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }
}
