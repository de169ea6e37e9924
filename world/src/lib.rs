#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the Adaptive Runner.
//!
//! The world owns the difficulty state and the performance window. It is only
//! mutated through [`apply`], and systems observe it through the read-only
//! functions in [`query`].

mod performance;

use std::time::Duration;

use adaptive_runner_core::{Command, DifficultyMultipliers, Event, RejectedInput};

use performance::PerformanceWindow;

pub use performance::PerformanceTuning;

/// Represents the authoritative state of one game session.
#[derive(Debug)]
pub struct World {
    tuning: PerformanceTuning,
    performance: PerformanceWindow,
    skill_level: f32,
    session_length: Duration,
    current_streak: u32,
    average_reaction_time: f32,
    multipliers: DifficultyMultipliers,
    tick_index: u64,
}

impl World {
    /// Creates a new session world using the default performance tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tuning(PerformanceTuning::default())
    }

    /// Creates a new session world using the provided performance tuning.
    #[must_use]
    pub fn with_tuning(tuning: PerformanceTuning) -> Self {
        let tuning = tuning.sanitized();
        let skill_level = adaptive_runner_core::clamp_unit(tuning.initial_skill_level);
        let average_reaction_time = if tuning.initial_reaction_time.is_finite() {
            tuning.initial_reaction_time.max(tuning.min_reaction_time)
        } else {
            PerformanceTuning::default().initial_reaction_time
        };
        Self {
            performance: PerformanceWindow::new(tuning.sample_size),
            skill_level,
            session_length: Duration::ZERO,
            current_streak: 0,
            average_reaction_time,
            multipliers: DifficultyMultipliers::default(),
            tick_index: 0,
            tuning,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.session_length = world.session_length.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::RecordPerformance { score } => {
            performance::record_score(world, score, out_events);
        }
        Command::ReportDeath => performance::record_death(world, out_events),
        Command::ReportSuccess => performance::record_success(world, out_events),
        Command::ReportObstacleAvoided { reaction_time } => {
            performance::record_obstacle_avoided(world, reaction_time, out_events);
        }
        Command::RestoreSkillLevel { skill } => {
            performance::restore_skill(world, skill, out_events);
        }
        Command::ApplyDifficulty { multipliers } => {
            if !multipliers_are_finite(&multipliers) {
                log::warn!("ignoring non-finite difficulty multipliers {multipliers:?}");
                return;
            }
            world.multipliers = multipliers;
            out_events.push(Event::DifficultyChanged { multipliers });
        }
        Command::GenerateSegment { start, length } => {
            // Empty segments are valid requests that simply produce nothing.
            if !start.is_finite() || length.is_nan() || length.is_infinite() {
                log::warn!("ignoring segment request start={start} length={length}");
                out_events.push(Event::InputRejected {
                    input: RejectedInput::SegmentBounds,
                });
                return;
            }
            if length > 0.0 {
                out_events.push(Event::SegmentRequested { start, length });
            }
        }
    }
}

fn multipliers_are_finite(multipliers: &DifficultyMultipliers) -> bool {
    multipliers.obstacle_frequency.is_finite()
        && multipliers.enemy_health.is_finite()
        && multipliers.reward_frequency.is_finite()
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use adaptive_runner_core::{DifficultyMultipliers, DifficultySnapshot};

    use super::World;

    /// Captures the difficulty state consumed by systems.
    #[must_use]
    pub fn difficulty_snapshot(world: &World) -> DifficultySnapshot {
        DifficultySnapshot {
            skill_level: world.skill_level,
            session_length: world.session_length,
            current_streak: world.current_streak,
            average_reaction_time: world.average_reaction_time,
            mean_recent_performance: world.performance.mean(),
            multipliers: world.multipliers,
        }
    }

    /// Current smoothed skill estimate.
    #[must_use]
    pub fn skill_level(world: &World) -> f32 {
        world.skill_level
    }

    /// Simulated time elapsed since the session started.
    #[must_use]
    pub fn session_length(world: &World) -> Duration {
        world.session_length
    }

    /// Multipliers most recently applied by the difficulty engine.
    #[must_use]
    pub fn multipliers(world: &World) -> DifficultyMultipliers {
        world.multipliers
    }

    /// Samples currently held in the performance window, oldest first.
    #[must_use]
    pub fn performance_samples(world: &World) -> Vec<f32> {
        world.performance.samples().collect()
    }

    /// Maximum number of samples the performance window retains.
    #[must_use]
    pub fn performance_capacity(world: &World) -> usize {
        world.performance.capacity()
    }

    /// Number of ticks processed since the session started.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            apply(world, command, &mut events);
        }
        events
    }

    #[test]
    fn tick_accumulates_session_length() {
        let mut world = World::new();
        let events = apply_all(
            &mut world,
            vec![
                Command::Tick {
                    dt: Duration::from_millis(250),
                },
                Command::Tick {
                    dt: Duration::from_millis(750),
                },
            ],
        );

        assert_eq!(query::session_length(&world), Duration::from_secs(1));
        assert_eq!(query::tick_index(&world), 2);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn skill_waits_for_three_samples() {
        let mut world = World::new();
        let events = apply_all(
            &mut world,
            vec![
                Command::RecordPerformance { score: 1.0 },
                Command::RecordPerformance { score: 1.0 },
            ],
        );
        assert_eq!(query::skill_level(&world), 0.5);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::SkillLevelChanged { .. })));

        let events = apply_all(&mut world, vec![Command::RecordPerformance { score: 1.0 }]);
        assert!((query::skill_level(&world) - 0.55).abs() < 1e-6);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::SkillLevelChanged { .. })));
    }

    #[test]
    fn death_resets_streak_and_records_poor_sample() {
        let mut world = World::new();
        let _ = apply_all(
            &mut world,
            vec![Command::ReportSuccess, Command::ReportSuccess],
        );
        assert_eq!(query::difficulty_snapshot(&world).current_streak, 2);

        let events = apply_all(&mut world, vec![Command::ReportDeath]);
        assert_eq!(query::difficulty_snapshot(&world).current_streak, 0);
        assert_eq!(query::performance_samples(&world), vec![0.9, 0.9, 0.1]);
        assert!(events.contains(&Event::PlayerDied));
        assert!(events.contains(&Event::StreakChanged { streak: 0 }));
    }

    #[test]
    fn obstacle_avoid_updates_reaction_average_and_score() {
        let mut world = World::new();
        let _ = apply_all(
            &mut world,
            vec![Command::ReportObstacleAvoided { reaction_time: 0.5 }],
        );

        let snapshot = query::difficulty_snapshot(&world);
        assert!((snapshot.average_reaction_time - 0.9).abs() < 1e-6);
        assert_eq!(query::performance_samples(&world), vec![1.0]);
    }

    #[test]
    fn out_of_range_reaction_is_clamped_not_rejected() {
        let mut world = World::new();
        let events = apply_all(
            &mut world,
            vec![
                Command::ReportObstacleAvoided { reaction_time: 9.0 },
                Command::ReportObstacleAvoided {
                    reaction_time: -3.0,
                },
            ],
        );

        assert_eq!(query::performance_samples(&world), vec![0.0, 1.0]);
        assert!(query::difficulty_snapshot(&world).average_reaction_time > 0.0);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::InputRejected { .. })));
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let mut world = World::new();
        let events = apply_all(
            &mut world,
            vec![
                Command::RecordPerformance { score: f32::NAN },
                Command::ReportObstacleAvoided {
                    reaction_time: f32::INFINITY,
                },
                Command::RestoreSkillLevel { skill: f32::NAN },
            ],
        );

        assert_eq!(
            events,
            vec![
                Event::InputRejected {
                    input: RejectedInput::PerformanceScore
                },
                Event::InputRejected {
                    input: RejectedInput::ReactionTime
                },
                Event::InputRejected {
                    input: RejectedInput::SkillLevel
                },
            ]
        );
        let snapshot = query::difficulty_snapshot(&world);
        assert_eq!(snapshot.skill_level, 0.5);
        assert_eq!(snapshot.average_reaction_time, 1.0);
        assert!(snapshot.mean_recent_performance.is_none());
    }

    #[test]
    fn restore_skill_clamps_into_unit_range() {
        let mut world = World::new();
        let _ = apply_all(&mut world, vec![Command::RestoreSkillLevel { skill: 1.7 }]);
        assert_eq!(query::skill_level(&world), 1.0);
    }

    #[test]
    fn apply_difficulty_broadcasts_multipliers() {
        let mut world = World::new();
        let multipliers = DifficultyMultipliers {
            obstacle_frequency: 1.2,
            enemy_health: 1.1,
            reward_frequency: 0.9,
        };
        let events = apply_all(&mut world, vec![Command::ApplyDifficulty { multipliers }]);

        assert_eq!(events, vec![Event::DifficultyChanged { multipliers }]);
        assert_eq!(query::multipliers(&world), multipliers);
    }

    #[test]
    fn segment_requests_are_validated() {
        let mut world = World::new();
        let events = apply_all(
            &mut world,
            vec![
                Command::GenerateSegment {
                    start: 0.0,
                    length: 100.0,
                },
                Command::GenerateSegment {
                    start: 100.0,
                    length: 0.0,
                },
                Command::GenerateSegment {
                    start: 100.0,
                    length: -5.0,
                },
                Command::GenerateSegment {
                    start: f32::NAN,
                    length: 10.0,
                },
            ],
        );

        assert_eq!(
            events,
            vec![
                Event::SegmentRequested {
                    start: 0.0,
                    length: 100.0
                },
                Event::InputRejected {
                    input: RejectedInput::SegmentBounds
                },
            ]
        );
    }

    #[test]
    fn inconsistent_reaction_bounds_never_panic() {
        for (min_reaction_time, max_reaction_time) in [(3.0, 1.0), (f32::NAN, 1.0), (0.1, f32::NAN)] {
            let mut world = World::with_tuning(PerformanceTuning {
                min_reaction_time,
                max_reaction_time,
                ..PerformanceTuning::default()
            });
            let events = apply_all(
                &mut world,
                vec![Command::ReportObstacleAvoided { reaction_time: 1.0 }],
            );

            assert!(events.contains(&Event::PerformanceRecorded {
                score: query::performance_samples(&world)[0]
            }));
            assert!(query::difficulty_snapshot(&world).average_reaction_time > 0.0);
        }
    }

    #[test]
    fn non_finite_multipliers_are_ignored() {
        let mut world = World::new();
        let events = apply_all(
            &mut world,
            vec![Command::ApplyDifficulty {
                multipliers: DifficultyMultipliers {
                    obstacle_frequency: f32::NAN,
                    ..DifficultyMultipliers::default()
                },
            }],
        );

        assert!(events.is_empty());
        assert_eq!(query::multipliers(&world), DifficultyMultipliers::default());
    }
}
