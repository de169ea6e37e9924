//! Headless session driven by a seeded synthetic player.

use std::{cell::RefCell, rc::Rc};

use adaptive_runner_core::{lerp, ChunkElement, ChunkStrategy, DifficultyMultipliers, ElementKind};
use adaptive_runner_session::{Session, StoreError};
use adaptive_runner_system_analytics::PlayerAction;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::report::{Adjustment, FinalState, SimulationReport, StrategyCounts};

/// Fixed host frame rate of the simulation.
pub(crate) const TICK_RATE_HZ: u32 = 60;
/// Simulated seconds between two success reports when the player stays alive.
const SUCCESS_INTERVAL_SECS: f64 = 10.0;

/// Parameters of a headless run.
#[derive(Clone, Debug)]
pub(crate) struct SimulationParams {
    pub(crate) seed: u64,
    pub(crate) seconds: u32,
    pub(crate) segment_length: f32,
    pub(crate) player_skill: f32,
    pub(crate) run_speed: f32,
}

/// Scripted stand-in for a human player.
#[derive(Debug)]
struct SyntheticPlayer {
    rng: ChaCha8Rng,
    skill: f32,
    speed: f32,
    position: f32,
}

impl SyntheticPlayer {
    fn new(seed: u64, skill: f32, speed: f32) -> Self {
        Self {
            // Decorrelated from the generator stream seeded with the same value.
            rng: ChaCha8Rng::seed_from_u64(seed.rotate_left(17) ^ 0x9E37_79B9_7F4A_7C15),
            skill: skill.clamp(0.0, 1.0),
            speed,
            position: 0.0,
        }
    }

    fn advance(&mut self, dt: f32) {
        self.position += self.speed * dt;
    }

    /// Chance of dodging an obstacle; harder variants and denser tracks hurt.
    fn avoid_chance(&self, variant: u16, multipliers: &DifficultyMultipliers) -> f32 {
        let base = lerp(0.55, 0.97, self.skill) - f32::from(variant) * 0.03;
        (base - (multipliers.obstacle_frequency - 1.0) * 0.1).clamp(0.05, 0.99)
    }

    fn reaction_time(&mut self) -> f32 {
        lerp(1.8, 0.4, self.skill) * self.rng.gen_range(0.8..1.25)
    }
}

#[derive(Debug, Default)]
struct Tally {
    deaths: u32,
    successes: u32,
    obstacles_avoided: u32,
    pickups: u32,
}

/// Runs a headless session and summarises it.
pub(crate) fn run(
    mut session: Session,
    params: &SimulationParams,
) -> Result<SimulationReport, StoreError> {
    let heard = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&heard);
    session.subscribe(Box::new(move |multipliers: &DifficultyMultipliers| {
        sink.borrow_mut().push(*multipliers);
    }));

    let dt = 1.0 / TICK_RATE_HZ as f32;
    let total_ticks = u64::from(params.seconds) * u64::from(TICK_RATE_HZ);
    let mut player = SyntheticPlayer::new(params.seed, params.player_skill, params.run_speed);
    let mut tally = Tally::default();
    let mut strategies = StrategyCounts::default();
    let mut adjustments = Vec::new();
    let mut pending: Vec<ChunkElement> = Vec::new();
    let mut track_end = 0.0_f32;
    let mut last_success = 0.0_f64;

    for _ in 0..total_ticks {
        session.tick(dt);
        player.advance(dt);

        for multipliers in heard.borrow_mut().drain(..) {
            adjustments.push(Adjustment {
                at_secs: session.elapsed_secs(),
                multipliers,
            });
        }

        if track_end - player.position < params.segment_length {
            for chunk in session.generate_chunks(track_end, params.segment_length) {
                strategies.count(chunk.strategy());
                track_end = chunk.end();
                pending.extend(chunk.into_elements());
            }
        }

        let (due, ahead): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|element| element.longitudinal() <= player.position);
        pending = ahead;
        for element in due {
            resolve(&mut session, &mut player, &mut tally, &element);
        }

        if session.elapsed_secs() - last_success >= SUCCESS_INTERVAL_SECS {
            session.on_success();
            tally.successes += 1;
            last_success = session.elapsed_secs();
        }
    }

    let score = player.position.max(0.0) as u32;
    session.submit_score(score);
    let closed = session.end_session()?;
    let snapshot = session.snapshot();

    Ok(SimulationReport {
        seed: params.seed,
        seconds: params.seconds,
        distance: player.position,
        score,
        deaths: tally.deaths,
        successes: tally.successes,
        obstacles_avoided: tally.obstacles_avoided,
        pickups: tally.pickups,
        chunks: strategies,
        adjustments,
        final_state: FinalState {
            skill_level: snapshot.skill_level,
            stress: session.stress(),
            current_streak: snapshot.current_streak,
            average_reaction_time: snapshot.average_reaction_time,
            multipliers: snapshot.multipliers,
        },
        patterns_recorded: session.pattern_history().len(),
        preferred_difficulty: session.analytics().preferred_difficulty().label(),
        session_minutes: closed.and_then(|record| record.duration_minutes()),
        recommendations: session.analytics().recommendations(),
    })
}

fn resolve(
    session: &mut Session,
    player: &mut SyntheticPlayer,
    tally: &mut Tally,
    element: &ChunkElement,
) {
    let position = Vec3::new(element.position().x, 0.0, player.position);
    match element.kind() {
        ElementKind::Obstacle => {
            let chance = player.avoid_chance(element.variant().get(), &session.snapshot().multipliers);
            if player.rng.gen::<f32>() < chance {
                let reaction_time = player.reaction_time();
                session.record_action(PlayerAction::ObstacleAvoid { reaction_time }, position);
                tally.obstacles_avoided += 1;
            } else {
                log::debug!("player hit an obstacle at {:.1}", element.longitudinal());
                session.on_death();
                tally.deaths += 1;
            }
        }
        ElementKind::Booster => {
            let action = if element.variant().get() % 2 == 0 {
                PlayerAction::SpeedBoost
            } else {
                PlayerAction::CollectiblePickup
            };
            session.record_action(action, position);
            tally.pickups += 1;
        }
        ElementKind::Enemy => {
            let success = player.rng.gen::<f32>() < player.skill;
            session.record_action(PlayerAction::EnemyCombat { success }, position);
            if !success {
                session.on_death();
                tally.deaths += 1;
            }
        }
        ElementKind::Environment => {}
    }
}

impl StrategyCounts {
    fn count(&mut self, strategy: ChunkStrategy) {
        match strategy {
            ChunkStrategy::Recovery => self.recovery += 1,
            ChunkStrategy::Challenge => self.challenge += 1,
            ChunkStrategy::Balanced => self.balanced += 1,
        }
    }
}
