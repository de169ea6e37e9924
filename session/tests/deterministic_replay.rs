use std::{
    cell::RefCell,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    rc::Rc,
};

use adaptive_runner_core::{ChunkStrategy, DifficultyMultipliers, ElementKind, LevelChunk};
use adaptive_runner_session::{Session, SessionConfig};

#[test]
fn scripted_session_replays_identically() {
    let first = replay(SessionConfig::default());
    let second = replay(SessionConfig::default());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(
        first.fingerprint(),
        second.fingerprint(),
        "fingerprint mismatch between identical runs"
    );
    assert!(!first.chunks.is_empty());
    assert_eq!(first.adjustments.len(), 8, "two minutes at one adjustment per 15s");
}

#[test]
fn different_seeds_change_the_fingerprint() {
    let first = replay(SessionConfig::default());
    let second = replay(SessionConfig {
        seed: 1,
        ..SessionConfig::default()
    });

    assert_eq!(first.adjustments, second.adjustments);
    assert_ne!(first.fingerprint(), second.fingerprint());
}

fn replay(config: SessionConfig) -> ReplayOutcome {
    let mut session = Session::new(config);
    let adjustments = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&adjustments);
    session.subscribe(Box::new(move |multipliers: &DifficultyMultipliers| {
        sink.borrow_mut().push(MultiplierRecord::from(*multipliers));
    }));

    let mut chunks = Vec::new();
    let mut track_end = 0.0;
    for step in 0..(120 * 60) {
        session.tick(1.0 / 60.0);
        match step % 180 {
            30 => session.on_success(),
            90 => session.on_obstacle_avoid(0.4 + (step % 7) as f32 * 0.2),
            150 if step % 540 == 150 => session.on_death(),
            _ => {}
        }
        if step % 300 == 0 {
            for chunk in session.generate_chunks(track_end, 120.0) {
                track_end = chunk.end();
                chunks.push(ChunkRecord::from(&chunk));
            }
        }
    }

    let adjustments = adjustments.borrow().clone();
    ReplayOutcome {
        chunks,
        adjustments,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    chunks: Vec<ChunkRecord>,
    adjustments: Vec<MultiplierRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ChunkRecord {
    start_bits: u32,
    length_bits: u32,
    strategy: ChunkStrategy,
    elements: Vec<(ElementKind, u16, [u32; 3])>,
}

impl From<&LevelChunk> for ChunkRecord {
    fn from(chunk: &LevelChunk) -> Self {
        Self {
            start_bits: chunk.start().to_bits(),
            length_bits: chunk.length().to_bits(),
            strategy: chunk.strategy(),
            elements: chunk
                .elements()
                .iter()
                .map(|element| {
                    let position = element.position();
                    (
                        element.kind(),
                        element.variant().get(),
                        [
                            position.x.to_bits(),
                            position.y.to_bits(),
                            position.z.to_bits(),
                        ],
                    )
                })
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct MultiplierRecord {
    obstacle_bits: u32,
    enemy_bits: u32,
    reward_bits: u32,
}

impl From<DifficultyMultipliers> for MultiplierRecord {
    fn from(multipliers: DifficultyMultipliers) -> Self {
        Self {
            obstacle_bits: multipliers.obstacle_frequency.to_bits(),
            enemy_bits: multipliers.enemy_health.to_bits(),
            reward_bits: multipliers.reward_frequency.to_bits(),
        }
    }
}
