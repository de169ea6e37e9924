use std::{sync::mpsc, thread, time::Duration};

use adaptive_runner_core::{
    ChunkStrategy, DifficultyMultipliers, DifficultySnapshot, ElementKind, LevelChunk, VariantId,
};
use adaptive_runner_system_chunk_generation::{
    ChunkGeneration, ElementCatalog, GenerationTuning, SpanRange,
};
use adaptive_runner_system_stress::StressEstimator;
use proptest::prelude::*;

fn generator(tuning: GenerationTuning, seed: u64) -> ChunkGeneration {
    ChunkGeneration::from_seed(
        tuning,
        ElementCatalog::default(),
        StressEstimator::default(),
        seed,
    )
}

fn segment(generation: &mut ChunkGeneration, start: f32, length: f32) -> Vec<LevelChunk> {
    let mut chunks = Vec::new();
    generation.generate_segment(start, length, None, &mut chunks);
    chunks
}

fn stressed_snapshot() -> DifficultySnapshot {
    DifficultySnapshot {
        mean_recent_performance: Some(0.0),
        average_reaction_time: 2.0,
        current_streak: 0,
        ..DifficultySnapshot::default()
    }
}

fn relaxed_snapshot(obstacle_frequency: f32) -> DifficultySnapshot {
    DifficultySnapshot {
        mean_recent_performance: Some(1.0),
        average_reaction_time: 0.5,
        current_streak: 20,
        multipliers: DifficultyMultipliers {
            obstacle_frequency,
            ..DifficultyMultipliers::default()
        },
        ..DifficultySnapshot::default()
    }
}

#[test]
fn segment_covers_requested_length() {
    let mut generation = generator(GenerationTuning::default(), 1);
    let chunks = segment(&mut generation, 0.0, 100.0);

    assert!(!chunks.is_empty());
    assert_eq!(chunks[0].start(), 0.0);
    for pair in chunks.windows(2) {
        assert!((pair[1].start() - pair[0].end()).abs() < 1e-3);
    }
    let covered: f32 = chunks.iter().map(LevelChunk::length).sum();
    assert!(covered >= 100.0);
    assert!(chunks.iter().all(|chunk| chunk.strategy() == ChunkStrategy::Balanced));
}

#[test]
fn empty_segments_produce_nothing() {
    let mut generation = generator(GenerationTuning::default(), 1);
    assert!(segment(&mut generation, 0.0, 0.0).is_empty());
    assert!(segment(&mut generation, 0.0, -12.0).is_empty());
    assert!(segment(&mut generation, 0.0, f32::NAN).is_empty());
}

#[test]
fn stressed_players_get_recovery_chunks() {
    let mut generation = generator(
        GenerationTuning {
            recovery_probability: 1.0,
            ..GenerationTuning::default()
        },
        5,
    );
    let snapshot = stressed_snapshot();
    assert!(StressEstimator::default().estimate_snapshot(&snapshot) > 0.8);

    let mut chunks = Vec::new();
    generation.generate_segment(0.0, 200.0, Some(&snapshot), &mut chunks);

    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert_eq!(chunk.strategy(), ChunkStrategy::Recovery);
        assert!((15.0..25.0).contains(&chunk.length()));
        assert!((2..=3).contains(&chunk.count_of(ElementKind::Booster)));
        assert_eq!(chunk.count_of(ElementKind::Obstacle), 0);
        for (index, element) in chunk.elements().iter().enumerate() {
            let position = element.position();
            assert_eq!(position.y, 0.5);
            assert!((-3.0..3.0).contains(&position.x));
            assert!((position.z - (chunk.start() + index as f32 * 8.0)).abs() < 1e-3);
        }
    }
}

#[test]
fn relaxed_players_get_dense_challenge_chunks() {
    let mut generation = generator(
        GenerationTuning {
            challenge_probability: 1.0,
            ..GenerationTuning::default()
        },
        9,
    );
    // Density 0.8 * 1.5 exceeds one, so every step places an obstacle.
    let snapshot = relaxed_snapshot(1.5);
    let mut chunks = Vec::new();
    generation.generate_segment(0.0, 150.0, Some(&snapshot), &mut chunks);

    for chunk in &chunks {
        assert_eq!(chunk.strategy(), ChunkStrategy::Challenge);
        assert!((20.0..35.0).contains(&chunk.length()));
        assert_eq!(chunk.count_of(ElementKind::Booster), 0);
        let elements = chunk.elements();
        assert_eq!(elements[0].longitudinal(), chunk.start());
        for pair in elements.windows(2) {
            let step = pair[1].longitudinal() - pair[0].longitudinal();
            assert!((3.0 - 1e-3..8.0 + 1e-3).contains(&step));
        }
        assert!(elements.iter().all(|element| element.longitudinal() < chunk.end()));
    }
}

#[test]
fn far_track_positions_still_terminate() {
    let run = |tuning: GenerationTuning, snapshot: Option<DifficultySnapshot>| {
        let (sender, receiver) = mpsc::channel();
        let _ = thread::spawn(move || {
            let mut generation = generator(tuning, 5);
            let mut chunks = Vec::new();
            generation.generate_segment(1.0e9, 500.0, snapshot.as_ref(), &mut chunks);
            let _ = sender.send(chunks);
        });
        receiver
            .recv_timeout(Duration::from_secs(10))
            .expect("generation at a far start must return")
    };

    let balanced = run(GenerationTuning::default(), None);
    assert!(!balanced.is_empty());

    let challenge = run(
        GenerationTuning {
            challenge_probability: 1.0,
            ..GenerationTuning::default()
        },
        Some(relaxed_snapshot(1.5)),
    );
    assert!(!challenge.is_empty());
    assert!(challenge
        .iter()
        .all(|chunk| chunk.strategy() == ChunkStrategy::Challenge));
}

#[test]
fn tight_spacing_falls_back_to_easiest_obstacle() {
    let mut generation = generator(
        GenerationTuning {
            obstacle_probability: 1.0,
            booster_probability: 0.0,
            min_obstacle_spacing: 2.0,
            max_obstacle_spacing: 2.0,
            ..GenerationTuning::default()
        },
        13,
    );
    let chunks = segment(&mut generation, 0.0, 120.0);
    let obstacles: Vec<_> = chunks
        .iter()
        .flat_map(|chunk| chunk.elements().iter().copied())
        .collect();

    assert!(obstacles.len() > 10);
    assert!(obstacles[1..]
        .iter()
        .all(|element| element.variant() == VariantId::EASIEST));
}

#[test]
fn wide_spacing_uses_the_whole_obstacle_pool() {
    let mut generation = generator(
        GenerationTuning {
            obstacle_probability: 1.0,
            booster_probability: 0.0,
            min_obstacle_spacing: 12.0,
            max_obstacle_spacing: 12.0,
            spacing_jitter: SpanRange::new(1.0, 1.0),
            ..GenerationTuning::default()
        },
        17,
    );
    let chunks = segment(&mut generation, 0.0, 1_200.0);
    let variants: Vec<_> = chunks
        .iter()
        .flat_map(|chunk| chunk.elements().iter().map(|element| element.variant()))
        .collect();

    assert!(variants.len() > 50);
    assert!(variants.iter().any(|variant| *variant != VariantId::EASIEST));
}

#[test]
fn balanced_boosters_float_ahead_of_their_step() {
    let mut generation = generator(
        GenerationTuning {
            obstacle_probability: 1.0,
            booster_probability: 1.0,
            ..GenerationTuning::default()
        },
        21,
    );
    let chunks = segment(&mut generation, 0.0, 80.0);
    for chunk in &chunks {
        for pair in chunk.elements().chunks(2) {
            assert_eq!(pair[0].kind(), ElementKind::Obstacle);
            assert_eq!(pair[1].kind(), ElementKind::Booster);
            assert_eq!(pair[1].position().y, 0.5);
            assert!((pair[1].longitudinal() - pair[0].longitudinal() - 2.0).abs() < 1e-3);
        }
    }
}

#[test]
fn empty_pools_are_never_placed() {
    let mut generation = ChunkGeneration::from_seed(
        GenerationTuning {
            recovery_probability: 1.0,
            ..GenerationTuning::default()
        },
        ElementCatalog {
            obstacles: 0,
            boosters: 0,
            ..ElementCatalog::default()
        },
        StressEstimator::default(),
        3,
    );
    let mut chunks = Vec::new();
    generation.generate_segment(0.0, 300.0, None, &mut chunks);
    generation.generate_segment(300.0, 300.0, Some(&stressed_snapshot()), &mut chunks);

    assert!(!chunks.is_empty());
    assert!(chunks.iter().all(|chunk| chunk.elements().is_empty()));
}

#[test]
fn identical_seeds_generate_identical_track() {
    let snapshot = relaxed_snapshot(1.2);
    let run = |seed: u64| {
        let mut generation = generator(GenerationTuning::default(), seed);
        let mut chunks = Vec::new();
        generation.generate_segment(0.0, 500.0, Some(&snapshot), &mut chunks);
        generation.generate_segment(500.0, 500.0, None, &mut chunks);
        chunks
    };

    assert_eq!(run(99), run(99));
    assert_ne!(run(99), run(100));
}

proptest! {
    #[test]
    fn obstacle_history_stays_bounded(seed in any::<u64>(), length in 1.0f32..2_000.0) {
        let mut generation = generator(GenerationTuning::default(), seed);
        let _ = segment(&mut generation, 0.0, length);
        prop_assert!(generation.recent_obstacles().len() <= 10);
    }

    #[test]
    fn segments_always_cover_their_length(
        seed in any::<u64>(),
        start in -1_000.0f32..1_000.0,
        length in 0.1f32..500.0,
        frequency in 0.0f32..3.0,
    ) {
        let mut generation = generator(GenerationTuning::default(), seed);
        let snapshot = relaxed_snapshot(frequency);
        let mut chunks = Vec::new();
        generation.generate_segment(start, length, Some(&snapshot), &mut chunks);

        let last = chunks.last().map(LevelChunk::end).unwrap_or(start);
        prop_assert!(last >= start + length);
    }
}
