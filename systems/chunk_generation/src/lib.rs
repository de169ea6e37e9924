#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded procedural chunk generation driven by player stress.
//!
//! Each chunk picks one of three strategies. Stressed players occasionally get
//! a booster-only recovery stretch, relaxed players occasionally get a dense
//! obstacle run, and everything else is a balanced mix whose spacing tightens
//! as the obstacle multiplier rises.

mod tuning;

use std::collections::VecDeque;

use adaptive_runner_core::{
    lerp, ChunkElement, ChunkStrategy, DifficultySnapshot, ElementKind, Event, LevelChunk,
    VariantId,
};
use adaptive_runner_system_stress::StressEstimator;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use tuning::{CountRange, ElementCatalog, GenerationTuning, SpanRange};

/// Stateful chunk generator owning its random source and obstacle history.
#[derive(Debug)]
pub struct ChunkGeneration<R = ChaCha8Rng> {
    tuning: GenerationTuning,
    catalog: ElementCatalog,
    stress: StressEstimator,
    rng: R,
    recent_obstacles: VecDeque<Vec3>,
}

impl ChunkGeneration<ChaCha8Rng> {
    /// Creates a generator whose random stream is derived from `seed`.
    #[must_use]
    pub fn from_seed(
        tuning: GenerationTuning,
        catalog: ElementCatalog,
        stress: StressEstimator,
        seed: u64,
    ) -> Self {
        Self::new(tuning, catalog, stress, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> ChunkGeneration<R> {
    /// Creates a generator drawing randomness from `rng`.
    #[must_use]
    pub fn new(
        tuning: GenerationTuning,
        catalog: ElementCatalog,
        stress: StressEstimator,
        rng: R,
    ) -> Self {
        let history = tuning.obstacle_history;
        Self {
            tuning,
            catalog,
            stress,
            rng,
            recent_obstacles: VecDeque::with_capacity(history),
        }
    }

    /// Positions of the most recently placed obstacles, oldest first.
    pub fn recent_obstacles(&self) -> impl ExactSizeIterator<Item = Vec3> + '_ {
        self.recent_obstacles.iter().copied()
    }

    /// Generates chunks until `[start, start + length)` is covered.
    ///
    /// Chunks are appended to `out` in track order. Non-finite bounds and
    /// non-positive lengths produce nothing.
    pub fn generate_segment(
        &mut self,
        start: f32,
        length: f32,
        snapshot: Option<&DifficultySnapshot>,
        out: &mut Vec<LevelChunk>,
    ) {
        if !start.is_finite() || !length.is_finite() || length <= 0.0 {
            return;
        }

        let end = start + length;
        let mut cursor = start;
        while cursor < end {
            let chunk = self.generate_chunk(cursor, snapshot);
            let next = chunk.end();
            out.push(chunk);
            if next <= cursor {
                log::warn!("chunk at {cursor} did not advance the track, stopping segment");
                break;
            }
            cursor = next;
        }
    }

    /// Generates a single chunk beginning at `start`.
    pub fn generate_chunk(
        &mut self,
        start: f32,
        snapshot: Option<&DifficultySnapshot>,
    ) -> LevelChunk {
        let stress = self.stress.estimate(snapshot);
        let multiplier = snapshot
            .map(|snapshot| snapshot.multipliers.obstacle_frequency)
            .filter(|value| value.is_finite())
            .unwrap_or(1.0);

        let chunk = match self.choose_strategy(stress) {
            ChunkStrategy::Recovery => self.recovery_chunk(start),
            ChunkStrategy::Challenge => self.challenge_chunk(start, multiplier),
            ChunkStrategy::Balanced => self.balanced_chunk(start, multiplier),
        };
        log::debug!(
            "{} chunk at {:.1} length {:.1} with {} elements (stress {:.2})",
            chunk.strategy().label(),
            chunk.start(),
            chunk.length(),
            chunk.elements().len(),
            stress
        );
        chunk
    }

    /// Consumes segment requests and publishes one event per generated chunk.
    pub fn handle(
        &mut self,
        events: &[Event],
        snapshot: Option<&DifficultySnapshot>,
        out: &mut Vec<Event>,
    ) {
        let mut chunks = Vec::new();
        for event in events {
            if let Event::SegmentRequested { start, length } = event {
                self.generate_segment(*start, *length, snapshot, &mut chunks);
            }
        }
        out.extend(chunks.into_iter().map(|chunk| Event::ChunkGenerated { chunk }));
    }

    fn choose_strategy(&mut self, stress: f32) -> ChunkStrategy {
        let tuning = &self.tuning;
        if stress > tuning.recovery_stress && self.rng.gen::<f32>() < tuning.recovery_probability
        {
            ChunkStrategy::Recovery
        } else if stress < tuning.challenge_stress
            && self.rng.gen::<f32>() < tuning.challenge_probability
        {
            ChunkStrategy::Challenge
        } else {
            ChunkStrategy::Balanced
        }
    }

    fn recovery_chunk(&mut self, start: f32) -> LevelChunk {
        let length = self.chunk_length(self.tuning.recovery_length);
        let mut chunk = LevelChunk::new(start, length, ChunkStrategy::Recovery);

        let count = self.tuning.recovery_boosters.sample(&mut self.rng);
        for index in 0..count {
            let Some(variant) = self.pick_variant(ElementKind::Booster) else {
                break;
            };
            let lateral = self.tuning.recovery_lateral.sample(&mut self.rng);
            let z = start + index as f32 * self.tuning.recovery_booster_gap;
            chunk.push(ChunkElement::new(
                ElementKind::Booster,
                variant,
                Vec3::new(lateral, self.tuning.booster_height, z),
            ));
        }
        chunk
    }

    fn challenge_chunk(&mut self, start: f32, multiplier: f32) -> LevelChunk {
        let length = self.chunk_length(self.tuning.challenge_length);
        let mut chunk = LevelChunk::new(start, length, ChunkStrategy::Challenge);
        let density = self.tuning.challenge_density * multiplier;

        let end = chunk.end();
        let mut cursor = start;
        while cursor < end {
            if self.rng.gen::<f32>() < density {
                if let Some(variant) = self.pick_variant(ElementKind::Obstacle) {
                    self.place_obstacle(&mut chunk, variant, cursor);
                }
            }
            let step = self.tuning.challenge_step.sample(&mut self.rng);
            let next = cursor + step.max(self.tuning.min_step);
            if next <= cursor {
                break;
            }
            cursor = next;
        }
        chunk
    }

    fn balanced_chunk(&mut self, start: f32, multiplier: f32) -> LevelChunk {
        let length = self.chunk_length(self.tuning.balanced_length);
        let mut chunk = LevelChunk::new(start, length, ChunkStrategy::Balanced);
        let base_spacing = lerp(
            self.tuning.max_obstacle_spacing,
            self.tuning.min_obstacle_spacing,
            multiplier,
        );

        let end = chunk.end();
        let mut cursor = start;
        while cursor < end {
            let spacing = base_spacing * self.tuning.spacing_jitter.sample(&mut self.rng);

            if self.rng.gen::<f32>() < self.tuning.obstacle_probability {
                if let Some(variant) = self.select_obstacle(cursor) {
                    self.place_obstacle(&mut chunk, variant, cursor);
                }
            }

            if self.rng.gen::<f32>() < self.tuning.booster_probability {
                if let Some(variant) = self.pick_variant(ElementKind::Booster) {
                    let lateral = self.tuning.lateral.sample(&mut self.rng);
                    chunk.push(ChunkElement::new(
                        ElementKind::Booster,
                        variant,
                        Vec3::new(
                            lateral,
                            self.tuning.booster_height,
                            cursor + self.tuning.booster_lead,
                        ),
                    ));
                }
            }

            // Far along the track a step can round away to nothing.
            let next = cursor + spacing.max(self.tuning.min_step);
            if next <= cursor {
                break;
            }
            cursor = next;
        }
        chunk
    }

    /// Picks the easiest obstacle right after another one, any obstacle otherwise.
    fn select_obstacle(&mut self, position: f32) -> Option<VariantId> {
        if self.catalog.obstacles == 0 {
            return None;
        }
        match self.recent_obstacles.back() {
            Some(last) if position - last.z < self.tuning.safe_obstacle_distance => {
                Some(VariantId::EASIEST)
            }
            _ => self.pick_variant(ElementKind::Obstacle),
        }
    }

    fn place_obstacle(&mut self, chunk: &mut LevelChunk, variant: VariantId, z: f32) {
        let lateral = self.tuning.lateral.sample(&mut self.rng);
        let position = Vec3::new(lateral, 0.0, z);
        chunk.push(ChunkElement::new(ElementKind::Obstacle, variant, position));

        if self.tuning.obstacle_history == 0 {
            return;
        }
        while self.recent_obstacles.len() >= self.tuning.obstacle_history {
            let _ = self.recent_obstacles.pop_front();
        }
        self.recent_obstacles.push_back(position);
    }

    fn pick_variant(&mut self, kind: ElementKind) -> Option<VariantId> {
        match self.catalog.variants(kind) {
            0 => None,
            count => Some(VariantId::new(self.rng.gen_range(0..count))),
        }
    }

    fn chunk_length(&mut self, range: SpanRange) -> f32 {
        let length = range.sample(&mut self.rng);
        if length.is_finite() {
            length.max(self.tuning.min_step)
        } else {
            self.tuning.min_step
        }
    }
}
