#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded history of the shapes of generated chunks.

use std::collections::VecDeque;

use adaptive_runner_core::{Event, LevelChunk, LevelPattern, PatternId};

/// Number of patterns retained when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Records a [`LevelPattern`] for every chunk it sees, oldest evicted first.
#[derive(Clone, Debug)]
pub struct PatternRecorder {
    capacity: usize,
    next_id: u64,
    history: VecDeque<LevelPattern>,
}

impl Default for PatternRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PatternRecorder {
    /// Creates a recorder retaining at most `capacity` patterns.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_id: 0,
            history: VecDeque::with_capacity(capacity),
        }
    }

    /// Maximum number of patterns retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Summarises `chunk` and appends the pattern to the history.
    pub fn record(&mut self, chunk: &LevelChunk) -> LevelPattern {
        let pattern = LevelPattern {
            id: self.allocate_id(),
            element_count: u32::try_from(chunk.elements().len()).unwrap_or(u32::MAX),
            average_spacing: average_spacing(chunk),
        };

        while self.history.len() >= self.capacity {
            let _ = self.history.pop_front();
        }
        self.history.push_back(pattern);
        log::trace!(
            "recorded pattern {} with {} elements",
            pattern.id.get(),
            pattern.element_count
        );
        pattern
    }

    /// Records every chunk published in the event batch.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            if let Event::ChunkGenerated { chunk } = event {
                let _ = self.record(chunk);
            }
        }
    }

    /// Retained patterns, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &LevelPattern> + '_ {
        self.history.iter()
    }

    /// Most recently recorded pattern.
    #[must_use]
    pub fn latest(&self) -> Option<&LevelPattern> {
        self.history.back()
    }

    fn allocate_id(&mut self) -> PatternId {
        let id = PatternId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}

/// Mean longitudinal gap between consecutive elements, zero below two elements.
#[must_use]
pub fn average_spacing(chunk: &LevelChunk) -> f32 {
    let elements = chunk.elements();
    if elements.len() < 2 {
        return 0.0;
    }
    let total: f32 = elements
        .windows(2)
        .map(|pair| (pair[1].longitudinal() - pair[0].longitudinal()).abs())
        .sum();
    total / (elements.len() - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_runner_core::{ChunkElement, ChunkStrategy, ElementKind, VariantId};
    use glam::Vec3;

    fn chunk_at(positions: &[f32]) -> LevelChunk {
        let mut chunk = LevelChunk::new(0.0, 30.0, ChunkStrategy::Balanced);
        for &z in positions {
            chunk.push(ChunkElement::new(
                ElementKind::Obstacle,
                VariantId::EASIEST,
                Vec3::new(1.0, 0.0, z),
            ));
        }
        chunk
    }

    #[test]
    fn spacing_averages_longitudinal_gaps() {
        assert_eq!(average_spacing(&chunk_at(&[])), 0.0);
        assert_eq!(average_spacing(&chunk_at(&[4.0])), 0.0);
        assert!((average_spacing(&chunk_at(&[0.0, 4.0, 12.0])) - 6.0).abs() < 1e-6);
        // Boosters may lead the next obstacle, so gaps are absolute.
        assert!((average_spacing(&chunk_at(&[0.0, 2.0, 1.0])) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut recorder = PatternRecorder::default();
        let first = recorder.record(&chunk_at(&[1.0]));
        let second = recorder.record(&chunk_at(&[1.0, 2.0]));
        assert!(second.id > first.id);
        assert_eq!(second.element_count, 2);
        assert_eq!(recorder.latest(), Some(&second));
    }

    #[test]
    fn zero_capacity_keeps_latest_pattern() {
        let mut recorder = PatternRecorder::new(0);
        let _ = recorder.record(&chunk_at(&[]));
        let latest = recorder.record(&chunk_at(&[3.0]));
        assert_eq!(recorder.capacity(), 1);
        assert_eq!(recorder.history().collect::<Vec<_>>(), vec![&latest]);
    }
}
