//! Summaries printed by the command line front-end.

use std::fmt::{self, Display, Formatter};

use adaptive_runner_core::{DifficultyMultipliers, LevelChunk};
use adaptive_runner_system_analytics::Recommendations;
use serde::Serialize;

/// Difficulty change heard by the simulation observer.
#[derive(Clone, Copy, Debug, Serialize)]
pub(crate) struct Adjustment {
    pub(crate) at_secs: f64,
    pub(crate) multipliers: DifficultyMultipliers,
}

/// Number of generated chunks per strategy.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub(crate) struct StrategyCounts {
    pub(crate) recovery: u32,
    pub(crate) challenge: u32,
    pub(crate) balanced: u32,
}

/// Difficulty state at the end of a run.
#[derive(Clone, Copy, Debug, Serialize)]
pub(crate) struct FinalState {
    pub(crate) skill_level: f32,
    pub(crate) stress: f32,
    pub(crate) current_streak: u32,
    pub(crate) average_reaction_time: f32,
    pub(crate) multipliers: DifficultyMultipliers,
}

/// Outcome of a headless simulation.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct SimulationReport {
    pub(crate) seed: u64,
    pub(crate) seconds: u32,
    pub(crate) distance: f32,
    pub(crate) score: u32,
    pub(crate) deaths: u32,
    pub(crate) successes: u32,
    pub(crate) obstacles_avoided: u32,
    pub(crate) pickups: u32,
    pub(crate) chunks: StrategyCounts,
    pub(crate) adjustments: Vec<Adjustment>,
    pub(crate) final_state: FinalState,
    pub(crate) patterns_recorded: usize,
    pub(crate) preferred_difficulty: &'static str,
    pub(crate) session_minutes: Option<f32>,
    pub(crate) recommendations: Recommendations,
}

impl Display for SimulationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "seed {} | {}s | distance {:.1} | score {}",
            self.seed, self.seconds, self.distance, self.score
        )?;
        writeln!(
            f,
            "deaths {} | successes {} | obstacles avoided {} | pickups {}",
            self.deaths, self.successes, self.obstacles_avoided, self.pickups
        )?;
        writeln!(
            f,
            "chunks: {} balanced, {} challenge, {} recovery ({} patterns kept)",
            self.chunks.balanced, self.chunks.challenge, self.chunks.recovery, self.patterns_recorded
        )?;
        writeln!(f, "adjustments:")?;
        for adjustment in &self.adjustments {
            writeln!(
                f,
                "  {:>7.1}s  {}",
                adjustment.at_secs,
                MultipliersDisplay(&adjustment.multipliers)
            )?;
        }
        let state = &self.final_state;
        writeln!(
            f,
            "final: skill {:.3} | stress {:.3} | streak {} | reaction {:.2}s | {}",
            state.skill_level,
            state.stress,
            state.current_streak,
            state.average_reaction_time,
            MultipliersDisplay(&state.multipliers)
        )?;
        let recommendations = &self.recommendations;
        write!(
            f,
            "player: prefers {} | theme {:?} | tempo {:?} | difficulty x{:.2}",
            self.preferred_difficulty,
            recommendations.theme,
            recommendations.tempo,
            recommendations.difficulty_multiplier
        )?;
        if !recommendations.power_ups.is_empty() {
            write!(f, " | power-ups {:?}", recommendations.power_ups)?;
        }
        if let Some(minutes) = self.session_minutes {
            write!(f, " | {minutes:.2} min")?;
        }
        writeln!(f)
    }
}

struct MultipliersDisplay<'a>(&'a DifficultyMultipliers);

impl Display for MultipliersDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "obstacles x{:.3}, enemy health x{:.3}, rewards x{:.3}",
            self.0.obstacle_frequency, self.0.enemy_health, self.0.reward_frequency
        )
    }
}

/// Renders generated chunks one placement per line.
pub(crate) fn render_chunks(chunks: &[LevelChunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&format!(
            "[{:>8.2}, {:>8.2}) {}\n",
            chunk.start(),
            chunk.end(),
            chunk.strategy().label()
        ));
        for element in chunk.elements() {
            let position = element.position();
            out.push_str(&format!(
                "    {:<9} #{} at ({:.2}, {:.2}, {:.2})\n",
                element.kind().label(),
                element.variant().get(),
                position.x,
                position.y,
                position.z
            ));
        }
    }
    out
}
