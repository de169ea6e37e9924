#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Behavioural analytics building a long-lived player profile.
//!
//! The analytics system classifies how the player plays from the actions the
//! host reports, keeps a history of play sessions, and derives personalised
//! recommendations for theme, difficulty, power-ups and interface scaling.

mod recommendations;

use adaptive_runner_core::lerp;
use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use recommendations::{MusicTempo, PowerUp, Recommendations, Theme, UiRecommendation};

/// Gameplay action reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// The player dodged an obstacle after `reaction_time` seconds.
    ObstacleAvoid {
        /// Reaction time measured in seconds.
        reaction_time: f32,
    },
    /// The player picked up a collectible.
    CollectiblePickup,
    /// The player fought an enemy.
    EnemyCombat {
        /// Whether the player won the encounter.
        success: bool,
    },
    /// The player used a speed boost.
    SpeedBoost,
}

impl PlayerAction {
    /// Whether the action counts as a success for the player.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        match self {
            Self::EnemyCombat { success } => *success,
            _ => true,
        }
    }

    /// Reaction time carried by the action, if any.
    #[must_use]
    pub fn reaction_time(&self) -> Option<f32> {
        match self {
            Self::ObstacleAvoid { reaction_time } => Some(*reaction_time),
            _ => None,
        }
    }
}

/// Action recorded during the current session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// What the player did.
    pub action: PlayerAction,
    /// Where the player was.
    pub position: Vec3,
    /// Seconds since the current session started.
    pub timestamp: f64,
}

/// Difficulty tier the player appears to prefer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyTier {
    /// Struggling or new players.
    Easy,
    /// Default tier.
    Medium,
    /// Consistently successful, experienced players.
    Hard,
}

impl DifficultyTier {
    /// Label used in logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// Relative interest in each kind of content, each within `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceWeights {
    /// Interest in speed.
    pub speed: f32,
    /// Interest in obstacles.
    pub obstacles: f32,
    /// Interest in collectibles.
    pub collectibles: f32,
    /// Interest in combat.
    pub combat: f32,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            speed: 0.5,
            obstacles: 0.5,
            collectibles: 0.5,
            combat: 0.5,
        }
    }
}

/// Persistent description of the player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    /// Playstyle from cautious (0) to aggressive (1).
    pub playstyle: f32,
    /// Accumulated skill progression, never negative.
    pub skill_progression: f32,
    /// Content preference weights.
    pub preferences: PreferenceWeights,
    /// Total play time across sessions in minutes.
    pub total_play_time_minutes: f32,
    /// Best score achieved.
    pub high_score: u32,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            playstyle: 0.5,
            skill_progression: 0.0,
            preferences: PreferenceWeights::default(),
            total_play_time_minutes: 0.0,
            high_score: 0,
        }
    }
}

impl PlayerProfile {
    /// Replaces non-finite or out-of-range fields with valid values.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let unit = |value: f32, fallback: f32| {
            if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                fallback
            }
        };
        let non_negative = |value: f32| if value.is_finite() { value.max(0.0) } else { 0.0 };
        let weights = defaults.preferences;
        Self {
            playstyle: unit(self.playstyle, defaults.playstyle),
            skill_progression: non_negative(self.skill_progression),
            preferences: PreferenceWeights {
                speed: unit(self.preferences.speed, weights.speed),
                obstacles: unit(self.preferences.obstacles, weights.obstacles),
                collectibles: unit(self.preferences.collectibles, weights.collectibles),
                combat: unit(self.preferences.combat, weights.combat),
            },
            total_play_time_minutes: non_negative(self.total_play_time_minutes),
            high_score: self.high_score,
        }
    }
}

/// Identifier assigned to a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a new session identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Summary of one play session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier.
    pub id: SessionId,
    /// Host clock reading in seconds when the session started.
    pub started_at: f64,
    /// Host clock reading in seconds when the session ended.
    pub ended_at: Option<f64>,
    /// Skill progression when the session started.
    pub initial_progression: f32,
    /// Skill progression when the session ended.
    pub final_progression: Option<f32>,
    /// Number of actions recorded during the session.
    pub actions_performed: u32,
}

impl SessionRecord {
    /// Session duration in minutes, `None` while the session is open.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<f32> {
        self.ended_at
            .map(|end| ((end - self.started_at).max(0.0) / 60.0) as f32)
    }
}

/// Thresholds and switches controlling the analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsTuning {
    /// Whether interface recommendations are produced.
    pub dynamic_ui: bool,
    /// Whether the host runs on a mobile platform.
    pub mobile_platform: bool,
    /// Reaction time in seconds below which an avoid counts as aggressive.
    pub fast_reaction_time: f32,
    /// Mean reaction time in seconds above which the interface is enlarged.
    pub slow_reaction_time: f32,
    /// Preference weight above which the matching power-up is recommended.
    pub power_up_threshold: f32,
    /// Number of trailing actions inspected for recent success.
    pub recent_actions: usize,
}

impl Default for AnalyticsTuning {
    fn default() -> Self {
        Self {
            dynamic_ui: true,
            mobile_platform: false,
            fast_reaction_time: 0.8,
            slow_reaction_time: 1.5,
            power_up_threshold: 0.6,
            recent_actions: 5,
        }
    }
}

/// Stateful player analytics.
#[derive(Clone, Debug)]
pub struct PlayerAnalytics {
    tuning: AnalyticsTuning,
    profile: PlayerProfile,
    preferred: DifficultyTier,
    sessions: Vec<SessionRecord>,
    actions: Vec<ActionRecord>,
    session_started_at: f64,
    next_session_id: u64,
}

impl Default for PlayerAnalytics {
    fn default() -> Self {
        Self::new(AnalyticsTuning::default())
    }
}

impl PlayerAnalytics {
    /// Creates analytics for a fresh player.
    #[must_use]
    pub fn new(tuning: AnalyticsTuning) -> Self {
        Self::with_profile(tuning, PlayerProfile::default())
    }

    /// Creates analytics continuing a persisted profile.
    #[must_use]
    pub fn with_profile(tuning: AnalyticsTuning, profile: PlayerProfile) -> Self {
        Self {
            tuning,
            profile: profile.sanitized(),
            preferred: DifficultyTier::Medium,
            sessions: Vec::new(),
            actions: Vec::new(),
            session_started_at: 0.0,
            next_session_id: 0,
        }
    }

    /// Current player profile.
    #[must_use]
    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    /// Replaces the profile, typically after loading it from storage.
    pub fn restore_profile(&mut self, profile: PlayerProfile) {
        self.profile = profile.sanitized();
    }

    /// Difficulty tier the player currently appears to prefer.
    #[must_use]
    pub fn preferred_difficulty(&self) -> DifficultyTier {
        self.preferred
    }

    /// Sessions recorded so far, oldest first.
    #[must_use]
    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    /// Actions recorded during the current session.
    #[must_use]
    pub fn current_actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    /// Opens a new session at host time `now` (seconds) and clears the action log.
    pub fn start_session(&mut self, now: f64) -> SessionId {
        let id = SessionId::new(self.next_session_id);
        self.next_session_id = self.next_session_id.wrapping_add(1);
        self.session_started_at = if now.is_finite() { now } else { 0.0 };
        self.actions.clear();
        self.sessions.push(SessionRecord {
            id,
            started_at: self.session_started_at,
            ended_at: None,
            initial_progression: self.profile.skill_progression,
            final_progression: None,
            actions_performed: 0,
        });
        log::debug!("analytics session {} started", id.get());
        id
    }

    /// Closes the most recent session at host time `now` and accrues play time.
    ///
    /// Returns `None` when there is no open session.
    pub fn end_session(&mut self, now: f64) -> Option<SessionRecord> {
        let session = self.sessions.last_mut()?;
        if session.ended_at.is_some() {
            return None;
        }
        let now = if now.is_finite() {
            now.max(session.started_at)
        } else {
            session.started_at
        };
        session.ended_at = Some(now);
        session.final_progression = Some(self.profile.skill_progression);
        session.actions_performed = u32::try_from(self.actions.len()).unwrap_or(u32::MAX);

        let record = *session;
        self.profile.total_play_time_minutes += record.duration_minutes().unwrap_or(0.0);
        log::info!(
            "analytics session {} ended after {} actions, progression {:.2}",
            record.id.get(),
            record.actions_performed,
            self.profile.skill_progression
        );
        Some(record)
    }

    /// Raises the high score when `score` beats it.
    pub fn submit_score(&mut self, score: u32) {
        self.profile.high_score = self.profile.high_score.max(score);
    }

    /// Records an action at host time `now` (seconds) and updates the profile.
    ///
    /// Actions carrying a non-finite reaction time are ignored.
    pub fn record_action(&mut self, action: PlayerAction, position: Vec3, now: f64) {
        if action.reaction_time().is_some_and(|time| !time.is_finite()) {
            log::warn!("ignoring action with non-finite reaction time: {action:?}");
            return;
        }

        let timestamp = if now.is_finite() {
            (now - self.session_started_at).max(0.0)
        } else {
            0.0
        };
        self.actions.push(ActionRecord {
            action,
            position,
            timestamp,
        });
        self.analyse(action);
        self.preferred = self.classify_tier();
    }

    fn analyse(&mut self, action: PlayerAction) {
        let profile = &mut self.profile;
        let weights = &mut profile.preferences;
        match action {
            PlayerAction::ObstacleAvoid { reaction_time } => {
                if reaction_time < self.tuning.fast_reaction_time {
                    profile.playstyle = lerp(profile.playstyle, 0.8, 0.1);
                    profile.skill_progression += 0.01;
                } else {
                    profile.playstyle = lerp(profile.playstyle, 0.3, 0.1);
                }
            }
            PlayerAction::CollectiblePickup => {
                weights.collectibles = (weights.collectibles + 0.05).min(1.0);
            }
            PlayerAction::EnemyCombat { success } => {
                weights.combat = (weights.combat + 0.03).min(1.0);
                if success {
                    profile.playstyle = lerp(profile.playstyle, 0.9, 0.15);
                    profile.skill_progression += 0.02;
                }
            }
            PlayerAction::SpeedBoost => {
                weights.speed = (weights.speed + 0.04).min(1.0);
                profile.playstyle = lerp(profile.playstyle, 0.7, 0.1);
            }
        }
    }

    fn classify_tier(&self) -> DifficultyTier {
        let ratio = success_ratio(&self.actions).unwrap_or(0.5);
        let progression = self.profile.skill_progression;
        if ratio > 0.8 && progression > 0.7 {
            DifficultyTier::Hard
        } else if ratio < 0.4 || progression < 0.3 {
            DifficultyTier::Easy
        } else {
            DifficultyTier::Medium
        }
    }

    /// Derives personalised recommendations from the current profile.
    #[must_use]
    pub fn recommendations(&self) -> Recommendations {
        let playstyle = self.profile.playstyle;
        let (theme, tempo) = if playstyle > 0.7 {
            (Theme::Action, MusicTempo::Fast)
        } else if playstyle < 0.3 {
            (Theme::Zen, MusicTempo::Slow)
        } else {
            (Theme::Adventure, MusicTempo::Medium)
        };

        Recommendations {
            theme,
            tempo,
            difficulty_multiplier: self.difficulty_multiplier(),
            power_ups: self.power_ups(),
            ui: self.tuning.dynamic_ui.then(|| UiRecommendation {
                ui_scale: self.ui_scale(),
                control_sensitivity: self.control_sensitivity(),
            }),
        }
    }

    fn difficulty_multiplier(&self) -> f32 {
        let mut multiplier = 0.8 + self.profile.skill_progression * 0.4;

        let window = self.tuning.recent_actions;
        if window > 0 && self.actions.len() > window {
            let recent = &self.actions[self.actions.len() - window..];
            match success_ratio(recent) {
                Some(ratio) if ratio > 0.8 => multiplier *= 1.2,
                Some(ratio) if ratio < 0.4 => multiplier *= 0.8,
                _ => {}
            }
        }

        if multiplier.is_finite() {
            multiplier.clamp(0.5, 2.0)
        } else {
            2.0
        }
    }

    fn power_ups(&self) -> Vec<PowerUp> {
        let weights = &self.profile.preferences;
        let threshold = self.tuning.power_up_threshold;
        let mut power_ups = Vec::new();
        if weights.speed > threshold {
            power_ups.push(PowerUp::SpeedBoost);
        }
        if weights.combat > threshold {
            power_ups.push(PowerUp::DamageBoost);
        }
        if weights.collectibles > threshold {
            power_ups.push(PowerUp::CoinMagnet);
        }
        if self.profile.playstyle < 0.4 {
            power_ups.push(PowerUp::Shield);
        }
        power_ups
    }

    fn ui_scale(&self) -> f32 {
        let mut scale = if self.tuning.mobile_platform { 1.2 } else { 1.0 };

        let reactions: Vec<f32> = self
            .actions
            .iter()
            .filter_map(|record| record.action.reaction_time())
            .filter(|time| *time > 0.0)
            .collect();
        if !reactions.is_empty() {
            let mean = reactions.iter().sum::<f32>() / reactions.len() as f32;
            if mean > self.tuning.slow_reaction_time {
                scale *= 1.15;
            }
        }
        scale
    }

    fn control_sensitivity(&self) -> f32 {
        match self.profile.playstyle {
            playstyle if playstyle > 0.7 => 1.3,
            playstyle if playstyle < 0.3 => 0.8,
            _ => 1.0,
        }
    }
}

fn success_ratio(actions: &[ActionRecord]) -> Option<f32> {
    if actions.is_empty() {
        return None;
    }
    let successes = actions
        .iter()
        .filter(|record| record.action.succeeded())
        .count();
    Some(successes as f32 / actions.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avoid(reaction_time: f32) -> PlayerAction {
        PlayerAction::ObstacleAvoid { reaction_time }
    }

    #[test]
    fn fast_avoids_make_playstyle_aggressive() {
        let mut analytics = PlayerAnalytics::default();
        analytics.record_action(avoid(0.5), Vec3::ZERO, 1.0);

        let profile = analytics.profile();
        assert!((profile.playstyle - 0.53).abs() < 1e-6);
        assert!((profile.skill_progression - 0.01).abs() < 1e-6);
    }

    #[test]
    fn slow_avoids_make_playstyle_cautious() {
        let mut analytics = PlayerAnalytics::default();
        analytics.record_action(avoid(1.2), Vec3::ZERO, 1.0);

        let profile = analytics.profile();
        assert!((profile.playstyle - 0.48).abs() < 1e-6);
        assert_eq!(profile.skill_progression, 0.0);
    }

    #[test]
    fn failed_combat_only_raises_combat_interest() {
        let mut analytics = PlayerAnalytics::default();
        analytics.record_action(PlayerAction::EnemyCombat { success: false }, Vec3::ZERO, 0.0);

        let profile = analytics.profile();
        assert!((profile.preferences.combat - 0.53).abs() < 1e-6);
        assert_eq!(profile.playstyle, 0.5);
        assert_eq!(analytics.preferred_difficulty(), DifficultyTier::Easy);
    }

    #[test]
    fn non_finite_reaction_is_ignored() {
        let mut analytics = PlayerAnalytics::default();
        analytics.record_action(avoid(f32::NAN), Vec3::ZERO, 0.0);
        assert!(analytics.current_actions().is_empty());
        assert_eq!(*analytics.profile(), PlayerProfile::default());
    }

    #[test]
    fn sanitized_profile_repairs_invalid_fields() {
        let profile = PlayerProfile {
            playstyle: f32::NAN,
            skill_progression: -2.0,
            preferences: PreferenceWeights {
                speed: 3.0,
                ..PreferenceWeights::default()
            },
            total_play_time_minutes: f32::INFINITY,
            high_score: 12,
        }
        .sanitized();

        assert_eq!(profile.playstyle, 0.5);
        assert_eq!(profile.skill_progression, 0.0);
        assert_eq!(profile.preferences.speed, 1.0);
        assert_eq!(profile.total_play_time_minutes, 0.0);
        assert_eq!(profile.high_score, 12);
    }

    #[test]
    fn timestamps_are_relative_to_session_start() {
        let mut analytics = PlayerAnalytics::default();
        let _ = analytics.start_session(100.0);
        analytics.record_action(PlayerAction::SpeedBoost, Vec3::new(0.0, 0.0, 12.0), 104.5);
        assert_eq!(analytics.current_actions()[0].timestamp, 4.5);
    }
}
