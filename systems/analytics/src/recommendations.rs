use serde::{Deserialize, Serialize};

/// Visual theme suggested for the player's playstyle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    /// High-energy theme for aggressive players.
    Action,
    /// Calm theme for cautious players.
    Zen,
    /// Default theme.
    Adventure,
}

/// Music tempo paired with the suggested theme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicTempo {
    /// Paired with [`Theme::Action`].
    Fast,
    /// Paired with [`Theme::Zen`].
    Slow,
    /// Paired with [`Theme::Adventure`].
    Medium,
}

/// Power-up the player is likely to enjoy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUp {
    /// Favoured by players who chase speed.
    SpeedBoost,
    /// Favoured by players who seek combat.
    DamageBoost,
    /// Favoured by collectors.
    CoinMagnet,
    /// Offered to cautious players.
    Shield,
}

/// Interface adjustments derived from observed behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiRecommendation {
    /// Scale factor for interface elements.
    pub ui_scale: f32,
    /// Input sensitivity factor.
    pub control_sensitivity: f32,
}

/// Personalised suggestions for the next stretch of play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// Suggested theme.
    pub theme: Theme,
    /// Suggested music tempo.
    pub tempo: MusicTempo,
    /// Suggested overall difficulty factor, within `[0.5, 2.0]`.
    pub difficulty_multiplier: f32,
    /// Power-ups to favour, in priority order.
    pub power_ups: Vec<PowerUp>,
    /// Interface adjustments, present when dynamic UI is enabled.
    pub ui: Option<UiRecommendation>,
}
