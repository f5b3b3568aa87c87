use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::markets::{MarketSummary, ScorelineProb};
use crate::engine::matrix::TailMode;
use crate::engine::recommend::Recommendations;
use crate::engine::value_bet::{OddsBoard, RankingStrategy, ValueBet};
use crate::error::EngineError;

/// One side's scoring record in the relevant context (home games for the
/// home team, away games for the away team).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    /// Average goals scored per match
    pub avg_scored: f64,
    /// Average goals conceded per match
    pub avg_conceded: f64,
    /// Recent form, 0–100
    #[serde(default)]
    pub form_pct: Option<f64>,
}

/// Past meetings between the two sides, counted from the home team's view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub home_wins: u32,
    pub draws: u32,
    pub away_wins: u32,
}

impl HeadToHead {
    /// Number of meetings. Summed in `u64` so three `u32::MAX` counts cannot wrap.
    pub fn total(&self) -> u64 {
        u64::from(self.home_wins) + u64::from(self.draws) + u64::from(self.away_wins)
    }
}

/// Everything the caller supplies for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInput {
    #[serde(default = "default_home_name")]
    pub home_team: String,
    #[serde(default = "default_away_name")]
    pub away_team: String,
    pub home: TeamStats,
    pub away: TeamStats,
    #[serde(default)]
    pub head_to_head: Option<HeadToHead>,
    /// Decimal odds keyed by market label
    #[serde(default)]
    pub odds: OddsBoard,
}

impl MatchInput {
    /// Parse a match from JSON; odds are validated while deserialising.
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(raw)?)
    }
}

fn default_home_name() -> String {
    "Home".to_string()
}

fn default_away_name() -> String {
    "Away".to_string()
}

/// A labelled probability, used where a plain map would lose ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledProb {
    pub label: String,
    pub probability: f64,
}

/// Full output of one prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub generated_at: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    /// Full-time expected goals
    pub home_rate: f64,
    pub away_rate: f64,
    /// First-half expected goals (half the full-time rate)
    pub ht_home_rate: f64,
    pub ht_away_rate: f64,
    pub max_goals: u32,
    pub tail_mode: TailMode,
    /// Full-time grid, one row per home goal count
    pub matrix: Vec<Vec<f64>>,
    /// Probability mass discarded by the goal cap
    pub tail_mass: f64,
    pub markets: MarketSummary,
    pub htft: Vec<LabeledProb>,
    pub top_scorelines: Vec<ScorelineProb>,
    /// Every priced label the value-bet selector can see
    pub model_probabilities: BTreeMap<String, f64>,
    pub recommendations: Recommendations,
    pub ranking: RankingStrategy,
    pub value_bet: Option<ValueBet>,
    /// Suggested fraction of bankroll for `value_bet`
    pub kelly_stake: Option<f64>,
    /// Σ 1/odds over a complete 1X2 book
    pub result_overround: Option<f64>,
}
