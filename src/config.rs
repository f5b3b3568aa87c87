use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::engine::markets::DEFAULT_TOTAL_LINES;
use crate::engine::matrix::{TailMode, DEFAULT_MAX_GOALS, MAX_GOALS_LIMIT};
use crate::engine::rates::{RateMode, RateOptions};
use crate::engine::value_bet::{OddsBoard, RankingStrategy};
use crate::engine::PredictionSettings;
use crate::models::{HeadToHead, MatchInput, TeamStats};

/// Poisson scoreline predictor for football matches
#[derive(Parser, Debug, Clone)]
#[command(name = "scoreline-predictor", version, about)]
pub struct Config {
    /// Highest goal count modelled per side
    #[arg(long, env = "MAX_GOALS", default_value_t = DEFAULT_MAX_GOALS, global = true)]
    pub max_goals: u32,

    /// What happens to probability mass beyond --max-goals
    #[arg(long, env = "TAIL_MODE", value_enum, default_value_t = TailMode::Drop, global = true)]
    pub tail_mode: TailMode,

    /// How team averages are turned into expected goals
    #[arg(long, env = "RATE_MODE", value_enum, default_value_t = RateMode::Baseline, global = true)]
    pub rate_mode: RateMode,

    /// Blend strength of the head-to-head record (0.0–1.0)
    #[arg(long, env = "H2H_WEIGHT", default_value = "0.5", global = true)]
    pub h2h_weight: f64,

    /// Which profitable quote is reported as the value bet
    #[arg(
        long,
        env = "VALUE_RANKING",
        value_enum,
        default_value_t = RankingStrategy::Probability,
        global = true
    )]
    pub ranking: RankingStrategy,

    /// Number of most likely scorelines to list
    #[arg(long, env = "TOP_N", default_value = "9", global = true)]
    pub top_n: usize,

    /// Fractional Kelly multiplier for stake suggestions (0.0–1.0)
    #[arg(long, env = "KELLY_FRACTION", default_value = "0.25", global = true)]
    pub kelly_fraction: f64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Predict a single match and print the report
    Predict(PredictArgs),
    /// Serve the prediction form and JSON API over HTTP
    Serve {
        /// Listen address
        #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Read the whole match (stats, head-to-head, odds) from a JSON file
    #[arg(long, conflicts_with_all = ["home_scored", "home_conceded", "away_scored", "away_conceded"])]
    pub input: Option<PathBuf>,

    #[arg(long, default_value = "Home")]
    pub home_team: String,

    #[arg(long, default_value = "Away")]
    pub away_team: String,

    /// Home team average goals scored at home
    #[arg(long, required_unless_present = "input")]
    pub home_scored: Option<f64>,

    /// Home team average goals conceded at home
    #[arg(long, required_unless_present = "input")]
    pub home_conceded: Option<f64>,

    /// Away team average goals scored away
    #[arg(long, required_unless_present = "input")]
    pub away_scored: Option<f64>,

    /// Away team average goals conceded away
    #[arg(long, required_unless_present = "input")]
    pub away_conceded: Option<f64>,

    /// Home team form percentage (0–100)
    #[arg(long)]
    pub home_form: Option<f64>,

    /// Away team form percentage (0–100)
    #[arg(long)]
    pub away_form: Option<f64>,

    #[arg(long, default_value = "0")]
    pub h2h_home_wins: u32,

    #[arg(long, default_value = "0")]
    pub h2h_draws: u32,

    #[arg(long, default_value = "0")]
    pub h2h_away_wins: u32,

    /// Bookmaker quote as LABEL=ODDS, e.g. "Home Win=2.5" or "O2.5=1.9" (repeatable)
    #[arg(long = "odds", value_name = "LABEL=ODDS")]
    pub odds: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_GOALS_LIMIT).contains(&self.max_goals) {
            anyhow::bail!("max_goals must be between 1 and {}", MAX_GOALS_LIMIT);
        }
        if !(0.0..=1.0).contains(&self.h2h_weight) {
            anyhow::bail!("h2h_weight must be between 0.0 and 1.0");
        }
        if !(0.0..=1.0).contains(&self.kelly_fraction) {
            anyhow::bail!("kelly_fraction must be between 0.0 and 1.0");
        }
        if self.top_n == 0 {
            anyhow::bail!("top_n must be at least 1");
        }
        Ok(())
    }

    pub fn settings(&self) -> PredictionSettings {
        PredictionSettings {
            max_goals: self.max_goals,
            tail_mode: self.tail_mode,
            rates: RateOptions {
                mode: self.rate_mode,
                h2h_weight: self.h2h_weight,
            },
            ranking: self.ranking,
            top_n: self.top_n,
            total_lines: DEFAULT_TOTAL_LINES.to_vec(),
            kelly_fraction: self.kelly_fraction,
        }
    }
}

impl PredictArgs {
    /// Assemble a [`MatchInput`] from the flags, or load it from `--input`.
    pub fn match_input(&self) -> anyhow::Result<MatchInput> {
        if let Some(path) = &self.input {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
            let mut input = MatchInput::from_json(&raw)?;
            for quote in &self.odds {
                input.odds.insert_quote(quote)?;
            }
            return Ok(input);
        }

        // clap enforces these when --input is absent
        let required = |v: Option<f64>, flag: &str| {
            v.ok_or_else(|| anyhow::anyhow!("--{} is required", flag))
        };

        let mut odds = OddsBoard::new();
        for quote in &self.odds {
            odds.insert_quote(quote)?;
        }
        let h2h = HeadToHead {
            home_wins: self.h2h_home_wins,
            draws: self.h2h_draws,
            away_wins: self.h2h_away_wins,
        };

        Ok(MatchInput {
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            home: TeamStats {
                avg_scored: required(self.home_scored, "home-scored")?,
                avg_conceded: required(self.home_conceded, "home-conceded")?,
                form_pct: self.home_form,
            },
            away: TeamStats {
                avg_scored: required(self.away_scored, "away-scored")?,
                avg_conceded: required(self.away_conceded, "away-conceded")?,
                form_pct: self.away_form,
            },
            head_to_head: (h2h.total() > 0).then_some(h2h),
            odds,
        })
    }
}
