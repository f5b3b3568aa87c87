//! Value-bet selection and stake sizing.
//!
//! A quote is a value bet when the model probability times the decimal odds
//! exceeds 1, i.e. the bookmaker pays more than the model thinks the outcome
//! is worth:
//!
//!   EV = p × odds,   value ⇔ EV > 1
//!
//! Which surviving quote gets picked is a [`RankingStrategy`]. The default
//! picks the *most likely* profitable outcome rather than the one with the
//! largest EV.

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::markets::Market;
use crate::error::{EngineError, Result};

/// Overround above which a 1X2 book is flagged as carrying a heavy margin.
pub const HEAVY_MARGIN_OVERROUND: f64 = 1.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RankingStrategy {
    /// Highest model probability among quotes with EV > 1.
    #[default]
    Probability,
    /// Highest EV among quotes with EV > 1.
    ExpectedValue,
    /// Highest model probability among all quoted labels, EV ignored.
    RawProbability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBet {
    pub label: String,
    pub probability: f64,
    pub odds: f64,
    pub expected_value: f64,
}

impl ValueBet {
    pub fn is_value(&self) -> bool {
        self.expected_value > 1.0
    }

    /// `EV − 1`: expected profit per unit staked.
    pub fn edge(&self) -> f64 {
        self.expected_value - 1.0
    }
}

// ── Odds board ───────────────────────────────────────────────────────────────

/// Bookmaker decimal odds keyed by canonical market label.
///
/// Labels are normalised through [`Market`] on insert so that `"o2.5"` and
/// `"Over 2.5"` address the same quote; odds must be finite and > 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct OddsBoard {
    quotes: BTreeMap<String, f64>,
}

impl OddsBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: &str, odds: f64) -> Result<()> {
        let market: Market = label.parse()?;
        if !odds.is_finite() || odds <= 1.0 {
            return Err(EngineError::invalid(format!(
                "odds for '{market}' must be a decimal price above 1.0, got {odds}"
            )));
        }
        self.quotes.insert(market.to_string(), odds);
        Ok(())
    }

    /// Parse a `LABEL=ODDS` quote, e.g. `"Home Win=2.5"` or `"O2.5=1.9"`.
    pub fn insert_quote(&mut self, quote: &str) -> Result<()> {
        let (label, odds) = quote
            .rsplit_once('=')
            .ok_or_else(|| EngineError::invalid(format!("expected LABEL=ODDS, got '{quote}'")))?;
        let odds: f64 = odds
            .trim()
            .parse()
            .map_err(|_| EngineError::invalid(format!("odds '{}' is not a number", odds.trim())))?;
        self.insert(label, odds)
    }

    pub fn get(&self, market: &Market) -> Option<f64> {
        self.quotes.get(&market.to_string()).copied()
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.quotes
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Σ 1/odds over the three 1X2 quotes, when all three are present.
    pub fn result_overround(&self) -> Option<f64> {
        let legs = [Market::HomeWin, Market::Draw, Market::AwayWin]
            .iter()
            .map(|m| self.get(m))
            .collect::<Option<Vec<f64>>>()?;
        Some(overround(&legs))
    }
}

impl TryFrom<BTreeMap<String, f64>> for OddsBoard {
    type Error = EngineError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self> {
        let mut board = OddsBoard::new();
        for (label, odds) in raw {
            board.insert(&label, odds)?;
        }
        Ok(board)
    }
}

impl From<OddsBoard> for BTreeMap<String, f64> {
    fn from(board: OddsBoard) -> Self {
        board.quotes
    }
}

// ── Pricing helpers ──────────────────────────────────────────────────────────

/// Probability implied by a decimal price, `1 / odds`.
pub fn implied_probability(odds: f64) -> f64 {
    if odds <= 0.0 {
        return 0.0;
    }
    1.0 / odds
}

/// Sum of implied probabilities across a complete book. Above 1 is the
/// bookmaker's margin; below 1 means the book can be arbitraged.
pub fn overround(odds: &[f64]) -> f64 {
    odds.iter().map(|&o| implied_probability(o)).sum()
}

/// Log and return the 1X2 overround of a board, if the book is complete.
pub fn check_result_book(board: &OddsBoard) -> Option<f64> {
    let book = board.result_overround()?;
    if book < 1.0 {
        warn!("1X2 book overround {:.3} < 1.0: quotes imply an arbitrage, check the odds", book);
    } else if book > HEAVY_MARGIN_OVERROUND {
        warn!("1X2 book overround {:.3} carries a heavy bookmaker margin", book);
    } else {
        debug!("1X2 book overround {:.3}", book);
    }
    Some(book)
}

/// Fractional Kelly stake for a decimal-odds bet.
///
///   b  = odds − 1   (net profit per unit staked)
///   f* = (b·p − q) / b,  q = 1 − p
///
/// Returns the fraction of bankroll to stake, `f* × kelly_fraction` clamped
/// to `[0, 1]`, and `0.0` when there is no edge or the price is invalid.
pub fn kelly_stake(win_prob: f64, odds: f64, kelly_fraction: f64) -> f64 {
    if !odds.is_finite() || odds <= 1.0 {
        return 0.0;
    }
    let b = odds - 1.0;
    let p = win_prob;
    let q = 1.0 - p;

    let f = (b * p - q) / b;
    if f <= 0.0 {
        return 0.0;
    }
    (f * kelly_fraction).clamp(0.0, 1.0)
}

// ── Selection ────────────────────────────────────────────────────────────────

/// Pick a bet from the labels present in both maps.
///
/// Labels without a quote are skipped, as are quotes at or below 1.0. Ties
/// keep the label that sorts first. Returns `None` when nothing qualifies.
pub fn select_value_bet(
    model_probs: &BTreeMap<String, f64>,
    odds: &BTreeMap<String, f64>,
    strategy: RankingStrategy,
) -> Option<ValueBet> {
    let mut best: Option<ValueBet> = None;

    for (label, &probability) in model_probs {
        let Some(&price) = odds.get(label) else {
            continue;
        };
        if !price.is_finite() || price <= 1.0 {
            warn!("Skipping '{}': odds {} are not a valid decimal price", label, price);
            continue;
        }
        let candidate = ValueBet {
            label: label.clone(),
            probability,
            odds: price,
            expected_value: probability * price,
        };
        if strategy != RankingStrategy::RawProbability && !candidate.is_value() {
            continue;
        }

        let better = match &best {
            None => true,
            Some(current) => match strategy {
                RankingStrategy::Probability | RankingStrategy::RawProbability => {
                    candidate.probability > current.probability
                }
                RankingStrategy::ExpectedValue => candidate.expected_value > current.expected_value,
            },
        };
        if better {
            best = Some(candidate);
        }
    }

    match &best {
        Some(bet) => debug!(
            label = %bet.label,
            probability = bet.probability,
            odds = bet.odds,
            ev = bet.expected_value,
            "selected bet"
        ),
        None => debug!(?strategy, "no value bet found"),
    }
    best
}
