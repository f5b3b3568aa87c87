use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info};

use super::markets::{
    aggregate_markets, htft_breakdown, top_scorelines, Market, MarketSummary, DEFAULT_TOTAL_LINES,
};
use super::matrix::{build_scoreline_matrix, ScorelineMatrix, TailMode, DEFAULT_MAX_GOALS};
use super::rates::{compute_rates, RateOptions};
use super::recommend::recommend;
use super::value_bet::{check_result_book, kelly_stake, select_value_bet, RankingStrategy};
use crate::error::Result;
use crate::models::{LabeledProb, MatchInput, PredictionReport};

/// Engine knobs shared by every prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSettings {
    pub max_goals: u32,
    pub tail_mode: TailMode,
    pub rates: RateOptions,
    pub ranking: RankingStrategy,
    pub top_n: usize,
    /// Totals lines as the integer part of `X.5`
    pub total_lines: Vec<u32>,
    pub kelly_fraction: f64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            max_goals: DEFAULT_MAX_GOALS,
            tail_mode: TailMode::Drop,
            rates: RateOptions::default(),
            ranking: RankingStrategy::Probability,
            top_n: 9,
            total_lines: DEFAULT_TOTAL_LINES.to_vec(),
            kelly_fraction: 0.25,
        }
    }
}

/// Run one prediction end to end: rates → grids → markets → picks.
///
/// Pure apart from the report timestamp; nothing is shared between calls.
pub fn predict(input: &MatchInput, settings: &PredictionSettings) -> Result<PredictionReport> {
    let (home_rate, away_rate) = compute_rates(
        &input.home,
        &input.away,
        input.head_to_head.as_ref(),
        &settings.rates,
    )?;
    let (ht_home, ht_away) = (home_rate.halved(), away_rate.halved());

    let ft = build_scoreline_matrix(home_rate, away_rate, settings.max_goals, settings.tail_mode)?;
    let ht = build_scoreline_matrix(ht_home, ht_away, settings.max_goals, settings.tail_mode)?;

    let markets = aggregate_markets(&ft, &settings.total_lines);
    let htft = htft_breakdown(&ht, &ft);
    let top = top_scorelines(&ft, settings.top_n);

    let mut model_probabilities = market_board(&markets, &ft);
    for (market, p) in htft.entries() {
        model_probabilities.insert(market.to_string(), p);
    }

    let result_overround = check_result_book(&input.odds);
    let value_bet = select_value_bet(&model_probabilities, input.odds.as_map(), settings.ranking);
    let stake = value_bet
        .as_ref()
        .map(|b| kelly_stake(b.probability, b.odds, settings.kelly_fraction));

    debug!(
        total = ft.total(),
        tail = ft.tail_mass(),
        "full-time grid {}x{}",
        ft.max_home() + 1,
        ft.max_away() + 1
    );
    match &value_bet {
        Some(bet) => info!(
            "{} vs {}: value bet {} @ {:.2} (p={:.3}, EV={:.3})",
            input.home_team, input.away_team, bet.label, bet.odds, bet.probability, bet.expected_value
        ),
        None if !input.odds.is_empty() => {
            info!("{} vs {}: no value bet found", input.home_team, input.away_team)
        }
        None => {}
    }

    Ok(PredictionReport {
        generated_at: Utc::now(),
        home_team: input.home_team.clone(),
        away_team: input.away_team.clone(),
        home_rate: home_rate.value(),
        away_rate: away_rate.value(),
        ht_home_rate: ht_home.value(),
        ht_away_rate: ht_away.value(),
        max_goals: settings.max_goals,
        tail_mode: settings.tail_mode,
        matrix: ft.rows(),
        tail_mass: ft.tail_mass(),
        recommendations: recommend(&markets),
        markets,
        htft: htft
            .entries()
            .into_iter()
            .map(|(m, p)| LabeledProb {
                label: m.to_string(),
                probability: p,
            })
            .collect(),
        top_scorelines: top,
        model_probabilities,
        ranking: settings.ranking,
        value_bet,
        kelly_stake: stake,
        result_overround,
    })
}

/// Flatten the full-time markets and exact scores into `label → p`.
///
/// 1X2 uses the normalised split. Absorbed tail buckets are left out of
/// the exact scores: `"3+-0"` is not the scoreline a `"3-0"` quote prices.
fn market_board(markets: &MarketSummary, ft: &ScorelineMatrix) -> BTreeMap<String, f64> {
    let mut board = BTreeMap::new();
    let r = &markets.result_normalized;
    board.insert(Market::HomeWin.to_string(), r.home);
    board.insert(Market::Draw.to_string(), r.draw);
    board.insert(Market::AwayWin.to_string(), r.away);
    for t in &markets.totals {
        board.insert(Market::Over(t.line).to_string(), t.over);
        board.insert(Market::Under(t.line).to_string(), t.under);
    }
    board.insert(Market::BttsYes.to_string(), markets.btts.yes);
    board.insert(Market::BttsNo.to_string(), markets.btts.no);

    let absorbed = ft.tail_mode() == TailMode::Absorb;
    for (i, j, p) in ft.cells() {
        if absorbed && (i == ft.max_home() || j == ft.max_away()) {
            continue;
        }
        board.insert(Market::CorrectScore(i, j).to_string(), p);
    }
    board
}
