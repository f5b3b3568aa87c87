pub mod markets;
pub mod matrix;
pub mod predictor;
pub mod rates;
pub mod recommend;
pub mod value_bet;

pub use markets::{aggregate_markets, htft_breakdown, top_scorelines, Market, Outcome};
pub use matrix::{
    build_scoreline_matrix, poisson_pmf, ScorelineMatrix, TailMode, MAX_GOALS_LIMIT,
};
pub use predictor::{predict, PredictionSettings};
pub use rates::{compute_rates, RateMode, RateOptions, TeamRate};
pub use value_bet::{kelly_stake, select_value_bet, OddsBoard, RankingStrategy, ValueBet};
