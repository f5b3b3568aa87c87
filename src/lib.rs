//! Poisson scoreline model for football matches.
//!
//! Team scoring averages become expected-goals rates, the rates become a
//! grid of scoreline probabilities, and the grid is summed into 1X2,
//! totals, BTTS and HT/FT markets. Supplied bookmaker odds are then scanned
//! for value bets.

pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod models;
pub mod report;

pub use engine::{predict, PredictionSettings};
pub use error::EngineError;
pub use models::{HeadToHead, MatchInput, PredictionReport, TeamStats};
