//! Scoreline probability grid.
//!
//! Cell `(i, j)` holds `P(home scores i) × P(away scores j)` with both goal
//! counts drawn from independent Poisson distributions. The grid is bounded
//! at `max_goals` per side, so what happens to the tail beyond it depends on
//! the [`TailMode`]:
//!
//! - `Drop` keeps the plain PMF values and the grid sums to slightly less
//!   than 1. The missing mass is the truncation under-count.
//! - `Absorb` folds `P(k ≥ max_goals)` into the last bucket, which is then
//!   reported as `"max+"`. With `max_goals = 3` this is the "0, 1, 2, 3+"
//!   layout; the grid sums to 1 up to float rounding.
//!
//! Downstream markets treat the last bucket as exactly `max_goals` goals in
//! either mode.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::rates::TeamRate;
use crate::error::{EngineError, Result};

/// Default per-side goal cap.
pub const DEFAULT_MAX_GOALS: u32 = 5;

/// Largest per-side goal cap a grid may be built with.
pub const MAX_GOALS_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TailMode {
    /// Mass beyond the cap is discarded.
    #[default]
    Drop,
    /// Mass beyond the cap lands in the last bucket.
    Absorb,
}

/// Immutable `(max_home + 1) × (max_away + 1)` grid, row-major by home goals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorelineMatrix {
    max_home: u32,
    max_away: u32,
    tail: TailMode,
    cells: Vec<f64>,
}

/// `P(X = k)` for `X ~ Poisson(lambda)`. `lambda = 0` gives a point mass at 0.
pub fn poisson_pmf(k: u32, lambda: f64) -> f64 {
    let mut p = (-lambda).exp();
    for i in 1..=k {
        p *= lambda / i as f64;
    }
    p
}

/// PMF values for `0..=max_k`, optionally folding the tail into the last slot.
fn pmf_vector(lambda: f64, max_k: u32, tail: TailMode) -> Vec<f64> {
    let mut out = Vec::with_capacity(max_k as usize + 1);
    let mut p = (-lambda).exp();
    out.push(p);
    for k in 1..=max_k {
        p *= lambda / k as f64;
        out.push(p);
    }
    if tail == TailMode::Absorb {
        let head: f64 = out[..max_k as usize].iter().sum();
        out[max_k as usize] = (1.0 - head).max(0.0);
    }
    out
}

/// Square grid with the same cap on both sides.
pub fn build_scoreline_matrix(
    home: TeamRate,
    away: TeamRate,
    max_goals: u32,
    tail: TailMode,
) -> Result<ScorelineMatrix> {
    ScorelineMatrix::with_bounds(home, away, max_goals, max_goals, tail)
}

impl ScorelineMatrix {
    /// Rectangular grid with independent caps per side.
    pub fn with_bounds(
        home: TeamRate,
        away: TeamRate,
        max_home: u32,
        max_away: u32,
        tail: TailMode,
    ) -> Result<Self> {
        if max_home == 0 || max_away == 0 {
            return Err(EngineError::invalid(format!(
                "max goals must be at least 1, got {max_home}x{max_away}"
            )));
        }
        if max_home > MAX_GOALS_LIMIT || max_away > MAX_GOALS_LIMIT {
            return Err(EngineError::invalid(format!(
                "max goals must be at most {MAX_GOALS_LIMIT}, got {max_home}x{max_away}"
            )));
        }
        let ph = pmf_vector(home.value(), max_home, tail);
        let pa = pmf_vector(away.value(), max_away, tail);

        let mut cells = Vec::with_capacity(ph.len() * pa.len());
        for p_i in &ph {
            for p_j in &pa {
                cells.push(p_i * p_j);
            }
        }

        Ok(ScorelineMatrix {
            max_home,
            max_away,
            tail,
            cells,
        })
    }

    pub fn max_home(&self) -> u32 {
        self.max_home
    }

    pub fn max_away(&self) -> u32 {
        self.max_away
    }

    pub fn tail_mode(&self) -> TailMode {
        self.tail
    }

    /// Probability of the `(home, away)` scoreline, 0 outside the grid.
    pub fn get(&self, home: u32, away: u32) -> f64 {
        if home > self.max_home || away > self.max_away {
            return 0.0;
        }
        self.cells[(home * (self.max_away + 1) + away) as usize]
    }

    /// Iterate `(home, away, probability)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        let width = self.max_away + 1;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, p)| (idx as u32 / width, idx as u32 % width, *p))
    }

    /// Row-per-home-goal view, handy for serialization and printing.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.cells
            .chunks((self.max_away + 1) as usize)
            .map(|r| r.to_vec())
            .collect()
    }

    /// Sum of all cells. `<= 1`; equal to 1 (within rounding) in `Absorb` mode.
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    /// Probability mass lost to truncation.
    pub fn tail_mass(&self) -> f64 {
        (1.0 - self.total()).max(0.0)
    }

    /// Display label for a goal count: the last bucket reads `"N+"` when it
    /// absorbs the tail.
    pub fn goal_label(&self, goals: u32, cap: u32) -> String {
        if self.tail == TailMode::Absorb && goals == cap {
            format!("{goals}+")
        } else {
            goals.to_string()
        }
    }

    /// `"H-A"` label for a scoreline, using `N+` for absorbed buckets.
    pub fn scoreline_label(&self, home: u32, away: u32) -> String {
        format!(
            "{}-{}",
            self.goal_label(home, self.max_home),
            self.goal_label(away, self.max_away)
        )
    }
}
