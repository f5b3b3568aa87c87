//! Aggregate markets derived from a [`ScorelineMatrix`].
//!
//! Every market is a sum over a region of the grid: triangles for 1X2, a
//! goal-sum threshold for totals, the `i ≥ 1 ∧ j ≥ 1` block for BTTS.
//! Complements are taken against the grid's own mass, so `over + under`
//! and `yes + no` always equal `matrix.total()` even when the tail is
//! truncated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::matrix::ScorelineMatrix;
use crate::error::{EngineError, Result};

/// Totals lines reported by default, as the integer part of `X.5`.
pub const DEFAULT_TOTAL_LINES: [u32; 3] = [1, 2, 3];

// ── Labels ───────────────────────────────────────────────────────────────────

/// Match result at a checkpoint (half-time or full-time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    /// "Leads" means strictly more goals; level is a draw.
    pub fn classify(home_goals: u32, away_goals: u32) -> Self {
        if home_goals > away_goals {
            Outcome::Home
        } else if home_goals < away_goals {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Outcome::Home => '1',
            Outcome::Draw => 'X',
            Outcome::Away => '2',
        }
    }

    fn index(self) -> usize {
        match self {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 2,
        }
    }

    fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Outcome::Home),
            "x" => Some(Outcome::Draw),
            "2" => Some(Outcome::Away),
            _ => None,
        }
    }
}

/// A bettable market or exact scoreline.
///
/// `Display` yields the canonical label (`"Over 2.5"`, `"BTTS Yes"`,
/// `"1/X"`, `"2-1"`); `FromStr` accepts that label case-insensitively plus
/// the usual shorthands (`1`, `X`, `2`, `O2.5`, `U2.5`, `GG`, `NG`, `2:1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Market {
    HomeWin,
    Draw,
    AwayWin,
    /// Over `line`.5 goals.
    Over(u32),
    /// Under `line`.5 goals.
    Under(u32),
    BttsYes,
    BttsNo,
    HtFt(Outcome, Outcome),
    CorrectScore(u32, u32),
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::HomeWin => write!(f, "Home Win"),
            Market::Draw => write!(f, "Draw"),
            Market::AwayWin => write!(f, "Away Win"),
            Market::Over(line) => write!(f, "Over {line}.5"),
            Market::Under(line) => write!(f, "Under {line}.5"),
            Market::BttsYes => write!(f, "BTTS Yes"),
            Market::BttsNo => write!(f, "BTTS No"),
            Market::HtFt(ht, ft) => write!(f, "{}/{}", ht.symbol(), ft.symbol()),
            Market::CorrectScore(h, a) => write!(f, "{h}-{a}"),
        }
    }
}

impl FromStr for Market {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self> {
        let s = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        let unknown = || EngineError::invalid(format!("unknown market label '{}'", raw.trim()));

        if let Some((ht, ft)) = s.split_once('/') {
            let ht = Outcome::from_symbol(ht.trim()).ok_or_else(unknown)?;
            let ft = Outcome::from_symbol(ft.trim()).ok_or_else(unknown)?;
            return Ok(Market::HtFt(ht, ft));
        }
        if let Some((h, a)) = s.split_once('-').or_else(|| s.split_once(':')) {
            let h = h.trim().parse::<u32>().map_err(|_| unknown())?;
            let a = a.trim().parse::<u32>().map_err(|_| unknown())?;
            return Ok(Market::CorrectScore(h, a));
        }

        let market = match s.as_str() {
            "home win" | "home" | "1" => Market::HomeWin,
            "draw" | "x" => Market::Draw,
            "away win" | "away" | "2" => Market::AwayWin,
            "btts yes" | "gg" => Market::BttsYes,
            "btts no" | "ng" => Market::BttsNo,
            other => {
                if let Some(rest) = other.strip_prefix("over").or_else(|| other.strip_prefix('o')) {
                    Market::Over(parse_half_line(rest).ok_or_else(unknown)?)
                } else if let Some(rest) =
                    other.strip_prefix("under").or_else(|| other.strip_prefix('u'))
                {
                    Market::Under(parse_half_line(rest).ok_or_else(unknown)?)
                } else {
                    return Err(unknown());
                }
            }
        };
        Ok(market)
    }
}

/// `" 2.5"` → `2`. Only `.5` lines exist for totals.
fn parse_half_line(s: &str) -> Option<u32> {
    s.trim().strip_suffix(".5")?.parse().ok()
}

// ── 1X2 ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneXTwo {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OneXTwo {
    pub fn total(&self) -> f64 {
        self.home + self.draw + self.away
    }

    /// Rescale all three by their common sum so they add up to 1.
    pub fn normalized(&self) -> OneXTwo {
        let sum = self.total();
        if sum <= 0.0 {
            return *self;
        }
        OneXTwo {
            home: self.home / sum,
            draw: self.draw / sum,
            away: self.away / sum,
        }
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }
}

/// Home win below the diagonal, draw on it, away win above it.
pub fn one_x_two(matrix: &ScorelineMatrix) -> OneXTwo {
    let mut out = OneXTwo {
        home: 0.0,
        draw: 0.0,
        away: 0.0,
    };
    for (i, j, p) in matrix.cells() {
        match Outcome::classify(i, j) {
            Outcome::Home => out.home += p,
            Outcome::Draw => out.draw += p,
            Outcome::Away => out.away += p,
        }
    }
    out
}

// ── Totals / BTTS ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Integer part of the `X.5` line.
    pub line: u32,
    pub over: f64,
    pub under: f64,
}

/// Under `line`.5 is every cell with `i + j <= line`; over is the rest of
/// the grid's mass.
pub fn totals(matrix: &ScorelineMatrix, line: u32) -> Totals {
    let mut under = 0.0;
    let mut total = 0.0;
    for (i, j, p) in matrix.cells() {
        total += p;
        if i + j <= line {
            under += p;
        }
    }
    Totals {
        line,
        over: total - under,
        under,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Btts {
    pub yes: f64,
    pub no: f64,
}

pub fn btts(matrix: &ScorelineMatrix) -> Btts {
    let mut yes = 0.0;
    let mut total = 0.0;
    for (i, j, p) in matrix.cells() {
        total += p;
        if i >= 1 && j >= 1 {
            yes += p;
        }
    }
    Btts {
        yes,
        no: total - yes,
    }
}

// ── HT/FT ────────────────────────────────────────────────────────────────────

/// The nine half-time/full-time buckets, indexed `[ht][ft]` in 1, X, 2 order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HtFtBreakdown {
    buckets: [[f64; 3]; 3],
}

impl HtFtBreakdown {
    pub fn get(&self, ht: Outcome, ft: Outcome) -> f64 {
        self.buckets[ht.index()][ft.index()]
    }

    /// `(label, probability)` in 1/1, 1/X, 1/2, X/1, … order.
    pub fn entries(&self) -> Vec<(Market, f64)> {
        let mut out = Vec::with_capacity(9);
        for ht in Outcome::ALL {
            for ft in Outcome::ALL {
                out.push((Market::HtFt(ht, ft), self.get(ht, ft)));
            }
        }
        out
    }

    pub fn total(&self) -> f64 {
        self.buckets.iter().flatten().sum()
    }
}

/// Combine a half-time grid and a full-time grid treated as independent.
///
/// Every pair of cells `(ht(i,j), ft(k,l))` lands in the bucket named by who
/// leads at each checkpoint. Because the grids are independent the double
/// sum factorises into the product of the two 1X2 vectors.
pub fn htft_breakdown(ht: &ScorelineMatrix, ft: &ScorelineMatrix) -> HtFtBreakdown {
    let ht_1x2 = one_x_two(ht);
    let ft_1x2 = one_x_two(ft);
    let mut buckets = [[0.0; 3]; 3];
    for h in Outcome::ALL {
        for f in Outcome::ALL {
            buckets[h.index()][f.index()] = ht_1x2.get(h) * ft_1x2.get(f);
        }
    }
    HtFtBreakdown { buckets }
}

// ── Correct scores ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorelineProb {
    pub home: u32,
    pub away: u32,
    /// `"H-A"`, with `N+` for an absorbed tail bucket.
    pub label: String,
    pub probability: f64,
}

/// The `n` most likely scorelines. Ties go to fewer total goals, then fewer
/// home goals, so the order is reproducible.
pub fn top_scorelines(matrix: &ScorelineMatrix, n: usize) -> Vec<ScorelineProb> {
    let mut all: Vec<(u32, u32, f64)> = matrix.cells().collect();
    all.sort_by(|a, b| {
        b.2.total_cmp(&a.2)
            .then_with(|| (a.0 + a.1).cmp(&(b.0 + b.1)))
            .then_with(|| a.0.cmp(&b.0))
    });
    all.into_iter()
        .take(n)
        .map(|(home, away, probability)| ScorelineProb {
            home,
            away,
            label: matrix.scoreline_label(home, away),
            probability,
        })
        .collect()
}

// ── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    /// Raw triangle sums; add up to `matrix_total`.
    pub result: OneXTwo,
    /// `result` rescaled to sum to 1.
    pub result_normalized: OneXTwo,
    pub totals: Vec<Totals>,
    pub btts: Btts,
    pub matrix_total: f64,
}

impl MarketSummary {
    pub fn totals_for(&self, line: u32) -> Option<&Totals> {
        self.totals.iter().find(|t| t.line == line)
    }
}

/// 1X2, totals for each of `lines`, and BTTS from one grid.
pub fn aggregate_markets(matrix: &ScorelineMatrix, lines: &[u32]) -> MarketSummary {
    let result = one_x_two(matrix);
    MarketSummary {
        result,
        result_normalized: result.normalized(),
        totals: lines.iter().map(|&l| totals(matrix, l)).collect(),
        btts: btts(matrix),
        matrix_total: matrix.total(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::matrix::{build_scoreline_matrix, TailMode};
    use crate::engine::rates::TeamRate;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn grid(h: f64, a: f64, max: u32, tail: TailMode) -> ScorelineMatrix {
        build_scoreline_matrix(TeamRate::new(h).unwrap(), TeamRate::new(a).unwrap(), max, tail)
            .unwrap()
    }

    #[test]
    fn one_x_two_matches_triangle_sums() {
        let m = grid(1.35, 1.2, 5, TailMode::Drop);
        let mut home = 0.0;
        for (i, j, p) in m.cells() {
            if i > j {
                home += p;
            }
        }
        let s = aggregate_markets(&m, &DEFAULT_TOTAL_LINES);
        assert_relative_eq!(s.result.home, home, epsilon = 1e-15);
        assert_relative_eq!(s.result.total(), m.total(), epsilon = 1e-12);
        assert_relative_eq!(s.result_normalized.home, home / m.total(), epsilon = 1e-12);
    }

    #[test]
    fn complementary_markets_hold_over_sampled_rates() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let h = rng.gen_range(0.0..4.0);
            let a = rng.gen_range(0.0..4.0);
            let max = rng.gen_range(1..=10);
            let tail = if rng.gen_bool(0.5) { TailMode::Drop } else { TailMode::Absorb };
            let m = grid(h, a, max, tail);
            let s = aggregate_markets(&m, &[0, 1, 2, 3, 4, 5]);
            let total = m.total();

            if total > 0.0 {
                assert_relative_eq!(s.result_normalized.total(), 1.0, epsilon = 1e-9);
            }
            for t in &s.totals {
                assert_relative_eq!(t.over + t.under, total, epsilon = 1e-12);
            }
            assert_relative_eq!(s.btts.yes + s.btts.no, total, epsilon = 1e-12);
        }
    }

    #[test]
    fn totals_threshold_uses_goal_sum() {
        let m = grid(1.35, 1.2, 5, TailMode::Drop);
        let t = totals(&m, 1);
        let expected = m.get(0, 0) + m.get(0, 1) + m.get(1, 0);
        assert_relative_eq!(t.under, expected, epsilon = 1e-15);
    }

    #[test]
    fn three_plus_bucket_counts_as_three_goals() {
        let m = grid(1.35, 1.2, 3, TailMode::Absorb);
        let t = totals(&m, 2);
        // 3+-0 holds at least three goals, so it is over 2.5.
        let under_cells: f64 = m.cells().filter(|(i, j, _)| i + j <= 2).map(|c| c.2).sum();
        assert_relative_eq!(t.under, under_cells, epsilon = 1e-15);
        assert_relative_eq!(t.over + t.under, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn btts_is_the_off_axis_block() {
        let m = grid(0.0, 2.0, 5, TailMode::Drop);
        let b = btts(&m);
        assert_eq!(b.yes, 0.0);
        assert_relative_eq!(b.no, m.total(), epsilon = 1e-15);
    }

    #[test]
    fn htft_buckets_cover_joint_mass() {
        let ft = grid(1.35, 1.2, 5, TailMode::Drop);
        let ht = grid(0.675, 0.6, 5, TailMode::Drop);
        let b = htft_breakdown(&ht, &ft);
        assert_relative_eq!(b.total(), ht.total() * ft.total(), epsilon = 1e-12);
        assert_eq!(b.entries().len(), 9);
        assert_eq!(b.entries()[1].0.to_string(), "1/X");

        // Brute-force the double sum for one bucket.
        let mut x_one = 0.0;
        for (i, j, p) in ht.cells() {
            for (k, l, q) in ft.cells() {
                if Outcome::classify(i, j) == Outcome::Draw && Outcome::classify(k, l) == Outcome::Home {
                    x_one += p * q;
                }
            }
        }
        assert_relative_eq!(b.get(Outcome::Draw, Outcome::Home), x_one, epsilon = 1e-12);
    }

    #[test]
    fn level_scores_are_draws() {
        assert_eq!(Outcome::classify(0, 0), Outcome::Draw);
        assert_eq!(Outcome::classify(2, 2), Outcome::Draw);
        assert_eq!(Outcome::classify(2, 1), Outcome::Home);
        assert_eq!(Outcome::classify(0, 1), Outcome::Away);
    }

    #[test]
    fn top_scorelines_sorted_with_deterministic_ties() {
        // Equal rates make (1,0) and (0,1) tie exactly.
        let m = grid(1.0, 1.0, 5, TailMode::Drop);
        let top = top_scorelines(&m, 4);
        assert_eq!(top.len(), 4);
        for w in top.windows(2) {
            assert!(w[0].probability >= w[1].probability);
        }
        // P(0,0) = P(1,0) = P(0,1) = P(1,1) = e^-2 when λ = 1.
        let order: Vec<(u32, u32)> = top.iter().map(|s| (s.home, s.away)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert_eq!(top[2].label, "1-0");
    }

    #[test]
    fn top_scorelines_with_large_n_returns_every_cell() {
        let m = grid(1.0, 1.0, 2, TailMode::Drop);
        assert_eq!(top_scorelines(&m, 100).len(), 9);
        assert!(top_scorelines(&m, 0).is_empty());
    }

    #[test]
    fn market_labels_round_trip_through_display() {
        let markets = [
            Market::HomeWin,
            Market::Draw,
            Market::AwayWin,
            Market::Over(2),
            Market::Under(3),
            Market::BttsYes,
            Market::BttsNo,
            Market::HtFt(Outcome::Draw, Outcome::Away),
            Market::CorrectScore(2, 1),
        ];
        for m in markets {
            assert_eq!(m.to_string().parse::<Market>().unwrap(), m);
        }
    }

    #[test]
    fn market_aliases() {
        assert_eq!("1".parse::<Market>().unwrap(), Market::HomeWin);
        assert_eq!(" x ".parse::<Market>().unwrap(), Market::Draw);
        assert_eq!("O2.5".parse::<Market>().unwrap(), Market::Over(2));
        assert_eq!("under  1.5".parse::<Market>().unwrap(), Market::Under(1));
        assert_eq!("GG".parse::<Market>().unwrap(), Market::BttsYes);
        assert_eq!("ng".parse::<Market>().unwrap(), Market::BttsNo);
        assert_eq!("2:0".parse::<Market>().unwrap(), Market::CorrectScore(2, 0));
        assert_eq!("x/1".parse::<Market>().unwrap(), Market::HtFt(Outcome::Draw, Outcome::Home));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        assert!("over 2".parse::<Market>().is_err());
        assert!("corners".parse::<Market>().is_err());
        assert!("3/1".parse::<Market>().is_err());
        assert!("a-b".parse::<Market>().is_err());
    }
}
