//! Expected-goals rate derivation.
//!
//! The baseline is the mean of what a team usually scores and what its
//! opponent usually concedes. Two optional adjustments sit on top of it:
//!
//! - **Form**: multiply the baseline by `form% / 100`. A team on 0% form
//!   gets a zero rate in this mode, and only in this mode.
//! - **Head-to-head**: scale by `1 + w × (winRate − lossRate)` using the
//!   historical meetings. With no meetings both rates are zero and the
//!   adjustment collapses to the baseline.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::{HeadToHead, TeamStats};

/// Which adjustment is applied on top of the baseline rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RateMode {
    /// `(scored + opponent conceded) / 2`, form and history ignored.
    #[default]
    Baseline,
    /// Baseline × form percentage / 100.
    Form,
    /// Baseline blended with the head-to-head record.
    HeadToHead,
}

/// Expected goals for one side of a fixture. Always finite and ≥ 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamRate(f64);

impl TeamRate {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(EngineError::invalid(format!(
                "expected-goals rate must be a finite value >= 0, got {value}"
            )));
        }
        Ok(TeamRate(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Rate over the first half only.
    pub fn halved(self) -> Self {
        TeamRate(self.0 / 2.0)
    }
}

/// Knobs for [`compute_rates`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateOptions {
    pub mode: RateMode,
    /// Blend strength for [`RateMode::HeadToHead`], in `[0, 1]`.
    pub h2h_weight: f64,
}

impl Default for RateOptions {
    fn default() -> Self {
        Self {
            mode: RateMode::Baseline,
            h2h_weight: 0.5,
        }
    }
}

/// `(team average scored + opponent average conceded) / 2`.
pub fn baseline_rate(avg_scored: f64, opponent_avg_conceded: f64) -> Result<TeamRate> {
    check_average("average goals scored", avg_scored)?;
    check_average("opponent average goals conceded", opponent_avg_conceded)?;
    TeamRate::new((avg_scored + opponent_avg_conceded) / 2.0)
}

/// Derive `(home_rate, away_rate)` for a fixture.
///
/// `home.scored` pairs with `away.conceded` and vice versa. Form values are
/// only consulted in [`RateMode::Form`] and head-to-head counts only in
/// [`RateMode::HeadToHead`], but they are validated whenever supplied.
pub fn compute_rates(
    home: &TeamStats,
    away: &TeamStats,
    head_to_head: Option<&HeadToHead>,
    opts: &RateOptions,
) -> Result<(TeamRate, TeamRate)> {
    let home_base = baseline_rate(home.avg_scored, away.avg_conceded)?;
    let away_base = baseline_rate(away.avg_scored, home.avg_conceded)?;

    if let Some(f) = home.form_pct {
        check_form("home", f)?;
    }
    if let Some(f) = away.form_pct {
        check_form("away", f)?;
    }

    let (home_rate, away_rate) = match opts.mode {
        RateMode::Baseline => (home_base, away_base),
        RateMode::Form => (
            apply_form(home_base, home.form_pct),
            apply_form(away_base, away.form_pct),
        ),
        RateMode::HeadToHead => {
            if !(0.0..=1.0).contains(&opts.h2h_weight) {
                return Err(EngineError::invalid(format!(
                    "head-to-head weight must be between 0.0 and 1.0, got {}",
                    opts.h2h_weight
                )));
            }
            let record = head_to_head.copied().unwrap_or_default();
            let (home_w, away_w) = head_to_head_rates(&record);
            // (1 + w·(win − loss)) stays >= 0 because w <= 1 and |win − loss| <= 1.
            (
                TeamRate(home_base.0 * (1.0 + opts.h2h_weight * (home_w - away_w))),
                TeamRate(away_base.0 * (1.0 + opts.h2h_weight * (away_w - home_w))),
            )
        }
    };

    debug!(
        mode = ?opts.mode,
        home = home_rate.0,
        away = away_rate.0,
        "derived expected-goals rates"
    );
    Ok((home_rate, away_rate))
}

/// Historical win rates `(home, away)` from the head-to-head record.
/// Both are 0 when the teams have never met.
pub fn head_to_head_rates(record: &HeadToHead) -> (f64, f64) {
    let total = record.total();
    if total == 0 {
        return (0.0, 0.0);
    }
    let total = total as f64;
    (
        f64::from(record.home_wins) / total,
        f64::from(record.away_wins) / total,
    )
}

fn apply_form(base: TeamRate, form_pct: Option<f64>) -> TeamRate {
    match form_pct {
        Some(pct) => TeamRate(base.0 * pct / 100.0),
        None => base,
    }
}

fn check_average(what: &str, v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(EngineError::invalid(format!(
            "{what} must be a finite value >= 0, got {v}"
        )));
    }
    Ok(())
}

fn check_form(side: &str, pct: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(EngineError::invalid(format!(
            "{side} form percentage must be between 0 and 100, got {pct}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn team(scored: f64, conceded: f64, form: Option<f64>) -> TeamStats {
        TeamStats {
            avg_scored: scored,
            avg_conceded: conceded,
            form_pct: form,
        }
    }

    #[test]
    fn baseline_is_mean_of_attack_and_opponent_defence() {
        let home = team(1.5, 1.1, None);
        let away = team(1.3, 1.2, None);
        let (h, a) = compute_rates(&home, &away, None, &RateOptions::default()).unwrap();
        assert_relative_eq!(h.value(), 1.35, epsilon = 1e-12);
        assert_relative_eq!(a.value(), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn baseline_ignores_zero_form() {
        let home = team(1.5, 1.1, Some(0.0));
        let away = team(1.3, 1.2, Some(0.0));
        let (h, _) = compute_rates(&home, &away, None, &RateOptions::default()).unwrap();
        assert_relative_eq!(h.value(), 1.35, epsilon = 1e-12);
    }

    #[test]
    fn form_mode_scales_multiplicatively() {
        let home = team(1.5, 1.1, Some(73.0));
        let away = team(1.3, 1.2, Some(80.0));
        let opts = RateOptions {
            mode: RateMode::Form,
            ..RateOptions::default()
        };
        let (h, a) = compute_rates(&home, &away, None, &opts).unwrap();
        assert_relative_eq!(h.value(), 1.35 * 0.73, epsilon = 1e-12);
        assert_relative_eq!(a.value(), 1.2 * 0.80, epsilon = 1e-12);
    }

    #[test]
    fn form_mode_zero_form_zeroes_rate() {
        let home = team(2.0, 1.0, Some(0.0));
        let away = team(1.0, 1.0, None);
        let opts = RateOptions {
            mode: RateMode::Form,
            ..RateOptions::default()
        };
        let (h, a) = compute_rates(&home, &away, None, &opts).unwrap();
        assert_eq!(h.value(), 0.0);
        // No form supplied means no adjustment.
        assert_relative_eq!(a.value(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn head_to_head_without_meetings_degrades_to_baseline() {
        let home = team(1.5, 1.1, None);
        let away = team(1.3, 1.2, None);
        let opts = RateOptions {
            mode: RateMode::HeadToHead,
            h2h_weight: 1.0,
        };
        let empty = HeadToHead::default();
        let (h, a) = compute_rates(&home, &away, Some(&empty), &opts).unwrap();
        assert_relative_eq!(h.value(), 1.35, epsilon = 1e-12);
        assert_relative_eq!(a.value(), 1.2, epsilon = 1e-12);

        let (h, _) = compute_rates(&home, &away, None, &opts).unwrap();
        assert_relative_eq!(h.value(), 1.35, epsilon = 1e-12);
    }

    #[test]
    fn head_to_head_favours_the_historical_winner() {
        let home = team(1.5, 1.1, None);
        let away = team(1.3, 1.2, None);
        let opts = RateOptions {
            mode: RateMode::HeadToHead,
            h2h_weight: 0.5,
        };
        let record = HeadToHead {
            home_wins: 6,
            draws: 2,
            away_wins: 2,
        };
        let (h, a) = compute_rates(&home, &away, Some(&record), &opts).unwrap();
        // win 0.6, loss 0.2 → ×1.2 for home, ×0.8 for away
        assert_relative_eq!(h.value(), 1.35 * 1.2, epsilon = 1e-12);
        assert_relative_eq!(a.value(), 1.2 * 0.8, epsilon = 1e-12);
    }

    #[test]
    fn head_to_head_rates_never_go_negative() {
        let home = team(1.0, 1.0, None);
        let away = team(1.0, 1.0, None);
        let opts = RateOptions {
            mode: RateMode::HeadToHead,
            h2h_weight: 1.0,
        };
        let record = HeadToHead {
            home_wins: 0,
            draws: 0,
            away_wins: 5,
        };
        let (h, a) = compute_rates(&home, &away, Some(&record), &opts).unwrap();
        assert_eq!(h.value(), 0.0);
        assert_relative_eq!(a.value(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn negative_average_is_rejected() {
        let home = team(-0.1, 1.0, None);
        let away = team(1.0, 1.0, None);
        let err = compute_rates(&home, &away, None, &RateOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn huge_head_to_head_counts_keep_rates_bounded() {
        let home = team(1.0, 1.0, None);
        let away = team(1.0, 1.0, None);
        let opts = RateOptions {
            mode: RateMode::HeadToHead,
            h2h_weight: 1.0,
        };
        let record = HeadToHead {
            home_wins: u32::MAX,
            draws: 0,
            away_wins: 2,
        };
        assert_eq!(record.total(), u64::from(u32::MAX) + 2);

        let (home_w, away_w) = head_to_head_rates(&record);
        assert!((0.0..=1.0).contains(&home_w));
        assert!((0.0..=1.0).contains(&away_w));

        let (h, a) = compute_rates(&home, &away, Some(&record), &opts).unwrap();
        assert!(h.value().is_finite() && h.value() <= 2.0);
        assert!(a.value().is_finite() && a.value() >= 0.0);
        assert_relative_eq!(h.value(), 2.0, epsilon = 1e-6);

        let all_max = HeadToHead {
            home_wins: u32::MAX,
            draws: u32::MAX,
            away_wins: u32::MAX,
        };
        let (h, a) = compute_rates(&home, &away, Some(&all_max), &opts).unwrap();
        assert_relative_eq!(h.value(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(a.value(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn nan_average_is_rejected() {
        assert!(baseline_rate(f64::NAN, 1.0).is_err());
        assert!(baseline_rate(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn form_out_of_range_is_rejected() {
        let home = team(1.0, 1.0, Some(120.0));
        let away = team(1.0, 1.0, None);
        assert!(compute_rates(&home, &away, None, &RateOptions::default()).is_err());
    }

    #[test]
    fn head_to_head_weight_out_of_range_is_rejected() {
        let home = team(1.0, 1.0, None);
        let away = team(1.0, 1.0, None);
        let opts = RateOptions {
            mode: RateMode::HeadToHead,
            h2h_weight: 1.5,
        };
        assert!(compute_rates(&home, &away, None, &opts).is_err());
    }

    #[test]
    fn halved_rate() {
        let r = TeamRate::new(1.35).unwrap();
        assert_relative_eq!(r.halved().value(), 0.675, epsilon = 1e-12);
        assert!(TeamRate::new(-1.0).is_err());
    }
}
