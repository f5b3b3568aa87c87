//! Plain-text rendering of a [`PredictionReport`].

use std::fmt::Write;

use crate::models::PredictionReport;

fn pct(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

/// Render the report the way it is printed by `predict`.
pub fn render_text(r: &PredictionReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, r);
    out
}

fn write_report(out: &mut String, r: &PredictionReport) -> std::fmt::Result {
    writeln!(out, "⚽ {} vs {}", r.home_team, r.away_team)?;
    writeln!(out)?;

    writeln!(out, "Expected goals")?;
    writeln!(
        out,
        "  {}: {:.2} (first half {:.2})",
        r.home_team, r.home_rate, r.ht_home_rate
    )?;
    writeln!(
        out,
        "  {}: {:.2} (first half {:.2})",
        r.away_team, r.away_rate, r.ht_away_rate
    )?;
    writeln!(
        out,
        "  Grid 0..={} goals per side ({:?} tail), mass outside grid {}",
        r.max_goals,
        r.tail_mode,
        pct(r.tail_mass)
    )?;
    writeln!(out)?;

    writeln!(out, "Top {} most likely scorelines", r.top_scorelines.len())?;
    for (idx, s) in r.top_scorelines.iter().enumerate() {
        writeln!(out, "  {}. {} with probability {}", idx + 1, s.label, pct(s.probability))?;
    }
    if r.top_scorelines.len() > 3 {
        writeln!(out, "Top 3 most likely scorelines")?;
        for (idx, s) in r.top_scorelines.iter().take(3).enumerate() {
            writeln!(out, "  {}. {} with probability {}", idx + 1, s.label, pct(s.probability))?;
        }
    }
    writeln!(out)?;

    let res = &r.markets.result_normalized;
    writeln!(out, "Match result")?;
    writeln!(out, "  Home Win  {}", pct(res.home))?;
    writeln!(out, "  Draw      {}", pct(res.draw))?;
    writeln!(out, "  Away Win  {}", pct(res.away))?;
    writeln!(out)?;

    writeln!(out, "Total goals")?;
    for t in &r.markets.totals {
        writeln!(
            out,
            "  Over {l}.5  {}   Under {l}.5  {}",
            pct(t.over),
            pct(t.under),
            l = t.line
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Both teams to score")?;
    writeln!(out, "  GG  {}   NG  {}", pct(r.markets.btts.yes), pct(r.markets.btts.no))?;
    writeln!(out)?;

    writeln!(out, "Half-time / full-time")?;
    for row in r.htft.chunks(3) {
        let line = row
            .iter()
            .map(|e| format!("{} {:>7}", e.label, pct(e.probability)))
            .collect::<Vec<_>>()
            .join("   ");
        writeln!(out, "  {line}")?;
    }
    writeln!(out)?;

    writeln!(out, "Recommendations")?;
    writeln!(out, "  Result: {}", r.recommendations.result)?;
    if let Some(total) = &r.recommendations.total_goals {
        writeln!(out, "  Total goals: {total}")?;
    }
    writeln!(out, "  Both teams to score: {}", r.recommendations.btts)?;

    if let Some(book) = r.result_overround {
        writeln!(out, "  1X2 book overround: {}", pct(book))?;
    }
    match &r.value_bet {
        Some(bet) => {
            writeln!(
                out,
                "  Value bet: {} @ {:.2} (model {}, EV {:.3})",
                bet.label,
                bet.odds,
                pct(bet.probability),
                bet.expected_value
            )?;
            if let Some(stake) = r.kelly_stake {
                writeln!(out, "  Suggested stake: {} of bankroll", pct(stake))?;
            }
        }
        None => writeln!(out, "  Value bet: no value bet found")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{predict, OddsBoard, PredictionSettings};
    use crate::models::{MatchInput, TeamStats};

    fn input(odds: OddsBoard) -> MatchInput {
        MatchInput {
            home_team: "Lions".into(),
            away_team: "Tigers".into(),
            home: TeamStats {
                avg_scored: 1.5,
                avg_conceded: 1.1,
                form_pct: None,
            },
            away: TeamStats {
                avg_scored: 1.3,
                avg_conceded: 1.2,
                form_pct: None,
            },
            head_to_head: None,
            odds,
        }
    }

    #[test]
    fn renders_every_section() {
        let report = predict(&input(OddsBoard::new()), &PredictionSettings::default()).unwrap();
        let text = render_text(&report);
        assert!(text.starts_with("⚽ Lions vs Tigers"));
        assert!(text.contains("Expected goals"));
        assert!(text.contains("  Lions: 1.35 (first half 0.68)"));
        assert!(text.contains("Top 9 most likely scorelines"));
        assert!(text.contains("Top 3 most likely scorelines"));
        assert!(text.contains("Over 2.5"));
        assert!(text.contains("1/1"));
        assert!(text.contains("Value bet: no value bet found"));
    }

    #[test]
    fn renders_value_bet_and_stake() {
        let mut odds = OddsBoard::new();
        odds.insert("GG", 3.0).unwrap();
        let report = predict(&input(odds), &PredictionSettings::default()).unwrap();
        let text = render_text(&report);
        assert!(text.contains("Value bet: BTTS Yes @ 3.00"));
        assert!(text.contains("Suggested stake:"));
    }
}
