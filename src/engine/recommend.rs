use serde::{Deserialize, Serialize};

use super::markets::{Market, MarketSummary};

/// Line used for the headline over/under pick (2.5 goals).
pub const HEADLINE_TOTAL_LINE: u32 = 2;

/// Straight probability-based picks, independent of any odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub result: String,
    pub total_goals: Option<String>,
    pub btts: String,
}

/// Home or away only when strictly ahead of both alternatives; anything
/// else, including a tie at the top, falls back to the draw.
pub fn result_pick(summary: &MarketSummary) -> Market {
    let r = &summary.result_normalized;
    if r.home > r.away.max(r.draw) {
        Market::HomeWin
    } else if r.away > r.home.max(r.draw) {
        Market::AwayWin
    } else {
        Market::Draw
    }
}

pub fn recommend(summary: &MarketSummary) -> Recommendations {
    let total_goals = summary.totals_for(HEADLINE_TOTAL_LINE).map(|t| {
        let pick = if t.over > t.under {
            Market::Over(t.line)
        } else {
            Market::Under(t.line)
        };
        pick.to_string()
    });
    let btts = if summary.btts.yes > summary.btts.no {
        Market::BttsYes
    } else {
        Market::BttsNo
    };

    Recommendations {
        result: result_pick(summary).to_string(),
        total_goals,
        btts: btts.to_string(),
    }
}
