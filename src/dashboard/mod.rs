use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::engine::{predict, PredictionSettings};
use crate::error::EngineError;
use crate::models::{MatchInput, PredictionReport};

#[derive(Clone)]
pub struct AppState {
    pub settings: PredictionSettings,
}

/// Build the Axum router for the prediction form and API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/settings", get(settings_handler))
        .route("/api/predict", post(predict_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Serve the form page, injecting the configured goal cap.
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let html = DASHBOARD_HTML.replace(
        r#"<body>"#,
        &format!(r#"<body data-maxgoals="{}">"#, state.settings.max_goals),
    );
    Html(html)
}

/// GET /api/health
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /api/settings
async fn settings_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let s = &state.settings;
    Json(json!({
        "max_goals": s.max_goals,
        "tail_mode": s.tail_mode,
        "rate_mode": s.rates.mode,
        "h2h_weight": s.rates.h2h_weight,
        "ranking": s.ranking,
        "top_n": s.top_n,
        "total_lines": s.total_lines,
        "kelly_fraction": s.kelly_fraction,
    }))
}

/// POST /api/predict
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<MatchInput>,
) -> Result<Json<PredictionReport>, (StatusCode, String)> {
    predict(&input, &state.settings).map(Json).map_err(|e| {
        warn!("Rejected prediction for {} vs {}: {}", input.home_team, input.away_team, e);
        let status = match &e {
            EngineError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Json(_) => StatusCode::BAD_REQUEST,
        };
        (status, e.to_string())
    })
}

/// Embedded single-file form page (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Scoreline Predictor</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; overflow: hidden; }
  .panel-header { padding: .9rem 1.2rem; border-bottom: 1px solid var(--border); font-weight: 600; }
  .form-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 1rem; padding: 1.2rem; }
  label { display: block; color: var(--muted); font-size: .8rem; margin-bottom: .3rem; }
  input { width: 100%; background: var(--bg); border: 1px solid var(--border); color: var(--text); padding: .45rem .6rem; border-radius: 6px; }
  button { background: var(--accent); border: none; color: #fff; padding: .6rem 1.4rem; border-radius: 6px; cursor: pointer; font-weight: 600; margin: 0 1.2rem 1.2rem; }
  table { width: 100%; border-collapse: collapse; }
  th { padding: .7rem 1rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .65rem 1rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
  tr:last-child td { border-bottom: none; }
  .two-col { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
  @media (max-width: 768px) { .two-col { grid-template-columns: 1fr; } }
  .pos { color: var(--green); }
  .neg { color: var(--red); }
  .empty { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; }
</style>
</head>
<body>
<header>
  <h1>⚽ Scoreline Predictor</h1>
  <span style="margin-left:auto;color:var(--muted);font-size:.8rem;" id="grid-info"></span>
</header>

<main>
  <div class="panel">
    <div class="panel-header">Team statistics</div>
    <div class="form-grid">
      <div><label>Home team</label><input id="home_team" value="Home"></div>
      <div><label>Away team</label><input id="away_team" value="Away"></div>
      <div><label>Home avg scored at home</label><input id="home_scored" type="number" step="0.01" value="1.5"></div>
      <div><label>Home avg conceded at home</label><input id="home_conceded" type="number" step="0.01" value="1.1"></div>
      <div><label>Away avg scored away</label><input id="away_scored" type="number" step="0.01" value="1.3"></div>
      <div><label>Away avg conceded away</label><input id="away_conceded" type="number" step="0.01" value="1.2"></div>
      <div><label>Home form %</label><input id="home_form" type="number" step="1" value="73"></div>
      <div><label>Away form %</label><input id="away_form" type="number" step="1" value="80"></div>
      <div><label>H2H home wins</label><input id="h2h_home" type="number" step="1" value="0"></div>
      <div><label>H2H draws</label><input id="h2h_draws" type="number" step="1" value="0"></div>
      <div><label>H2H away wins</label><input id="h2h_away" type="number" step="1" value="0"></div>
    </div>
    <div class="panel-header">Odds (decimal, leave blank to skip)</div>
    <div class="form-grid" id="odds-grid"></div>
    <button onclick="runPrediction()">Predict</button>
  </div>

  <div class="panel" id="error-panel" style="display:none"><div class="panel-header neg" id="error-text"></div></div>

  <div class="two-col">
    <div class="panel">
      <div class="panel-header">Markets</div>
      <table><tbody id="markets-tbody"><tr><td class="empty">Run a prediction</td></tr></tbody></table>
    </div>
    <div class="panel">
      <div class="panel-header">Most likely scorelines</div>
      <table><tbody id="scores-tbody"><tr><td class="empty">Run a prediction</td></tr></tbody></table>
    </div>
  </div>

  <div class="two-col">
    <div class="panel">
      <div class="panel-header">Half-time / full-time</div>
      <table><tbody id="htft-tbody"><tr><td class="empty">Run a prediction</td></tr></tbody></table>
    </div>
    <div class="panel">
      <div class="panel-header">Recommendations</div>
      <table><tbody id="rec-tbody"><tr><td class="empty">Run a prediction</td></tr></tbody></table>
    </div>
  </div>
</main>

<script>
const pct = v => (v*100).toFixed(2)+'%';
const ODDS_LABELS = ['Home Win','Draw','Away Win','Over 2.5','Under 2.5','BTTS Yes','BTTS No'];
const num = id => parseFloat(document.getElementById(id).value);
const int = id => parseInt(document.getElementById(id).value || '0', 10);

document.getElementById('odds-grid').innerHTML = ODDS_LABELS.map((l, i) =>
  `<div><label>${l}</label><input id="odds-${i}" type="number" step="0.01"></div>`).join('');

async function runPrediction() {
  const odds = {};
  ODDS_LABELS.forEach((l, i) => {
    const v = parseFloat(document.getElementById('odds-'+i).value);
    if (Number.isFinite(v)) odds[l] = v;
  });
  const h2h = { home_wins: int('h2h_home'), draws: int('h2h_draws'), away_wins: int('h2h_away') };
  const body = {
    home_team: document.getElementById('home_team').value || 'Home',
    away_team: document.getElementById('away_team').value || 'Away',
    home: { avg_scored: num('home_scored'), avg_conceded: num('home_conceded'), form_pct: num('home_form') },
    away: { avg_scored: num('away_scored'), avg_conceded: num('away_conceded'), form_pct: num('away_form') },
    head_to_head: h2h.home_wins + h2h.draws + h2h.away_wins > 0 ? h2h : null,
    odds,
  };
  const r = await fetch('/api/predict', { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(body) });
  const errPanel = document.getElementById('error-panel');
  if (!r.ok) {
    errPanel.style.display = '';
    document.getElementById('error-text').textContent = await r.text();
    return;
  }
  errPanel.style.display = 'none';
  render(await r.json());
}

function render(rep) {
  document.getElementById('grid-info').textContent =
    `xG ${rep.home_rate.toFixed(2)} – ${rep.away_rate.toFixed(2)} · grid 0..${rep.max_goals} · tail ${pct(rep.tail_mass)}`;

  const m = rep.markets;
  const rows = [
    ['Home Win', m.result_normalized.home], ['Draw', m.result_normalized.draw], ['Away Win', m.result_normalized.away],
    ...m.totals.flatMap(t => [[`Over ${t.line}.5`, t.over], [`Under ${t.line}.5`, t.under]]),
    ['BTTS Yes', m.btts.yes], ['BTTS No', m.btts.no],
  ];
  document.getElementById('markets-tbody').innerHTML = rows.map(([l, p]) => `<tr><td>${l}</td><td>${pct(p)}</td></tr>`).join('');

  document.getElementById('scores-tbody').innerHTML = rep.top_scorelines.map((s, i) =>
    `<tr><td>${i+1}.</td><td>${s.label}</td><td>${pct(s.probability)}</td></tr>`).join('');

  document.getElementById('htft-tbody').innerHTML = rep.htft.map(e =>
    `<tr><td>${e.label}</td><td>${pct(e.probability)}</td></tr>`).join('');

  const rec = rep.recommendations;
  const bet = rep.value_bet;
  const recRows = [
    ['Result', rec.result],
    ['Total goals', rec.total_goals || '–'],
    ['Both teams to score', rec.btts],
    ['1X2 overround', rep.result_overround != null ? pct(rep.result_overround) : '–'],
    ['Value bet', bet ? `<span class="${bet.expected_value > 1 ? 'pos' : 'neg'}">${bet.label} @ ${bet.odds.toFixed(2)} (EV ${bet.expected_value.toFixed(3)})</span>` : 'no value bet found'],
    ['Suggested stake', rep.kelly_stake != null ? pct(rep.kelly_stake) + ' of bankroll' : '–'],
  ];
  document.getElementById('rec-tbody').innerHTML = recRows.map(([k, v]) => `<tr><td>${k}</td><td>${v}</td></tr>`).join('');
}

document.addEventListener('DOMContentLoaded', () => {
  document.getElementById('grid-info').textContent = 'grid 0..' + document.body.dataset.maxgoals;
});
</script>
</body>
</html>"#;
