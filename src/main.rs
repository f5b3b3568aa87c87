use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

use scoreline_predictor::config::{Command, Config, PredictArgs};
use scoreline_predictor::dashboard::{self, AppState};
use scoreline_predictor::engine::{predict, PredictionSettings};
use scoreline_predictor::report::render_text;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging (stderr, so stdout carries only the report)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;
    let settings = config.settings();

    match &config.command {
        Command::Predict(args) => run_predict(args, &settings),
        Command::Serve { addr } => serve(addr, settings).await,
    }
}

fn run_predict(args: &PredictArgs, settings: &PredictionSettings) -> Result<()> {
    let input = args.match_input()?;
    let report = predict(&input, settings)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

async fn serve(addr: &str, settings: PredictionSettings) -> Result<()> {
    info!(
        "Model: max_goals={} tail={:?} rates={:?} ranking={:?}",
        settings.max_goals, settings.tail_mode, settings.rates.mode, settings.ranking
    );
    let app = dashboard::router(AppState { settings });
    let addr: SocketAddr = addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
