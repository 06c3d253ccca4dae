use anyhow::Context;
use clap::Parser;
use forecast_core::{Config, ForecastPipeline};
use forecast_web::{AppState, router};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "weather-web", version, about = "Forecast HTTP endpoint")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: String,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let pipeline = ForecastPipeline::new(&config.http, config.endpoints)?;
    let app = router(AppState {
        pipeline: Arc::new(pipeline),
    });

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    tracing::info!("Web server running at http://{}", args.bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
