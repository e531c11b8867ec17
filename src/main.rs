//! signal-scout: binary entrypoint
//! Loads config and credentials, runs one pipeline pass, writes the reports.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use signal_scout::config::load_config_default;
use signal_scout::credentials::Credentials;
use signal_scout::pipeline::Pipeline;

/// Compact logs by default; SIGNAL_SCOUT_LOG_JSON=1 switches to JSON lines.
/// RUST_LOG overrides the default filter.
fn init_tracing() {
    let json = std::env::var("SIGNAL_SCOUT_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("signal_scout=info,pipeline=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local .env may carry SEMANTIC_SCHOLAR_API_KEY / SCOPUS_API_KEY.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Config and credentials fail the run before any request goes out.
    let config = load_config_default().context("loading pipeline config")?;
    let creds = if config.papers.enabled {
        Credentials::load_default().context("loading provider credentials")?
    } else {
        Credentials::default()
    };
    let out_dir = config.output.dir.clone();
    let pipeline = Pipeline::from_config(config, &creds).context("building pipeline")?;

    let mut run = pipeline.run().await;
    let paths = run.persist(&out_dir).context("writing outputs")?;

    info!(target: "pipeline", path = %paths.raw.display(), "raw data saved");
    info!(target: "pipeline", path = %paths.report.display(), "signal report saved");
    info!(target: "pipeline", path = %paths.narrative.display(), "narrative report saved");
    Ok(())
}
