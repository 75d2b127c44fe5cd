use std::sync::Arc;

use analysis_client::{AnalysisConfig, AnalysisJobClient, AnalysisSession};
use anyhow::{bail, Result};

const DEFAULT_PROMPT: &str = "Analyze this stock comprehensively covering trend, key drivers, \
support and resistance levels, volume, market sentiment, risk and actionable recommendations.";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let ticker = match args.next() {
        Some(t) if !t.trim().is_empty() => t,
        _ => bail!("Usage: analyst <TICKER> [PROMPT...]"),
    };
    let prompt = args.collect::<Vec<_>>().join(" ");
    let prompt = if prompt.trim().is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        prompt
    };

    let config = AnalysisConfig::from_env();
    tracing::info!(
        "Polling after {:?}, then every {:?}",
        config.initial_delay,
        config.poll_interval
    );
    let schedule = config.schedule();
    let client = Arc::new(AnalysisJobClient::new(config));
    let mut session = AnalysisSession::new(client, schedule);

    let job_id = session.start(&ticker, &prompt).await?;
    tracing::info!("Submitted job {}, waiting for results (Ctrl-C to cancel)", job_id);

    let outcome = tokio::select! {
        outcome = session.wait() => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(report)) => {
            if report.is_empty() {
                tracing::warn!("Job {} finished with an empty analysis", job_id);
            }
            print!("{}", report.to_text());
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => {
            session.cancel();
            tracing::info!("Cancelled job {}", job_id);
            Ok(())
        }
    }
}
