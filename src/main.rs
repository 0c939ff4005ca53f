//! AI news briefing: batch entrypoint.
//! Reads candidates, runs both categories through the pipeline and prints the result as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ai_news_briefing::bootstrap::Runtime;
use ai_news_briefing::ingest::file_source::JsonFileSource;
use ai_news_briefing::metrics::Metrics;
use ai_news_briefing::pipeline::DynSource;
use ai_news_briefing::JsonSink;

const DEFAULT_CANDIDATES_PATH: &str = "data/candidates.json";
const ENV_CANDIDATES_PATH: &str = "CANDIDATES_PATH";
const ENV_METRICS_SNAPSHOT_PATH: &str = "METRICS_SNAPSHOT_PATH";

/// Logs go to stderr so stdout stays clean for the JSON payload.
/// LOG_FORMAT=json switches to structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ai_news_briefing=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

struct Args {
    input: Option<PathBuf>,
    probe: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        input: None,
        probe: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--input" => {
                let path = it.next().context("--input needs a path")?;
                args.input = Some(PathBuf::from(path));
            }
            "--probe" => args.probe = true,
            other => bail!("unknown argument: {other} (usage: [--input candidates.json] [--probe])"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = parse_args()?;

    let metrics = match std::env::var_os(ENV_METRICS_SNAPSHOT_PATH) {
        Some(path) => Some((Metrics::install()?, PathBuf::from(path))),
        None => None,
    };

    let rt = Runtime::from_env().context("loading configuration")?;

    if args.probe {
        rt.quick_probe().await;
        return Ok(());
    }

    let input = args.input.unwrap_or_else(|| {
        std::env::var(ENV_CANDIDATES_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CANDIDATES_PATH))
    });
    info!(input = %input.display(), "running pipeline");

    let sources: Vec<DynSource> = vec![Arc::new(JsonFileSource::new(input))];
    let sink = JsonSink::stdout();
    let report = rt.pipeline.run_and_deliver(&sources, &sink).await;
    info!(delivered = report.delivered_total(), "run complete");

    if let Some((metrics, path)) = metrics {
        if let Err(e) = metrics.write_snapshot(&path) {
            warn!(error = ?e, "metrics snapshot not written");
        }
    }
    if !report.delivery_ok() {
        bail!("delivery failed for {:?}", report.delivery_failures);
    }
    Ok(())
}
