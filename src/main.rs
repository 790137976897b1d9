use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;

mod cli;
mod config;
mod error;
mod logger;
mod metrics;
mod mongo_client;
mod sampler;

use cli::PluginArgs;
use error::{AppError, AppResult};
use metrics::report;
use sampler::Sampler;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = PluginArgs::parse();
    logger::init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let AppError::Sampler { source } = &err {
                if source.is_unavailable() {
                    warn!("MongoDB unreachable; leaving retries to the next scheduled run");
                }
            }
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: PluginArgs) -> AppResult<()> {
    // ── 1. Validate configuration (no network yet) ──────────────
    let config = args.into_config()?;

    // ── 2. Agent asking for the graph definition ────────────────
    if std::env::var_os(report::META_ENV).is_some_and(|value| !value.is_empty()) {
        report::write_meta(&mut std::io::stdout().lock(), &config.prefix)?;
        return Ok(());
    }

    // ── 3. Sample the profiler log ──────────────────────────────
    let metrics = Sampler::new(config.params).collect().await?;

    // ── 4. Emit ─────────────────────────────────────────────────
    let epoch = chrono::Utc::now().timestamp();
    let mut out = std::io::stdout().lock();
    report::write_values(&mut out, &config.prefix, &metrics, epoch)?;
    out.flush()?;
    Ok(())
}
