use anyhow::Context;
use clap::Parser;
use colored::*;
use cyclone_tracks::cli::Args;
use cyclone_tracks::processor::writer::ParquetSink;
use cyclone_tracks::processor::{ProcessingOutcome, TrackProcessor};
use cyclone_tracks::TrackError;
use std::process;
use tracing::debug;

fn main() {
    let args = Args::parse();
    setup_logging(&args);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = run(&args) => result,
            signal = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                let reason = match signal {
                    Ok(()) => "Processing interrupted by user".to_string(),
                    Err(e) => format!("Signal handler failed: {}", e),
                };
                Err(TrackError::Interrupted { reason }.into())
            }
        }
    });

    match result {
        Ok(outcome) => {
            if !outcome.provisional.is_empty() {
                println!(
                    "  {} {} provisional storms left out",
                    "Note:".bright_yellow(),
                    outcome.provisional.len()
                );
            }
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<ProcessingOutcome> {
    let config = args.to_config();
    let paths = args
        .source_paths()
        .context("Failed to locate input files")?;

    let mut sink = ParquetSink::new(&args.output);
    let outcome = TrackProcessor::run(config, &paths, &mut sink)
        .await
        .context("Track processing failed")?;

    println!(
        "\n{} {}",
        "Output written to".bright_green().bold(),
        args.output.display().to_string().bright_white()
    );
    Ok(outcome)
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cyclone_tracks={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}
