//! Main entry point for rvh CLI

use anyhow::Context;
use clap::Parser;
use rvh::cli::{Args, OutputFormatter, VerbosityLevel};
use rvh::core::{select, sort_by_quality, Aggregator};
use rvh::RvhError;
use std::io::BufRead;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbosity_level());
    info!("Starting rvh with args: {:?}", args);

    let mut formatter = OutputFormatter::new(args.verbosity_level());

    match run(&args, &mut formatter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatter.error(&format!("{:#}", e));
            if let Some(hint) = e.downcast_ref::<RvhError>().and_then(RvhError::hint) {
                formatter.info(hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Search, list, and resolve the chosen result
async fn run(args: &Args, formatter: &mut OutputFormatter) -> anyhow::Result<()> {
    let aggregator = Aggregator::new(args.search_options()?)?;

    let query = args.query_string();
    let mut results = aggregator.search(&query).await?;
    formatter.print_found(results.len());

    if !args.no_details {
        formatter.create_progress_bar(results.len() as u64);
        let failures = aggregator
            .enrich_all(&mut results, |_| formatter.inc_progress())
            .await;
        formatter.finish_progress();

        for (id, error) in failures {
            formatter.warning(&format!("No details for result {}: {}", id, error));
        }
    }

    if args.sort {
        debug!("Sorting {} results (descending: {})", results.len(), args.reverse);
        sort_by_quality(&mut results, args.reverse);
    }

    if args.json {
        formatter.print_json(&results)?;
    } else {
        formatter.print_results(&results);
    }

    if args.list_only {
        return Ok(());
    }

    let id = match args.select {
        Some(id) => id,
        None => {
            formatter.print_prompt(results.len());
            read_selection()?
        }
    };

    let chosen = select(&results, id)?;
    let link = aggregator
        .resolve(chosen)
        .await
        .with_context(|| format!("Could not resolve \"{}\"", chosen.title))?;
    formatter.print_link(&link);

    Ok(())
}

/// Read a result id from stdin
fn read_selection() -> anyhow::Result<usize> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read selection")?;

    line.trim()
        .parse::<usize>()
        .with_context(|| format!("Selection must be a result id, got {:?}", line.trim()))
}

/// Initialize logging system
fn init_logging(verbosity: VerbosityLevel) {
    let default_level = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "debug",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries only results and the link
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}
