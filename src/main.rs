extern crate tokio;

use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::{filter, prelude::*};

mod config;
mod infra;
mod updater;

/// Replace the code of an AWS Lambda function with a local package
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of a setting file
    #[arg(short, long, default_value_t = String::from(config::DEFAULT_PATH))]
    conf: String,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        filter::LevelFilter::DEBUG
    } else {
        filter::LevelFilter::INFO
    };
    // stdout carries the status line only
    let logger = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(logger.with_filter(level))
        .init();

    let updater = updater::Updater::new(infra::Client::new());
    let outcome = updater.run(&args.conf).await;
    if let Err(err) = &outcome {
        tracing::error!("update aborted; {:?}", err);
    }
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = updater::report(&mut stdout, &outcome).and_then(|_| stdout.flush()) {
        tracing::error!("failed to write the result; {:?}", err);
    }
    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
