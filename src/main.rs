//! demo-relay - disposable-mailbox demo-code fetcher with Telegram relay.

use clap::Parser;
use std::process::ExitCode;

use demo_relay::logging;
use demo_relay::Commands;

#[tokio::main]
async fn main() -> ExitCode {
    // Keep the guard alive so the file appender flushes on exit.
    let _guard = match logging::init() {
        Ok((guard, _log_dir)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let args = Commands::parse();

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
