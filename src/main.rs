//! CloudSaver CLI - search shared cloud drive resources from the terminal
//!
//! Each invocation runs one command and prints the resulting envelope as JSON.

use std::process::ExitCode;

use clap::Parser;

use cloudsaver::cli::{self, Cli};
use cloudsaver::{logging, ApiAdapter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let adapter = match ApiAdapter::from_config(&cli.adapter_config()) {
        Ok(adapter) => adapter,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli::run(&adapter, cli.command).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
