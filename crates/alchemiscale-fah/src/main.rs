use std::process::ExitCode;

use alchemiscale_fah::cli::{Cli, commands};
use alchemiscale_fah::logging::{LoggingConfig, init_logging};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logging_guard = match init_logging(&LoggingConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
