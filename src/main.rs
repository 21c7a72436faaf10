mod cli;

use clap::Parser;
use dotenvy::dotenv;
use log::{debug, error};
use std::process::ExitCode;

use cli::Cli;
use townhall_portal::error::SerializableError;
use townhall_portal::{PortalState, RuntimeConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    env_logger::init();

    let args = Cli::parse();

    let state = match RuntimeConfig::from_env().and_then(PortalState::from_config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize portal: {}", e);
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    debug!("Using API at {}", state.config.api_base_url);

    match cli::run(&state, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = SerializableError::from(e);
            debug!("Command failed with {}", error.code);
            eprintln!("Error: {}", error.message);
            ExitCode::FAILURE
        }
    }
}
