pub mod artifact;
pub mod cli;
pub mod config;
pub mod crop;
pub mod display;
pub mod editor;
pub mod error;
pub mod events;
pub mod generation;
pub mod geometry;
pub mod history;
pub mod i18n;
pub mod logging;
pub mod templates;
pub use error::{AppError, AppResult};

use clap::Parser;

/// Entrypoint used by the binary: parses arguments, then runs one command.
pub fn run() -> AppResult<()> {
    let cli = cli::Cli::parse();
    logging::init(logging::level_for(cli.verbose));
    tracing::info!("starting avatar-studio");

    let config = config::load_app_config();
    cli::execute(cli, &config)
}
