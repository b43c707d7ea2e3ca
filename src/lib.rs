mod utils;

pub mod cli;
pub mod db;
pub mod engine;
pub mod error;
pub mod inference;
pub mod metrics;
pub mod models;
pub mod session;
pub mod settings;
pub mod workout;

use clap::Parser;

pub use error::CoachError;

pub fn run() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = cli::Cli::parse();
    log::info!("formcoach starting up (data dir {})", cli.data_dir.display());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(cli::execute(cli))
}
