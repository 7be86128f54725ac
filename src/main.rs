use std::process::exit;

use anyhow::Result;
use clap::Parser;
use dnas::app;
use dnas::cli::Args;
use dnas::config::Mode;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let code = match Mode::from_args(args)? {
        Mode::ListInterfaces => {
            app::list_interfaces()?;
            0
        }
        Mode::Monitor(config) => {
            info!("Starting dnas on {}", config.interface.as_deref().unwrap_or("default interface"));
            app::run_monitor(config).await?
        }
        Mode::Query(config) => app::run_query(config).await?,
    };

    exit(code)
}
