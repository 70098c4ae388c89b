pub mod rebuild;

mod error;

pub use error::{Error, Result};

use std::{io::Write, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fave_service::{LeaderboardService, Stores};
use fave_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = fave_cli::VERSION,
	rename_all = "kebab",
	styles = fave_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
	/// List-name to rebuild. Repeatable; every known list-name when omitted.
	#[arg(long = "list", value_name = "NAME")]
	pub lists: Vec<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = fave_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Arc::new(Db::connect(&config.storage.postgres).await?);

	db.ensure_schema().await?;

	let stores = Stores { lists: db.clone(), snapshots: db };
	let service = LeaderboardService::new(config, stores);
	let outcome = rebuild::rebuild_lists(&service, &args.lists).await?;
	let mut stdout = std::io::stdout().lock();

	for report in &outcome.reports {
		writeln!(stdout, "{}", serde_json::to_string(report)?)?;
	}

	outcome.into_result()?;

	Ok(())
}
