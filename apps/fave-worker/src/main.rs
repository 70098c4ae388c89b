use clap::Parser;

use fave_worker::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	fave_worker::run(Args::parse()).await
}
