pub mod worker;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskmind_service::TodoService;
use taskmind_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = taskmind_cli::VERSION,
	rename_all = "kebab",
	styles = taskmind_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = taskmind_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema(config.storage.vector.dim).await?;

	worker::run_worker(TodoService::new(config, db)).await
}
