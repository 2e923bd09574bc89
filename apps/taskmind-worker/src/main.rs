use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = taskmind_worker::Args::parse();

	taskmind_worker::run(args).await
}
