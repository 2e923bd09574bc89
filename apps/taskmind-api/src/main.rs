use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = taskmind_api::Args::parse();

	taskmind_api::run(args).await
}
