use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = tavola_api::Args::parse();

	tavola_api::run(args).await
}
