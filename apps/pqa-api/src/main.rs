use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = pqa_api::Args::parse();

	pqa_api::run(args).await
}
