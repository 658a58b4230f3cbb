use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = pqa_ingest::Args::parse();

	pqa_ingest::run(args).await
}
