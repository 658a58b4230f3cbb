use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = pqa_chat::Args::parse();

	pqa_chat::run(args).await
}
