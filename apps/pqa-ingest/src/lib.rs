use std::{
	fs,
	path::{Path, PathBuf},
	time::Duration,
};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{self, WrapErr};
use tracing_subscriber::EnvFilter;

use pqa_domain::{PriceRecord, RetrievedDocument};
use pqa_providers::embedding;
use pqa_storage::{index, qdrant::QdrantStore};

#[derive(Debug, Parser)]
#[command(
	version = pqa_cli::VERSION,
	rename_all = "kebab",
	styles = pqa_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Price records as CSV, JSON Lines, or a single JSON array.
	#[arg(long, short = 'i', value_name = "FILE")]
	pub input: PathBuf,
	/// Overrides the format implied by the input file extension.
	#[arg(long, value_enum)]
	pub format: Option<InputFormat>,
	/// Drop and recreate the collection before loading.
	#[arg(long)]
	pub rebuild: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
	/// Header row with the dataset's column names; empty cells become missing values.
	Csv,
	/// JSON Lines or one JSON array.
	Json,
}
impl InputFormat {
	/// `.csv` files are CSV; everything else is read as JSON.
	pub fn from_path(path: &Path) -> Self {
		match path.extension().and_then(|ext| ext.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
			_ => Self::Json,
		}
	}
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
	pub records: usize,
	pub batches: usize,
	pub upserted: usize,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = pqa_config::load(&args.config)?;

	init_tracing(&config);

	let raw = fs::read_to_string(&args.input)
		.wrap_err_with(|| format!("Failed to read {}.", args.input.display()))?;
	let format = args.format.unwrap_or_else(|| InputFormat::from_path(&args.input));
	let records = match format {
		InputFormat::Csv => parse_csv_records(&raw)?,
		InputFormat::Json => parse_records(&raw)?,
	};
	let documents: Vec<RetrievedDocument> = records.iter().map(PriceRecord::to_document).collect();
	let store = QdrantStore::new(&config.storage.qdrant)?;

	index::ensure_collection(&store, args.rebuild).await?;

	let report = load_documents(&config, &store, &documents).await?;
	let total = index::count(&store).await?;

	tracing::info!(
		records = report.records,
		batches = report.batches,
		upserted = report.upserted,
		collection_total = total,
		"Ingestion finished."
	);

	Ok(())
}

/// Accepts JSON Lines (blank lines skipped) or one top-level JSON array.
pub fn parse_records(raw: &str) -> color_eyre::Result<Vec<PriceRecord>> {
	let records: Vec<PriceRecord> = if raw.trim_start().starts_with('[') {
		serde_json::from_str(raw).wrap_err("Failed to parse price record array.")?
	} else {
		raw.lines()
			.enumerate()
			.filter(|(_, line)| !line.trim().is_empty())
			.map(|(i, line)| {
				serde_json::from_str(line)
					.wrap_err_with(|| format!("Failed to parse price record on line {}.", i + 1))
			})
			.collect::<color_eyre::Result<_>>()?
	};

	ensure_records(records)
}

/// Rows are deserialized by header name, so column order does not matter.
pub fn parse_csv_records(raw: &str) -> color_eyre::Result<Vec<PriceRecord>> {
	let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(raw.as_bytes());
	let records = reader
		.deserialize::<PriceRecord>()
		.enumerate()
		.map(|(i, row)| {
			row.wrap_err_with(|| format!("Failed to parse price record on row {}.", i + 1))
		})
		.collect::<color_eyre::Result<Vec<_>>>()?;

	ensure_records(records)
}

fn ensure_records(records: Vec<PriceRecord>) -> color_eyre::Result<Vec<PriceRecord>> {
	if records.is_empty() {
		return Err(eyre::eyre!("Input contains no price records."));
	}

	Ok(records)
}

async fn load_documents(
	config: &pqa_config::Config,
	store: &QdrantStore,
	documents: &[RetrievedDocument],
) -> color_eyre::Result<IngestReport> {
	let batch_size = config.ingest.batch_size as usize;
	let pause = Duration::from_millis(config.ingest.batch_pause_ms);
	let batches = documents.len().div_ceil(batch_size);
	let mut report = IngestReport { records: documents.len(), ..Default::default() };

	for (i, batch) in documents.chunks(batch_size).enumerate() {
		let texts: Vec<String> = batch.iter().map(|document| document.content.clone()).collect();
		let vectors = embedding::embed(&config.providers.embedding, &texts)
			.await
			.wrap_err_with(|| format!("Failed to embed batch {}.", i + 1))?;

		report.upserted += index::upsert(store, batch, vectors).await?;
		report.batches += 1;

		tracing::info!(batch = i + 1, batches, upserted = report.upserted, "Batch stored.");

		if i + 1 < batches && !pause.is_zero() {
			tokio::time::sleep(pause).await;
		}
	}

	Ok(report)
}

fn init_tracing(config: &pqa_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
