use std::{fmt::Write as _, path::PathBuf};

use clap::Parser;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use pqa_service::{AnswerResult, ChatOutcome, ChatService};

const PROMPT: &str = "问题> ";

#[derive(Debug, Parser)]
#[command(
	version = pqa_cli::VERSION,
	rename_all = "kebab",
	styles = pqa_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Reuse a session handle instead of generating one.
	#[arg(long, value_name = "ID")]
	pub session: Option<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = pqa_config::load(&args.config)?;

	init_tracing(&config);

	let service = ChatService::from_config(&config)?;
	let vectors = service.ensure_ready().await?;
	let session = args.session.unwrap_or_else(|| Uuid::new_v4().to_string());
	let tokens = config.chat.termination_tokens.join("/");
	let mut stdout = io::stdout();
	let mut lines = BufReader::new(io::stdin()).lines();

	tracing::info!(%session, vectors, "Chat session started.");

	let banner = format!("已加载 {vectors} 条价格数据，输入 {tokens} 结束对话。\n");

	stdout.write_all(banner.as_bytes()).await?;

	loop {
		stdout.write_all(PROMPT.as_bytes()).await?;
		stdout.flush().await?;

		let Some(line) = lines.next_line().await? else {
			break;
		};

		if line.trim().is_empty() {
			continue;
		}

		match service.chat(&session, &line).await {
			ChatOutcome::Answer(result) => {
				stdout.write_all(render_answer(&result).as_bytes()).await?;
			},
			ChatOutcome::Terminated(result) => {
				stdout.write_all(format!("{}\n", result.message).as_bytes()).await?;

				break;
			},
			ChatOutcome::Failed(err) => {
				stdout
					.write_all(format!("[{}] {}\n", err.kind.as_str(), err.message).as_bytes())
					.await?;
			},
		}
	}

	service.end_session(&session);

	Ok(())
}

/// Answer, retrieval count and numbered sources, one block per turn.
pub fn render_answer(result: &AnswerResult) -> String {
	let mut out = format!("\n{}\n\n检索到 {} 条相关数据", result.answer, result.retrieved_count);

	if result.used_filtered_path {
		out.push_str("（精确过滤）");
	}

	out.push('\n');

	for (i, source) in result.sources.iter().enumerate() {
		let _ = writeln!(out, "  [{}] {}", i + 1, source.content);
	}

	out.push('\n');

	out
}

fn init_tracing(config: &pqa_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(test)]
mod tests {
	use super::*;
	use pqa_domain::RetrievedDocument;

	#[test]
	fn numbers_sources_in_retrieval_order() {
		let result = AnswerResult {
			answer: "北京新发地的大白菜平均价为1.2元。".to_string(),
			sources: vec![
				RetrievedDocument::new("品种：大白菜"),
				RetrievedDocument::new("品种：圆白菜"),
			],
			retrieved_count: 2,
			used_filtered_path: true,
		};
		let rendered = render_answer(&result);

		assert!(rendered.contains("检索到 2 条相关数据（精确过滤）"));
		assert!(rendered.contains("  [1] 品种：大白菜\n  [2] 品种：圆白菜\n"));
	}

	#[test]
	fn fallback_answer_has_no_filter_marker() {
		let result = AnswerResult {
			answer: "未找到相关价格数据".to_string(),
			sources: Vec::new(),
			retrieved_count: 0,
			used_filtered_path: false,
		};
		let rendered = render_answer(&result);

		assert!(rendered.contains("检索到 0 条相关数据\n"));
		assert!(!rendered.contains("精确过滤"));
	}
}
