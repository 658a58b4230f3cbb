use std::path::Path;

use pqa_domain::{PatternExtractor, PredicateExtractor, compile, record::MISSING_VALUE};
use pqa_ingest::{InputFormat, parse_csv_records, parse_records};

const RECORDS: &str = include_str!("fixtures/records.jsonl");
const CSV_RECORDS: &str = include_str!("fixtures/records.csv");

#[test]
fn parses_json_lines_and_skips_blank_lines() {
	let records = parse_records(RECORDS).expect("Failed to parse fixture.");

	assert_eq!(records.len(), 3);
	assert_eq!(records[1].avg_price, "1.3");
	assert_eq!(records[2].min_price, MISSING_VALUE);
	assert_eq!(records[2].max_price, MISSING_VALUE);
}

#[test]
fn parses_a_json_array() {
	let raw = r#"[{"variety": "大白菜", "market": "北京新发地农产品批发市场", "date": "2024-05-01"}]"#;
	let records = parse_records(raw).expect("Failed to parse array.");

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].market, "北京新发地农产品批发市场");
}

#[test]
fn rejects_empty_input() {
	assert!(parse_records("\n\n").is_err());
	assert!(parse_records("[]").is_err());
}

#[test]
fn reports_the_failing_line() {
	let err = parse_records("{\"品种\": \"大白菜\"}\nnot json\n")
		.expect_err("Expected a parse error.");

	assert!(format!("{err:#}").contains("line 2"));
}

#[test]
fn ingested_documents_satisfy_question_filters() {
	let records = parse_records(RECORDS).expect("Failed to parse fixture.");
	let documents: Vec<_> = records.iter().map(|record| record.to_document()).collect();
	let extractor = PatternExtractor::new().expect("Failed to compile extractor patterns.");
	let matching = |question: &str| {
		let filter = compile(&extractor.extract(question));

		documents.iter().filter(|document| filter.matches(&document.metadata)).count()
	};

	assert_eq!(matching("2024-05-01甘肃的白菜价格"), 1);
	assert_eq!(matching("5月2日的大白菜"), 2);
	assert_eq!(matching("北京新发地农产品批发市场的白菜"), 1);
	assert_eq!(matching("山东 寿光县 的白菜"), 1);
}

#[test]
fn parses_csv_with_dataset_headers() {
	let records = parse_csv_records(CSV_RECORDS).expect("Failed to parse CSV fixture.");

	assert_eq!(records.len(), 3);
	assert_eq!(records[0].market, "黑龙江哈尔滨哈达农副产品批发市场");
	assert_eq!(records[0].avg_price, "1.1");
	assert_eq!(records[1].date, "2024-05-01");
	assert_eq!(records[2].min_price, MISSING_VALUE);
	assert_eq!(records[2].max_price, "1.0");
}

#[test]
fn csv_columns_are_matched_by_name() {
	let raw = "发布日期,品种,批发市场\n2024-05-01,大白菜,北京新发地农产品批发市场\n";
	let records = parse_csv_records(raw).expect("Failed to parse CSV.");

	assert_eq!(records[0].market, "北京新发地农产品批发市场");
	assert_eq!(records[0].date, "2024-05-01");
	assert_eq!(records[0].avg_price, MISSING_VALUE);
}

#[test]
fn csv_without_rows_or_with_ragged_rows_is_rejected() {
	assert!(parse_csv_records("品种,批发市场\n").is_err());

	let err = parse_csv_records("品种,批发市场\n大白菜,北京新发地农产品批发市场\n大白菜\n")
		.expect_err("Expected a ragged row error.");

	assert!(format!("{err:#}").contains("row 2"));
}

#[test]
fn csv_records_satisfy_question_filters() {
	let records = parse_csv_records(CSV_RECORDS).expect("Failed to parse CSV fixture.");
	let documents: Vec<_> = records.iter().map(|record| record.to_document()).collect();
	let extractor = PatternExtractor::new().expect("Failed to compile extractor patterns.");
	let matching = |question: &str| {
		let filter = compile(&extractor.extract(question));

		documents.iter().filter(|document| filter.matches(&document.metadata)).count()
	};

	assert_eq!(matching("黑龙江的白菜价格"), 1);
	assert_eq!(matching("2024-05-01甘肃的白菜价格"), 1);
}

#[test]
fn format_follows_the_file_extension() {
	assert_eq!(InputFormat::from_path(Path::new("cabbage_prices.csv")), InputFormat::Csv);
	assert_eq!(InputFormat::from_path(Path::new("PRICES.CSV")), InputFormat::Csv);
	assert_eq!(InputFormat::from_path(Path::new("prices.jsonl")), InputFormat::Json);
	assert_eq!(InputFormat::from_path(Path::new("prices")), InputFormat::Json);
}
