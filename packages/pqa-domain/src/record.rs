use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
	compile::FilterField,
	document::RetrievedDocument,
	filter::{PROVINCES, scan_admin_name},
};

pub const MISSING_VALUE: &str = "无数据";
pub const UNKNOWN_VALUE: &str = "未知";

/// One published wholesale price row. Accepts the source dataset's Chinese column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
	#[serde(alias = "品种", default = "missing_value", deserialize_with = "lenient_text")]
	pub variety: String,
	#[serde(alias = "批发市场", default = "missing_value", deserialize_with = "lenient_text")]
	pub market: String,
	#[serde(alias = "最低价", default = "missing_value", deserialize_with = "lenient_text")]
	pub min_price: String,
	#[serde(alias = "最高价", default = "missing_value", deserialize_with = "lenient_text")]
	pub max_price: String,
	#[serde(alias = "平均价", default = "missing_value", deserialize_with = "lenient_text")]
	pub avg_price: String,
	#[serde(alias = "发布日期", default = "missing_value", deserialize_with = "lenient_text")]
	pub date: String,
}
impl PriceRecord {
	pub fn text(&self) -> String {
		format!(
			"品种：{}，批发市场：{}，最低价：{}元，最高价：{}元，平均价：{}元，发布日期：{}",
			self.variety, self.market, self.min_price, self.max_price, self.avg_price, self.date
		)
	}

	/// Renders the record with the metadata attributes the filtered path matches on.
	pub fn to_document(&self) -> RetrievedDocument {
		let (year, month_day) = match split_iso_date(&self.date) {
			Some((year, month, day)) => (year.to_string(), format!("{month}-{day}")),
			None => (UNKNOWN_VALUE.to_string(), self.date.clone()),
		};

		RetrievedDocument::new(self.text())
			.with_metadata(FilterField::Category.as_str(), self.variety.as_str())
			.with_metadata(FilterField::Market.as_str(), self.market.as_str())
			.with_metadata(FilterField::Province.as_str(), market_province(&self.market))
			.with_metadata(FilterField::City.as_str(), market_city(&self.market))
			.with_metadata(FilterField::Date.as_str(), self.date.as_str())
			.with_metadata(FilterField::DateMonthDay.as_str(), month_day)
			.with_metadata("year", year)
			.with_metadata("min_price", self.min_price.as_str())
			.with_metadata("max_price", self.max_price.as_str())
			.with_metadata("avg_price", self.avg_price.as_str())
	}
}

/// Market names lead with their province. The first two characters stand in for it when no
/// entry of [`PROVINCES`] prefixes the name.
pub fn market_province(market: &str) -> String {
	if market == MISSING_VALUE || market.chars().count() < 2 {
		return UNKNOWN_VALUE.to_string();
	}
	if let Some(province) = PROVINCES.iter().find(|province| market.starts_with(*province)) {
		return province.to_string();
	}

	market.chars().take(2).collect()
}

pub fn market_city(market: &str) -> String {
	let rest = PROVINCES
		.iter()
		.find_map(|province| market.strip_prefix(province))
		.unwrap_or(market)
		.trim_start_matches(['省', '市', '自', '治', '区']);
	let chars: Vec<char> = rest.chars().collect();

	scan_admin_name(&chars, |next| next != Some('场'))
		.unwrap_or_else(|| UNKNOWN_VALUE.to_string())
}

fn split_iso_date(date: &str) -> Option<(&str, &str, &str)> {
	let head = date.get(..10)?;
	let bytes = head.as_bytes();
	let digits_at = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);

	if bytes[4] != b'-' || bytes[7] != b'-' || !digits_at(0..4) || !digits_at(5..7) || !digits_at(8..10)
	{
		return None;
	}

	Some((&head[..4], &head[5..7], &head[8..10]))
}

fn missing_value() -> String {
	MISSING_VALUE.to_string()
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	let text = match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => MISSING_VALUE.to_string(),
		Some(Value::String(text)) if text.trim().is_empty() => MISSING_VALUE.to_string(),
		Some(Value::String(text)) => text.trim().to_string(),
		Some(other) => other.to_string(),
	};

	Ok(text)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_iso_dates() {
		assert_eq!(split_iso_date("2024-05-01"), Some(("2024", "05", "01")));
		assert_eq!(split_iso_date("2024/05/01"), None);
		assert_eq!(split_iso_date("无数据"), None);
	}

	#[test]
	fn province_uses_market_prefix() {
		assert_eq!(market_province("甘肃兰州国际高原夏菜副食品批发市场"), "甘肃");
		assert_eq!(market_province("黑龙江哈尔滨哈达农副产品批发市场"), "黑龙江");
		assert_eq!(market_province("内蒙古包头友谊蔬菜批发市场"), "内蒙古");
		assert_eq!(market_province("寿光农产品物流园"), "寿光");
		assert_eq!(market_province("兰"), UNKNOWN_VALUE);
		assert_eq!(market_province(MISSING_VALUE), UNKNOWN_VALUE);
	}

	#[test]
	fn city_skips_province_and_market_suffix() {
		assert_eq!(market_city("河北省石家庄市桥西蔬菜批发市场"), "石家庄");
		assert_eq!(market_city("山东寿光县农产品物流园"), "寿光");
		assert_eq!(market_city("江苏无锡朝阳农产品大市场"), UNKNOWN_VALUE);
	}
}
