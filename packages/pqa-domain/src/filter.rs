//! Free-text question parsing into typed filter predicates.
//!
//! Matching rules, in priority order:
//! - a full `YYYY-MM-DD` date suppresses month-day detection;
//! - the province is the first entry of [`PROVINCES`] found anywhere in the text;
//! - a city name excludes its administrative suffix, a market name includes its suffix;
//! - every category variant normalizes to [`CANONICAL_CATEGORY`].

use regex::Regex;
use serde::Serialize;

pub const PROVINCES: [&str; 31] = [
	"北京", "天津", "上海", "重庆", "河北", "山西", "内蒙古", "辽宁", "吉林", "黑龙江", "江苏", "浙江",
	"安徽", "福建", "江西", "山东", "河南", "湖北", "湖南", "广东", "广西", "海南", "四川", "贵州",
	"云南", "西藏", "陕西", "甘肃", "青海", "宁夏", "新疆",
];
pub const CATEGORY_VARIANTS: [&str; 5] = ["大白菜", "白菜", "圆白菜", "洋白菜", "莲花白"];
pub const CANONICAL_CATEGORY: &str = "大白菜";
pub const CITY_SUFFIXES: [char; 4] = ['市', '州', '县', '区'];

const DATE_EXACT_PATTERN: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2}";
const DATE_MONTH_DAY_PATTERN: &str = r"([0-9]{1,2})月([0-9]{1,2})日";
const MARKET_PATTERN: &str = r"[\x{4E00}-\x{9FFF}A-Za-z0-9·（）()\-]{2,}?(?:市场|公司|批发市场|交易中心|有限公司)";

pub trait PredicateExtractor
where
	Self: Send + Sync,
{
	fn extract(&self, question: &str) -> FilterPredicates;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKey {
	Market,
	Province,
	City,
	DateExact,
	DateMonthDay,
	Category,
}
impl PredicateKey {
	pub const ALL: [Self; 6] = [
		Self::Market,
		Self::Province,
		Self::City,
		Self::DateExact,
		Self::DateMonthDay,
		Self::Category,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Market => "market",
			Self::Province => "province",
			Self::City => "city",
			Self::DateExact => "date_exact",
			Self::DateMonthDay => "date_month_day",
			Self::Category => "category",
		}
	}
}

/// At most one value per key; `None` leaves the key unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterPredicates {
	pub market: Option<String>,
	pub province: Option<String>,
	pub city: Option<String>,
	pub date_exact: Option<String>,
	pub date_month_day: Option<String>,
	pub category: Option<String>,
}
impl FilterPredicates {
	pub fn get(&self, key: PredicateKey) -> Option<&str> {
		let value = match key {
			PredicateKey::Market => &self.market,
			PredicateKey::Province => &self.province,
			PredicateKey::City => &self.city,
			PredicateKey::DateExact => &self.date_exact,
			PredicateKey::DateMonthDay => &self.date_month_day,
			PredicateKey::Category => &self.category,
		};

		value.as_deref()
	}

	pub fn is_empty(&self) -> bool {
		PredicateKey::ALL.iter().all(|key| self.get(*key).is_none())
	}
}

pub struct PatternExtractor {
	date_exact: Regex,
	date_month_day: Regex,
	market: Regex,
}
impl PatternExtractor {
	pub fn new() -> Result<Self, regex::Error> {
		Ok(Self {
			date_exact: Regex::new(DATE_EXACT_PATTERN)?,
			date_month_day: Regex::new(DATE_MONTH_DAY_PATTERN)?,
			market: Regex::new(MARKET_PATTERN)?,
		})
	}

	fn extract_dates(&self, question: &str) -> (Option<String>, Option<String>) {
		if let Some(found) = self.date_exact.find(question) {
			return (Some(found.as_str().to_string()), None);
		}

		let month_day = self.date_month_day.captures(question).and_then(|caps| {
			let month: u32 = caps.get(1)?.as_str().parse().ok()?;
			let day: u32 = caps.get(2)?.as_str().parse().ok()?;

			Some(format!("{month:02}-{day:02}"))
		});

		(None, month_day)
	}

	fn extract_market(&self, question: &str) -> Option<String> {
		self.market.find(question).map(|found| found.as_str().to_string())
	}
}
impl PredicateExtractor for PatternExtractor {
	fn extract(&self, question: &str) -> FilterPredicates {
		let (date_exact, date_month_day) = self.extract_dates(question);

		FilterPredicates {
			market: self.extract_market(question),
			province: extract_province(question),
			city: extract_city(question),
			date_exact,
			date_month_day,
			category: extract_category(question),
		}
	}
}

pub fn extract_province(question: &str) -> Option<String> {
	PROVINCES.iter().find(|province| question.contains(*province)).map(|p| p.to_string())
}

/// 2-3 ideographs followed by a suffix from [`CITY_SUFFIXES`] that is not itself followed by a
/// word character. The suffix is not part of the result.
pub fn extract_city(question: &str) -> Option<String> {
	let chars: Vec<char> = question.chars().collect();

	scan_admin_name(&chars, |next| next.is_none_or(|c| !is_word_char(c)))
}

pub fn extract_category(question: &str) -> Option<String> {
	CATEGORY_VARIANTS
		.iter()
		.any(|variant| question.contains(variant))
		.then(|| CANONICAL_CATEGORY.to_string())
}

pub(crate) fn is_ideograph(c: char) -> bool {
	('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Leftmost scan for an ideographic name directly before an administrative suffix, trying the
/// longer name first at each position. `accept_next` sees the character after the suffix.
pub(crate) fn scan_admin_name(
	chars: &[char],
	accept_next: impl Fn(Option<char>) -> bool,
) -> Option<String> {
	for start in 0..chars.len() {
		for len in [3, 2] {
			let end = start + len;
			let Some(suffix) = chars.get(end) else {
				continue;
			};

			if !CITY_SUFFIXES.contains(suffix) || !chars[start..end].iter().all(|c| is_ideograph(*c))
			{
				continue;
			}
			if accept_next(chars.get(end + 1).copied()) {
				return Some(chars[start..end].iter().collect());
			}
		}
	}

	None
}

fn is_word_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_'
}
