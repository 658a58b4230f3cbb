use std::collections::BTreeMap;

use serde_json::Value;

use crate::filter::FilterPredicates;

/// Metadata attributes the index stores for every price record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
	Market,
	Province,
	City,
	Date,
	DateMonthDay,
	Category,
}
impl FilterField {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Market => "market",
			Self::Province => "province",
			Self::City => "city",
			Self::Date => "date",
			Self::DateMonthDay => "date_month_day",
			Self::Category => "category",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqClause {
	pub field: FilterField,
	pub value: String,
}
impl EqClause {
	pub fn new(field: FilterField, value: impl Into<String>) -> Self {
		Self { field, value: value.into() }
	}

	fn to_value(&self) -> Value {
		serde_json::json!({ "op": "eq", "field": self.field.as_str(), "value": self.value })
	}
}

/// Equality clauses joined by conjunction.
///
/// `Unconstrained` matches every document; there is no variant that matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompiledFilter {
	#[default]
	Unconstrained,
	Clause(EqClause),
	And(Vec<EqClause>),
}
impl CompiledFilter {
	pub fn is_unconstrained(&self) -> bool {
		matches!(self, Self::Unconstrained)
	}

	pub fn clauses(&self) -> &[EqClause] {
		match self {
			Self::Unconstrained => &[],
			Self::Clause(clause) => std::slice::from_ref(clause),
			Self::And(clauses) => clauses,
		}
	}

	pub fn matches(&self, metadata: &BTreeMap<String, String>) -> bool {
		self.clauses()
			.iter()
			.all(|clause| metadata.get(clause.field.as_str()).is_some_and(|v| *v == clause.value))
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Unconstrained => Value::Null,
			Self::Clause(clause) => clause.to_value(),
			Self::And(clauses) => serde_json::json!({
				"op": "and",
				"args": Value::Array(clauses.iter().map(EqClause::to_value).collect()),
			}),
		}
	}

	fn from_clauses(mut clauses: Vec<EqClause>) -> Self {
		match clauses.len() {
			0 => Self::Unconstrained,
			1 => clauses.pop().map(Self::Clause).unwrap_or_default(),
			_ => Self::And(clauses),
		}
	}
}

/// Market outranks province and city; an exact date outranks a month-day.
pub fn compile(predicates: &FilterPredicates) -> CompiledFilter {
	let mut clauses = Vec::new();

	if let Some(market) = predicates.market.as_deref() {
		clauses.push(EqClause::new(FilterField::Market, market));
	} else {
		if let Some(province) = predicates.province.as_deref() {
			clauses.push(EqClause::new(FilterField::Province, province));
		}
		if let Some(city) = predicates.city.as_deref() {
			clauses.push(EqClause::new(FilterField::City, city));
		}
	}

	if let Some(date) = predicates.date_exact.as_deref() {
		clauses.push(EqClause::new(FilterField::Date, date));
	} else if let Some(month_day) = predicates.date_month_day.as_deref() {
		clauses.push(EqClause::new(FilterField::DateMonthDay, month_day));
	}

	if let Some(category) = predicates.category.as_deref() {
		clauses.push(EqClause::new(FilterField::Category, category));
	}

	CompiledFilter::from_clauses(clauses)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_clause_is_not_wrapped() {
		let predicates =
			FilterPredicates { category: Some("大白菜".to_string()), ..Default::default() };
		let filter = compile(&predicates);

		assert_eq!(filter, CompiledFilter::Clause(EqClause::new(FilterField::Category, "大白菜")));
		assert_eq!(
			filter.to_value(),
			serde_json::json!({ "op": "eq", "field": "category", "value": "大白菜" })
		);
	}

	#[test]
	fn unconstrained_matches_any_metadata() {
		assert!(CompiledFilter::Unconstrained.matches(&BTreeMap::new()));
	}

	#[test]
	fn conjunction_requires_every_clause() {
		let filter = CompiledFilter::And(vec![
			EqClause::new(FilterField::Province, "甘肃"),
			EqClause::new(FilterField::Category, "大白菜"),
		]);
		let mut metadata = BTreeMap::new();

		metadata.insert("province".to_string(), "甘肃".to_string());

		assert!(!filter.matches(&metadata));

		metadata.insert("category".to_string(), "大白菜".to_string());

		assert!(filter.matches(&metadata));
	}
}
