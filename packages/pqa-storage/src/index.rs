use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
		DeleteCollectionBuilder, Distance, FieldType, Filter, PointStruct, Query, QueryPointsBuilder,
		UpsertPointsBuilder, Value, VectorParamsBuilder, value::Kind,
	},
};
use uuid::Uuid;

use crate::{
	Error, Result,
	qdrant::{CONTENT_PAYLOAD_KEY, QdrantStore},
};
use pqa_domain::{CompiledFilter, FilterField, RetrievedDocument};

/// Metadata attributes that receive a keyword payload index.
pub const INDEXED_FIELDS: [FilterField; 6] = [
	FilterField::Market,
	FilterField::Province,
	FilterField::City,
	FilterField::Date,
	FilterField::DateMonthDay,
	FilterField::Category,
];

/// `None` for an unconstrained filter; otherwise every clause becomes a `must` keyword match.
pub fn to_qdrant_filter(filter: &CompiledFilter) -> Option<Filter> {
	if filter.is_unconstrained() {
		return None;
	}

	Some(Filter::must(
		filter
			.clauses()
			.iter()
			.map(|clause| Condition::matches(clause.field.as_str(), clause.value.clone())),
	))
}

pub async fn search(
	store: &QdrantStore,
	vector: Vec<f32>,
	filter: &CompiledFilter,
	limit: u64,
) -> Result<Vec<RetrievedDocument>> {
	if vector.len() != store.vector_dim as usize {
		return Err(Error::InvalidArgument(format!(
			"Query vector has {} dimensions, collection expects {}.",
			vector.len(),
			store.vector_dim
		)));
	}

	let mut query = QueryPointsBuilder::new(store.collection.clone())
		.query(Query::new_nearest(vector))
		.with_payload(true)
		.limit(limit);

	if let Some(filter) = to_qdrant_filter(filter) {
		query = query.filter(filter);
	}

	let response = store.client.query(query).await?;
	let documents: Vec<RetrievedDocument> = response
		.result
		.into_iter()
		.filter_map(|point| document_from_payload(point.payload))
		.collect();

	tracing::debug!(
		collection = %store.collection,
		limit,
		returned = documents.len(),
		"Index query finished."
	);

	Ok(documents)
}

pub async fn upsert(
	store: &QdrantStore,
	documents: &[RetrievedDocument],
	vectors: Vec<Vec<f32>>,
) -> Result<usize> {
	if documents.len() != vectors.len() {
		return Err(Error::InvalidArgument(format!(
			"Got {} vectors for {} documents.",
			vectors.len(),
			documents.len()
		)));
	}
	if documents.is_empty() {
		return Ok(0);
	}

	let mut points = Vec::with_capacity(documents.len());

	for (document, vector) in documents.iter().zip(vectors) {
		if vector.len() != store.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Document vector has {} dimensions, collection expects {}.",
				vector.len(),
				store.vector_dim
			)));
		}

		points.push(PointStruct::new(
			point_id(document).to_string(),
			vector,
			document_payload(document),
		));
	}

	let count = points.len();

	store
		.client
		.upsert_points(UpsertPointsBuilder::new(store.collection.clone(), points).wait(true))
		.await?;

	Ok(count)
}

/// Creates the collection and its keyword indexes when missing. With `recreate`, an existing
/// collection is dropped first.
pub async fn ensure_collection(store: &QdrantStore, recreate: bool) -> Result<()> {
	let exists = store.client.collection_exists(store.collection.as_str()).await?;

	if exists && !recreate {
		return Ok(());
	}
	if exists {
		store.client.delete_collection(DeleteCollectionBuilder::new(store.collection.clone())).await?;

		tracing::info!(collection = %store.collection, "Dropped existing collection.");
	}

	store
		.client
		.create_collection(
			CreateCollectionBuilder::new(store.collection.clone())
				.vectors_config(VectorParamsBuilder::new(store.vector_dim as u64, Distance::Cosine)),
		)
		.await?;

	for field in INDEXED_FIELDS {
		store
			.client
			.create_field_index(CreateFieldIndexCollectionBuilder::new(
				store.collection.clone(),
				field.as_str(),
				FieldType::Keyword,
			))
			.await?;
	}

	tracing::info!(collection = %store.collection, dim = store.vector_dim, "Created collection.");

	Ok(())
}

pub async fn count(store: &QdrantStore) -> Result<u64> {
	let response =
		store.client.count(CountPointsBuilder::new(store.collection.clone()).exact(true)).await?;

	Ok(response.result.map(|result| result.count).unwrap_or(0))
}

/// Stable id derived from the document text, so re-ingesting a record overwrites its point.
pub fn point_id(document: &RetrievedDocument) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, document.content.as_bytes())
}

pub fn document_payload(document: &RetrievedDocument) -> Payload {
	let mut payload = Payload::new();

	payload.insert(CONTENT_PAYLOAD_KEY, document.content.clone());

	for (key, value) in &document.metadata {
		payload.insert(key.as_str(), value.clone());
	}

	payload
}

pub fn document_from_payload(payload: HashMap<String, Value>) -> Option<RetrievedDocument> {
	let mut content = None;
	let mut document = RetrievedDocument::new(String::new());

	for (key, value) in payload {
		let Some(text) = value_text(value) else {
			continue;
		};

		if key == CONTENT_PAYLOAD_KEY {
			content = Some(text);
		} else {
			document.metadata.insert(key, text);
		}
	}

	document.content = content?;

	Some(document)
}

fn value_text(value: Value) -> Option<String> {
	match value.kind? {
		Kind::StringValue(text) => Some(text),
		Kind::IntegerValue(number) => Some(number.to_string()),
		Kind::DoubleValue(number) => Some(number.to_string()),
		Kind::BoolValue(flag) => Some(flag.to_string()),
		_ => None,
	}
}
