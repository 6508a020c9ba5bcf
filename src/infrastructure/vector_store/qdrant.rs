//! Qdrant REST vector store

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::vector_store::{
    Distance, Payload, PointFilter, PointSelector, ScoredPoint, StoredPoint, VectorPoint,
    VectorStore,
};
use crate::domain::DomainError;
use crate::infrastructure::llm::{HttpClientTrait, JsonResponse};

const PROVIDER_NAME: &str = "qdrant";

/// Vector store backed by the Qdrant HTTP API
#[derive(Debug)]
pub struct QdrantVectorStore<C: HttpClientTrait> {
    client: C,
    base_url: String,
    api_key: Option<String>,
}

impl<C: HttpClientTrait> QdrantVectorStore<C> {
    pub fn new(client: C, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{}", self.base_url, collection)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];

        if let Some(ref key) = self.api_key {
            headers.push(("api-key", key.as_str()));
        }

        headers
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<JsonResponse, DomainError> {
        self.client
            .send_json(method, url, self.headers(), body)
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))
    }

    async fn request_ok(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, DomainError> {
        self.request(method, url, body)
            .await?
            .into_success(PROVIDER_NAME)
            .map_err(|e| DomainError::vector_store(e.to_string()))
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<bool, DomainError> {
        let body = json!({
            "vectors": { "size": dimensions, "distance": distance.as_str() }
        });

        let response = self
            .request(Method::PUT, &self.collection_url(collection), Some(&body))
            .await?;

        if response.is_success() {
            info!(collection = %collection, dimensions, "Created vector collection");
            return Ok(true);
        }

        if response.status == 409 || response.body.to_string().contains("already exists") {
            return Ok(false);
        }

        Err(DomainError::vector_store(format!(
            "Failed to create collection '{}': HTTP {}: {}",
            collection, response.status, response.body
        )))
    }
}

fn point_id(id: &str) -> Value {
    match id.parse::<u64>() {
        Ok(num) => json!(num),
        Err(_) => json!(id),
    }
}

fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn filter_json(filter: &PointFilter) -> Value {
    let must: Vec<Value> = filter
        .conditions()
        .iter()
        .map(|(key, value)| json!({ "key": key, "match": { "value": value } }))
        .collect();

    json!({ "must": must })
}

#[async_trait]
impl<C: HttpClientTrait> VectorStore for QdrantVectorStore<C> {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<bool, DomainError> {
        let existing = self
            .request(Method::GET, &self.collection_url(collection), None)
            .await?;

        if existing.is_success() {
            debug!(collection = %collection, "Vector collection already exists");
            return Ok(false);
        }

        self.create_collection(collection, dimensions, distance).await
    }

    async fn recreate_collection(
        &self,
        collection: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<(), DomainError> {
        let deleted = self
            .request(Method::DELETE, &self.collection_url(collection), None)
            .await?;

        if !deleted.is_success() && deleted.status != 404 {
            return Err(DomainError::vector_store(format!(
                "Failed to delete collection '{}': HTTP {}",
                collection, deleted.status
            )));
        }

        self.create_collection(collection, dimensions, distance)
            .await
            .map(|_| ())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), DomainError> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<Value> = points
            .into_iter()
            .map(|p| json!({ "id": point_id(&p.id), "vector": p.vector, "payload": p.payload }))
            .collect();

        let url = format!("{}/points?wait=true", self.collection_url(collection));
        self.request_ok(Method::PUT, &url, Some(&json!({ "points": points })))
            .await
            .map(|_| ())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&PointFilter>,
    ) -> Result<Vec<ScoredPoint>, DomainError> {
        let mut body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });

        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            body["filter"] = filter_json(filter);
        }

        let url = format!("{}/points/search", self.collection_url(collection));
        let json = self.request_ok(Method::POST, &url, Some(&body)).await?;

        let response: SearchResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::vector_store(format!("Failed to parse search response: {}", e))
        })?;

        Ok(response
            .result
            .into_iter()
            .map(|hit| ScoredPoint {
                id: id_to_string(&hit.id),
                score: hit.score,
                payload: hit.payload.unwrap_or_default(),
            })
            .collect())
    }

    async fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<StoredPoint>, DomainError> {
        let body = json!({
            "limit": limit,
            "with_payload": true,
            "with_vector": false,
        });

        let url = format!("{}/points/scroll", self.collection_url(collection));
        let json = self.request_ok(Method::POST, &url, Some(&body)).await?;

        let response: ScrollResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::vector_store(format!("Failed to parse scroll response: {}", e))
        })?;

        Ok(response
            .result
            .points
            .into_iter()
            .map(|p| StoredPoint {
                id: id_to_string(&p.id),
                payload: p.payload.unwrap_or_default(),
            })
            .collect())
    }

    async fn delete(&self, collection: &str, selector: PointSelector) -> Result<(), DomainError> {
        let body = match selector {
            PointSelector::Ids(ids) => {
                json!({ "points": ids.iter().map(|id| point_id(id)).collect::<Vec<_>>() })
            }
            PointSelector::Filter(filter) => json!({ "filter": filter_json(&filter) }),
        };

        let url = format!("{}/points/delete?wait=true", self.collection_url(collection));
        self.request_ok(Method::POST, &url, Some(&body))
            .await
            .map(|_| ())
    }
}

// Qdrant API types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: Value,
    score: f32,
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct ScrollResponse {
    result: ScrollResult,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<ScrollPoint>,
}

#[derive(Debug, Deserialize)]
struct ScrollPoint {
    id: Value,
    payload: Option<Payload>,
}
