//! Qdrant vector store over the REST API

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{CollectionInfo, IndexPoint, ScoredPoint};

use super::retry::{retry_with_backoff, DEFAULT_BASE_DELAY};
use super::vector_store::VectorStoreProvider;

/// Qdrant client bound to one collection
pub struct QdrantStore {
    client: Client,
    base_url: String,
    collection: String,
    upsert_retries: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

impl QdrantStore {
    /// Create a store from config; no request is made until first use
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url(),
            collection: config.collection.clone(),
            upsert_retries: config.upsert_retries,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("{} request failed: {}", what, e)))
    }
}

/// Turn a non-2xx response into a `VectorDb` error carrying the body
async fn check_status(response: Response, what: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::vector_db(format!(
        "{} failed: HTTP {} - {}",
        what, status, body
    )))
}

/// Extract size and distance from a `GET /collections/{name}` body
///
/// Only single unnamed vector configs are supported.
pub fn parse_collection_info(body: &Value) -> Result<CollectionInfo> {
    let vectors = &body["result"]["config"]["params"]["vectors"];

    let vector_size = vectors["size"]
        .as_u64()
        .ok_or_else(|| Error::vector_db("collection info has no vectors.size (named vectors are not supported)"))?;
    let distance = vectors["distance"]
        .as_str()
        .ok_or_else(|| Error::vector_db("collection info has no vectors.distance"))?;

    Ok(CollectionInfo {
        vector_size: vector_size as usize,
        distance: distance.to_string(),
    })
}

#[async_trait]
impl VectorStoreProvider for QdrantStore {
    async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        let response = self
            .send(self.client.get(self.collection_url()), "Collection info")
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: Value = check_status(response, "Collection info").await?.json().await?;
        parse_collection_info(&body).map(Some)
    }

    async fn create_collection(&self, dimensions: usize) -> Result<()> {
        tracing::info!(
            "Creating collection '{}' ({} dims, cosine)",
            self.collection,
            dimensions
        );
        let request = self.client.put(self.collection_url()).json(&json!({
            "vectors": {"size": dimensions, "distance": "Cosine"}
        }));
        check_status(self.send(request, "Create collection").await?, "Create collection").await?;
        Ok(())
    }

    async fn delete_collection(&self) -> Result<()> {
        tracing::info!("Deleting collection '{}'", self.collection);
        let response = self
            .send(self.client.delete(self.collection_url()), "Delete collection")
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response, "Delete collection").await?;
        Ok(())
    }

    async fn upsert(&self, points: &[IndexPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/points?wait=true", self.collection_url());
        let body = json!({ "points": points });
        let (url, body) = (&url, &body);

        retry_with_backoff("Upsert", self.upsert_retries, DEFAULT_BASE_DELAY, || async move {
            let request = self.client.put(url).json(body);
            check_status(self.send(request, "Upsert").await?, "Upsert").await?;
            Ok(())
        })
        .await
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let url = format!("{}/points/search", self.collection_url());
        let request = self.client.post(&url).json(&json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        }));
        let response = self.send(request, "Search").await?;

        // Nothing ingested yet
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Collection '{}' does not exist", self.collection);
            return Ok(Vec::new());
        }

        let parsed: SearchResponse = check_status(response, "Search").await?.json().await?;
        Ok(parsed.result)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/collections", self.base_url);
        let response = self.send(self.client.get(&url), "Health check").await?;
        if response.status().is_success() {
            Ok(true)
        } else {
            Err(Error::vector_db(format!(
                "Health check failed: HTTP {}",
                response.status()
            )))
        }
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
