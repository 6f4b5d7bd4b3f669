use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RagError, Result};
use crate::http::{join_url, JsonClient};
use crate::index::{
    EntryMetadata, IndexDescription, IndexEntry, IndexService, IndexSpec, Match, VectorIndex,
};

#[derive(Serialize)]
struct CreateCollection<'a> {
    vectors: VectorParams<'a>,
}

#[derive(Serialize)]
struct VectorParams<'a> {
    size: usize,
    distance: &'a str,
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: Option<T>,
}

#[derive(Deserialize)]
struct CollectionList {
    #[serde(default)]
    collections: Vec<CollectionName>,
}

#[derive(Deserialize)]
struct CollectionName {
    name: String,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: OwnedVectorParams,
}

#[derive(Deserialize)]
struct OwnedVectorParams {
    size: usize,
    distance: String,
}

#[derive(Serialize)]
struct PointPayload<'a> {
    id: &'a str,
    #[serde(flatten)]
    metadata: &'a EntryMetadata,
}

#[derive(Serialize)]
struct Point<'a> {
    id: u64,
    vector: &'a [f32],
    payload: PointPayload<'a>,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: [Point<'a>; 1],
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct QueryResult {
    points: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    id: Value,
    #[serde(default)]
    score: f32,
    payload: Option<Value>,
}

/// Self-hosted Qdrant; collections stand in for indexes.
pub struct QdrantService {
    http: JsonClient,
    base_url: String,
}

impl QdrantService {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self> {
        let headers: Vec<(&str, &str)> = api_key.map(|k| ("api-key", k)).into_iter().collect();
        let http = JsonClient::new(&headers).map_err(RagError::provisioning)?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    fn collection_url(&self, name: &str) -> String {
        join_url(&self.base_url, &format!("collections/{}", name))
    }
}

impl IndexService for QdrantService {
    fn list_index_names(&self) -> Result<HashSet<String>> {
        let url = join_url(&self.base_url, "collections");
        let res: QdrantResponse<CollectionList> =
            self.http.get_json(&url).map_err(RagError::provisioning)?;
        Ok(res
            .result
            .map(|r| r.collections.into_iter().map(|c| c.name).collect())
            .unwrap_or_default())
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let body = CreateCollection {
            vectors: VectorParams {
                size: spec.dimension,
                distance: spec.metric.as_qdrant(),
            },
        };
        self.http
            .put_json::<Value, _>(&self.collection_url(&spec.name), &body)
            .map_err(RagError::provisioning)?;
        Ok(())
    }

    fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let res: QdrantResponse<CollectionInfo> = self
            .http
            .get_json(&self.collection_url(name))
            .map_err(RagError::provisioning)?;
        let info = res
            .result
            .ok_or_else(|| RagError::Provisioning(format!("collection `{}` not found", name)))?;
        let vectors = info.config.params.vectors;
        Ok(IndexDescription {
            name: name.to_string(),
            dimension: vectors.size,
            metric: vectors.distance.parse().map_err(|_| {
                RagError::Provisioning(format!(
                    "collection `{}` uses unsupported distance `{}`",
                    name, vectors.distance
                ))
            })?,
            host: None,
        })
    }

    fn open_index(&self, description: &IndexDescription) -> Result<Arc<dyn VectorIndex>> {
        Ok(Arc::new(QdrantCollection {
            name: description.name.clone(),
            url: self.collection_url(&description.name),
            http: self.http.clone(),
        }))
    }
}

pub struct QdrantCollection {
    name: String,
    url: String,
    http: JsonClient,
}

impl VectorIndex for QdrantCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn upsert(&self, entry: &IndexEntry) -> Result<()> {
        // Qdrant point ids must be integers or UUIDs; the `chunk-N` id rides in the payload.
        let body = UpsertPoints {
            points: [Point {
                id: entry.metadata.chunk_id as u64,
                vector: &entry.values,
                payload: PointPayload {
                    id: &entry.id,
                    metadata: &entry.metadata,
                },
            }],
        };
        let url = format!("{}/points?wait=true", self.url);
        self.http
            .put_json::<Value, _>(&url, &body)
            .map_err(|e| RagError::Upsert {
                id: entry.id.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Match>> {
        let url = format!("{}/points/query", self.url);
        let req = QueryRequest {
            query: vector,
            limit: top_k,
            with_payload: true,
        };
        let res: QdrantResponse<QueryResult> =
            self.http.post_json(&url, &req).map_err(RagError::retrieval)?;
        Ok(res
            .result
            .map(|r| r.points.into_iter().map(into_match).collect())
            .unwrap_or_default())
    }
}

fn into_match(hit: Hit) -> Match {
    let payload = hit.payload.unwrap_or(Value::Null);
    let id = payload
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| match &hit.id {
            Value::String(s) => s.clone(),
            other => format!("chunk-{}", other),
        });
    Match {
        id,
        score: hit.score,
        metadata: payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upsert_uses_numeric_point_id_and_flat_payload() {
        let metadata = EntryMetadata {
            chunk_id: 7,
            text: "survival rate".to_string(),
            page: 3,
        };
        let body = UpsertPoints {
            points: [Point {
                id: 7,
                vector: &[0.25],
                payload: PointPayload {
                    id: "chunk-7",
                    metadata: &metadata,
                },
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"points": [{
                "id": 7,
                "vector": [0.25],
                "payload": {"id": "chunk-7", "chunk_id": 7, "text": "survival rate", "page": 3}
            }]})
        );
    }

    #[test]
    fn parses_collection_info() {
        let res: QdrantResponse<CollectionInfo> = serde_json::from_value(json!({
            "result": {
                "status": "green",
                "config": {"params": {"vectors": {"size": 768, "distance": "Euclid"}}}
            },
            "status": "ok",
            "time": 0.001
        }))
        .unwrap();
        let vectors = res.result.unwrap().config.params.vectors;
        assert_eq!(vectors.size, 768);
        assert_eq!(vectors.distance, "Euclid");
    }

    #[test]
    fn hits_recover_string_ids() {
        let res: QdrantResponse<QueryResult> = serde_json::from_value(json!({
            "result": {"points": [
                {"id": 2, "score": 0.9, "payload": {"id": "chunk-2", "chunk_id": 2, "text": "x", "page": 1}},
                {"id": 5, "score": 0.7}
            ]}
        }))
        .unwrap();
        let matches: Vec<Match> = res.result.unwrap().points.into_iter().map(into_match).collect();
        assert_eq!(matches[0].id, "chunk-2");
        assert_eq!(matches[0].metadata["text"], "x");
        assert_eq!(matches[1].id, "chunk-5");
    }
}
