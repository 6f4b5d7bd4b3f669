use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{RagError, Result};
use crate::http::{join_url, JsonClient};
use crate::index::{
    EntryMetadata, IndexDescription, IndexEntry, IndexService, IndexSpec, Match, VectorIndex,
};

const API_VERSION: &str = "2024-07";
const READY_POLL_ATTEMPTS: u32 = 120;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Serialize)]
struct CreateIndex<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    serverless: Serverless<'a>,
}

#[derive(Serialize)]
struct Serverless<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Deserialize)]
struct IndexModel {
    name: String,
    dimension: usize,
    metric: String,
    host: Option<String>,
    status: Option<IndexStatus>,
}

#[derive(Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct UpsertVectors<'a> {
    vectors: [VectorRecord<'a>; 1],
}

#[derive(Serialize)]
struct VectorRecord<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a EntryMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Deserialize)]
struct ScoredVector {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Value,
}

/// Pinecone control plane (`api.pinecone.io`).
pub struct PineconeService {
    http: JsonClient,
    controller_url: String,
}

impl PineconeService {
    pub fn new(api_key: &str, controller_url: &str) -> Result<Self> {
        let http = JsonClient::new(&[("Api-Key", api_key), ("X-Pinecone-API-Version", API_VERSION)])
            .map_err(RagError::provisioning)?;
        Ok(Self {
            http,
            controller_url: controller_url.to_string(),
        })
    }

    fn fetch_index(&self, name: &str) -> Result<IndexModel> {
        let url = join_url(&self.controller_url, &format!("indexes/{}", name));
        self.http.get_json(&url).map_err(RagError::provisioning)
    }

    fn wait_until_ready(&self, name: &str) -> Result<()> {
        for attempt in 1..=READY_POLL_ATTEMPTS {
            let model = self.fetch_index(name)?;
            if model.status.map(|s| s.ready).unwrap_or(false) {
                info!(index = name, attempt, "index is ready");
                return Ok(());
            }
            debug!(index = name, attempt, "index not ready yet");
            thread::sleep(READY_POLL_INTERVAL);
        }
        Err(RagError::Provisioning(format!(
            "index `{}` was not ready after {} seconds",
            name,
            READY_POLL_ATTEMPTS as u64 * READY_POLL_INTERVAL.as_secs()
        )))
    }
}

impl IndexService for PineconeService {
    fn list_index_names(&self) -> Result<HashSet<String>> {
        let url = join_url(&self.controller_url, "indexes");
        let list: IndexList = self.http.get_json(&url).map_err(RagError::provisioning)?;
        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let url = join_url(&self.controller_url, "indexes");
        let body = CreateIndex {
            name: &spec.name,
            dimension: spec.dimension,
            metric: spec.metric.as_pinecone(),
            spec: ServerlessSpec {
                serverless: Serverless {
                    cloud: &spec.hosting.cloud,
                    region: &spec.hosting.region,
                },
            },
        };
        self.http
            .post_json::<Value, _>(&url, &body)
            .map_err(RagError::provisioning)?;
        self.wait_until_ready(&spec.name)
    }

    fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        describe(self.fetch_index(name)?)
    }

    fn open_index(&self, description: &IndexDescription) -> Result<Arc<dyn VectorIndex>> {
        let host = description.host.as_deref().ok_or_else(|| {
            RagError::Provisioning(format!("index `{}` has no data plane host", description.name))
        })?;
        Ok(Arc::new(PineconeIndex {
            name: description.name.clone(),
            base_url: host_url(host),
            http: self.http.clone(),
        }))
    }
}

fn describe(model: IndexModel) -> Result<IndexDescription> {
    Ok(IndexDescription {
        metric: model.metric.parse().map_err(|_| {
            RagError::Provisioning(format!(
                "index `{}` uses unsupported metric `{}`",
                model.name, model.metric
            ))
        })?,
        name: model.name,
        dimension: model.dimension,
        host: model.host,
    })
}

fn host_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Pinecone data plane for one index.
pub struct PineconeIndex {
    name: String,
    base_url: String,
    http: JsonClient,
}

impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn upsert(&self, entry: &IndexEntry) -> Result<()> {
        let url = join_url(&self.base_url, "vectors/upsert");
        let body = UpsertVectors {
            vectors: [VectorRecord {
                id: &entry.id,
                values: &entry.values,
                metadata: &entry.metadata,
            }],
        };
        self.http
            .post_json::<Value, _>(&url, &body)
            .map_err(|e| RagError::Upsert {
                id: entry.id.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Match>> {
        let url = join_url(&self.base_url, "query");
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };
        let res: QueryResponse = self.http.post_json(&url, &body).map_err(RagError::retrieval)?;
        Ok(into_matches(res))
    }
}

fn into_matches(res: QueryResponse) -> Vec<Match> {
    res.matches
        .into_iter()
        .map(|m| Match {
            id: m.id,
            score: m.score,
            metadata: m.metadata,
        })
        .collect()
}
