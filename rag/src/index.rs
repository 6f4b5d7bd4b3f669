use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{RagError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Euclidean,
    Cosine,
    DotProduct,
}

impl Metric {
    pub fn as_pinecone(self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Cosine => "cosine",
            Metric::DotProduct => "dotproduct",
        }
    }

    pub fn as_qdrant(self) -> &'static str {
        match self {
            Metric::Euclidean => "Euclid",
            Metric::Cosine => "Cosine",
            Metric::DotProduct => "Dot",
        }
    }
}

impl FromStr for Metric {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" | "euclid" => Ok(Metric::Euclidean),
            "cosine" => Ok(Metric::Cosine),
            "dotproduct" | "dot" => Ok(Metric::DotProduct),
            other => Err(RagError::Config(format!("unknown distance metric `{}`", other))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_pinecone())
    }
}

/// Where a managed index is hosted. Ignored by self-hosted backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostingSpec {
    pub cloud: String,
    pub region: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub hosting: HostingSpec,
}

/// What the service reports about an existing index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub host: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryMetadata {
    pub chunk_id: usize,
    pub text: String,
    pub page: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    pub fn entry_id(chunk_id: usize) -> String {
        format!("chunk-{}", chunk_id)
    }
}

/// One nearest-neighbour hit, best first. Metadata is kept loose because
/// backends round-trip numbers differently (Pinecone returns `7.0` for `7`).
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub id: String,
    pub score: f32,
    pub metadata: Value,
}

/// Handle to one provisioned index.
pub trait VectorIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Insert or overwrite by `entry.id`.
    fn upsert(&self, entry: &IndexEntry) -> Result<()>;

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Match>>;
}

/// Control plane of a vector index service.
pub trait IndexService: Send + Sync {
    fn list_index_names(&self) -> Result<HashSet<String>>;

    fn create_index(&self, spec: &IndexSpec) -> Result<()>;

    fn describe_index(&self, name: &str) -> Result<IndexDescription>;

    fn open_index(&self, description: &IndexDescription) -> Result<Arc<dyn VectorIndex>>;
}

pub fn ensure_index(service: &dyn IndexService, spec: &IndexSpec) -> Result<Arc<dyn VectorIndex>> {
    let names = service.list_index_names()?;
    if names.contains(&spec.name) {
        info!(index = %spec.name, "index already exists");
    } else {
        info!(
            index = %spec.name,
            dimension = spec.dimension,
            metric = %spec.metric,
            "creating index"
        );
        service.create_index(spec)?;
    }

    let description = service.describe_index(&spec.name)?;
    if description.dimension != spec.dimension || description.metric != spec.metric {
        return Err(RagError::Provisioning(format!(
            "index `{}` already exists with dimension {} and metric {}, expected dimension {} and metric {}",
            spec.name, description.dimension, description.metric, spec.dimension, spec.metric
        )));
    }
    service.open_index(&description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_ids_follow_chunk_numbering() {
        assert_eq!(IndexEntry::entry_id(0), "chunk-0");
        assert_eq!(IndexEntry::entry_id(7), "chunk-7");
    }

    #[test]
    fn metric_names_per_backend() {
        assert_eq!("Euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!("dot".parse::<Metric>().unwrap(), Metric::DotProduct);
        assert_eq!(Metric::Euclidean.as_qdrant(), "Euclid");
        assert_eq!(Metric::DotProduct.as_pinecone(), "dotproduct");
    }
}
