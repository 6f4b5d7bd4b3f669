use std::env;
use std::str::FromStr;

use crate::error::{RagError, Result};
use crate::index::{HostingSpec, IndexSpec, Metric};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Pinecone,
    Qdrant,
}

impl FromStr for Backend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pinecone" => Ok(Backend::Pinecone),
            "qdrant" => Ok(Backend::Qdrant),
            other => Err(RagError::Config(format!("unknown VECTOR_BACKEND `{}`", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub document_path: String,
    pub topic: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub dimension: usize,
    pub metric: Metric,
    pub backend: Backend,
    pub pinecone_api_key: String,
    pub pinecone_index: String,
    pub pinecone_controller_url: String,
    pub pinecone_cloud: String,
    pub pinecone_region: String,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub qdrant_collection: String,
    pub ollama_url: String,
    pub embed_model: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env if present so API keys work without manual `source .env`.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend: Backend = text("VECTOR_BACKEND", "pinecone").parse()?;
        let pinecone_api_key = optional("PINECONE_API_KEY").unwrap_or_default();
        if backend == Backend::Pinecone && pinecone_api_key.is_empty() {
            return Err(RagError::Config("PINECONE_API_KEY is not set".to_string()));
        }
        let openai_api_key = optional("OPENAI_API_KEY")
            .ok_or_else(|| RagError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let cfg = Self {
            document_path: text("DOCQA_DOCUMENT", "Knowledge_base/titanic_final_eda.pdf"),
            topic: text("DOCQA_TOPIC", "Titanic Data Analysis"),
            chunk_size: number(&lookup, "RAG_CHUNK_SIZE", 1000)?,
            chunk_overlap: number(&lookup, "RAG_CHUNK_OVERLAP", 50)?,
            top_k: number(&lookup, "RAG_TOP_K", 5)?,
            dimension: number(&lookup, "RAG_EMBED_DIMENSION", 768)?,
            metric: text("RAG_METRIC", "euclidean").parse()?,
            backend,
            pinecone_api_key,
            pinecone_index: text("PINECONE_INDEX", "titanic"),
            pinecone_controller_url: text("PINECONE_CONTROLLER_URL", "https://api.pinecone.io"),
            pinecone_cloud: text("PINECONE_CLOUD", "aws"),
            pinecone_region: text("PINECONE_REGION", "us-east-1"),
            qdrant_url: text("QDRANT_URL", "http://localhost:6333"),
            qdrant_api_key: optional("QDRANT_API_KEY"),
            qdrant_collection: text("QDRANT_COLLECTION", "titanic"),
            ollama_url: text("OLLAMA_URL", "http://localhost:11434"),
            embed_model: text("OLLAMA_EMBED_MODEL", "nomic-embed-text"),
            openai_api_key,
            openai_base_url: text("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            chat_model: text("OPENAI_CHAT_MODEL", "gpt-4o-mini"),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("RAG_CHUNK_SIZE must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "RAG_CHUNK_OVERLAP ({}) must be smaller than RAG_CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("RAG_TOP_K must be positive".to_string()));
        }
        if self.dimension == 0 {
            return Err(RagError::Config("RAG_EMBED_DIMENSION must be positive".to_string()));
        }
        Ok(())
    }

    /// Name of the index or collection for the selected backend.
    pub fn index_name(&self) -> &str {
        match self.backend {
            Backend::Pinecone => &self.pinecone_index,
            Backend::Qdrant => &self.qdrant_collection,
        }
    }

    pub fn index_spec(&self) -> IndexSpec {
        IndexSpec {
            name: self.index_name().to_string(),
            dimension: self.dimension,
            metric: self.metric,
            hosting: HostingSpec {
                cloud: self.pinecone_cloud.clone(),
                region: self.pinecone_region.clone(),
            },
        }
    }
}

fn number<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| RagError::Config(format!("{} must be a non-negative integer, got `{}`", key, raw))),
    }
}
