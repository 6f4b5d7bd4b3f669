mod build_prompt;
mod chunk_text;
mod config;
mod embed_text;
mod error;
mod generate;
mod http;
mod index;
mod ingest;
mod read_document;
mod retrieve_chunks;
mod session;
mod store_pinecone;
mod store_qdrant;

use std::sync::Arc;

pub use build_prompt::{build_prompt, format_context, Message};
pub use chunk_text::{chunk_pages, chunk_text, Chunk, ChunkConfig};
pub use config::{Backend, Config};
pub use embed_text::{embed_checked, Embedder, OllamaEmbedder};
pub use error::{RagError, Result};
pub use generate::{answer, AnswerSettings, ChatCompleter, OpenAiChat, NO_RELEVANT_SECTIONS};
pub use http::HttpError;
pub use index::{
    ensure_index, EntryMetadata, HostingSpec, IndexDescription, IndexEntry, IndexService, IndexSpec,
    Match, Metric, VectorIndex,
};
pub use ingest::{ingest, IngestProgress};
pub use read_document::{DocumentSource, Page, PdfDocument};
pub use retrieve_chunks::{retrieve, Section};
pub use session::{Answer, Session, SessionDeps, StartOutcome};
pub use store_pinecone::{PineconeIndex, PineconeService};
pub use store_qdrant::{QdrantCollection, QdrantService};

/// Wires the configured backends into a fresh session on the landing stage.
/// Builds blocking HTTP clients, so call it outside an async context.
pub fn build_session(cfg: &Config) -> Result<Session> {
    let index_service: Arc<dyn IndexService> = match cfg.backend {
        Backend::Pinecone => Arc::new(PineconeService::new(
            &cfg.pinecone_api_key,
            &cfg.pinecone_controller_url,
        )?),
        Backend::Qdrant => Arc::new(QdrantService::new(
            &cfg.qdrant_url,
            cfg.qdrant_api_key.as_deref(),
        )?),
    };
    let embedder = OllamaEmbedder::new(&cfg.ollama_url, &cfg.embed_model, cfg.dimension)?;
    let completer = OpenAiChat::new(&cfg.openai_base_url, &cfg.openai_api_key)?;

    Ok(Session::new(SessionDeps {
        index_service,
        embedder: Arc::new(embedder),
        completer: Arc::new(completer),
        document: Arc::new(PdfDocument::new(&cfg.document_path)),
        index_spec: cfg.index_spec(),
        chunking: ChunkConfig {
            size: cfg.chunk_size,
            overlap: cfg.chunk_overlap,
        },
        top_k: cfg.top_k,
        answer: AnswerSettings {
            topic: cfg.topic.clone(),
            model: cfg.chat_model.clone(),
        },
    }))
}
