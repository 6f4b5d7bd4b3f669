use std::sync::Arc;

use tracing::info;

use crate::build_prompt::format_context;
use crate::chunk_text::ChunkConfig;
use crate::embed_text::Embedder;
use crate::error::{RagError, Result};
use crate::generate::{answer, AnswerSettings, ChatCompleter};
use crate::index::{ensure_index, IndexService, IndexSpec, VectorIndex};
use crate::ingest::{ingest, IngestProgress};
use crate::read_document::DocumentSource;
use crate::retrieve_chunks::{retrieve, Section};

/// Collaborators a session drives. The embedder is shared by ingestion and
/// retrieval.
pub struct SessionDeps {
    pub index_service: Arc<dyn IndexService>,
    pub embedder: Arc<dyn Embedder>,
    pub completer: Arc<dyn ChatCompleter>,
    pub document: Arc<dyn DocumentSource>,
    pub index_spec: IndexSpec,
    pub chunking: ChunkConfig,
    pub top_k: usize,
    pub answer: AnswerSettings,
}

enum Stage {
    Landing,
    Chatbot {
        index: Arc<dyn VectorIndex>,
        chunk_count: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started { chunk_count: usize },
    AlreadyStarted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    /// Rendered context block, for display next to the answer.
    pub context: String,
    pub text: String,
    pub sections: Vec<Section>,
}

/// One user's walk from the landing screen to the chatbot. The index is built
/// on the single landing -> chatbot transition; there is no way back.
pub struct Session {
    deps: SessionDeps,
    stage: Stage,
}

impl Session {
    pub fn new(deps: SessionDeps) -> Self {
        Self {
            deps,
            stage: Stage::Landing,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.stage, Stage::Chatbot { .. })
    }

    pub fn chunk_count(&self) -> Option<usize> {
        match &self.stage {
            Stage::Landing => None,
            Stage::Chatbot { chunk_count, .. } => Some(*chunk_count),
        }
    }

    pub fn document(&self) -> String {
        self.deps.document.describe()
    }

    /// Provisions the index and ingests the document. A failure leaves the
    /// session on the landing stage so the user can try again.
    pub fn start(&mut self, progress: &mut dyn FnMut(IngestProgress)) -> Result<StartOutcome> {
        if self.is_ready() {
            return Ok(StartOutcome::AlreadyStarted);
        }
        let deps = &self.deps;
        let index = ensure_index(deps.index_service.as_ref(), &deps.index_spec)?;
        let chunk_count = ingest(
            deps.document.as_ref(),
            deps.embedder.as_ref(),
            index.as_ref(),
            deps.chunking,
            progress,
        )?;
        info!(index = index.name(), chunk_count, "knowledge base ready");
        self.stage = Stage::Chatbot { index, chunk_count };
        Ok(StartOutcome::Started { chunk_count })
    }

    pub fn ask(&self, query: &str) -> Result<Answer> {
        let Stage::Chatbot { index, .. } = &self.stage else {
            return Err(RagError::NotStarted);
        };
        let sections = retrieve(
            query,
            self.deps.embedder.as_ref(),
            index.as_ref(),
            self.deps.top_k,
        )?;
        let text = answer(query, &sections, self.deps.completer.as_ref(), &self.deps.answer)?;
        let context = if sections.is_empty() {
            "(no relevant sections)".to_string()
        } else {
            format_context(&sections)
        };
        Ok(Answer {
            context,
            text,
            sections,
        })
    }
}
