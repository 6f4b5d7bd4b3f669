use tracing::info;

use crate::chunk_text::{chunk_pages, ChunkConfig};
use crate::embed_text::{embed_checked, Embedder};
use crate::error::{RagError, Result};
use crate::index::{EntryMetadata, IndexEntry, VectorIndex};
use crate::read_document::DocumentSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestProgress {
    Chunked { total: usize },
    Uploaded { chunk_id: usize, done: usize, total: usize },
}

/// Reads, chunks, embeds and upserts one chunk at a time. Stops at the first
/// failing chunk; entries already written stay in the index and are
/// overwritten by id on the next run.
pub fn ingest(
    document: &dyn DocumentSource,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    chunking: ChunkConfig,
    progress: &mut dyn FnMut(IngestProgress),
) -> Result<usize> {
    let pages = document.read_pages()?;
    let chunks = chunk_pages(&pages, chunking);
    let total = chunks.len();
    info!(
        document = %document.describe(),
        pages = pages.len(),
        chunks = total,
        "document chunked"
    );
    progress(IngestProgress::Chunked { total });

    for (done, chunk) in chunks.into_iter().enumerate() {
        info!(chunk = chunk.index, page = chunk.page, "processing chunk");
        let id = IndexEntry::entry_id(chunk.index);
        let values = embed_checked(embedder, &chunk.text).map_err(|err| match err {
            RagError::Embedding(message) => RagError::Embedding(format!("{}: {}", id, message)),
            other => other,
        })?;
        let entry = IndexEntry {
            id,
            values,
            metadata: EntryMetadata {
                chunk_id: chunk.index,
                text: chunk.text,
                page: chunk.page,
            },
        };
        index.upsert(&entry)?;
        progress(IngestProgress::Uploaded {
            chunk_id: chunk.index,
            done: done + 1,
            total,
        });
    }

    info!(index = index.name(), chunks = total, "all chunks uploaded");
    Ok(total)
}
