use serde_json::Value;
use tracing::debug;

use crate::embed_text::{embed_checked, Embedder};
use crate::error::{RagError, Result};
use crate::index::{Match, VectorIndex};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub text: String,
    pub page: Option<u32>,
}

pub fn retrieve(
    query: &str,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    top_k: usize,
) -> Result<Vec<Section>> {
    if query.trim().is_empty() {
        return Err(RagError::EmptyQuery);
    }
    let vector = embed_checked(embedder, query)?;
    let matches = index.query(&vector, top_k)?;
    debug!(index = index.name(), top_k, hits = matches.len(), "index queried");
    Ok(matches.iter().map(section_from_match).collect())
}

fn section_from_match(hit: &Match) -> Section {
    let metadata = &hit.metadata;
    let text = metadata
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let page = metadata
        .get("page")
        .and_then(as_whole_number)
        .or_else(|| metadata.get("chunk_id").and_then(as_whole_number));
    Section { text, page }
}

/// Accepts `7` and `7.0`; Pinecone hands integers back as floats.
fn as_whole_number(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(metadata: Value) -> Match {
        Match {
            id: "chunk-0".to_string(),
            score: 0.0,
            metadata,
        }
    }

    #[test]
    fn reads_page_and_text_from_metadata() {
        let section = section_from_match(&hit(json!({"chunk_id": 4.0, "text": "Women survived", "page": 2.0})));
        assert_eq!(
            section,
            Section {
                text: "Women survived".to_string(),
                page: Some(2)
            }
        );
    }

    #[test]
    fn falls_back_to_chunk_id_then_nothing() {
        let section = section_from_match(&hit(json!({"chunk_id": 9, "text": "t"})));
        assert_eq!(section.page, Some(9));

        let section = section_from_match(&hit(Value::Null));
        assert_eq!(section.page, None);
        assert_eq!(section.text, "");
    }

    #[test]
    fn whole_numbers_only() {
        assert_eq!(as_whole_number(&json!(3)), Some(3));
        assert_eq!(as_whole_number(&json!(3.0)), Some(3));
        assert_eq!(as_whole_number(&json!(3.5)), None);
        assert_eq!(as_whole_number(&json!(-1)), None);
        assert_eq!(as_whole_number(&json!("3")), None);
    }
}
