use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{RagError, Result};
use crate::http::{join_url, JsonClient};

/// Anything that maps text to a fixed-length vector. One instance is shared
/// between ingestion and querying so both sides land in the same space.
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Serialize)]
struct EmbedLegacyRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Clone, Debug)]
pub struct OllamaEmbedder {
    http: JsonClient,
    base_url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, dimension: usize) -> Result<Self> {
        let http = JsonClient::new(&[]).map_err(RagError::embedding)?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            model: model.to_string(),
            dimension,
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = join_url(&self.base_url, "api/embed");
        let req = EmbedRequest {
            model: &self.model,
            input: text,
        };
        let value = match self.http.post_json::<Value, _>(&url, &req) {
            Ok(res) => res,
            // Ollama releases before 0.2 only expose the legacy endpoint.
            Err(err) if err.status() == Some(404) => {
                warn!(error = %err, "api/embed not found, using legacy api/embeddings");
                let url = join_url(&self.base_url, "api/embeddings");
                let req = EmbedLegacyRequest {
                    model: &self.model,
                    prompt: text,
                };
                self.http
                    .post_json::<Value, _>(&url, &req)
                    .map_err(RagError::embedding)?
            }
            Err(err) => return Err(RagError::embedding(err)),
        };
        parse_embedding(&value).map_err(RagError::Embedding)
    }
}

/// Embeds `text` and rejects vectors that do not match the embedder's
/// declared dimension.
pub fn embed_checked(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    check_dimension(embedder.embed(text)?, embedder.dimension())
}

fn check_dimension(vector: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
    if vector.len() != expected {
        return Err(RagError::Embedding(format!(
            "expected a {}-dimensional vector, model returned {}",
            expected,
            vector.len()
        )));
    }
    Ok(vector)
}

fn parse_embedding(value: &Value) -> std::result::Result<Vec<f32>, String> {
    if let Some(embeddings) = value.get("embeddings") {
        let rows = embeddings.as_array().ok_or("Invalid embeddings format")?;
        let first = rows.first().ok_or("No embeddings in response")?;
        return parse_vec(first);
    }
    if let Some(embedding) = value.get("embedding") {
        return parse_vec(embedding);
    }
    Err("No embeddings in response".to_string())
}

fn parse_vec(value: &Value) -> std::result::Result<Vec<f32>, String> {
    let arr = value.as_array().ok_or("Embedding is not an array")?;
    let mut out = Vec::with_capacity(arr.len());
    for v in arr {
        let n = v.as_f64().ok_or("Embedding value is not a number")?;
        out.push(n as f32);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_batch_and_legacy_shapes() {
        let batch = json!({"model": "m", "embeddings": [[0.5, 1.0, -2.0]]});
        assert_eq!(parse_embedding(&batch).unwrap(), vec![0.5, 1.0, -2.0]);

        let legacy = json!({"embedding": [1, 2]});
        assert_eq!(parse_embedding(&legacy).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_malformed_responses() {
        assert!(parse_embedding(&json!({"embeddings": []})).is_err());
        assert!(parse_embedding(&json!({"embedding": ["x"]})).is_err());
        assert!(parse_embedding(&json!({"error": "model not found"})).is_err());
    }

    #[test]
    fn wrong_dimension_is_an_embedding_error() {
        let err = check_dimension(vec![0.0; 384], 768).unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
        assert_eq!(check_dimension(vec![0.0; 3], 3).unwrap().len(), 3);
    }
}
