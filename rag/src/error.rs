use thiserror::Error;

use crate::http::HttpError;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index provisioning failed: {0}")]
    Provisioning(String),

    #[error("Failed to read document {path}: {message}")]
    DocumentRead { path: String, message: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Upsert of {id} failed: {message}")]
    Upsert { id: String, message: String },

    #[error("Index query failed: {0}")]
    Retrieval(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("The knowledge base has not been built yet")]
    NotStarted,

    #[error("Query is empty")]
    EmptyQuery,
}

impl RagError {
    pub(crate) fn provisioning(err: HttpError) -> Self {
        RagError::Provisioning(err.to_string())
    }

    pub(crate) fn embedding(err: HttpError) -> Self {
        RagError::Embedding(err.to_string())
    }

    pub(crate) fn retrieval(err: HttpError) -> Self {
        RagError::Retrieval(err.to_string())
    }

    pub(crate) fn generation(err: HttpError) -> Self {
        RagError::Generation(err.to_string())
    }
}
