use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::from_str;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("invalid header {name}: {message}")]
    Header { name: String, message: String },

    #[error("client setup failed: {0}")]
    Client(String),

    #[error("{method} {url} failed: {message}")]
    Transport {
        method: &'static str,
        url: String,
        message: String,
    },

    #[error("{method} {url} failed: {status} {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("{method} {url} decode failed: {message} | {body}")]
    Decode {
        method: &'static str,
        url: String,
        message: String,
        body: String,
    },
}

impl HttpError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Blocking JSON client that attaches the same headers to every request.
#[derive(Clone, Debug)]
pub struct JsonClient {
    client: Client,
}

impl JsonClient {
    pub fn new(headers: &[(&str, &str)]) -> Result<Self, HttpError> {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::Header {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            let mut header_value = HeaderValue::from_str(value).map_err(|e| HttpError::Header {
                name: name.to_string(),
                message: e.to_string(),
            })?;
            header_value.set_sensitive(true);
            map.insert(header_name, header_value);
        }
        let client = Client::builder()
            .default_headers(map)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        send("GET", url, self.client.get(url))
    }

    pub fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        send("POST", url, self.client.post(url).json(body))
    }

    pub fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        send("PUT", url, self.client.put(url).json(body))
    }
}

fn send<T: DeserializeOwned>(
    method: &'static str,
    url: &str,
    request: RequestBuilder,
) -> Result<T, HttpError> {
    debug!(method, url, "sending request");
    let resp = request.send().map_err(|e| HttpError::Transport {
        method,
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let status = resp.status();
    let text = resp.text().unwrap_or_default();
    if !status.is_success() {
        return Err(HttpError::Status {
            method,
            url: url.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }
    // Some endpoints (Pinecone create-index among them) answer with an empty body.
    let text = if text.trim().is_empty() { "null".to_string() } else { text };
    from_str::<T>(&text).map_err(|e| HttpError::Decode {
        method,
        url: url.to_string(),
        message: e.to_string(),
        body: text,
    })
}

pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h:1/", "/indexes"), "http://h:1/indexes");
        assert_eq!(join_url("http://h:1", "indexes"), "http://h:1/indexes");
    }

    #[test]
    fn rejects_header_with_newline() {
        let err = JsonClient::new(&[("Api-Key", "bad\nvalue")]).unwrap_err();
        assert!(matches!(err, HttpError::Header { .. }));
    }
}
