use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{path_segments, DocumentStore, StoreError};

/// HTTP client for a hosted JSON-tree database (`{base}/{path}.json`).
pub struct RemoteStore {
    base_url: String,
    auth: Option<String>,
    client: Client,
}

/// Response body from POST: the generated child key.
#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

impl RemoteStore {
    pub fn new(base_url: &str, auth: Option<String>, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            client,
        }
    }

    fn url(&self, path: &str) -> Result<String, StoreError> {
        let segments = path_segments(path)?;
        Ok(format!("{}/{}.json", self.base_url, segments.join("/")))
    }

    fn send(&self, request: RequestBuilder, url: &str, path: &str) -> Result<Response, StoreError> {
        let request = match &self.auth {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        };

        let response = request.send().map_err(|e| StoreError::Transport {
            url: url.to_string(),
            reason: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl DocumentStore for RemoteStore {
    fn get(&self, path: &str) -> Result<Value, StoreError> {
        let url = self.url(path)?;
        let response = self.send(self.client.get(&url), &url, path)?;
        response
            .json::<Value>()
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }

    fn post(&self, path: &str, body: &Value) -> Result<String, StoreError> {
        let url = self.url(path)?;
        let response = self.send(self.client.post(&url).json(body), &url, path)?;
        let parsed: PushResponse = response
            .json()
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(parsed.name)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.client.patch(&url).json(body), &url, path)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.client.delete(&url), &url, path)?;
        Ok(())
    }
}
