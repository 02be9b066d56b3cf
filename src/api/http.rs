//! Media store that uploads raw bytes to a single HTTP endpoint.

use reqwest::Client;
use serde::Deserialize;

use crate::models::MediaFile;

use super::MediaStore;

/// Response body expected from the upload endpoint
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
    #[serde(default)]
    content: Option<UploadContent>,
}

#[derive(Debug, Deserialize)]
struct UploadContent {
    url: Option<String>,
}

impl UploadResponse {
    fn into_url(self) -> Option<String> {
        self.url
            .or_else(|| self.content.and_then(|c| c.url))
            .filter(|u| !u.is_empty())
    }
}

/// Uploads media with `POST <endpoint>` and reads the URL from the JSON reply
pub struct HttpMediaStore {
    client: Client,
    endpoint: String,
    bearer: Option<String>,
}

impl HttpMediaStore {
    /// Create a store for an endpoint
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            bearer: None,
        }
    }

    /// Send an `Authorization: Bearer` header with every upload
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    async fn try_upload(&self, file: &MediaFile) -> anyhow::Result<Option<String>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", &file.mime_type)
            .header("X-File-Name", &file.name)
            .body(file.bytes.clone());

        if let Some(token) = &self.bearer {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }

        let parsed: UploadResponse = response.json().await?;
        Ok(parsed.into_url())
    }
}

impl MediaStore for HttpMediaStore {
    async fn upload(&self, file: &MediaFile) -> Option<String> {
        tracing::debug!("Uploading {} ({} bytes)", file.name, file.bytes.len());

        match self.try_upload(file).await {
            Ok(Some(url)) => Some(url),
            Ok(None) => {
                tracing::warn!("Upload of {} returned no URL", file.name);
                None
            }
            Err(e) => {
                tracing::warn!("Upload of {} failed: {e}", file.name);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_shapes() {
        let flat: UploadResponse = serde_json::from_str(r#"{"url":"https://m.example/a.png"}"#).unwrap();
        assert_eq!(flat.into_url().as_deref(), Some("https://m.example/a.png"));

        let nested: UploadResponse =
            serde_json::from_str(r#"{"content":{"url":"https://m.example/b.png"}}"#).unwrap();
        assert_eq!(nested.into_url().as_deref(), Some("https://m.example/b.png"));

        let empty: UploadResponse = serde_json::from_str(r#"{"url":""}"#).unwrap();
        assert_eq!(empty.into_url(), None);
    }
}
