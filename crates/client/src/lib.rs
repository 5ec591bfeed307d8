//! HTTP clients for the depot storage and analysis services.
//!
//! [`StorageClient`] uploads and downloads files against the storage
//! service, reading the provenance headers that travel with every download.
//! It implements [`FileFetcher`], which is how the analysis service pulls
//! content in production. [`AnalysisClient`] triggers analyses.
//!
//! ```no_run
//! use depot_client::StorageClient;
//!
//! # async fn example() -> Result<(), depot_client::Error> {
//! let client = StorageClient::new("http://localhost:8080");
//! let uploaded = client.upload("notes.txt", b"some text".to_vec()).await?;
//! let downloaded = client.download(uploaded.id).await?;
//! assert_eq!(downloaded.hash, uploaded.hash);
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::Error;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

use depot_analysis::{FetchError, FetchedFile, FileFetcher};
use depot_core::{
    AnalysisResponse, ErrorResponse, FileHash, FileId, UploadResponse, X_FILE_HASH,
    X_FILE_UPLOAD_TIME,
};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A downloaded file: the raw bytes plus the provenance the storage service
/// declared in its response headers.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub content: Bytes,
    pub hash: FileHash,
    pub upload_time: DateTime<Utc>,
}

/// Builder for configuring a [`StorageClient`] or [`AnalysisClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
}

impl ClientBuilder {
    /// Create a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: None,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom reqwest [`Client`], e.g. for TLS or proxy settings.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    fn build_inner(self) -> Result<(Client, String), Error> {
        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| Error::Configuration(e.to_string()))?,
        };
        Ok((client, self.base_url))
    }

    /// Build a storage client.
    pub fn build_storage(self) -> Result<StorageClient, Error> {
        let (client, base_url) = self.build_inner()?;
        Ok(StorageClient { client, base_url })
    }

    /// Build an analysis client.
    pub fn build_analysis(self) -> Result<AnalysisClient, Error> {
        let (client, base_url) = self.build_inner()?;
        Ok(AnalysisClient { client, base_url })
    }
}

/// Read a non-success response into [`Error::Http`], preferring the
/// structured problem body when the service sent one.
async fn status_error(response: Response) -> Error {
    let status = response.status().as_u16();
    let message = match response.text().await {
        Ok(body) => match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(problem) => problem.error,
            Err(_) if !body.is_empty() => body,
            Err(_) => "no error details".to_owned(),
        },
        Err(_) => "no error details".to_owned(),
    };
    Error::Http { status, message }
}

/// HTTP client for the depot storage service.
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
}

impl StorageClient {
    /// Create a client with default configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientBuilder::new(base_url)
            .build_storage()
            .expect("default client configuration should not fail")
    }

    /// Create a builder for advanced configuration.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the service is healthy.
    pub async fn health(&self) -> Result<bool, Error> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(response.status().is_success())
    }

    /// Upload a file as a multipart request.
    ///
    /// Byte-identical content that is already stored comes back with
    /// `is_duplicate = true` and the original record's fields.
    pub async fn upload(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadResponse, Error> {
        let url = format!("{}/v1/files", self.base_url);
        let part = Part::bytes(content)
            .file_name(file_name.to_owned())
            .mime_str("text/plain")
            .map_err(|e| Error::Configuration(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Download a stored file with its provenance.
    ///
    /// Both provenance headers are mandatory; a response without them (or
    /// with unparseable values) is rejected.
    pub async fn download(&self, id: FileId) -> Result<DownloadedFile, Error> {
        let url = format!("{}/v1/files/{id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let hash = header_value(&response, X_FILE_HASH)?;
        let hash = FileHash::parse(&hash).map_err(|e| Error::InvalidHeader {
            header: X_FILE_HASH,
            message: e.to_string(),
        })?;

        let upload_time = header_value(&response, X_FILE_UPLOAD_TIME)?;
        let upload_time = DateTime::parse_from_rfc3339(&upload_time)
            .map_err(|e| Error::InvalidHeader {
                header: X_FILE_UPLOAD_TIME,
                message: e.to_string(),
            })?
            .with_timezone(&Utc);

        let content = response
            .bytes()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(DownloadedFile {
            content,
            hash,
            upload_time,
        })
    }
}

fn header_value(response: &Response, name: &'static str) -> Result<String, Error> {
    let value = response
        .headers()
        .get(name)
        .ok_or(Error::MissingHeader(name))?;
    let value = value
        .to_str()
        .map_err(|e| Error::InvalidHeader {
            header: name,
            message: e.to_string(),
        })?
        .trim();
    if value.is_empty() {
        return Err(Error::InvalidHeader {
            header: name,
            message: "value is empty".to_owned(),
        });
    }
    Ok(value.to_owned())
}

#[async_trait]
impl FileFetcher for StorageClient {
    async fn fetch(&self, id: FileId) -> Result<FetchedFile, FetchError> {
        match self.download(id).await {
            Ok(downloaded) => Ok(FetchedFile {
                content: downloaded.content,
                hash: downloaded.hash,
                upload_time: downloaded.upload_time,
            }),
            Err(Error::Connection(message)) => Err(FetchError::Transport { id, message }),
            Err(err) if err.is_not_found() => Err(FetchError::NotFound(id)),
            Err(Error::Http { status, .. }) => Err(FetchError::Status { id, status }),
            Err(err @ (Error::MissingHeader(_) | Error::InvalidHeader { .. })) => {
                Err(FetchError::Provenance {
                    id,
                    message: err.to_string(),
                })
            }
            Err(err) => Err(FetchError::Body {
                id,
                message: err.to_string(),
            }),
        }
    }
}

/// HTTP client for the depot analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    client: Client,
    base_url: String,
}

impl AnalysisClient {
    /// Create a client with default configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientBuilder::new(base_url)
            .build_analysis()
            .expect("default client configuration should not fail")
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the service is healthy.
    pub async fn health(&self) -> Result<bool, Error> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(response.status().is_success())
    }

    /// Analyze a stored file. Safe to call repeatedly: after the first
    /// success the service serves the cached result.
    pub async fn analyze(&self, id: FileId) -> Result<AnalysisResponse, Error> {
        let url = format!("{}/v1/analysis/{id}", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_trims_trailing_slash() {
        let client = StorageClient::builder("http://localhost:8080/")
            .build_storage()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn builder_accepts_custom_timeout() {
        let client = ClientBuilder::new("http://localhost:9090")
            .timeout(Duration::from_secs(5))
            .build_analysis()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:9090");
    }
}
