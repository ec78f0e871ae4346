//! HTTP transport for FAH servers
//!
//! Every request presents the client identity for mutual TLS. Anything other
//! than `200 OK` is surfaced as [`FahError::RequestFailed`] with the body the
//! server sent back.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{FahError, Result};
use crate::keys::Identity;

/// Shared HTTP client for the assignment and work server APIs
#[derive(Clone, Debug)]
pub struct FahHttpClient {
    client: Client,
}

impl FahHttpClient {
    /// Create a client presenting `identity` to every server it talks to
    pub fn new(
        identity: &Identity,
        verify: bool,
        connect_timeout_ms: u64,
        read_timeout_ms: u64,
    ) -> Result<Self> {
        let identity = reqwest::Identity::from_pem(&identity.to_pem_bundle())?;

        if !verify {
            warn!("Server certificate verification is disabled");
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(connect_timeout_ms))
            .read_timeout(Duration::from_millis(read_timeout_ms))
            .identity(identity)
            .danger_accept_invalid_certs(!verify)
            .build()?;

        Ok(Self { client })
    }

    /// Resolve `path` against `base` the way a browser resolves a link.
    ///
    /// A path with a leading `/` replaces the whole base path.
    pub fn build_url(base: &Url, path: &str) -> Result<Url> {
        Ok(base.join(path)?)
    }

    fn request(&self, method: Method, base: &Url, path: &str) -> Result<RequestBuilder> {
        let url = Self::build_url(base, path)?;
        debug!(%method, %url, "Sending request");
        Ok(self.client.request(method, url))
    }

    /// Make a GET request and parse the JSON response
    pub async fn get<T: DeserializeOwned>(&self, base: &Url, path: &str) -> Result<T> {
        let response = self.request(Method::GET, base, path)?.send().await?;
        Self::handle_json(response).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        base: &Url,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let response = self
            .request(Method::GET, base, path)?
            .query(query)
            .send()
            .await?;
        Self::handle_json(response).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put_json<B: Serialize + ?Sized>(&self, base: &Url, path: &str, body: &B) -> Result<()> {
        let response = self.request(Method::PUT, base, path)?.json(body).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    pub async fn delete(&self, base: &Url, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, base, path)?.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// PUT raw bytes as the request body
    pub async fn put_bytes(&self, base: &Url, path: &str, body: Bytes) -> Result<()> {
        self.put_body(base, path, Body::from(body), None).await
    }

    /// PUT the contents of a local file, streamed in chunks
    pub async fn upload(&self, base: &Url, path: &str, src: &Path) -> Result<()> {
        let file = tokio::fs::File::open(src).await?;
        let size = file.metadata().await?.len();
        debug!(src = %src.display(), size, "Uploading file");
        let body = Body::wrap_stream(ReaderStream::new(file));
        self.put_body(base, path, body, Some(size)).await
    }

    async fn put_body(&self, base: &Url, path: &str, body: Body, size: Option<u64>) -> Result<()> {
        let mut request = self
            .request(Method::PUT, base, path)?
            .header(CONTENT_TYPE, "application/octet-stream");
        // Streamed bodies have no length of their own
        if let Some(size) = size {
            request = request.header(CONTENT_LENGTH, size);
        }
        let response = request.body(body).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// GET a resource into memory
    pub async fn get_bytes(&self, base: &Url, path: &str) -> Result<Bytes> {
        let response = self.request(Method::GET, base, path)?.send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?)
    }

    /// GET a resource and stream it into `dest`, creating parent directories.
    ///
    /// Returns the number of bytes written.
    pub async fn download(&self, base: &Url, path: &str, dest: &Path) -> Result<u64> {
        let response = self.request(Method::GET, base, path)?.send().await?;
        let response = Self::check_status(response).await?;

        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(dest = %dest.display(), size = written, "Downloaded file");
        Ok(written)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        error!(%url, status = status.as_u16(), "Request failed: {}", body);
        Err(FahError::RequestFailed {
            status: status.as_u16(),
            body,
        })
    }

    async fn handle_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_absolute_path_replaces_base_path() {
        let base = Url::parse("https://ws.example.org/api/").unwrap();
        assert_eq!(
            FahHttpClient::build_url(&base, "/projects/1").unwrap().as_str(),
            "https://ws.example.org/projects/1"
        );
    }

    #[test]
    fn test_build_url_relative_path_extends_base() {
        let base = Url::parse("https://ws.example.org/api/").unwrap();
        assert_eq!(
            FahHttpClient::build_url(&base, "projects/1").unwrap().as_str(),
            "https://ws.example.org/api/projects/1"
        );
    }

    #[test]
    fn test_build_url_keeps_port() {
        let base = Url::parse("http://127.0.0.1:8084").unwrap();
        assert_eq!(
            FahHttpClient::build_url(&base, "/ws/10.0.0.7").unwrap().as_str(),
            "http://127.0.0.1:8084/ws/10.0.0.7"
        );
    }
}
