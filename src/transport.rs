// src/transport.rs - HTTP boundary to the moonraker API
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use thiserror::Error;

/// Fatal transport failures. Anything of this class aborts the recovery run;
/// the bounded retry machinery only retries "device not there yet", never a
/// network that cannot be reached at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid request path '{0}'")]
    InvalidPath(String),

    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed reading response body from {path}: {source}")]
    Body {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// One raw HTTP exchange. The body is surfaced even for non-2xx statuses;
/// moonraker legitimately answers 4xx/5xx while klipper is in `startup` or
/// `error`, and those bodies still carry the state token.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The two operations the recovery core needs from the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError>;
    async fn post(&self, path: &str) -> Result<RawResponse, TransportError>;
}

/// Production transport: a single reusable client bound to one base URL for
/// the lifetime of the run.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(mut base_url: Url, request_timeout: Duration) -> Result<Self, TransportError> {
        // A trailing slash keeps Url::join from eating the last path segment
        // of a base like http://host:7125/moonraker.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(request_timeout)
            .connect_timeout(request_timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|_| TransportError::InvalidPath(path.to_string()))
    }

    async fn execute(&self, method: Method, path: &str) -> Result<RawResponse, TransportError> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|err| TransportError::Request {
                path: path.to_string(),
                source: err.into(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Body {
                path: path.to_string(),
                source: err.into(),
            })?
            .to_vec();

        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        self.execute(Method::GET, path).await
    }

    async fn post(&self, path: &str) -> Result<RawResponse, TransportError> {
        self.execute(Method::POST, path).await
    }
}
