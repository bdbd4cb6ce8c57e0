//! HTTP implementation of [`CanvasApi`].

use std::time::Duration;

use async_trait::async_trait;
use drawsync_core::{ElementPatch, Skeleton};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::api::{CanvasApi, Health, RemoteElement};
use crate::config::{ClientConfig, RetryConfig};
use crate::error::{ClientError, ClientResult};

/// Longest response body kept in [`ClientError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Deserialize)]
struct ElementList {
    #[serde(default)]
    elements: Vec<RemoteElement>,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    elements: &'a [Skeleton],
}

/// Whether a failed call may be sent again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Repeating the call has the same effect as sending it once.
    Idempotent,
    /// Only resend if the server never saw the request.
    ConnectFailuresOnly,
}

/// Canvas server client over HTTP.
#[derive(Debug, Clone)]
pub struct CanvasClient {
    http: Client,
    base: Url,
    retry: RetryConfig,
}

impl CanvasClient {
    /// Create a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed or not
    /// http(s), and [`ClientError::Http`] if the HTTP client fails to build.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut base = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{}: expected an http or https URL",
                config.base_url
            )));
        }

        // Relative joins replace the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(concat!("drawsync/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base,
            retry: config.retry,
        })
    }

    /// Client for `base_url` with default timeouts and retries.
    ///
    /// # Errors
    ///
    /// See [`CanvasClient::new`].
    pub fn with_base_url(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::new(ClientConfig::new(base_url))
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    fn element_url(&self, id: &str) -> ClientResult<Url> {
        let mut url = self.endpoint("api/elements")?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base.to_string()))?
            .push(id);
        Ok(url)
    }

    /// Send a request, retrying transient failures according to policy.
    async fn execute<F>(&self, operation: &str, replay: Replay, build: F) -> ClientResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let result = match build(&self.http).send().await {
                Ok(response) => check_status(response).await,
                Err(e) => Err(ClientError::Http(e)),
            };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            let may_replay = match replay {
                Replay::Idempotent => error.is_retryable(),
                Replay::ConnectFailuresOnly => error.is_connect(),
            };
            if !may_replay || attempt + 1 >= max_attempts {
                return Err(error);
            }

            let delay = self.retry.delay_for_attempt(attempt);
            warn!(
                "{} failed (attempt {}/{}), retrying in {}ms: {}",
                operation,
                attempt + 1,
                max_attempts,
                delay,
                error
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
            attempt += 1;
        }
    }
}

/// Map non-success statuses to errors.
async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let resource = response.url().path().to_string();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(resource));
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|&i| body.is_char_boundary(i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl CanvasApi for CanvasClient {
    async fn health(&self) -> ClientResult<Health> {
        let url = self.endpoint("health")?;
        let response = self
            .execute("GET /health", Replay::Idempotent, |http| http.get(url.clone()))
            .await?;
        decode(response).await
    }

    async fn list_elements(&self) -> ClientResult<Vec<RemoteElement>> {
        let url = self.endpoint("api/elements")?;
        let response = self
            .execute("GET /api/elements", Replay::Idempotent, |http| {
                http.get(url.clone())
            })
            .await?;
        let list: ElementList = decode(response).await?;
        debug!("canvas holds {} elements", list.elements.len());
        Ok(list.elements)
    }

    async fn create_elements(&self, skeletons: &[Skeleton]) -> ClientResult<Vec<RemoteElement>> {
        let url = self.endpoint("api/elements/batch")?;
        let request = BatchRequest {
            elements: skeletons,
        };
        let response = self
            .execute(
                "POST /api/elements/batch",
                Replay::ConnectFailuresOnly,
                |http| http.post(url.clone()).json(&request),
            )
            .await?;
        let created: ElementList = decode(response).await?;
        debug!(
            "batch created {} of {} elements",
            created.elements.len(),
            skeletons.len()
        );
        Ok(created.elements)
    }

    async fn update_element(&self, id: &str, patch: &ElementPatch) -> ClientResult<()> {
        let url = self.element_url(id)?;
        self.execute("PUT /api/elements/{id}", Replay::Idempotent, |http| {
            http.put(url.clone()).json(patch)
        })
        .await?;
        debug!("updated remote element {id}");
        Ok(())
    }

    async fn delete_element(&self, id: &str) -> ClientResult<()> {
        let url = self.element_url(id)?;
        self.execute("DELETE /api/elements/{id}", Replay::Idempotent, |http| {
            http.delete(url.clone())
        })
        .await?;
        debug!("deleted remote element {id}");
        Ok(())
    }

    async fn clear(&self) -> ClientResult<usize> {
        let count = self.list_elements().await?.len();
        let url = self.endpoint("api/elements")?;
        self.execute("DELETE /api/elements", Replay::Idempotent, |http| {
            http.delete(url.clone())
        })
        .await?;
        debug!("cleared {count} elements");
        Ok(count)
    }
}
