//! HTTP plumbing for the fabdb.net REST API.
//!
//! Sets the fixed request headers, checks the response status and decodes
//! JSON bodies. There are no retries: a failed call is returned as is.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Public fabdb.net API.
pub const DEFAULT_ENDPOINT: &str = "https://api.fabdb.net";

/// Sent as `User-Agent` on every request.
pub const USER_AGENT_VALUE: &str = concat!("fabtcg-bot/", env!("CARGO_PKG_VERSION"));

const JSON_CONTENT_TYPE: &str = "application/json";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Errors returned by the fabdb.net client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-2xx status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("error calling the API endpoint: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A search answered with an empty `data` list.
    #[error("JSON response does not have any card fields")]
    NoCards,

    #[error("invalid API endpoint {0:?}")]
    Endpoint(String),
}

impl ApiError {
    /// Build the error for a non-2xx response.
    ///
    /// Responses that are not JSON get a message saying so, since those
    /// usually come from a proxy or CDN rather than the API itself.
    fn from_response(response: &Response) -> Self {
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(JSON_CONTENT_TYPE));

        let message = if is_json {
            format!("HTTP response with status code {}", status.as_u16())
        } else {
            format!(
                "HTTP response with status code {} does not contain Content-Type: {}",
                status.as_u16(),
                JSON_CONTENT_TYPE
            )
        };

        Self::Status { status, message }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(e) => e.status(),
            _ => None,
        }
    }
}

/// Construction options for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL. Defaults to [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Whole-request timeout. `None` leaves requests bounded only by the
    /// connect timeout and by the caller dropping the future.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

/// Thin wrapper around a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
}

impl Client {
    /// Create a client with the fixed headers and connection settings.
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        let endpoint = Url::parse(options.endpoint.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::Endpoint(options.endpoint.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint,
        })
    }

    /// Endpoint URL with `segments` appended, each percent-encoded as a
    /// single path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `{endpoint}/{segments...}` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(segments)?;
        debug!(url = %url, "Calling fabdb API");

        let response = self.http.get(url).query(query).send().await?;
        let response = check_response(response)?;

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ApiError::from_response(&response))
    }
}
