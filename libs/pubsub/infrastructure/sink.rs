//! Event sink
//!
//! The downstream ingestion endpoint (PostgREST). The retrier only sees the
//! [`EventSink`] trait; [`HttpEventSink`] is the reqwest implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const SINK_USER_AGENT: &str = "TwitchSubAgent";

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Sink rejected event ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

pub type Result<T> = std::result::Result<T, SinkError>;

/// Anything that can durably record an event
#[async_trait]
pub trait EventSink: Send + Sync {
    /// POST `payload` to `endpoint`; `Ok` only when the sink accepted it
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<()>;
}

/// Headers sent with every upload
pub fn sink_headers(api_key: &str) -> Result<HeaderMap> {
    let invalid = |e: reqwest::header::InvalidHeaderValue| SinkError::InvalidHeader(e.to_string());

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(SINK_USER_AGENT));
    headers.insert("apikey", HeaderValue::from_str(api_key).map_err(invalid)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(invalid)?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("prefer", HeaderValue::from_static("return=minimal"));
    Ok(headers)
}

/// PostgREST sink over reqwest
pub struct HttpEventSink {
    root_url: String,
    client: Client,
}

impl HttpEventSink {
    pub fn new(root_url: impl Into<String>, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .default_headers(sink_headers(api_key)?)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            root_url: root_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.root_url, endpoint)
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<()> {
        let url = self.url_for(endpoint);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
