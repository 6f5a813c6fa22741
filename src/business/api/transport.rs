//! HTTP transport seam between the panel client and the network

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::TransportError;
use crate::logger::log;

/// Pause between transport retries
const RETRY_WAIT: Duration = Duration::from_millis(100);

/// A JSON POST to the panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRequest {
    /// Full URL without query string
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl PanelRequest {
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw HTTP response, before any envelope decoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelResponse {
    pub status: u16,
    /// Header names are stored lowercase
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl PanelResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends panel requests. Retries and timeouts belong to implementations.
#[async_trait]
pub trait PanelTransport: Send + Sync {
    async fn post_json(&self, request: &PanelRequest) -> Result<PanelResponse, TransportError>;
}

/// reqwest-backed transport with a fixed retry count on connect/timeout failures
pub struct ReqwestTransport {
    client: reqwest::Client,
    retry_count: u32,
    debug: bool,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, retry_count: u32, debug: bool) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            retry_count,
            debug,
        })
    }

    async fn send_once(&self, request: &PanelRequest) -> Result<PanelResponse, reqwest::Error> {
        let mut builder = self
            .client
            .post(&request.url)
            .query(&request.query)
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), v.to_string());
            }
        }

        let body = response.bytes().await?;
        Ok(PanelResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl PanelTransport for ReqwestTransport {
    async fn post_json(&self, request: &PanelRequest) -> Result<PanelResponse, TransportError> {
        if self.debug {
            log::debug!(url = %request.url, body = %request.body, "Panel request");
        }

        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(response) => {
                    if self.debug {
                        log::exchange(&request.url, response.status, &response.body_text());
                    }
                    return Ok(response);
                }
                Err(e) if attempt < self.retry_count && (e.is_connect() || e.is_timeout()) => {
                    attempt += 1;
                    log::debug!(
                        url = %request.url,
                        attempt = attempt,
                        error = %e,
                        "Panel request failed, retrying"
                    );
                    tokio::time::sleep(RETRY_WAIT).await;
                }
                Err(e) => {
                    log::warn!(url = %request.url, error = %e, "Panel request failed");
                    return Err(e.into());
                }
            }
        }
    }
}
