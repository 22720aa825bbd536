use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

/// Status and decoded body of a completed HTTP exchange.
///
/// Non-success statuses are not errors at this layer; the clients decide
/// what a 404 or a 500 means for their API.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP seam both clients talk through.
///
/// An `Err` means the exchange itself failed (connection, TLS, DNS).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
    async fn post(&self, url: &str, body: &Value) -> Result<HttpResponse>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }
}

pub struct HttpTransportBuilder {
    identity: Option<reqwest::Identity>,
    verify_ssl: bool,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            identity: None,
            verify_ssl: true,
        }
    }
}

impl HttpTransportBuilder {
    /// Present this client certificate on every TLS handshake.
    pub fn identity(mut self, identity: reqwest::Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let mut builder = reqwest::Client::builder()
            .user_agent("freshmaker")
            .danger_accept_invalid_certs(!self.verify_ssl);
        if let Some(identity) = self.identity {
            builder = builder.identity(identity);
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        into_http_response(url, response).await
    }

    #[instrument(skip(self, body))]
    async fn post(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        let payload = serde_json::to_string(body).context("failed to encode request body")?;

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(payload)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        into_http_response(url, response).await
    }
}

async fn into_http_response(url: &str, response: reqwest::Response) -> Result<HttpResponse> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .with_context(|| format!("failed to read body from {url}"))?;

    Ok(HttpResponse::new(status, decode_body(&text)))
}

/// Error pages are not always JSON; keep them as a string rather than
/// losing the body.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Get(String),
        Post(String, Value),
    }

    /// In-memory transport: canned responses keyed by URL, every call logged.
    /// URLs without a canned response answer 404 with an empty body.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        responses: Mutex<HashMap<String, HttpResponse>>,
        failures: Mutex<HashMap<String, String>>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn respond(&self, url: &str, status: u16, body: Value) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), HttpResponse::new(status, body));
        }

        pub(crate) fn fail(&self, url: &str, message: &str) {
            self.failures
                .lock()
                .unwrap()
                .insert(url.to_string(), message.to_string());
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, url: &str) -> Result<HttpResponse> {
            if let Some(message) = self.failures.lock().unwrap().get(url) {
                anyhow::bail!("{message}");
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_else(|| HttpResponse::new(404, Value::Null)))
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse> {
            self.calls.lock().unwrap().push(Call::Get(url.to_string()));
            self.answer(url)
        }

        async fn post(&self, url: &str, body: &Value) -> Result<HttpResponse> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Post(url.to_string(), body.clone()));
            self.answer(url)
        }
    }
}
