use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{normalize_server_url, LightBlueConfig};
use crate::document::{ContainerImage, ContainerRepository, Document};
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, Transport};

pub const ENTITY_VERSION_CONTAINER_IMAGE: &str = "0.0.12";
pub const ENTITY_VERSION_CONTAINER_REPOSITORY: &str = "0.0.11";

/// Entities freshmaker queries. Each carries its own schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    ContainerImage,
    ContainerRepository,
}

impl ObjectType {
    pub fn entity(self) -> &'static str {
        match self {
            Self::ContainerImage => "containerImage",
            Self::ContainerRepository => "containerRepository",
        }
    }

    pub fn version(self) -> &'static str {
        match self {
            Self::ContainerImage => ENTITY_VERSION_CONTAINER_IMAGE,
            Self::ContainerRepository => ENTITY_VERSION_CONTAINER_REPOSITORY,
        }
    }

    fn find_path(self) -> String {
        format!("find/{}/{}", self.entity(), self.version())
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity())
    }
}

/// A non-success LightBlue response.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFailure {
    raw: Value,
    status_code: u16,
    errors: Value,
}

/// One entry of a failure's `errors` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerError<'a> {
    pub context: Option<&'a str>,
    pub error_code: Option<&'a str>,
    pub msg: Option<&'a str>,
    pub object_type: Option<&'a str>,
}

impl RequestFailure {
    pub fn new(raw: Value, status_code: u16) -> Self {
        let errors = raw
            .get("errors")
            .cloned()
            .unwrap_or_else(|| Value::Array(vec![]));
        Self {
            raw,
            status_code,
            errors,
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// The body's `errors` field exactly as received, `[]` when absent.
    pub fn errors(&self) -> &Value {
        &self.errors
    }

    /// Individual error entries. A lone non-array `errors` value counts as
    /// one entry; `null` as none.
    fn entries(&self) -> &[Value] {
        match &self.errors {
            Value::Array(items) => items.as_slice(),
            Value::Null => &[],
            other => std::slice::from_ref(other),
        }
    }

    pub fn inner_errors(&self) -> impl Iterator<Item = InnerError<'_>> {
        self.entries().iter().map(|err| {
            let field = |name: &str| err.get(name).and_then(Value::as_str);
            InnerError {
                context: field("context"),
                error_code: field("errorCode"),
                msg: field("msg"),
                object_type: field("objectType"),
            }
        })
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LightBlue request failed with HTTP {}", self.status_code)?;
        let entries = self.entries();
        if entries.is_empty() {
            return write!(f, ": {}", self.raw);
        }
        f.write_str(". Errors:")?;
        for err in entries {
            match err.get("msg") {
                Some(Value::String(msg)) => write!(f, "\n    {msg}")?,
                Some(other) => write!(f, "\n    {other}")?,
                None => write!(f, "\n    {err}")?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for RequestFailure {}

#[derive(Debug, Clone, Serialize)]
struct Projection {
    field: String,
    include: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    recursive: Option<bool>,
}

/// Builder for the body of a `find` request.
///
/// The `query` clause is passed through untouched; its grammar belongs to
/// the server.
#[derive(Debug, Clone, Serialize)]
pub struct FindRequest {
    #[serde(rename = "objectType")]
    object_type: &'static str,
    projection: Vec<Projection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<Value>,
}

impl FindRequest {
    pub fn new(object_type: ObjectType) -> Self {
        Self {
            object_type: object_type.entity(),
            projection: vec![],
            query: None,
        }
    }

    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.projection.push(Projection {
            field: field.into(),
            include: true,
            recursive: None,
        });
        self
    }

    pub fn include_recursive(mut self, field: impl Into<String>) -> Self {
        self.projection.push(Projection {
            field: field.into(),
            include: true,
            recursive: Some(true),
        });
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.projection.push(Projection {
            field: field.into(),
            include: false,
            recursive: None,
        });
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Client for the LightBlue data REST API.
#[derive(Clone)]
pub struct LightBlue {
    api_root: String,
    transport: Arc<dyn Transport>,
}

impl LightBlue {
    /// Connect using a client certificate. The certificate and key files
    /// must exist; this is checked here, not at request time.
    pub fn new(config: LightBlueConfig) -> Result<Self> {
        config.validate()?;

        let mut pem = std::fs::read(&config.cert)
            .map_err(|e| Error::Identity(format!("{}: {e}", config.cert.display())))?;
        pem.push(b'\n');
        pem.extend(
            std::fs::read(&config.private_key)
                .map_err(|e| Error::Identity(format!("{}: {e}", config.private_key.display())))?,
        );
        let identity = reqwest::Identity::from_pem(&pem).map_err(|e| Error::Identity(e.to_string()))?;

        let transport = HttpTransport::builder()
            .identity(identity)
            .verify_ssl(config.verify_ssl)
            .build()?;

        Ok(Self::with_transport(&config.server_url, Arc::new(transport)))
    }

    pub fn with_transport(server_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_root: format!("{}/rest/data", with_scheme(&normalize_server_url(server_url))),
            transport,
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// POST `request` to `<api_root>/<entity_path>` and return the response
    /// body. Any status other than 200 becomes a [`RequestFailure`].
    #[instrument(skip(self, request))]
    pub async fn make_request(&self, entity_path: &str, request: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.api_root, entity_path.trim_matches('/'));
        let response = self.transport.post(&url, request).await?;

        if response.status != 200 {
            let failure = RequestFailure::new(response.body, response.status);
            warn!(url = %url, status = failure.status_code(), "LightBlue request failed");
            return Err(failure.into());
        }
        Ok(response.body)
    }

    /// Run a find query, returning `processed` in server order.
    #[instrument(skip(self, request, object_type), fields(object_type = %object_type))]
    pub async fn find(&self, object_type: ObjectType, request: &Value) -> Result<Vec<Document>> {
        let url_path = object_type.find_path();
        let mut body = self.make_request(&url_path, request).await?;

        let processed = match body.get_mut("processed").map(Value::take) {
            None | Some(Value::Null) => return Ok(vec![]),
            Some(processed) => processed,
        };
        let documents: Vec<Document> =
            serde_json::from_value(processed).map_err(|source| Error::Decode {
                url: format!("{}/{url_path}", self.api_root),
                source,
            })?;

        debug!(count = documents.len(), "find returned documents");
        Ok(documents)
    }

    pub async fn find_container_images(&self, request: &Value) -> Result<Vec<ContainerImage>> {
        let docs = self.find(ObjectType::ContainerImage, request).await?;
        Ok(docs.into_iter().map(ContainerImage::from).collect())
    }

    pub async fn find_container_repositories(
        &self,
        request: &Value,
    ) -> Result<Vec<ContainerRepository>> {
        let docs = self.find(ObjectType::ContainerRepository, request).await?;
        Ok(docs.into_iter().map(ContainerRepository::from).collect())
    }
}

fn with_scheme(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
