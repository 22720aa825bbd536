use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::config::normalize_server_url;
use crate::error::{Error, Result};
use crate::events::Event;
use crate::transport::{HttpTransport, Transport};

const REST_API_VERSION: &str = "api/v1";
const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// An advisory as listed in a build's `all_errata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    #[serde(rename = "id")]
    pub errata_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

impl Advisory {
    pub fn is_shipped(&self) -> bool {
        self.status == "SHIPPED_LIVE"
    }
}

/// Drop advisories whose id was already seen, keeping first occurrences in
/// order. Several builds usually share one advisory.
pub fn deduplicate_advisories(mut advisories: Vec<Advisory>) -> Vec<Advisory> {
    let mut seen: HashSet<u64> = HashSet::new();
    advisories.retain(|adv| seen.insert(adv.errata_id));
    advisories
}

/// `advisory/<id>/builds.json`: product -> list of {nvr -> variant/arch files}.
type AdvisoryBuilds = BTreeMap<String, Vec<BTreeMap<String, Value>>>;

/// Client for the Errata Tool.
#[derive(Clone)]
pub struct Errata {
    server_url: String,
    transport: Arc<dyn Transport>,
    max_concurrency: usize,
}

impl Errata {
    pub fn new(server_url: &str) -> Result<Self> {
        Ok(Self::with_transport(server_url, Arc::new(HttpTransport::new()?)))
    }

    pub fn with_transport(server_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            server_url: normalize_server_url(server_url),
            transport,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Upper bound on concurrent build lookups in [`Errata::builds_signed`].
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Advisories the event's subject is attached to.
    ///
    /// Only build-signing events can be mapped; anything else is a caller
    /// bug and fails with [`Error::UnsupportedEvent`].
    #[instrument(skip(self, event), fields(event = %event))]
    pub async fn advisories_from_event(&self, event: &Event) -> Result<Vec<Advisory>> {
        match event {
            Event::BrewSignRpm { nvr, .. } => self.advisories_for_build(nvr).await,
            other => Err(Error::UnsupportedEvent { kind: other.kind() }),
        }
    }

    /// Advisories of several builds, deduplicated by errata id.
    #[instrument(skip(self, nvrs))]
    pub async fn advisories_from_builds<I, S>(&self, nvrs: I) -> Result<Vec<Advisory>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut advisories = Vec::new();
        for nvr in nvrs {
            advisories.extend(self.advisories_for_build(nvr.as_ref()).await?);
        }
        Ok(deduplicate_advisories(advisories))
    }

    #[instrument(skip(self))]
    async fn advisories_for_build(&self, nvr: &str) -> Result<Vec<Advisory>> {
        let endpoint = format!("build/{nvr}");
        let Some(record) = self.rest_get(&endpoint).await? else {
            warn!(nvr, "build not known to Errata Tool");
            return Ok(vec![]);
        };

        match record.get("all_errata") {
            None | Some(Value::Null) => {
                debug!(nvr, "build has no all_errata");
                Ok(vec![])
            }
            Some(all_errata) => {
                let advisories: Vec<Advisory> = serde_json::from_value(all_errata.clone())
                    .map_err(|source| Error::Decode {
                        url: self.rest_url(&endpoint),
                        source,
                    })?;
                debug!(nvr, count = advisories.len(), "resolved advisories");
                Ok(advisories)
            }
        }
    }

    /// True when every build attached to the advisory has signed RPMs.
    ///
    /// A build whose record is missing or lacks `rpms_signed` counts as
    /// unsigned.
    #[instrument(skip(self))]
    pub async fn builds_signed(&self, errata_id: u64) -> Result<bool> {
        let endpoint = format!("advisory/{errata_id}/builds.json");
        let body = self.http_get(&endpoint).await?;
        let builds: AdvisoryBuilds = serde_json::from_value(body).map_err(|source| Error::Decode {
            url: self.http_url(&endpoint),
            source,
        })?;

        let nvrs: BTreeSet<String> = builds
            .into_values()
            .flatten()
            .flat_map(|by_nvr| by_nvr.into_keys())
            .collect();
        debug!(errata_id, count = nvrs.len(), "checking builds");

        let sem = Semaphore::new(self.max_concurrency);
        let sem = &sem;
        let results = join_all(nvrs.iter().map(|nvr| async move {
            match sem.acquire().await {
                Ok(_permit) => self.build_signed(nvr).await,
                Err(e) => Err(Error::Transport(e.into())),
            }
        }))
        .await;

        let mut all_signed = true;
        for (nvr, result) in nvrs.iter().zip(results) {
            if !result? {
                debug!(errata_id, nvr = %nvr, "build is not signed");
                all_signed = false;
            }
        }
        Ok(all_signed)
    }

    async fn build_signed(&self, nvr: &str) -> Result<bool> {
        let record = self.rest_get(&format!("build/{nvr}")).await?;
        Ok(record
            .as_ref()
            .and_then(|r| r.get("rpms_signed"))
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Pulp repository ids the advisory ships to, whether or not any package
    /// lands in a given repository.
    #[instrument(skip(self))]
    pub async fn get_pulp_repository_ids(&self, errata_id: u64) -> Result<BTreeSet<String>> {
        let endpoint = format!("errata/get_pulp_packages/{errata_id}.json");
        let body = self.http_get(&endpoint).await?;
        let repos: Map<String, Value> = serde_json::from_value(body).map_err(|source| Error::Decode {
            url: self.http_url(&endpoint),
            source,
        })?;
        Ok(repos.into_iter().map(|(repo_id, _)| repo_id).collect())
    }

    fn rest_url(&self, endpoint: &str) -> String {
        format!("{}/{REST_API_VERSION}/{endpoint}", self.server_url)
    }

    fn http_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.server_url)
    }

    /// GET against the REST API. A 404 is `None`, not an error.
    async fn rest_get(&self, endpoint: &str) -> Result<Option<Value>> {
        let url = self.rest_url(endpoint);
        let response = self.transport.get(&url).await?;

        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(Error::Http {
                url,
                status: response.status,
            });
        }
        Ok(Some(response.body))
    }

    /// GET of a plain JSON file served outside the REST API.
    async fn http_get(&self, endpoint: &str) -> Result<Value> {
        let url = self.http_url(endpoint);
        let response = self.transport.get(&url).await?;

        if !response.is_success() {
            return Err(Error::Http {
                url,
                status: response.status,
            });
        }
        Ok(response.body)
    }
}
