use anyhow::Result;
use bytes::Bytes;
use charm_types::{CharmInfoResponse, CharmUrl, CounterKey};
use reqwest::{Client as ReqwestClient, StatusCode, Url};
use std::collections::BTreeMap;
use std::time::Duration;

/// Path the server answers with a fixed key for liveness probes.
pub const LIVENESS_PATH: &str = "/mu-35700a31-6bf320ca-a800b670-05f845ee";

/// Client for the public charm store API
pub struct CharmClient {
    client: ReqwestClient,
    base_url: String,
}

impl CharmClient {
    /// Create a new client instance
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Looks up several charms at once. Entries are keyed by the identifiers
    /// as given; per-charm failures come back in each entry's `errors`.
    pub async fn charm_info(
        &self,
        ids: &[&str],
        stats: bool,
    ) -> Result<BTreeMap<String, CharmInfoResponse>> {
        let url = format!("{}/charm-info", self.base_url);

        let mut query: Vec<(&str, &str)> = ids.iter().map(|id| ("charms", *id)).collect();
        if !stats {
            query.push(("stats", "0"));
        }

        let response = self.client.get(&url).query(&query).send().await?;

        response.error_for_status_ref()?;

        Ok(response.json().await?)
    }

    /// Downloads the bundle of a store charm.
    pub async fn download(&self, charm: &CharmUrl) -> Result<Bytes> {
        let mut url = format!("{}/charm/{}", self.base_url, charm.to_path());
        if let Some(revision) = charm.revision {
            url.push_str(&format!("-{revision}"));
        }

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            anyhow::bail!("charm not found: {}", charm);
        }

        response.error_for_status_ref()?;

        let bundle = response.bytes().await?;
        tracing::debug!(charm = %charm, size = bundle.len(), "downloaded charm");
        Ok(bundle)
    }

    /// Reads a counter, or the sum under it for a prefix key.
    pub async fn counter_sum(&self, key: &CounterKey) -> Result<i64> {
        let key = key.to_string();
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("invalid base URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(["stats", "counter", key.as_str()]);

        let response = self.client.get(url).send().await?;

        response.error_for_status_ref()?;

        let body = response.text().await?;
        Ok(body.trim().parse()?)
    }

    /// Check if the service is alive
    pub async fn liveness(&self) -> Result<bool> {
        let url = format!("{}{}", self.base_url, LIVENESS_PATH);

        let response = self.client.get(&url).send().await?;

        Ok(response.status() == StatusCode::OK && response.text().await? == "42")
    }
}
