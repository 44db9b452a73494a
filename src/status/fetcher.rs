// src/status/fetcher.rs
use async_trait::async_trait;
use log::warn;
use std::fmt;
use std::time::Duration;
use crate::config::Config;
use crate::models::server::TargetServer;
use crate::models::status::{StatusSnapshot, UpstreamStatus};

/// Produces one snapshot for one server. Implementations never fail;
/// every error path degrades to `StatusSnapshot::offline`.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, server: &TargetServer) -> StatusSnapshot;
}

#[derive(Debug)]
enum FetchError {
    Transport(reqwest::Error),
    Read(reqwest::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Read(e) => write!(f, "read error: {}", e),
            Self::Parse(e) => write!(f, "parse error: {}", e),
        }
    }
}

/// Queries the upstream status API (`<base>/3/<address>`).
pub struct StatusFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl StatusFetcher {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: config.status_api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, address: &str) -> String {
        format!("{}/3/{}", self.base_url, address)
    }

    async fn query(&self, address: &str) -> Result<UpstreamStatus, FetchError> {
        let response = self.client
            .get(self.url_for(address))
            .send().await
            .map_err(FetchError::Transport)?;
        let body = response.bytes().await.map_err(FetchError::Read)?;
        serde_json::from_slice(&body).map_err(FetchError::Parse)
    }
}

#[async_trait]
impl StatusSource for StatusFetcher {
    async fn fetch(&self, server: &TargetServer) -> StatusSnapshot {
        match self.query(&server.address).await {
            Ok(resp) => StatusSnapshot::from_upstream(server, resp),
            Err(e) => {
                warn!("Status fetch for {} failed: {}", server.address, e);
                StatusSnapshot::offline(server)
            }
        }
    }
}

/// Applies the fetch bound on top of any source.
pub async fn fetch_bounded(
    source: &dyn StatusSource,
    server: &TargetServer,
    timeout: Duration
) -> StatusSnapshot {
    match tokio::time::timeout(timeout, source.fetch(server)).await {
        Ok(snapshot) => snapshot,
        Err(_) => {
            warn!("Status fetch for {} timed out after {:?}", server.address, timeout);
            StatusSnapshot::offline(server)
        }
    }
}
