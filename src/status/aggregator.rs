// src/status/aggregator.rs
use log::{debug, error, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crate::models::status::StatusSnapshot;
use crate::status::cache::StatusCache;
use crate::status::fetcher::{fetch_bounded, StatusSource};
use crate::storage::memory::ServerRegistry;

/// Runs one fan-out cycle over the enabled servers and publishes the result.
pub struct Aggregator {
    registry: Arc<ServerRegistry>,
    source: Arc<dyn StatusSource>,
    cache: Arc<StatusCache>,
    fetch_timeout: Duration,
    cycles: AtomicU64,
}

impl Aggregator {
    pub fn new(
        registry: Arc<ServerRegistry>,
        source: Arc<dyn StatusSource>,
        cache: Arc<StatusCache>,
        fetch_timeout: Duration
    ) -> Self {
        Self {
            registry,
            source,
            cache,
            fetch_timeout,
            cycles: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    /// Fetches every enabled server concurrently, waits for all of them, then
    /// swaps the cache. Returns false if a newer cycle published first.
    pub async fn run_cycle(&self) -> bool {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let servers = self.registry.list_enabled();
        debug!("Cycle {} starting for {} servers", cycle, servers.len());

        let mut handles = Vec::with_capacity(servers.len());
        for server in &servers {
            let source = self.source.clone();
            let server = server.clone();
            let timeout = self.fetch_timeout;
            handles.push(tokio::spawn(async move {
                fetch_bounded(source.as_ref(), &server, timeout).await
            }));
        }

        // Collected by registry position, not completion order.
        let mut snapshots = Vec::with_capacity(servers.len());
        for (server, handle) in servers.iter().zip(handles) {
            match handle.await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    error!("Status task for {} failed: {}", server.address, e);
                    snapshots.push(StatusSnapshot::offline(server));
                }
            }
        }

        let online = snapshots.iter().filter(|s| s.online).count();
        let total = snapshots.len();
        if self.cache.publish(cycle, snapshots) {
            info!("Cycle {} published: {}/{} servers online", cycle, online, total);
            true
        } else {
            debug!("Cycle {} superseded by a newer cycle, result dropped", cycle);
            false
        }
    }
}
