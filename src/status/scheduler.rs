// src/status/scheduler.rs
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use crate::status::aggregator::Aggregator;

/// Drives the aggregator on a fixed interval and on demand.
#[derive(Clone)]
pub struct Scheduler {
    aggregator: Arc<Aggregator>,
    period: Duration,
}

impl Scheduler {
    pub fn new(aggregator: Arc<Aggregator>, period: Duration) -> Self {
        Self { aggregator, period }
    }

    /// Runs the first cycle inline, then spawns the periodic loop.
    pub async fn start(&self) -> JoinHandle<()> {
        self.aggregator.run_cycle().await;

        let this = self.clone();
        tokio::spawn(async move { this.periodic_loop().await })
    }

    async fn periodic_loop(&self) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Status refresh loop started, interval {:?}", self.period);

        // First tick fires immediately and the startup cycle already ran.
        timer.tick().await;
        loop {
            timer.tick().await;
            self.aggregator.run_cycle().await;
        }
    }

    /// Fire-and-forget cycle. Not queued or deduplicated.
    pub fn trigger(&self, reason: &str) -> JoinHandle<()> {
        debug!("Ad-hoc status refresh: {}", reason);
        let aggregator = self.aggregator.clone();
        tokio::spawn(async move {
            aggregator.run_cycle().await;
        })
    }
}
