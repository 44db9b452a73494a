// src/main.rs
mod config;
mod handlers;
mod models;
mod status;
mod storage;
mod utils;

use actix_web::{ middleware::Logger, web, App, HttpServer };
use env_logger::Env;
use governor::RateLimiter;
use log::info;
use std::sync::Arc;
use crate::config::Config;
use crate::handlers::AppData;
use crate::status::aggregator::Aggregator;
use crate::status::cache::StatusCache;
use crate::status::fetcher::StatusFetcher;
use crate::status::scheduler::Scheduler;
use crate::storage::memory::ServerRegistry;
use crate::utils::{ RefreshLimiter, StatusReadLimiter };

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();

    let registry = Arc::new(match &config.registry_file {
        Some(path) => ServerRegistry::open(path)?,
        None => ServerRegistry::new(),
    });

    let fetcher = StatusFetcher::new(&config).map_err(|e| {
        log::error!("Failed to build status API client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, format!("Failed to build HTTP client: {}", e))
    })?;

    let cache = Arc::new(StatusCache::new());
    let aggregator = Arc::new(
        Aggregator::new(registry.clone(), Arc::new(fetcher), cache.clone(), config.fetch_timeout())
    );
    let scheduler = Scheduler::new(aggregator, config.refresh_interval());

    // Blocks until the first cycle is published so early readers see data.
    info!("Fetching initial server status from {}", config.status_api_base);
    let refresh_loop = scheduler.start().await;

    let data = AppData {
        status_read_limiter: web::Data::new(
            StatusReadLimiter(RateLimiter::keyed(config.status_read_quota()))
        ),
        refresh_limiter: web::Data::new(RefreshLimiter(RateLimiter::keyed(config.refresh_quota()))),
        registry: web::Data::from(registry),
        cache: web::Data::from(cache),
        scheduler: web::Data::new(scheduler),
        config: web::Data::new(config.clone()),
    };

    let bind = config.bind();
    info!("Starting server on {}", bind);
    let result = HttpServer::new(move || {
        let data = data.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| handlers::configure(cfg, &data))
    })
        .bind(&bind)?
        .run().await;

    refresh_loop.abort();
    info!("Server stopped");
    result
}
