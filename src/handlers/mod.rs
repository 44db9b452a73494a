pub mod servers;
pub mod status;

use actix_web::web;
use crate::config::Config;
use crate::status::cache::StatusCache;
use crate::status::scheduler::Scheduler;
use crate::storage::memory::ServerRegistry;
use crate::utils::{RefreshLimiter, RequestError, StatusReadLimiter};

/// Shared state handed to every worker.
#[derive(Clone)]
pub struct AppData {
    pub config: web::Data<Config>,
    pub registry: web::Data<ServerRegistry>,
    pub cache: web::Data<StatusCache>,
    pub scheduler: web::Data<Scheduler>,
    pub status_read_limiter: web::Data<StatusReadLimiter>,
    pub refresh_limiter: web::Data<RefreshLimiter>,
}

pub fn configure(cfg: &mut web::ServiceConfig, data: &AppData) {
    cfg.app_data(data.config.clone())
        .app_data(data.registry.clone())
        .app_data(data.cache.clone())
        .app_data(data.scheduler.clone())
        .app_data(data.status_read_limiter.clone())
        .app_data(data.refresh_limiter.clone())
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| RequestError::InvalidBody(err.to_string()).into()),
        )
        // `/single` must be registered ahead of `/{id}`.
        .route("/api/server-status", web::get().to(status::get_all_status))
        .route("/api/server-status/single", web::get().to(status::get_single_status))
        .route("/api/server-status/{id}", web::get().to(status::get_status_by_id))
        .route("/admin/server-status/refresh", web::post().to(servers::refresh_status))
        .route("/admin/servers", web::get().to(servers::list_servers))
        .route("/admin/servers", web::post().to(servers::create_server))
        .route("/admin/servers/{id}", web::put().to(servers::update_server))
        .route("/admin/servers/{id}", web::delete().to(servers::delete_server));
}
