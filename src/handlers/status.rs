// src/handlers/status.rs
use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;
use serde_json::json;
use crate::models::status::Totals;
use crate::status::cache::StatusCache;
use crate::utils::{check_rate, parse_id, RequestError, StatusReadLimiter};

pub async fn get_all_status(
    req: HttpRequest,
    cache: web::Data<StatusCache>,
    limiter: web::Data<StatusReadLimiter>,
) -> Result<HttpResponse, RequestError> {
    check_rate(&limiter.0, &req, "status list")?;

    let servers = cache.snapshot();
    let totals = Totals::of(&servers);
    debug!("Serving status for {} servers", servers.len());

    Ok(HttpResponse::Ok().json(json!({
        "servers": servers.as_slice(),
        "total_online": totals.total_online,
        "total_max": totals.total_max,
    })))
}

/// First cached entry, kept for the single-server widget.
pub async fn get_single_status(
    req: HttpRequest,
    cache: web::Data<StatusCache>,
    limiter: web::Data<StatusReadLimiter>,
) -> Result<HttpResponse, RequestError> {
    check_rate(&limiter.0, &req, "single status")?;

    match cache.snapshot().first() {
        Some(first) => Ok(HttpResponse::Ok().json(first)),
        None => Ok(HttpResponse::Ok().json(json!({ "online": false }))),
    }
}

pub async fn get_status_by_id(
    req: HttpRequest,
    path: web::Path<String>,
    cache: web::Data<StatusCache>,
    limiter: web::Data<StatusReadLimiter>,
) -> Result<HttpResponse, RequestError> {
    check_rate(&limiter.0, &req, "status by id")?;

    let id = parse_id(&path)?;
    cache
        .get(id)
        .map(|snapshot| HttpResponse::Ok().json(snapshot))
        .ok_or_else(|| RequestError::NotFound(format!("Server {}", id)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;
    use crate::handlers::testing::{get, TestState};

    #[actix_web::test]
    async fn full_status_includes_online_totals_only() {
        let state = TestState::new();
        let up = state.add("alpha", 0, true);
        state.add("beta", 1, true);
        state.add("hidden", 2, false);
        state.source.set_offline("beta.example.net");
        state.cycle().await;

        let app = test::init_service(state.app()).await;
        let body: Value = test::call_and_read_body_json(&app, get("/api/server-status").to_request()).await;

        let servers = body["servers"].as_array().unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0]["server_id"], up.id);
        assert_eq!(servers[1]["online"], false);
        assert_eq!(body["total_online"], 5);
        assert_eq!(body["total_max"], 20);
    }

    #[actix_web::test]
    async fn empty_cache_reads() {
        let state = TestState::new();
        let app = test::init_service(state.app()).await;

        let body: Value = test::call_and_read_body_json(&app, get("/api/server-status").to_request()).await;
        assert_eq!(body["servers"], serde_json::json!([]));
        assert_eq!(body["total_online"], 0);

        let single: Value = test::call_and_read_body_json(&app, get("/api/server-status/single").to_request()).await;
        assert_eq!(single, serde_json::json!({ "online": false }));
    }

    #[actix_web::test]
    async fn single_returns_first_entry() {
        let state = TestState::new();
        state.add("second", 5, true);
        let first = state.add("first", 1, true);
        state.cycle().await;

        let app = test::init_service(state.app()).await;
        let body: Value = test::call_and_read_body_json(&app, get("/api/server-status/single").to_request()).await;
        assert_eq!(body["server_id"], first.id);
        assert_eq!(body["motd"], "Hello World");
    }

    #[actix_web::test]
    async fn lookup_by_id_distinguishes_missing_from_offline() {
        let state = TestState::new();
        let down = state.add("down", 0, true);
        state.source.set_offline("down.example.net");
        state.cycle().await;

        let app = test::init_service(state.app()).await;

        let present = test::call_service(&app, get(&format!("/api/server-status/{}", down.id)).to_request()).await;
        assert_eq!(present.status(), StatusCode::OK);
        let body: Value = test::read_body_json(present).await;
        assert_eq!(body["online"], false);
        assert_eq!(body["server_name"], "down");

        let missing = test::call_service(&app, get("/api/server-status/999").to_request()).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let bad = test::call_service(&app, get("/api/server-status/abc").to_request()).await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
