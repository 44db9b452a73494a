// src/handlers/servers.rs
use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use serde_json::json;
use crate::config::Config;
use crate::models::server::{NewServer, ServerPatch};
use crate::status::scheduler::Scheduler;
use crate::storage::memory::ServerRegistry;
use crate::utils::{check_rate, parse_id, require_admin, RefreshLimiter, RequestError};

pub async fn list_servers(
    req: HttpRequest,
    config: web::Data<Config>,
    registry: web::Data<ServerRegistry>,
) -> Result<HttpResponse, RequestError> {
    require_admin(&req, &config)?;
    Ok(HttpResponse::Ok().json(registry.list_all()))
}

pub async fn create_server(
    req: HttpRequest,
    config: web::Data<Config>,
    registry: web::Data<ServerRegistry>,
    scheduler: web::Data<Scheduler>,
    body: web::Json<NewServer>,
) -> Result<HttpResponse, RequestError> {
    require_admin(&req, &config)?;

    let server = registry.create(body.into_inner())?;
    info!("Created server {} ({}) at {}", server.id, server.name, server.address);
    scheduler.trigger("server created");
    Ok(HttpResponse::Ok().json(server))
}

pub async fn update_server(
    req: HttpRequest,
    path: web::Path<String>,
    config: web::Data<Config>,
    registry: web::Data<ServerRegistry>,
    scheduler: web::Data<Scheduler>,
    body: web::Json<ServerPatch>,
) -> Result<HttpResponse, RequestError> {
    require_admin(&req, &config)?;

    let id = parse_id(&path)?;
    let server = registry.update(id, body.into_inner())?;
    info!("Updated server {} ({})", server.id, server.address);
    scheduler.trigger("server updated");
    Ok(HttpResponse::Ok().json(server))
}

pub async fn delete_server(
    req: HttpRequest,
    path: web::Path<String>,
    config: web::Data<Config>,
    registry: web::Data<ServerRegistry>,
    scheduler: web::Data<Scheduler>,
) -> Result<HttpResponse, RequestError> {
    require_admin(&req, &config)?;

    let id = parse_id(&path)?;
    if !registry.delete(id)? {
        return Err(RequestError::NotFound(format!("Server {}", id)));
    }
    info!("Deleted server {}", id);
    scheduler.trigger("server deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "deleted" })))
}

pub async fn refresh_status(
    req: HttpRequest,
    config: web::Data<Config>,
    scheduler: web::Data<Scheduler>,
    limiter: web::Data<RefreshLimiter>,
) -> Result<HttpResponse, RequestError> {
    require_admin(&req, &config)?;
    check_rate(&limiter.0, &req, "status refresh")?;

    scheduler.trigger("manual refresh");
    Ok(HttpResponse::Ok().json(json!({ "message": "refresh triggered" })))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};
    use std::time::Duration;
    use crate::handlers::testing::{admin, TestState};

    async fn wait_for_cycle(state: &TestState, cycle: u64) {
        for _ in 0..100 {
            if state.cache.cycle() >= cycle {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("cycle {} never published", cycle);
    }

    #[actix_web::test]
    async fn admin_routes_require_token() {
        let state = TestState::new();
        let app = test::init_service(state.app()).await;

        let anonymous = test::TestRequest::get()
            .uri("/admin/servers")
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .to_request();
        assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

        let wrong = test::TestRequest::post()
            .uri("/admin/server-status/refresh")
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .insert_header(("Authorization", "Bearer nope"))
            .to_request();
        assert_eq!(test::call_service(&app, wrong).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn create_triggers_refresh() {
        let state = TestState::new();
        let app = test::init_service(state.app()).await;

        let req = admin(test::TestRequest::post().uri("/admin/servers"))
            .set_json(json!({ "name": "Survival", "address": "survival.example.net", "server_type": "paper" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["name"], "Survival");
        assert_eq!(created["enabled"], true);

        wait_for_cycle(&state, 1).await;
        let cached = state.cache.snapshot();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].server_name, "Survival");
        assert_eq!(cached[0].kind, "paper");
    }

    #[actix_web::test]
    async fn create_rejects_bad_bodies() {
        let state = TestState::new();
        let app = test::init_service(state.app()).await;

        let blank = admin(test::TestRequest::post().uri("/admin/servers"))
            .set_json(json!({ "name": " ", "address": "x.example.net" }))
            .to_request();
        assert_eq!(test::call_service(&app, blank).await.status(), StatusCode::BAD_REQUEST);

        let missing = admin(test::TestRequest::post().uri("/admin/servers"))
            .set_json(json!({ "name": "No address" }))
            .to_request();
        let resp = test::call_service(&app, missing).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[actix_web::test]
    async fn disabling_a_server_drops_it_from_cache() {
        let state = TestState::new();
        let alpha = state.add("alpha", 0, true);
        state.add("beta", 1, true);
        state.cycle().await;
        let app = test::init_service(state.app()).await;

        let req = admin(test::TestRequest::put().uri(&format!("/admin/servers/{}", alpha.id)))
            .set_json(json!({ "enabled": false }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["enabled"], false);
        assert_eq!(updated["name"], "alpha");

        wait_for_cycle(&state, 2).await;
        assert!(state.cache.get(alpha.id).is_none());
        assert_eq!(state.cache.snapshot().len(), 1);
    }

    #[actix_web::test]
    async fn update_and_delete_unknown_ids() {
        let state = TestState::new();
        let app = test::init_service(state.app()).await;

        let update = admin(test::TestRequest::put().uri("/admin/servers/77"))
            .set_json(json!({ "name": "ghost" }))
            .to_request();
        assert_eq!(test::call_service(&app, update).await.status(), StatusCode::NOT_FOUND);

        let delete = admin(test::TestRequest::delete().uri("/admin/servers/77")).to_request();
        assert_eq!(test::call_service(&app, delete).await.status(), StatusCode::NOT_FOUND);

        let bad = admin(test::TestRequest::delete().uri("/admin/servers/x")).to_request();
        assert_eq!(test::call_service(&app, bad).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn update_rejects_blank_name() {
        let state = TestState::new();
        let alpha = state.add("alpha", 0, true);
        let app = test::init_service(state.app()).await;

        let req = admin(test::TestRequest::put().uri(&format!("/admin/servers/{}", alpha.id)))
            .set_json(json!({ "name": "  ", "sort_order": 3 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid request body: name must not be empty");

        assert_eq!(state.registry.list_all(), vec![alpha]);
    }

    #[actix_web::test]
    async fn delete_then_list() {
        let state = TestState::new();
        let alpha = state.add("alpha", 0, true);
        let beta = state.add("beta", 1, false);
        let app = test::init_service(state.app()).await;

        let delete = admin(test::TestRequest::delete().uri(&format!("/admin/servers/{}", alpha.id))).to_request();
        let body: Value = test::call_and_read_body_json(&app, delete).await;
        assert_eq!(body["message"], "deleted");

        let list: Value = test::call_and_read_body_json(
            &app,
            admin(test::TestRequest::get().uri("/admin/servers")).to_request(),
        )
        .await;
        let ids: Vec<u64> = list.as_array().unwrap().iter().map(|s| s["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![beta.id as u64]);
    }

    #[actix_web::test]
    async fn refresh_returns_immediately_and_is_rate_limited() {
        let state = TestState::new();
        state.add("alpha", 0, true);
        let app = test::init_service(state.app()).await;

        for _ in 0..3 {
            let req = admin(test::TestRequest::post().uri("/admin/server-status/refresh")).to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["message"], "refresh triggered");
        }
        let req = admin(test::TestRequest::post().uri("/admin/server-status/refresh")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::TOO_MANY_REQUESTS);

        wait_for_cycle(&state, 1).await;
        assert_eq!(state.cache.snapshot().len(), 1);
    }
}
