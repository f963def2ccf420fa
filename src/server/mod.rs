//! Development grant store: the menu catalog and grant endpoints the admin
//! console talks to, served from a `MemoryStore`.

mod handlers;
pub mod response;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::store::memory::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
}

pub fn router(store: Arc<MemoryStore>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/menus", get(handlers::list_menus))
        .route("/api/permissions", get(handlers::list_grants))
        .route("/api/accounts/:account_id/permissions", post(handlers::bulk_upsert))
        .fallback(handlers::not_found)
        .with_state(AppState { store })
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(listener: TcpListener, store: Arc<MemoryStore>) -> std::io::Result<()> {
    axum::serve(listener, router(store)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::permissions::model::Menu;

    fn app() -> Router {
        router(Arc::new(MemoryStore::new(vec![Menu::new(1, "Users"), Menu::new(2, "Courses")])))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_menus_are_enveloped() {
        let (status, body) = send(app(), Request::get("/api/menus").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][1], json!({"id": 2, "name": "Courses"}));
    }

    #[tokio::test]
    async fn test_grant_lookup_requires_both_ids() {
        let (status, body) = send(
            app(),
            Request::get("/api/permissions?menu_id=1").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_bulk_upsert_reports_count_only() {
        let payload = json!({
            "menus": [{
                "menu_id": 1,
                "permissions": [
                    {"id": 0, "account_id": 42, "menu_id": 1, "permission_code": 1, "status": true},
                    {"id": 0, "account_id": 42, "menu_id": 1, "permission_code": 2, "status": false}
                ]
            }]
        });
        let request = Request::post("/api/accounts/42/permissions")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({"saved": 2}));
    }

    #[tokio::test]
    async fn test_rejected_batch_is_422() {
        let payload = json!({
            "menus": [{
                "menu_id": 9,
                "permissions": [
                    {"id": 0, "account_id": 42, "menu_id": 9, "permission_code": 1, "status": true}
                ]
            }]
        });
        let request = Request::post("/api/accounts/42/permissions")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = send(app(), Request::get("/api/courses").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
