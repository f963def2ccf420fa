use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::permissions::model::{AccountId, Menu, MenuId};
use crate::server::response::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::store::wire::{BulkUpsertRequest, BulkUpsertSummary, GrantRecord};
use crate::store::{GrantStore, MenuCatalog};

#[derive(Debug, Deserialize)]
pub struct GrantQuery {
    pub menu_id: Option<i64>,
    pub account_id: Option<i64>,
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "status": "ok",
                "timestamp": now
            }
        })),
    )
}

/// GET /api/menus - The full menu catalog
pub async fn list_menus(State(state): State<AppState>) -> ApiResult<Vec<Menu>> {
    let menus = state.store.list_menus().await?;
    Ok(ApiResponse::success(menus))
}

/// GET /api/permissions?menu_id=&account_id= - Grants for one (menu, account) pair
pub async fn list_grants(State(state): State<AppState>, Query(query): Query<GrantQuery>) -> ApiResult<Vec<GrantRecord>> {
    let (Some(menu_id), Some(account_id)) = (query.menu_id, query.account_id) else {
        return Err(ApiError::bad_request("menu_id and account_id are required"));
    };

    let grants = state.store.list_grants(MenuId(menu_id), AccountId(account_id)).await?;
    Ok(ApiResponse::success(grants.iter().map(GrantRecord::from_grant).collect()))
}

/// POST /api/accounts/:account_id/permissions - Create-or-update a whole matrix
pub async fn bulk_upsert(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Json(request): Json<BulkUpsertRequest>,
) -> ApiResult<BulkUpsertSummary> {
    let account_id = AccountId(account_id);
    let outcome = state.store.bulk_upsert(account_id, request.menus).await?;
    info!("Saved {} grants for account {}", outcome.saved, account_id);
    Ok(ApiResponse::success(BulkUpsertSummary { saved: outcome.saved }))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}
