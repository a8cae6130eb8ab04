use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wallet_core::domain::entities::{AssetType, Transaction};
use wallet_core::domain::repository::TransactionWithAsset;
use wallet_core::{domain::types::Money, WalletCore};

use super::error::ApiError;
use super::response::ApiResponse;

pub struct AppState {
    pub core: WalletCore,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/wallets/top-up", post(top_up))
        .route("/v1/wallets/bonus", post(grant_bonus))
        .route("/v1/wallets/spend", post(spend))
        .route("/v1/wallets/{user_id}/{asset_code}/balance", get(get_balance))
        .route("/v1/assets/{identifier}", get(get_asset_type))
        .route("/v1/users/{user_id}/transactions", get(list_transactions))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct WalletOperationRequest {
    pub user_id: Uuid,
    pub asset_code: String,
    pub amount: Money,
    /// Falls back here when the caller does not set the `Idempotency-Key`
    /// header.
    pub idempotency_key: Option<String>,
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
}

fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}

fn idempotency_key(headers: &HeaderMap, body_key: Option<String>) -> Result<String, ApiError> {
    if let Some(value) = headers.get("Idempotency-Key") {
        let value = value
            .to_str()
            .map_err(|_| wallet_core::domain::error::CoreError::invalid("Idempotency-Key header is not valid UTF-8"))?;
        return Ok(value.to_string());
    }
    body_key.ok_or_else(|| {
        wallet_core::domain::error::CoreError::invalid(
            "an idempotency key is required, either as the Idempotency-Key header or the idempotency_key body field",
        )
        .into()
    })
}

/// `POST /v1/wallets/top-up`
#[utoipa::path(
    post,
    path = "/v1/wallets/top-up",
    responses((status = 200, description = "top-up applied or replayed"))
)]
pub async fn top_up(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<WalletOperationRequest>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let key = idempotency_key(&headers, payload.idempotency_key.clone())?;
    let user_id = common::UserId(payload.user_id);
    let transaction = state
        .core
        .top_up(user_id, &payload.asset_code, payload.amount, key, payload.metadata)
        .await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// `POST /v1/wallets/bonus`
#[utoipa::path(
    post,
    path = "/v1/wallets/bonus",
    responses((status = 200, description = "bonus applied or replayed"))
)]
pub async fn grant_bonus(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<WalletOperationRequest>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let key = idempotency_key(&headers, payload.idempotency_key.clone())?;
    let user_id = common::UserId(payload.user_id);
    let transaction = state
        .core
        .grant_bonus(user_id, &payload.asset_code, payload.amount, key, payload.metadata)
        .await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// `POST /v1/wallets/spend`
#[utoipa::path(
    post,
    path = "/v1/wallets/spend",
    responses(
        (status = 200, description = "spend applied or replayed"),
        (status = 422, description = "insufficient funds"),
    )
)]
pub async fn spend(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<WalletOperationRequest>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let key = idempotency_key(&headers, payload.idempotency_key.clone())?;
    let user_id = common::UserId(payload.user_id);
    let transaction = state
        .core
        .spend(user_id, &payload.asset_code, payload.amount, key, payload.metadata)
        .await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// `GET /v1/wallets/{user_id}/{asset_code}/balance`
#[utoipa::path(
    get,
    path = "/v1/wallets/{user_id}/{asset_code}/balance",
    responses((status = 200, description = "current balance"))
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path((user_id, asset_code)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<Money>>, ApiError> {
    let balance = state
        .core
        .get_balance(common::UserId(user_id), &asset_code)
        .await?;
    Ok(Json(ApiResponse::success(balance)))
}

/// `GET /v1/assets/{identifier}`
#[utoipa::path(
    get,
    path = "/v1/assets/{identifier}",
    responses((status = 200, description = "asset type metadata"))
)]
pub async fn get_asset_type(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<AssetType>>, ApiError> {
    let asset_type = state.core.get_asset_type(&identifier).await?;
    Ok(Json(ApiResponse::success(asset_type)))
}

#[derive(Deserialize)]
pub struct ListTransactionsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct TransactionHistoryPage {
    pub transactions: Vec<TransactionWithAsset>,
}

/// `GET /v1/users/{user_id}/transactions`
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/transactions",
    responses((status = 200, description = "paginated transaction history, most recent first"))
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ApiResponse<TransactionHistoryPage>>, ApiError> {
    let transactions = state
        .core
        .list_transactions(common::UserId(user_id), query.limit, query.offset)
        .await?;
    Ok(Json(ApiResponse::success(TransactionHistoryPage {
        transactions,
    })))
}
