use adlink_shared::Contract;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::AppError;
use crate::extract::ApiPath;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/contracts", get(list_contracts))
        .route("/api/contracts/{id}", get(get_contract))
        .route("/api/contracts/{id}/complete", post(complete_contract))
        .route("/api/contracts/{id}/cancel", post(cancel_contract))
}

async fn list_contracts(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<Contract>>, AppError> {
    Ok(Json(state.contracts.list_contracts(&caller).await?))
}

async fn get_contract(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Contract>, AppError> {
    Ok(Json(state.contracts.get_contract(&caller, id).await?))
}

async fn complete_contract(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Contract>, AppError> {
    Ok(Json(state.contracts.complete_contract(&caller, id).await?))
}

async fn cancel_contract(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Contract>, AppError> {
    Ok(Json(state.contracts.cancel_contract(&caller, id).await?))
}
