use adlink_shared::{Contract, NewResponse, OfferResponse};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/offers/{id}/responses", get(list_responses).post(create_response))
        .route("/api/responses/{id}", get(get_response))
        .route("/api/responses/{id}/accept", post(accept_response))
        .route("/api/responses/{id}/reject", post(reject_response))
}

async fn list_responses(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(offer_id): ApiPath<i64>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    Ok(Json(state.responses.list_responses(&caller, offer_id).await?))
}

async fn create_response(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(offer_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<NewResponse>,
) -> Result<(StatusCode, Json<OfferResponse>), AppError> {
    let response = state.responses.create_response(&caller, offer_id, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_response(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<OfferResponse>, AppError> {
    Ok(Json(state.responses.get_response(&caller, id).await?))
}

/// Accepting returns the contract created by the transition.
async fn accept_response(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<(StatusCode, Json<Contract>), AppError> {
    let contract = state.responses.accept_response(&caller, id).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

async fn reject_response(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<OfferResponse>, AppError> {
    Ok(Json(state.responses.reject_response(&caller, id).await?))
}
